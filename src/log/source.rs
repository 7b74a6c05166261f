//! Device and app metadata sources
//!
//! Both are queried on the logging path, so implementations should be quick.
//! Errors are never surfaced to log callers; the log substitutes placeholders.

use super::entry::{AppInfo, DeviceInfo};
use crate::config::LogConfig;
use crate::{LogError, Result};

pub trait DeviceInfoSource: Send + Sync {
    fn device_info(&self) -> Result<DeviceInfo>;
}

pub trait AppInfoSource: Send + Sync {
    fn app_info(&self) -> Result<AppInfo>;
}

/// Describes the machine the process runs on
#[derive(Debug, Clone, Default)]
pub struct HostDevice;

impl HostDevice {
    fn os_version() -> Result<String> {
        let release = std::fs::read_to_string("/proc/sys/kernel/osrelease")?;
        let release = release.trim();
        if release.is_empty() {
            return Err(LogError::MetadataUnavailable("empty OS release".to_string()));
        }
        Ok(release.to_string())
    }
}

impl DeviceInfoSource for HostDevice {
    fn device_info(&self) -> Result<DeviceInfo> {
        let mut info = DeviceInfo::new(
            std::env::consts::OS,
            Self::os_version().unwrap_or_default(),
        );
        info.model = Some(std::env::consts::ARCH.to_string());
        info.is_device = Some(true);
        Ok(info.normalized())
    }
}

/// App metadata fixed at build/config time
#[derive(Debug, Clone)]
pub struct StaticAppInfo {
    info: AppInfo,
}

impl StaticAppInfo {
    pub fn new(info: AppInfo) -> Self {
        Self { info }
    }

    pub fn from_config(config: &LogConfig) -> Self {
        Self::new(AppInfo {
            version: config.app_version.clone(),
            build_number: config.build_number.clone(),
            environment: config.environment,
            platform: Some(config.app_platform.clone()),
        })
    }
}

impl AppInfoSource for StaticAppInfo {
    fn app_info(&self) -> Result<AppInfo> {
        Ok(self.info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_host_device() {
        let info = HostDevice.device_info().unwrap();
        assert_eq!(info.platform, std::env::consts::OS);
        assert!(!info.version.is_empty());
        assert_eq!(info.is_device, Some(true));
    }

    #[test]
    fn test_static_app_info_from_config() {
        let config = LogConfig::production()
            .with_app_version("2.1.0")
            .with_build_number("42");
        let info = StaticAppInfo::from_config(&config).app_info().unwrap();

        assert_eq!(info.version, "2.1.0");
        assert_eq!(info.build_number.as_deref(), Some("42"));
        assert_eq!(info.environment, Environment::Production);
        assert_eq!(info.platform.as_deref(), Some("native"));
    }
}
