use log::warn;

use super::metrics::ServiceInfo;

#[cfg(windows)]
use crate::platform::system::windows::services::get_services;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::services::get_services;

/// Services known to the host service manager, empty when there is none
pub fn collect() -> Vec<ServiceInfo> {
    #[cfg(any(windows, target_os = "linux"))]
    {
        get_services().unwrap_or_else(|e| {
            warn!("Service query failed: {}", e);
            Vec::new()
        })
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Vec::new()
    }
}
