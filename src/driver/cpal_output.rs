use crate::error::DriverError;
use cpal::traits::{DeviceTrait, HostTrait};
use log::{debug, warn};

/// Names of all output devices the default host reports.
pub fn output_device_names() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();

    match host.output_devices() {
        Ok(devices) => {
            for device in devices {
                if let Ok(name) = device.name() {
                    names.push(name);
                }
            }
        }
        Err(e) => warn!("Failed to enumerate output devices: {}", e),
    }

    names
}

/// Find an output device on the default host and return its name.
///
/// `None` selects the host's default output device; otherwise the device
/// name must match exactly.
pub fn resolve_output_device(name: Option<&str>) -> Result<String, DriverError> {
    let host = cpal::default_host();
    debug!("Resolving output device on host {:?}", host.id());

    let device = match name {
        Some(wanted) => host
            .output_devices()
            .map_err(|e| DriverError::Backend(format!("Failed to get output devices: {}", e)))?
            .find(|d| match d.name() {
                Ok(name) => name == wanted,
                Err(_) => false,
            }),
        None => host.default_output_device(),
    };

    let device =
        device.ok_or_else(|| DriverError::NoDevice(name.unwrap_or("default").to_string()))?;

    device
        .name()
        .map_err(|e| DriverError::Backend(format!("Failed to read device name: {}", e)))
}
