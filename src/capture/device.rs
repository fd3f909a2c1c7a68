//! Audio input device lookup.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Opens an input device by spec: "default", a numeric index or a device name.
///
/// # Errors
/// - If the host has no default input device
/// - If no device with the specified name/index is found
pub fn open_input_device(device_spec: &str) -> Result<cpal::Device> {
    suppress_stderr(|| {
        let host = cpal::default_host();

        if device_spec == "default" {
            host.default_input_device()
                .ok_or_else(|| anyhow!("No audio input device available"))
        } else {
            find_device(&host, device_spec)
        }
    })
}

/// Lists input devices whose names can be queried, plus the default device name.
///
/// # Errors
/// - If the host cannot enumerate devices
pub fn input_devices() -> Result<(Vec<cpal::Device>, Option<String>)> {
    suppress_stderr(|| {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        Ok((devices, default_name))
    })
}

fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .map(|device| {
            let name = device.name().ok();
            (device, name)
        });
    select_device(devices, device_spec)
}

/// Picks a device by index or name among those with a readable name, the
/// same set (and numbering) `list-devices` prints.
fn select_device<D>(
    devices: impl IntoIterator<Item = (D, Option<String>)>,
    device_spec: &str,
) -> Result<D> {
    let mut named = devices
        .into_iter()
        .filter_map(|(device, name)| Some((device, name?)));

    if let Ok(index) = device_spec.parse::<usize>() {
        return named
            .nth(index)
            .map(|(device, _)| device)
            .ok_or_else(|| anyhow!("Device index {index} is out of range"));
    }

    named
        .find(|(_, name)| name == device_spec)
        .map(|(device, _)| device)
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'wavestack list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to silence ALSA's chatter on Linux.
#[cfg(target_os = "linux")]
fn suppress_stderr<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
fn suppress_stderr<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<(u32, Option<String>)> {
        vec![
            (10, Some("Built-in Microphone".to_string())),
            (11, None),
            (12, Some("USB Interface".to_string())),
        ]
    }

    #[test]
    fn test_index_skips_unnamed_devices() {
        assert_eq!(select_device(devices(), "0").unwrap(), 10);
        assert_eq!(select_device(devices(), "1").unwrap(), 12);
        assert!(select_device(devices(), "2").is_err());
    }

    #[test]
    fn test_select_by_name() {
        assert_eq!(select_device(devices(), "USB Interface").unwrap(), 12);
        assert!(select_device(devices(), "USB").is_err());
    }
}
