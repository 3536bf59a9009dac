//! Linux sysfs backlight sink.
//!
//! Each device under `/sys/class/backlight/<name>/` exposes `brightness` (writable raw
//! level) and `max_brightness`. Fractions are scaled onto the raw range. Writes usually
//! need the user to be in the `video` group; a refused write reports `Unavailable`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{BrightnessSink, SinkResult};

/// Brightness sink backed by one sysfs backlight device.
pub struct BacklightSink {
    device: PathBuf,
    max_raw: u64,
}

/// Find the first backlight device that has both control files, in name order.
pub fn find_device(root: &Path) -> Option<PathBuf> {
    let mut devices: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.join("brightness").exists() && path.join("max_brightness").exists())
        .collect();
    devices.sort();
    devices.into_iter().next()
}

impl BacklightSink {
    /// Open the first usable device under `root`.
    pub fn discover(root: &Path) -> Result<Self> {
        let device = find_device(root)
            .with_context(|| format!("No backlight device found under {}", root.display()))?;
        Self::open(device)
    }

    /// Open a specific device directory.
    pub fn open(device: PathBuf) -> Result<Self> {
        let max_raw = read_raw(&device.join("max_brightness")).with_context(|| {
            format!("Failed to read max_brightness of {}", device.display())
        })?;
        if max_raw == 0 {
            anyhow::bail!("Backlight {} reports max_brightness of 0", device.display());
        }

        #[cfg(debug_assertions)]
        eprintln!(
            "DEBUG: BacklightSink::open() - {} (max {})",
            device.display(),
            max_raw
        );

        Ok(Self { device, max_raw })
    }

    fn to_raw(&self, value: f64) -> u64 {
        (value * self.max_raw as f64).round() as u64
    }
}

fn read_raw(path: &Path) -> Result<u64> {
    let content = fs::read_to_string(path)?;
    content
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Invalid value in {}", path.display()))
}

impl BrightnessSink for BacklightSink {
    fn write(&mut self, value: f64) -> SinkResult {
        let raw = self.to_raw(value);
        match fs::write(self.device.join("brightness"), format!("{raw}\n")) {
            Ok(()) => SinkResult::Applied,
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("DEBUG: BacklightSink::write({raw}) failed: {_e}");
                SinkResult::Unavailable
            }
        }
    }

    fn read(&self) -> Option<f64> {
        let raw = read_raw(&self.device.join("brightness")).ok()?;
        Some((raw as f64 / self.max_raw as f64).clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "Backlight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_device(root: &Path, name: &str, current: u64, max: u64) -> PathBuf {
        let device = root.join(name);
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("brightness"), format!("{current}\n")).unwrap();
        fs::write(device.join("max_brightness"), format!("{max}\n")).unwrap();
        device
    }

    #[test]
    fn test_read_scales_to_fraction() {
        let root = tempdir().unwrap();
        fake_device(root.path(), "acpi_video0", 96, 192);

        let sink = BacklightSink::discover(root.path()).unwrap();
        assert_eq!(sink.read(), Some(0.5));
    }

    #[test]
    fn test_write_scales_to_raw() {
        let root = tempdir().unwrap();
        let device = fake_device(root.path(), "intel_backlight", 0, 1000);

        let mut sink = BacklightSink::discover(root.path()).unwrap();
        assert_eq!(sink.write(0.25), SinkResult::Applied);
        assert_eq!(
            fs::read_to_string(device.join("brightness")).unwrap().trim(),
            "250"
        );
    }

    #[test]
    fn test_discover_picks_first_device_by_name() {
        let root = tempdir().unwrap();
        fake_device(root.path(), "b_device", 10, 100);
        fake_device(root.path(), "a_device", 20, 100);

        let sink = BacklightSink::discover(root.path()).unwrap();
        assert_eq!(sink.read(), Some(0.2));
    }

    #[test]
    fn test_zero_max_is_rejected() {
        let root = tempdir().unwrap();
        fake_device(root.path(), "broken", 0, 0);
        assert!(BacklightSink::discover(root.path()).is_err());
    }

    #[test]
    fn test_missing_device_write_is_unavailable() {
        let root = tempdir().unwrap();
        let device = fake_device(root.path(), "gone", 50, 100);
        let mut sink = BacklightSink::open(device.clone()).unwrap();

        fs::remove_dir_all(&device).unwrap();
        assert_eq!(sink.write(0.5), SinkResult::Unavailable);
        assert_eq!(sink.read(), None);
    }
}
