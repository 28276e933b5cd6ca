// src/actuator/pins.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    fn as_sysfs(&self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

/// A set of digital output lines.
pub trait PinBank {
    fn write(&mut self, pin: u32, level: Level) -> Result<()>;
}

/// GPIO lines through the Linux sysfs interface (`/sys/class/gpio`).
pub struct SysfsPins {
    root: PathBuf,
}

impl SysfsPins {
    /// Export every line and configure it as an output.
    pub fn open(root: impl AsRef<Path>, pins: &[u32]) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for &pin in pins {
            let line = root.join(format!("gpio{}", pin));
            if !line.exists() {
                std::fs::write(root.join("export"), pin.to_string())
                    .with_context(|| format!("Failed to export gpio {}", pin))?;
            }
            std::fs::write(line.join("direction"), "out")
                .with_context(|| format!("Failed to set gpio {} as output", pin))?;
        }
        info!("✓ GPIO lines {:?} ready under {}", pins, root.display());
        Ok(Self { root })
    }
}

impl PinBank for SysfsPins {
    fn write(&mut self, pin: u32, level: Level) -> Result<()> {
        let value = self.root.join(format!("gpio{}", pin)).join("value");
        std::fs::write(&value, level.as_sysfs())
            .with_context(|| format!("Failed to write gpio {}", pin))
    }
}

/// Logs writes instead of touching hardware.
#[derive(Debug, Default)]
pub struct DryRunPins;

impl PinBank for DryRunPins {
    fn write(&mut self, pin: u32, level: Level) -> Result<()> {
        debug!("[dry-run] gpio {} ← {:?}", pin, level);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ball-rover-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_sysfs_writes_direction_and_value() {
        let root = scratch_dir("sysfs");
        // Pretend line 5 is already exported.
        std::fs::create_dir_all(root.join("gpio5")).unwrap();

        let mut pins = SysfsPins::open(&root, &[5]).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("gpio5/direction")).unwrap(), "out");

        pins.write(5, Level::High).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("gpio5/value")).unwrap(), "1");
        pins.write(5, Level::Low).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("gpio5/value")).unwrap(), "0");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_sysfs_missing_line_fails_to_open() {
        let root = scratch_dir("sysfs-missing");
        // export succeeds as a plain file but no kernel creates gpio7/
        let err = SysfsPins::open(&root, &[7]).err().unwrap();
        assert!(format!("{:#}", err).contains("gpio 7"));
        let _ = std::fs::remove_dir_all(&root);
    }
}
