use crate::types::{BridgeChannel, Config};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("Invalid config {}", path))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let control = &self.control;
        if control.target_fps == 0 {
            bail!("control.target_fps must be positive");
        }
        if control.turn_band_low > control.turn_band_high {
            bail!(
                "control.turn_band_low ({}) is above turn_band_high ({})",
                control.turn_band_low,
                control.turn_band_high
            );
        }
        if !(control.scoop_hold_seconds >= 0.0 && control.scoop_hold_seconds.is_finite()) {
            bail!("control.scoop_hold_seconds must be a finite, non-negative number");
        }

        let detector = &self.detector;
        if detector.resize_width == 0 {
            bail!("detector.resize_width must be positive");
        }
        if detector.blur_kernel % 2 == 0 {
            bail!("detector.blur_kernel must be odd, got {}", detector.blur_kernel);
        }

        if self.snapshot.enabled && self.snapshot.frame_divider == 0 {
            bail!("snapshot.frame_divider must be positive");
        }

        if self.source.warmup_secs < 0.0 {
            bail!("source.warmup_secs must not be negative");
        }

        let channels: [(&str, &BridgeChannel); 3] = [
            ("left", &self.actuator.left),
            ("right", &self.actuator.right),
            ("belt", &self.actuator.belt),
        ];
        let mut seen = HashSet::new();
        for (name, channel) in channels {
            for pin in [channel.forward_pin, channel.backward_pin] {
                if !seen.insert(pin) {
                    bail!("actuator.{} reuses gpio line {}", name, pin);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{ActuatorBackend, Config, SourceKind, StopMode};

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.control.close_x_threshold, 100);
        assert_eq!(config.control.turn_band_low, 150);
        assert_eq!(config.control.turn_band_high, 300);
        assert_eq!(config.control.target_fps, 10);
        assert_eq!(config.snapshot.frame_divider, 10);
        assert_eq!(config.actuator.backend, ActuatorBackend::DryRun);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let yaml = r#"
control:
  target_fps: 20
  scoop_hold_seconds: 1.5
source:
  kind:
    type: replay
    dir: recordings/run1
actuator:
  backend: sysfs
  belt:
    forward_pin: 5
    backward_pin: 6
    stop: coast
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.control.target_fps, 20);
        assert_eq!(config.control.min_intake_radius, 30.0);
        assert_eq!(config.control.scoop_hold().as_millis(), 1500);
        assert!(matches!(config.source.kind, SourceKind::Replay { ref dir } if dir == "recordings/run1"));
        assert_eq!(config.actuator.backend, ActuatorBackend::Sysfs);
        assert_eq!(config.actuator.belt.stop, StopMode::Coast);
        assert_eq!(config.actuator.left.forward_pin, 24);
    }

    #[test]
    fn test_rejects_zero_fps() {
        let err = Config::from_yaml("control:\n  target_fps: 0\n").unwrap_err();
        assert!(err.to_string().contains("target_fps"));
    }

    #[test]
    fn test_rejects_inverted_turn_band() {
        let yaml = "control:\n  turn_band_low: 400\n  turn_band_high: 300\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_shared_gpio_line() {
        let yaml = r#"
actuator:
  belt:
    forward_pin: 24
    backward_pin: 6
    stop: brake
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("gpio line 24"));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load("/nonexistent/rover.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rover.yaml"));
    }
}
