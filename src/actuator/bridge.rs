// src/actuator/bridge.rs
//
// Maps wheel and belt commands onto H-bridge input pairs.
//
//   FORWARD  → forward pin high, backward pin low
//   BACKWARD → forward pin low,  backward pin high
//   STOP     → both low (coast) or both high (brake), per channel
//
// The pin being released is always written before the pin being raised so
// a direction change never passes through a both-high state on a coasting
// channel.

use super::pins::{Level, PinBank};
use super::Actuator;
use crate::types::{ActuatorConfig, BeltAction, BridgeChannel, StopMode, WheelDirection};
use anyhow::{Context, Result};
use tracing::debug;

pub struct PinActuator<P: PinBank> {
    pins: P,
    left: ChannelDriver,
    right: ChannelDriver,
    belt: ChannelDriver,
}

struct ChannelDriver {
    name: &'static str,
    channel: BridgeChannel,
    last: Option<WheelDirection>,
}

impl ChannelDriver {
    fn new(name: &'static str, channel: BridgeChannel) -> Self {
        Self {
            name,
            channel,
            last: None,
        }
    }

    fn levels(&self, direction: WheelDirection) -> (Level, Level) {
        match direction {
            WheelDirection::Forward => (Level::High, Level::Low),
            WheelDirection::Backward => (Level::Low, Level::High),
            WheelDirection::Stop => match self.channel.stop {
                StopMode::Coast => (Level::Low, Level::Low),
                StopMode::Brake => (Level::High, Level::High),
            },
        }
    }

    fn set<P: PinBank>(&mut self, pins: &mut P, direction: WheelDirection) -> Result<()> {
        if self.last == Some(direction) {
            return Ok(());
        }

        let (fwd, back) = self.levels(direction);
        let mut writes = [
            (self.channel.forward_pin, fwd),
            (self.channel.backward_pin, back),
        ];
        writes.sort_by_key(|(_, level)| *level == Level::High);

        // Forget the cached state first: a failed write leaves it unknown.
        self.last = None;
        for (pin, level) in writes {
            pins.write(pin, level)
                .with_context(|| format!("{} channel", self.name))?;
        }
        debug!("{} channel → {:?}", self.name, direction);
        self.last = Some(direction);
        Ok(())
    }
}

impl<P: PinBank> PinActuator<P> {
    pub fn new(pins: P, config: &ActuatorConfig) -> Self {
        Self {
            pins,
            left: ChannelDriver::new("left", config.left),
            right: ChannelDriver::new("right", config.right),
            belt: ChannelDriver::new("belt", config.belt),
        }
    }

    /// Every line the actuator drives.
    pub fn pin_list(config: &ActuatorConfig) -> Vec<u32> {
        [config.left, config.right, config.belt]
            .iter()
            .flat_map(|c| [c.forward_pin, c.backward_pin])
            .collect()
    }

    #[cfg(test)]
    pub fn pins(&self) -> &P {
        &self.pins
    }
}

impl<P: PinBank> Actuator for PinActuator<P> {
    /// Both channels are always attempted; the first failure is returned.
    fn drive(&mut self, left: WheelDirection, right: WheelDirection) -> Result<()> {
        let left = self.left.set(&mut self.pins, left);
        let right = self.right.set(&mut self.pins, right);
        left.and(right)
    }

    fn belt(&mut self, action: BeltAction) -> Result<()> {
        let direction = match action {
            BeltAction::Intake => WheelDirection::Forward,
            #[cfg(test)]
            BeltAction::Outtake => WheelDirection::Backward,
            BeltAction::Stop => WheelDirection::Stop,
        };
        self.belt.set(&mut self.pins, direction)
    }
}
