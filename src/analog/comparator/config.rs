use crate::gpio::SignalEdge;

/// Comparator settings that are applied together with the inputs
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) hysteresis: Hysteresis,
    pub(crate) filter: u16,
    pub(crate) power_mode: PowerMode,
    pub(crate) inverted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hysteresis: Hysteresis::Disabled,
            filter: 0,
            power_mode: PowerMode::HighSpeed,
            inverted: false,
        }
    }
}

impl Config {
    pub fn hysteresis(mut self, hysteresis: impl Into<Hysteresis>) -> Self {
        self.hysteresis = hysteresis.into();
        self
    }

    /// Number of consecutive equal samples before the output changes, 0 disables the filter
    pub fn filter(mut self, samples: u16) -> Self {
        self.filter = samples;
        self
    }

    pub fn power_mode(mut self, power_mode: PowerMode) -> Self {
        self.power_mode = power_mode;
        self
    }

    pub fn output_inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn output_polarity(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }
}

/// Input hysteresis
///
/// The hardware offers a single fixed level of about 20 mV, shared by both
/// comparators.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Hysteresis {
    Disabled,
    Enabled,
}

impl From<bool> for Hysteresis {
    fn from(enabled: bool) -> Self {
        if enabled {
            Hysteresis::Enabled
        } else {
            Hysteresis::Disabled
        }
    }
}

impl From<u32> for Hysteresis {
    /// Requested hysteresis in millivolts; 20 mV or more enables it
    fn from(millivolts: u32) -> Self {
        Hysteresis::from(millivolts >= 20)
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PowerMode {
    HighSpeed,
    MediumSpeed,
    /// Raw `PWRMODE` field value, masked to the field width
    Raw(u8),
}

/// Edge detection on the comparator's EXTI line
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Trigger {
    pub edge: Option<SignalEdge>,
    /// Raise the `ADC_COMP` interrupt on the edge
    pub interrupt: bool,
    /// Raise a wake-up event on the edge
    pub event: bool,
}

impl Trigger {
    pub const NONE: Trigger = Trigger {
        edge: None,
        interrupt: false,
        event: false,
    };

    /// `true` if the edge detector has anything to drive
    pub fn is_active(&self) -> bool {
        self.edge.is_some() && (self.interrupt || self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis_threshold() {
        assert_eq!(Hysteresis::from(0u32), Hysteresis::Disabled);
        assert_eq!(Hysteresis::from(19u32), Hysteresis::Disabled);
        assert_eq!(Hysteresis::from(20u32), Hysteresis::Enabled);
        assert_eq!(Hysteresis::from(true), Hysteresis::Enabled);
    }

    #[test]
    fn builder() {
        let cfg = Config::default()
            .hysteresis(20u32)
            .filter(8)
            .power_mode(PowerMode::MediumSpeed)
            .output_inverted();
        assert_eq!(cfg.hysteresis, Hysteresis::Enabled);
        assert_eq!(cfg.filter, 8);
        assert_eq!(cfg.power_mode, PowerMode::MediumSpeed);
        assert!(cfg.inverted);
    }

    #[test]
    fn trigger_needs_edge_and_output() {
        assert!(!Trigger::NONE.is_active());
        let edge_only = Trigger {
            edge: Some(SignalEdge::Rising),
            ..Trigger::NONE
        };
        assert!(!edge_only.is_active());
        assert!(Trigger {
            event: true,
            ..edge_only
        }
        .is_active());
    }
}
