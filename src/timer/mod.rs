//! Timers
use crate::pac::tim;
use crate::rcc::Peripheral;
use crate::time::Hertz;

pub mod pins;
pub mod pool;
pub mod pwm;

pub use pins::{timer_pin, TimerPin};
pub use pool::{OwnedTimer, SharedTimer, TimerLease, TimerPool};
pub use pwm::PwmTimer;

/// Hardware timers
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerId {
    TIM1,
    TIM3,
    TIM14,
    TIM16,
    TIM17,
}

pub(crate) const TIMER_COUNT: usize = 5;

impl TimerId {
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    pub(crate) const fn base(self) -> usize {
        match self {
            TimerId::TIM1 => tim::TIM1,
            TimerId::TIM3 => tim::TIM3,
            TimerId::TIM14 => tim::TIM14,
            TimerId::TIM16 => tim::TIM16,
            TimerId::TIM17 => tim::TIM17,
        }
    }

    pub(crate) const fn clock(self) -> Peripheral {
        match self {
            TimerId::TIM1 => Peripheral::TIM1,
            TimerId::TIM3 => Peripheral::TIM3,
            TimerId::TIM14 => Peripheral::TIM14,
            TimerId::TIM16 => Peripheral::TIM16,
            TimerId::TIM17 => Peripheral::TIM17,
        }
    }

    /// `true` if the timer implements OCxREF clear (`OCxCE` and `SMCR.OCCS`)
    pub const fn has_ocref_clear(self) -> bool {
        matches!(self, TimerId::TIM1 | TimerId::TIM3)
    }

    /// `true` if the timer has a break/dead-time register with a main output enable
    pub const fn has_break(self) -> bool {
        matches!(self, TimerId::TIM1 | TimerId::TIM16 | TimerId::TIM17)
    }
}

/// Compare channel, 1 to 4
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    pub const fn new(n: u8) -> Option<Channel> {
        match n {
            1..=4 => Some(Channel(n)),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// CCMR register offset and the shift of this channel's half of it
    pub(crate) const fn ccmr(self) -> (usize, u32) {
        let reg = if self.0 <= 2 { tim::CCMR1 } else { tim::CCMR2 };
        let shift = if self.0 % 2 == 1 { 0 } else { tim::CCMR_CH_SHIFT };
        (reg, shift)
    }

    pub(crate) const fn ccer_shift(self) -> u32 {
        (self.0 as u32 - 1) * tim::CCER_CH_SHIFT
    }

    pub(crate) const fn ccr(self) -> usize {
        tim::CCR1 + 4 * (self.0 as usize - 1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerFrequencySettings {
    psc: u16,
    arr: u32,
}

impl TimerFrequencySettings {
    pub(crate) fn from(target_freq: Hertz, clk: Hertz) -> Self {
        let ratio = (clk.raw() / target_freq.raw().max(1)).max(1);
        let psc = (ratio - 1) / 0xffff;
        let arr = (ratio / (psc + 1)).saturating_sub(1);
        let psc = psc as u16;

        Self { psc, arr }
    }
}
