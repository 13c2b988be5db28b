//! Delays
use embedded_hal::delay::DelayNs;

use crate::rcc::Clocks;
use crate::time::{cycles, ExtU32, Hertz};

/// Busy-wait delay provider counting core clock cycles
///
/// Used for the short analog settling waits of the comparator.
pub struct Delay {
    clk: Hertz,
}

impl Delay {
    pub fn new(clocks: &Clocks) -> Self {
        Delay {
            clk: clocks.core_clk,
        }
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = cycles(ns.nanos(), self.clk);
        if ticks > 0 {
            cortex_m::asm::delay(ticks);
        }
    }
}

pub trait DelayExt {
    fn delay(&self) -> Delay;
}

impl DelayExt for Clocks {
    fn delay(&self) -> Delay {
        Delay::new(self)
    }
}
