//! Reset and clock control
use crate::bus::RegisterBus;
use crate::pac::rcc;
use crate::time::{Hertz, RateExtU32};

/// HSI speed
pub const HSI_FREQ: u32 = 24_000_000;

/// Clock frequencies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clocks {
    /// System frequency
    pub sys_clk: Hertz,
    /// Core frequency
    pub core_clk: Hertz,
    /// APB frequency
    pub apb_clk: Hertz,
    /// APB timers frequency
    pub apb_tim_clk: Hertz,
}

impl Default for Clocks {
    fn default() -> Clocks {
        Clocks {
            sys_clk: HSI_FREQ.Hz(),
            core_clk: HSI_FREQ.Hz(),
            apb_clk: HSI_FREQ.Hz(),
            apb_tim_clk: HSI_FREQ.Hz(),
        }
    }
}

/// Peripherals with a clock gate used by this crate
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Peripheral {
    GPIOA,
    GPIOB,
    GPIOF,
    SYSCFG,
    COMP1,
    COMP2,
    TIM1,
    TIM3,
    TIM14,
    TIM16,
    TIM17,
}

macro_rules! bus {
    ($($PER:ident => ($enr:ident, $en:ident),)+) => {
        impl Peripheral {
            /// Enable register and bit of the peripheral clock gate
            const fn gate(self) -> (usize, u32) {
                match self {
                    $(Peripheral::$PER => (rcc::$enr, rcc::$en),)+
                }
            }
        }
    }
}

bus! {
    GPIOA => (IOPENR, IOPENR_GPIOAEN),
    GPIOB => (IOPENR, IOPENR_GPIOBEN),
    GPIOF => (IOPENR, IOPENR_GPIOFEN),
    SYSCFG => (APBENR2, APBENR2_SYSCFGEN),
    COMP1 => (APBENR2, APBENR2_COMP1EN),
    COMP2 => (APBENR2, APBENR2_COMP2EN),
    TIM1 => (APBENR2, APBENR2_TIM1EN),
    TIM3 => (APBENR1, APBENR1_TIM3EN),
    TIM14 => (APBENR2, APBENR2_TIM14EN),
    TIM16 => (APBENR2, APBENR2_TIM16EN),
    TIM17 => (APBENR2, APBENR2_TIM17EN),
}

/// Enables the peripheral clock
#[inline(always)]
pub fn enable<B: RegisterBus + ?Sized>(bus: &B, per: Peripheral) {
    let (enr, en) = per.gate();
    bus.set_bits(enr, en);
}

/// Disables the peripheral clock
#[inline(always)]
pub fn disable<B: RegisterBus + ?Sized>(bus: &B, per: Peripheral) {
    let (enr, en) = per.gate();
    bus.clear_bits(enr, en);
}

/// Returns `true` if the peripheral clock is running
#[inline(always)]
pub fn is_enabled<B: RegisterBus + ?Sized>(bus: &B, per: Peripheral) -> bool {
    let (enr, en) = per.gate();
    bus.is_set(enr, en)
}
