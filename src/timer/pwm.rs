//! # Pulse Width Modulation
use crate::bus::RegisterBus;
use crate::pac::tim;
use crate::rcc::{self, Clocks};
use crate::time::Hertz;
use crate::timer::{Channel, TimerFrequencySettings, TimerId};

/// Largest value of the 10-bit compare format
pub const COMPARE_10BIT_MAX: u32 = (1 << 10) - 1;

/// PWM driver for one timer
///
/// The driver keeps no register state of its own; every method goes to the
/// hardware, so any number of drivers for the same timer agree.
#[derive(Debug, PartialEq, Eq)]
pub struct PwmTimer {
    id: TimerId,
    clk: Hertz,
}

impl PwmTimer {
    pub fn new(id: TimerId, clocks: &Clocks) -> Self {
        PwmTimer {
            id,
            clk: clocks.apb_tim_clk,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    #[inline(always)]
    fn reg(&self, offset: usize) -> usize {
        self.id.base() + offset
    }

    /// Enables the timer clock
    pub fn init<B: RegisterBus + ?Sized>(&self, bus: &B) {
        rcc::enable(bus, self.id.clock());
    }

    /// Puts `ch` in PWM mode 1 with a preloaded compare value and enables its output
    pub fn set_pwm_mode<B: RegisterBus + ?Sized>(&self, bus: &B, ch: Channel) {
        let (ccmr, shift) = ch.ccmr();
        bus.modify_field(
            self.reg(ccmr),
            (tim::CCMR_OCM | tim::CCMR_OCPE) << shift,
            (tim::OCM_PWM1 << tim::CCMR_OCM_POS | tim::CCMR_OCPE) << shift,
        );
        bus.set_bits(self.reg(tim::CCER), tim::CCER_CCE << ch.ccer_shift());
    }

    /// Programs prescaler and reload for `freq`
    pub fn set_freq<B: RegisterBus + ?Sized>(&self, bus: &B, freq: Hertz) {
        let settings = TimerFrequencySettings::from(freq, self.clk);
        bus.write(self.reg(tim::PSC), settings.psc as u32);
        bus.write(self.reg(tim::ARR), settings.arr & 0xFFFF);
        bus.set_bits(self.reg(tim::CR1), tim::CR1_ARPE);
    }

    /// Returns the currently configured frequency
    pub fn freq<B: RegisterBus + ?Sized>(&self, bus: &B) -> Hertz {
        let psc = bus.read(self.reg(tim::PSC)) + 1;
        let arr = bus.read(self.reg(tim::ARR)) + 1;
        Hertz::from_raw(self.clk.raw() / psc / arr)
    }

    /// Reload value, the largest meaningful compare count
    pub fn top<B: RegisterBus + ?Sized>(&self, bus: &B) -> u32 {
        bus.read(self.reg(tim::ARR))
    }

    pub fn compare<B: RegisterBus + ?Sized>(&self, bus: &B, ch: Channel) -> u32 {
        bus.read(self.reg(ch.ccr()))
    }

    /// Writes a raw compare count
    pub fn set_compare<B: RegisterBus + ?Sized>(&self, bus: &B, ch: Channel, counts: u32) {
        bus.write(self.reg(ch.ccr()), counts);
    }

    /// Writes a compare value given in the 10-bit format, where
    /// [`COMPARE_10BIT_MAX`] is a full period
    pub fn set_compare_10bit<B: RegisterBus + ?Sized>(&self, bus: &B, ch: Channel, value: u32) {
        let period = self.top(bus) as u64 + 1;
        let value = value.min(COMPARE_10BIT_MAX) as u64;
        let counts = period * value / COMPARE_10BIT_MAX as u64;
        self.set_compare(bus, ch, counts as u32);
    }

    /// Loads the shadow registers and starts counting
    pub fn resume<B: RegisterBus + ?Sized>(&self, bus: &B) {
        if self.id.has_break() {
            bus.set_bits(self.reg(tim::BDTR), tim::BDTR_MOE);
        }
        bus.write(self.reg(tim::EGR), tim::EGR_UG);
        bus.set_bits(self.reg(tim::CR1), tim::CR1_CEN);
    }

    pub fn pause<B: RegisterBus + ?Sized>(&self, bus: &B) {
        bus.clear_bits(self.reg(tim::CR1), tim::CR1_CEN);
    }

    /// Enables or disables clearing of `ch`'s OCxREF by the internal
    /// OCREF_CLR signal
    ///
    /// Enabling also selects OCREF_CLR_INT instead of ETRF as the clear source.
    pub fn set_ocref_clear<B: RegisterBus + ?Sized>(&self, bus: &B, ch: Channel, enable: bool) {
        if enable {
            bus.clear_bits(self.reg(tim::SMCR), tim::SMCR_OCCS);
        }
        let (ccmr, shift) = ch.ccmr();
        bus.write_bits(self.reg(ccmr), tim::CCMR_OCCE << shift, enable);
    }

    /// Arms or disarms the break input
    ///
    /// Armed, a break drops the outputs and automatic output enable brings
    /// them back at the first update event after the break input releases.
    /// Disarming cycles MOE so output generation restarts cleanly.
    pub fn set_break<B: RegisterBus + ?Sized>(&self, bus: &B, enable: bool, active_high: bool) {
        let bdtr = self.reg(tim::BDTR);
        if enable {
            bus.set_bits(bdtr, tim::BDTR_BKE);
            bus.write_bits(bdtr, tim::BDTR_BKP, active_high);
            bus.set_bits(bdtr, tim::BDTR_AOE);
            self.clear_break_flag(bus);
            bus.set_bits(bdtr, tim::BDTR_MOE);
        } else {
            bus.clear_bits(bdtr, tim::BDTR_BKE);
            bus.clear_bits(bdtr, tim::BDTR_AOE);
            self.clear_break_flag(bus);
            bus.clear_bits(bdtr, tim::BDTR_MOE);
            bus.set_bits(bdtr, tim::BDTR_MOE);
        }
    }

    fn clear_break_flag<B: RegisterBus + ?Sized>(&self, bus: &B) {
        // NOTE SR flags clear on writing 0, ones leave the other flags alone
        bus.write(self.reg(tim::SR), !tim::SR_BIF);
    }

    /// Stops the timer, disables its outputs and gates its clock
    pub fn stop<B: RegisterBus + ?Sized>(&self, bus: &B) {
        self.pause(bus);
        bus.write(self.reg(tim::CCER), 0);
        if self.id.has_break() {
            bus.clear_bits(self.reg(tim::BDTR), tim::BDTR_MOE);
        }
        rcc::disable(bus, self.id.clock());
    }
}
