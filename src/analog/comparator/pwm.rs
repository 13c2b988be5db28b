//! PWM cutoff
//!
//! A comparator can cut a TIM1 PWM output in hardware: either per channel by
//! clearing OCxREF through the internal OCREF_CLR signal, or for all outputs
//! through the timer break input.
//!
//! Only TIM1 outputs are accepted.
use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::{self, ErrorKind, SetDutyCycle};

use crate::bus::RegisterBus;
use crate::gpio::{Gpio, PinName};
use crate::interrupt::InterruptControl;
use crate::pac::syscfg;
use crate::rcc::{self, Peripheral};
use crate::time::Hertz;
use crate::timer::{timer_pin, Channel, PwmTimer, TimerId, TimerLease, TimerPin};

use super::{Comparator, Error, Resources, State};

/// Duty cycle used until one is set
pub const DEFAULT_DUTY_PERMILLE: u16 = 500;

const PERMILLE_MAX: u16 = 1000;

/// Rounds a duty cycle in permille to the 10-bit compare format,
/// clamping to 1000 first
pub const fn duty_permille_to_10bit(permille: u16) -> u32 {
    let permille = if permille > PERMILLE_MAX {
        PERMILLE_MAX
    } else {
        permille
    } as u32;
    (permille * 1023 + 500) / 1000
}

/// PWM output driven by a comparator
#[derive(Debug)]
pub(super) struct PwmBinding {
    lease: TimerLease,
    pin: PinName,
    channel: Channel,
    freq: Hertz,
}

/// Returns the timer lease of `state` to the pool
pub(super) fn unbind<B: RegisterBus, D, N>(res: &mut Resources<B, D, N>, state: &mut State) {
    if let Some(binding) = state.pwm.take() {
        res.timers.release(&res.bus, binding.lease);
    }
}

impl pwm::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl<'a, B, D, N> Comparator<'a, B, D, N>
where
    B: RegisterBus,
    D: DelayNs,
    N: InterruptControl,
{
    /// TIM1 output behind `pin`
    fn tim1_pin(&self, pin: PinName) -> Result<TimerPin, Error> {
        if !self.state.started {
            return Err(Error::NotStarted);
        }
        let tp = timer_pin(pin).ok_or(Error::NoTimer)?;
        if tp.timer != TimerId::TIM1 {
            return Err(Error::UnsupportedTimer);
        }
        Ok(tp)
    }

    /// TIM1 channel behind `pin`, checked for OCxREF clear support
    fn clear_channel(&self, tp: &TimerPin) -> Result<Channel, Error> {
        let channel = Channel::new(tp.channel).ok_or(Error::InvalidChannel)?;
        if !tp.timer.has_ocref_clear() {
            return Err(Error::NoOcrefClear);
        }
        Ok(channel)
    }

    /// Starts PWM on `pin` at `freq` and lets the comparator clear it
    ///
    /// The duty cycle set with [`duty`](Self::duty) is kept. Rebinding to
    /// another timer returns the previous one to the pool.
    pub fn pwm(&mut self, pin: PinName, freq: Hertz) -> Result<(), Error> {
        if !self.state.started {
            return Err(Error::NotStarted);
        }
        if freq.raw() == 0 {
            return Err(Error::ZeroFrequency);
        }
        let tp = self.tim1_pin(pin)?;
        let channel = self.clear_channel(&tp)?;

        let res = &mut *self.res;
        let lease = match self.state.pwm.take() {
            Some(binding) if binding.lease.id() == tp.timer => binding.lease,
            Some(binding) => {
                res.timers.release(&res.bus, binding.lease);
                res.timers.acquire(tp.timer)
            }
            None => res.timers.acquire(tp.timer),
        };

        let bus = &res.bus;
        let timer = lease.timer();
        timer.init(bus);
        Gpio::new(bus).set_alternate(pin, tp.af);
        timer.set_pwm_mode(bus, channel);
        timer.set_freq(bus, freq);
        timer.set_compare_10bit(bus, channel, duty_permille_to_10bit(self.state.duty));
        timer.resume(bus);
        timer.set_ocref_clear(bus, channel, true);

        debug!(
            "COMP{} cuts {} ch{}, owned={}",
            self.instance.number(),
            tp.timer,
            tp.channel,
            lease.is_owned()
        );
        self.state.pwm = Some(PwmBinding {
            lease,
            pin,
            channel,
            freq,
        });
        Ok(())
    }

    /// Enables or disables OCxREF clear on the channel behind `pin`
    ///
    /// Frequency and duty cycle are left alone.
    pub fn pwm_clear(&mut self, pin: PinName, enable: bool) -> Result<(), Error> {
        let tp = self.tim1_pin(pin)?;
        let channel = self.clear_channel(&tp)?;
        PwmTimer::new(tp.timer, &self.res.clocks).set_ocref_clear(&self.res.bus, channel, enable);
        Ok(())
    }

    /// Routes the comparator output to the TIM1 break input
    ///
    /// Armed, a high (or low with `active_high == false`) comparator output
    /// shuts all TIM1 outputs down; they come back at the next update event
    /// once the output returns. Disarming restarts output generation.
    pub fn pwm_break(&mut self, pin: PinName, enable: bool, active_high: bool) -> Result<(), Error> {
        let tp = self.tim1_pin(pin)?;
        let route = self
            .res
            .variant
            .tim1_break_route(self.instance.number())
            .ok_or(Error::NoBreakRoute)?;

        let bus = &self.res.bus;
        rcc::enable(bus, Peripheral::SYSCFG);
        bus.write_bits(syscfg::CFGR2, route, enable);
        PwmTimer::new(tp.timer, &self.res.clocks).set_break(bus, enable, active_high);
        debug!("COMP{} break {}", self.instance.number(), enable);
        Ok(())
    }

    /// Sets the duty cycle in permille, applied at once when PWM is running
    pub fn duty(&mut self, permille: u16) {
        self.state.duty = permille.min(PERMILLE_MAX);
        if let Some(binding) = &self.state.pwm {
            binding.lease.timer().set_compare_10bit(
                &self.res.bus,
                binding.channel,
                duty_permille_to_10bit(self.state.duty),
            );
        }
    }

    /// Latched duty cycle in permille
    pub fn duty_permille(&self) -> u16 {
        self.state.duty
    }

    /// Writes the compare register directly, clamped to [`pwm_top`](Self::pwm_top)
    pub fn duty_raw(&mut self, counts: u32) -> Result<(), Error> {
        let binding = self.state.pwm.as_ref().ok_or(Error::NotBound)?;
        let timer = binding.lease.timer();
        let top = timer.top(&self.res.bus);
        timer.set_compare(&self.res.bus, binding.channel, counts.min(top));
        Ok(())
    }

    /// Reload value of the bound timer, 0 without PWM
    pub fn pwm_top(&self) -> u32 {
        match &self.state.pwm {
            Some(binding) => binding.lease.timer().top(&self.res.bus),
            None => 0,
        }
    }

    /// Pin and frequency of the bound PWM output
    pub fn pwm_output(&self) -> Option<(PinName, Hertz)> {
        self.state.pwm.as_ref().map(|b| (b.pin, b.freq))
    }

    /// Returns the bound timer to the pool; the comparator keeps running
    pub fn pwm_release(&mut self) {
        unbind(&mut *self.res, &mut *self.state);
    }
}

impl<'a, B, D, N> pwm::ErrorType for Comparator<'a, B, D, N> {
    type Error = Error;
}

impl<'a, B, D, N> SetDutyCycle for Comparator<'a, B, D, N>
where
    B: RegisterBus,
    D: DelayNs,
    N: InterruptControl,
{
    /// One period in timer counts; a compare value of `ARR + 1` keeps the output active
    fn max_duty_cycle(&self) -> u16 {
        match &self.state.pwm {
            Some(_) => (self.pwm_top() + 1).min(u16::MAX as u32) as u16,
            None => 1,
        }
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Error> {
        let binding = self.state.pwm.as_ref().ok_or(Error::NotBound)?;
        binding
            .lease
            .timer()
            .set_compare(&self.res.bus, binding.channel, duty as u32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Rig;
    use super::super::{Instance, MinusInput};
    use super::*;
    use crate::device::Variant;
    use crate::gpio::*;
    use crate::pac::{gpio as gpio_regs, rcc as rcc_regs, tim};
    use crate::time::RateExtU32;
    use std::vec::Vec;

    const TIM1_BDTR: usize = tim::TIM1 + tim::BDTR;

    #[test]
    fn duty_conversion() {
        assert_eq!(duty_permille_to_10bit(0), 0);
        assert_eq!(duty_permille_to_10bit(1000), 1023);
        assert_eq!(duty_permille_to_10bit(500), 512);
        assert_eq!(duty_permille_to_10bit(1001), 1023);
        assert_eq!(duty_permille_to_10bit(u16::MAX), 1023);
    }

    #[test]
    fn pwm_requires_started_comparator() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        assert_eq!(c.pwm(PA8, 20.kHz()), Err(Error::NotStarted));
        assert_eq!(c.pwm_clear(PA8, true), Err(Error::NotStarted));
        assert_eq!(c.pwm_break(PA8, true, true), Err(Error::NotStarted));
        assert!(rig.sim.writes().is_empty());
    }

    #[test]
    fn pwm_validation() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, MinusInput::VrefHalf, None).unwrap();

        assert_eq!(c.pwm(PA8, 0.Hz()), Err(Error::ZeroFrequency));
        assert_eq!(c.pwm(PA5, 20.kHz()), Err(Error::NoTimer));
        assert_eq!(c.pwm(PA6, 20.kHz()), Err(Error::UnsupportedTimer));
        assert_eq!(c.pwm(PF1, 20.kHz()), Err(Error::UnsupportedTimer));
        assert_eq!(c.pwm_clear(PB8, true), Err(Error::UnsupportedTimer));
        assert_eq!(c.duty_raw(10), Err(Error::NotBound));
        assert_eq!(c.pwm_top(), 0);
    }

    #[test]
    fn pwm_starts_tim1_with_latched_duty() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        c.duty(250);
        c.pwm(PA9, 20.kHz()).unwrap();

        let sim = &rig.sim;
        assert_ne!(sim.peek(rcc_regs::APBENR2) & rcc_regs::APBENR2_TIM1EN, 0);
        assert_eq!(sim.peek(tim::TIM1 + tim::ARR), 1199);
        // channel 2: PWM mode 1, preload, OCREF clear
        assert_eq!(
            sim.peek(tim::TIM1 + tim::CCMR1),
            (tim::OCM_PWM1 << tim::CCMR_OCM_POS | tim::CCMR_OCPE | tim::CCMR_OCCE) << 8
        );
        assert_eq!(sim.peek(tim::TIM1 + tim::CCER), tim::CCER_CCE << 4);
        assert_eq!(sim.peek(tim::TIM1 + tim::SMCR) & tim::SMCR_OCCS, 0);
        assert_eq!(
            sim.peek(tim::TIM1 + tim::CCR1 + 4),
            1200 * duty_permille_to_10bit(250) / 1023
        );
        assert_ne!(sim.peek(tim::TIM1 + tim::CR1) & tim::CR1_CEN, 0);
        assert_ne!(sim.peek(TIM1_BDTR) & tim::BDTR_MOE, 0);
        // PA9 on AF2
        assert_eq!(sim.peek(gpio_regs::GPIOA + gpio_regs::AFRH), 2 << 4);

        assert_eq!(c.pwm_top(), 1199);
        assert_eq!(c.pwm_output(), Some((PA9, Hertz::from_raw(20_000))));
    }

    #[test]
    fn duty_updates_live_compare() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        c.pwm(PA8, 20.kHz()).unwrap();
        let ccr1 = tim::TIM1 + tim::CCR1;
        assert_eq!(rig.sim.peek(ccr1), 1200 * 512 / 1023);

        c.duty(2000);
        assert_eq!(c.duty_permille(), 1000);
        assert_eq!(rig.sim.peek(ccr1), 1200);
        c.duty(0);
        assert_eq!(rig.sim.peek(ccr1), 0);

        c.duty_raw(700).unwrap();
        assert_eq!(rig.sim.peek(ccr1), 700);
        c.duty_raw(50_000).unwrap();
        assert_eq!(rig.sim.peek(ccr1), 1199);

        assert_eq!(c.max_duty_cycle(), 1200);
        c.set_duty_cycle_percent(50).unwrap();
        assert_eq!(rig.sim.peek(ccr1), 600);
    }

    #[test]
    fn fully_on_covers_whole_period() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        assert_eq!(c.max_duty_cycle(), 1);
        assert_eq!(c.set_duty_cycle_fully_on(), Err(Error::NotBound));

        c.pwm(PA8, 20.kHz()).unwrap();
        c.set_duty_cycle_fully_on().unwrap();
        let arr = rig.sim.peek(tim::TIM1 + tim::ARR);
        let ccr1 = rig.sim.peek(tim::TIM1 + tim::CCR1);
        assert!(ccr1 > arr);
        assert_eq!(ccr1, arr + 1);

        c.set_duty_cycle_fully_off().unwrap();
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::CCR1), 0);
    }

    #[test]
    fn pwm_clear_toggles_channel_only() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp2);
        c.begin(PB4, PB3, None).unwrap();
        c.pwm(PA10, 10.kHz()).unwrap();
        let arr = rig.sim.peek(tim::TIM1 + tim::ARR);
        let ccr3 = rig.sim.peek(tim::TIM1 + tim::CCR1 + 8);

        c.pwm_clear(PA10, false).unwrap();
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::CCMR2) & tim::CCMR_OCCE, 0);
        rig.sim.poke(tim::TIM1 + tim::SMCR, tim::SMCR_OCCS);
        c.pwm_clear(PA10, true).unwrap();
        assert_ne!(rig.sim.peek(tim::TIM1 + tim::CCMR2) & tim::CCMR_OCCE, 0);
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::SMCR) & tim::SMCR_OCCS, 0);

        assert_eq!(rig.sim.peek(tim::TIM1 + tim::ARR), arr);
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::CCR1 + 8), ccr3);
    }

    #[test]
    fn break_enable_then_disable_restores_outputs() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f002a);
        let mut c = bank.comparator(Instance::Comp2);
        c.begin(PB4, PB3, None).unwrap();
        rig.sim.poke(tim::TIM1 + tim::SR, tim::SR_BIF | 1);

        c.pwm_break(PA8, true, false).unwrap();
        let bdtr = rig.sim.peek(TIM1_BDTR);
        assert_eq!(
            bdtr & (tim::BDTR_BKE | tim::BDTR_BKP | tim::BDTR_AOE | tim::BDTR_MOE),
            tim::BDTR_BKE | tim::BDTR_AOE | tim::BDTR_MOE
        );
        assert_eq!(rig.sim.peek(syscfg::CFGR2), syscfg::CFGR2_COMP2_BRK_TIM1);
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::SR), 1);

        rig.sim.poke(tim::TIM1 + tim::SR, tim::SR_BIF);
        rig.sim.clear_log();
        c.pwm_break(PA8, false, false).unwrap();
        let moe: Vec<bool> = rig
            .sim
            .writes()
            .into_iter()
            .filter(|&(addr, _)| addr == TIM1_BDTR)
            .map(|(_, value)| value & tim::BDTR_MOE != 0)
            .collect();
        // outputs pass through MOE=0 before coming back
        assert_eq!(moe[moe.len() - 2..], [false, true]);
        assert!(moe[..moe.len() - 2].iter().all(|&on| on));
        let bdtr = rig.sim.peek(TIM1_BDTR);
        assert_eq!(bdtr & tim::BDTR_BKE, 0);
        assert_eq!(bdtr & tim::BDTR_AOE, 0);
        assert_ne!(bdtr & tim::BDTR_MOE, 0);
        assert_eq!(rig.sim.peek(syscfg::CFGR2), 0);
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::SR), 0);
    }

    #[test]
    fn break_polarity() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        c.pwm_break(PA8, true, true).unwrap();
        assert_ne!(rig.sim.peek(TIM1_BDTR) & tim::BDTR_BKP, 0);
        assert_eq!(rig.sim.peek(syscfg::CFGR2), syscfg::CFGR2_COMP1_BRK_TIM1);
        assert_ne!(rig.sim.peek(rcc_regs::APBENR2) & rcc_regs::APBENR2_SYSCFGEN, 0);
    }

    #[test]
    fn break_needs_routing() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f030);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        rig.sim.clear_log();
        assert_eq!(c.pwm_break(PA8, true, true), Err(Error::NoBreakRoute));
        assert!(rig.sim.writes().is_empty());
    }

    #[test]
    fn rebinding_reuses_lease() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        c.pwm(PA8, 20.kHz()).unwrap();
        c.pwm(PA9, 10.kHz()).unwrap();
        assert_eq!(c.pwm_output(), Some((PA9, Hertz::from_raw(10_000))));
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::ARR), 2399);

        let mut c2 = bank.comparator(Instance::Comp2);
        c2.begin(PB4, PB3, None).unwrap();
        c2.pwm(PA10, 10.kHz()).unwrap();
        assert!(!c2.state.pwm.as_ref().unwrap().lease.is_owned());

        // the owner leaves first, the last sharer stops the timer
        bank.get(Instance::Comp1).unwrap().pwm_release();
        assert_ne!(rig.sim.peek(tim::TIM1 + tim::CR1) & tim::CR1_CEN, 0);
        bank.get(Instance::Comp2).unwrap().pwm_release();
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::CR1) & tim::CR1_CEN, 0);
        assert!(!bank.timers().is_in_use(TimerId::TIM1));
    }

    #[test]
    fn adopted_timer_is_never_stopped() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        bank.timers().adopt(TimerId::TIM1);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        c.pwm(PA8, 20.kHz()).unwrap();
        c.pwm_release();
        assert_ne!(rig.sim.peek(tim::TIM1 + tim::CR1) & tim::CR1_CEN, 0);
    }

    #[test]
    fn replacing_comparator_returns_its_timer() {
        let rig = Rig::default();
        let mut bank = rig.bank(Variant::Py32f003);
        let mut c = bank.comparator(Instance::Comp1);
        c.begin(PA1, PA0, None).unwrap();
        c.pwm(PA8, 20.kHz()).unwrap();

        bank.comparator(Instance::Comp1);
        assert!(!bank.timers().is_in_use(TimerId::TIM1));
        assert_eq!(rig.sim.peek(tim::TIM1 + tim::CR1) & tim::CR1_CEN, 0);
    }
}
