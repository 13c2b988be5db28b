//! Comparator
//!
//! The two comparators are configured at run time through a [`Comparators`]
//! registry. Every setter stores one field and re-applies the complete
//! configuration of that comparator, re-evaluating the VREFINT scaler bridge
//! the two comparators share.
//!
//! ```ignore
//! let clocks = Clocks::default();
//! let bus = Mmio::new(dp.COMP1, dp.COMP2);
//! let mut comps = Comparators::new(bus, clocks.delay(), Nvic::new(cp.NVIC), &clocks);
//!
//! let mut comp1 = comps.comparator(Instance::Comp1);
//! comp1.begin(PA1, MinusInput::VrefHalf, Some(PA6))?;
//! comp1.hysteresis(20u32)?;
//! comp1.attach_interrupt(on_edge, SignalEdge::Rising)?;
//! ```
use core::convert::TryFrom;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, InputPin, PinState};

use crate::bus::RegisterBus;
use crate::device::Variant;
use crate::exti::{Event, Exti};
use crate::gpio::{Gpio, PinMode, PinName, SignalEdge};
use crate::interrupt::{Interrupt, InterruptControl};
use crate::pac::comp;
use crate::rcc::{self, Clocks, Peripheral};
#[cfg(feature = "pwm")]
use crate::timer::TimerPool;

mod config;
mod input;
#[cfg(feature = "pwm")]
mod pwm;
mod scaler;

pub use config::{Config, Hysteresis, PowerMode, Trigger};
pub use input::{minus_selector, plus_selector, MinusInput};
#[cfg(feature = "pwm")]
pub use pwm::{duty_permille_to_10bit, DEFAULT_DUTY_PERMILLE};
pub use scaler::ReferenceScaler;

/// Settling time of the scaler bridge after power up
pub const SCALER_SETTLE_US: u32 = 200;
/// Comparator start-up time after `EN` is set
pub const STARTUP_US: u32 = 80;
/// Priority of the shared `ADC_COMP` interrupt
pub const IRQ_PRIORITY: u8 = 3;

/// Edge notification, called from the `ADC_COMP` handler
pub type Callback = fn();

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instance {
    Comp1,
    Comp2,
}

impl Instance {
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Datasheet number, 1 or 2
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }

    pub const fn other(self) -> Instance {
        match self {
            Instance::Comp1 => Instance::Comp2,
            Instance::Comp2 => Instance::Comp1,
        }
    }

    const fn base(self) -> usize {
        match self {
            Instance::Comp1 => comp::COMP1,
            Instance::Comp2 => comp::COMP2,
        }
    }

    const fn event(self) -> Event {
        match self {
            Instance::Comp1 => Event::COMP1,
            Instance::Comp2 => Event::COMP2,
        }
    }

    const fn clock(self) -> Peripheral {
        match self {
            Instance::Comp1 => Peripheral::COMP1,
            Instance::Comp2 => Peripheral::COMP2,
        }
    }
}

impl TryFrom<u8> for Instance {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self, Error> {
        match n {
            1 => Ok(Instance::Comp1),
            2 => Ok(Instance::Comp2),
            _ => Err(Error::InvalidInstance),
        }
    }
}

/// Comparator error
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Comparator number other than 1 or 2
    InvalidInstance,
    /// Pin is not an input of this comparator
    UnmappedPin,
    /// PWM frequency of 0 Hz
    ZeroFrequency,
    /// Pin has no timer output
    NoTimer,
    /// Pin belongs to a timer other than TIM1
    UnsupportedTimer,
    /// Timer channel outside 1..=4
    InvalidChannel,
    /// Timer cannot clear OCxREF
    NoOcrefClear,
    /// Part cannot route this comparator into the TIM1 break input
    NoBreakRoute,
    /// Comparator has not been started with `begin`
    NotStarted,
    /// No PWM output is bound to the comparator
    NotBound,
}

impl digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Cached configuration of one comparator
#[derive(Debug)]
struct State {
    plus: Option<PinName>,
    minus: MinusInput,
    config: Config,
    trigger: Trigger,
    mirror: Option<PinName>,
    callback: Option<Callback>,
    started: bool,
    #[cfg(feature = "pwm")]
    pwm: Option<pwm::PwmBinding>,
    #[cfg(feature = "pwm")]
    duty: u16,
}

impl State {
    fn new() -> Self {
        State {
            plus: None,
            minus: MinusInput::Vref,
            config: Config::default(),
            trigger: Trigger::NONE,
            mirror: None,
            callback: None,
            started: false,
            #[cfg(feature = "pwm")]
            pwm: None,
            #[cfg(feature = "pwm")]
            duty: DEFAULT_DUTY_PERMILLE,
        }
    }
}

/// Everything the comparators share
struct Resources<B, D, N> {
    bus: B,
    delay: D,
    nvic: N,
    variant: Variant,
    scaler: ReferenceScaler,
    #[cfg(feature = "pwm")]
    clocks: Clocks,
    #[cfg(feature = "pwm")]
    timers: TimerPool,
}

/// Registry of the two comparators
///
/// Owns the register bus, the delay used for analog settling and the
/// interrupt controller. Share it with the `ADC_COMP` handler (for example in
/// a `cortex_m::interrupt::Mutex<RefCell<_>>`) and call
/// [`Comparators::on_interrupt`] from there.
///
/// Callbacks run inside `on_interrupt`, while the registry is borrowed. They
/// must not borrow it again: a `RefCell` panics on the second borrow. Hand
/// results to the main loop through an atomic or a separate static instead.
pub struct Comparators<B, D, N> {
    res: Resources<B, D, N>,
    slots: [Option<State>; 2],
}

impl<B, D, N> Comparators<B, D, N>
where
    B: RegisterBus,
    D: DelayNs,
    N: InterruptControl,
{
    pub fn new(bus: B, delay: D, nvic: N, clocks: &Clocks) -> Self {
        #[cfg(not(feature = "pwm"))]
        let _ = clocks;
        Comparators {
            res: Resources {
                bus,
                delay,
                nvic,
                variant: Variant::default(),
                scaler: ReferenceScaler::new(),
                #[cfg(feature = "pwm")]
                clocks: *clocks,
                #[cfg(feature = "pwm")]
                timers: TimerPool::new(*clocks),
            },
            slots: [None, None],
        }
    }

    /// Overrides the part selected by the device feature
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.res.variant = variant;
        self
    }

    pub fn variant(&self) -> Variant {
        self.res.variant
    }

    pub fn bus(&self) -> &B {
        &self.res.bus
    }

    /// Timers used for PWM cutoff
    #[cfg(feature = "pwm")]
    pub fn timers(&mut self) -> &mut TimerPool {
        &mut self.res.timers
    }

    /// Creates the comparator `instance`, replacing a previous one
    ///
    /// The replaced comparator keeps running in hardware but no longer takes
    /// part in interrupt dispatch or scaler arbitration.
    pub fn comparator(&mut self, instance: Instance) -> Comparator<'_, B, D, N> {
        let Comparators { res, slots } = self;
        let slot = &mut slots[instance.index()];
        if let Some(mut old) = slot.take() {
            warn!("COMP{} replaced", instance.number());
            res.scaler.withdraw(instance);
            #[cfg(feature = "pwm")]
            pwm::unbind(&mut *res, &mut old);
            #[cfg(not(feature = "pwm"))]
            let _ = &mut old;
        }
        Comparator {
            instance,
            res,
            state: slot.insert(State::new()),
        }
    }

    /// Comparator `instance`, if it was created
    pub fn get(&mut self, instance: Instance) -> Option<Comparator<'_, B, D, N>> {
        let Comparators { res, slots } = self;
        let state = slots[instance.index()].as_mut()?;
        Some(Comparator {
            instance,
            res,
            state,
        })
    }

    /// Body of the shared `ADC_COMP` interrupt
    ///
    /// Serves COMP1 before COMP2. A started comparator with a pending edge has
    /// the edge acknowledged, its mirror pin refreshed and its callback run.
    pub fn on_interrupt(&mut self) {
        for instance in [Instance::Comp1, Instance::Comp2] {
            let state = match &self.slots[instance.index()] {
                Some(state) if state.started => state,
                _ => continue,
            };
            let exti = Exti::new(&self.res.bus);
            if !exti.is_pending(instance.event()) {
                continue;
            }
            exti.unpend(instance.event());
            refresh_mirror(&self.res.bus, instance, state.mirror);
            if let Some(callback) = state.callback {
                callback();
            }
        }
    }

    /// Releases the bus, delay and interrupt controller
    pub fn free(self) -> (B, D, N) {
        (self.res.bus, self.res.delay, self.res.nvic)
    }
}

fn output_bit<B: RegisterBus + ?Sized>(bus: &B, instance: Instance) -> bool {
    bus.is_set(instance.base() + comp::CSR, comp::CSR_VALUE)
}

fn refresh_mirror<B: RegisterBus + ?Sized>(bus: &B, instance: Instance, mirror: Option<PinName>) {
    if let Some(pin) = mirror {
        let level = PinState::from(output_bit(bus, instance));
        Gpio::new(bus).digital_write(pin, level);
    }
}

/// One comparator, borrowed from [`Comparators`]
pub struct Comparator<'a, B, D, N> {
    instance: Instance,
    res: &'a mut Resources<B, D, N>,
    state: &'a mut State,
}

impl<'a, B, D, N> Comparator<'a, B, D, N>
where
    B: RegisterBus,
    D: DelayNs,
    N: InterruptControl,
{
    pub fn instance(&self) -> Instance {
        self.instance
    }

    /// `true` once the comparator runs with the cached configuration
    pub fn is_started(&self) -> bool {
        self.state.started
    }

    pub fn config(&self) -> Config {
        self.state.config
    }

    pub fn trigger(&self) -> Trigger {
        self.state.trigger
    }

    /// Starts comparing `plus` against `minus`
    ///
    /// `mirror` is driven in software with the comparator output after every
    /// configuration, [`read`](Self::read) and serviced edge.
    pub fn begin(
        &mut self,
        plus: PinName,
        minus: impl Into<MinusInput>,
        mirror: Option<PinName>,
    ) -> Result<(), Error> {
        let minus = minus.into();
        self.check_inputs(plus, minus)?;

        self.state.plus = Some(plus);
        self.state.minus = minus;
        self.state.mirror = mirror;

        let gpio = Gpio::new(&self.res.bus);
        gpio.pin_mode(plus, PinMode::Analog);
        if let MinusInput::Pin(pin) = minus {
            gpio.pin_mode(pin, PinMode::Analog);
        }
        if let Some(pin) = mirror {
            gpio.pin_mode(pin, PinMode::Output);
        }

        self.apply_config()
    }

    /// [`begin`](Self::begin) with a complete configuration
    pub fn begin_with(
        &mut self,
        plus: PinName,
        minus: impl Into<MinusInput>,
        mirror: Option<PinName>,
        config: Config,
    ) -> Result<(), Error> {
        let minus = minus.into();
        self.check_inputs(plus, minus)?;
        self.state.config = config;
        self.begin(plus, minus, mirror)
    }

    fn check_inputs(&self, plus: PinName, minus: MinusInput) -> Result<(), Error> {
        plus_selector(self.instance, plus, self.res.variant)
            .and_then(|_| minus_selector(self.instance, minus))
            .map(|_| ())
            .map_err(|e| {
                warn!("COMP{} begin: {}", self.instance.number(), e);
                e
            })
    }

    /// Enables hysteresis for 20 mV or more
    ///
    /// Hysteresis is common to both comparators; the last applied setting wins.
    pub fn hysteresis(&mut self, hysteresis: impl Into<Hysteresis>) -> Result<(), Error> {
        self.state.config.hysteresis = hysteresis.into();
        self.reapply()
    }

    /// Digital filter length in samples, 0 disables the filter
    pub fn filter(&mut self, samples: u16) -> Result<(), Error> {
        self.state.config.filter = samples;
        self.reapply()
    }

    pub fn power(&mut self, mode: PowerMode) -> Result<(), Error> {
        self.state.config.power_mode = mode;
        self.reapply()
    }

    /// Inverts the output polarity
    pub fn invert(&mut self, inverted: bool) -> Result<(), Error> {
        self.state.config.inverted = inverted;
        self.reapply()
    }

    /// Calls `callback` from [`Comparators::on_interrupt`] on `edge`
    ///
    /// Also unmasks the `ADC_COMP` interrupt.
    pub fn attach_interrupt(&mut self, callback: Callback, edge: SignalEdge) -> Result<(), Error> {
        self.state.callback = Some(callback);
        self.state.trigger.edge = Some(edge);
        self.state.trigger.interrupt = true;
        self.res.nvic.enable(Interrupt::ADC_COMP, IRQ_PRIORITY);
        self.reapply()
    }

    pub fn detach_interrupt(&mut self) -> Result<(), Error> {
        self.state.callback = None;
        self.state.trigger.interrupt = false;
        if !self.state.trigger.event {
            self.state.trigger.edge = None;
        }
        self.reapply()
    }

    /// Raises a wake-up event on `edge`, without an interrupt
    pub fn listen_event(&mut self, edge: SignalEdge) -> Result<(), Error> {
        self.state.trigger.edge = Some(edge);
        self.state.trigger.event = true;
        self.reapply()
    }

    pub fn unlisten_event(&mut self) -> Result<(), Error> {
        self.state.trigger.event = false;
        if !self.state.trigger.interrupt {
            self.state.trigger.edge = None;
        }
        self.reapply()
    }

    /// Samples the comparator output and refreshes the mirror pin
    ///
    /// `false` before the comparator is started.
    pub fn read(&mut self) -> bool {
        if !self.state.started {
            return false;
        }
        let level = output_bit(&self.res.bus, self.instance);
        refresh_mirror(&self.res.bus, self.instance, self.state.mirror);
        level
    }

    /// Live output level, without touching the mirror pin
    pub fn output_level(&self) -> bool {
        output_bit(&self.res.bus, self.instance)
    }

    // Setters only latch their value until `begin` picks the inputs.
    fn reapply(&mut self) -> Result<(), Error> {
        if self.state.plus.is_none() {
            return Ok(());
        }
        self.apply_config()
    }

    /// Writes the whole cached configuration to the hardware
    ///
    /// The comparator is disabled while the configuration changes and
    /// restarted afterwards. Nothing is written if an input does not map.
    pub fn apply_config(&mut self) -> Result<(), Error> {
        let instance = self.instance;
        let plus = self.state.plus.ok_or(Error::NotStarted)?;
        let inpsel = plus_selector(instance, plus, self.res.variant)?;
        let inmsel = minus_selector(instance, self.state.minus)?;

        let bus = &self.res.bus;
        let csr = instance.base() + comp::CSR;
        let fr = instance.base() + comp::FR;

        rcc::enable(bus, instance.clock());

        bus.clear_bits(csr, comp::CSR_EN);
        self.state.started = false;
        self.res.scaler.withdraw(instance);

        match self.state.config.filter {
            0 => bus.clear_bits(fr, comp::FR_FLTEN),
            samples => bus.write(
                fr,
                comp::FR_FLTEN | (samples as u32) << comp::FR_FLTCNT_POS,
            ),
        }

        let exti = Exti::new(bus);
        let event = instance.event();
        let trigger = self.state.trigger;
        if trigger.is_active() {
            exti.set_edges(event, trigger.edge);
            exti.unpend(event);
            exti.set_event(event, trigger.event);
            exti.set_interrupt(event, trigger.interrupt);
        } else {
            exti.unlisten(event);
        }

        let needs_scaler = self.state.minus.needs_scaler();
        let scaler_on = self.res.scaler.required(instance, needs_scaler);
        if ReferenceScaler::switch(bus, scaler_on) {
            self.res.delay.delay_us(SCALER_SETTLE_US);
        }

        let common = comp::COMP1 + comp::CSR;
        bus.write_bits(
            common,
            comp::CSR_HYST,
            self.state.config.hysteresis == Hysteresis::Enabled,
        );
        bus.clear_bits(common, comp::CSR_WINMODE);
        bus.clear_bits(comp::COMP2 + comp::CSR, comp::CSR_WINMODE);

        let pwrmode = self.res.variant.pwrmode_bits(self.state.config.power_mode);
        let polarity = if self.state.config.inverted {
            comp::CSR_POLARITY
        } else {
            0
        };
        bus.modify_field(
            csr,
            comp::CSR_INMSEL | comp::CSR_INPSEL | comp::CSR_PWRMODE | comp::CSR_POLARITY | comp::CSR_EN,
            inmsel << comp::CSR_INMSEL_POS
                | inpsel << comp::CSR_INPSEL_POS
                | pwrmode << comp::CSR_PWRMODE_POS
                | polarity,
        );

        bus.set_bits(csr, comp::CSR_EN);
        self.res.delay.delay_us(STARTUP_US);

        self.state.started = true;
        self.res.scaler.register(instance, needs_scaler);
        refresh_mirror(bus, instance, self.state.mirror);
        debug!("COMP{} started, scaler {}", instance.number(), scaler_on);
        Ok(())
    }
}

impl<'a, B, D, N> digital::ErrorType for Comparator<'a, B, D, N> {
    type Error = Error;
}

impl<'a, B, D, N> InputPin for Comparator<'a, B, D, N>
where
    B: RegisterBus,
    D: DelayNs,
    N: InterruptControl,
{
    fn is_high(&mut self) -> Result<bool, Error> {
        if !self.is_started() {
            return Err(Error::NotStarted);
        }
        Ok(self.read())
    }

    fn is_low(&mut self) -> Result<bool, Error> {
        self.is_high().map(|high| !high)
    }
}
