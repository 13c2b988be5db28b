//! External interrupt controller
use crate::bus::RegisterBus;
use crate::gpio::SignalEdge;
use crate::pac::exti;

/// EXTI trigger event
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum Event {
    COMP1 = 17,
    COMP2 = 18,
}

impl Event {
    #[inline(always)]
    const fn mask(self) -> u32 {
        1 << self as u8
    }
}

/// Line control over a register bus
pub struct Exti<'a, B: ?Sized> {
    bus: &'a B,
}

impl<'a, B: RegisterBus + ?Sized> Exti<'a, B> {
    pub fn new(bus: &'a B) -> Self {
        Exti { bus }
    }

    /// Selects the edges latched for `ev`; `None` disables both
    pub fn set_edges(&self, ev: Event, edge: Option<SignalEdge>) {
        let (rising, falling) = match edge {
            Some(SignalEdge::Rising) => (true, false),
            Some(SignalEdge::Falling) => (false, true),
            Some(SignalEdge::All) => (true, true),
            None => (false, false),
        };
        self.bus.write_bits(exti::RTSR, ev.mask(), rising);
        self.bus.write_bits(exti::FTSR, ev.mask(), falling);
    }

    /// Unmasks or masks the interrupt request of `ev`
    pub fn set_interrupt(&self, ev: Event, enable: bool) {
        self.bus.write_bits(exti::IMR, ev.mask(), enable);
    }

    /// Unmasks or masks the wake-up event of `ev`
    pub fn set_event(&self, ev: Event, enable: bool) {
        self.bus.write_bits(exti::EMR, ev.mask(), enable);
    }

    /// Latches `edge` for `ev` and raises an interrupt for it
    pub fn listen(&self, ev: Event, edge: SignalEdge) {
        self.set_edges(ev, Some(edge));
        self.set_interrupt(ev, true);
    }

    /// Stops all triggering for `ev` and drops a pending edge
    pub fn unlisten(&self, ev: Event) {
        self.set_edges(ev, None);
        self.set_event(ev, false);
        self.set_interrupt(ev, false);
        self.unpend(ev);
    }

    pub fn is_pending(&self, ev: Event) -> bool {
        self.bus.is_set(exti::PR, ev.mask())
    }

    pub fn unpend(&self, ev: Event) {
        // NOTE write-1-to-clear, other lines are unaffected
        self.bus.write(exti::PR, ev.mask());
    }
}
