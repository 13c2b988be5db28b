//! Timer ownership
//!
//! Comparator PWM bindings borrow timers from a [`TimerPool`]. The first
//! binding to a free timer owns it and stops it again when released; later
//! bindings, and any binding to a timer the application adopted, only share it.
use crate::bus::RegisterBus;
use crate::rcc::Clocks;
use crate::timer::{PwmTimer, TimerId, TIMER_COUNT};

/// Timer held by the binding that started it
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedTimer(PwmTimer);

/// Timer started by someone else
#[derive(Debug, PartialEq, Eq)]
pub struct SharedTimer(PwmTimer);

/// Access to a timer handed out by a [`TimerPool`]
#[derive(Debug, PartialEq, Eq)]
pub enum TimerLease {
    Owned(OwnedTimer),
    Shared(SharedTimer),
}

impl TimerLease {
    pub fn timer(&self) -> &PwmTimer {
        match self {
            TimerLease::Owned(OwnedTimer(t)) | TimerLease::Shared(SharedTimer(t)) => t,
        }
    }

    pub fn id(&self) -> TimerId {
        self.timer().id()
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, TimerLease::Owned(_))
    }
}

/// Book-keeping of the timers in use
#[derive(Debug)]
pub struct TimerPool {
    clocks: Clocks,
    adopted: u8,
    /// Timers whose owner left while shared leases remained
    orphaned: u8,
    leases: [u8; TIMER_COUNT],
}

impl TimerPool {
    pub fn new(clocks: Clocks) -> Self {
        TimerPool {
            clocks,
            adopted: 0,
            orphaned: 0,
            leases: [0; TIMER_COUNT],
        }
    }

    /// Marks `id` as run by the application
    ///
    /// Bindings to an adopted timer never stop it.
    pub fn adopt(&mut self, id: TimerId) {
        self.adopted |= 1 << id.index();
    }

    pub fn is_adopted(&self, id: TimerId) -> bool {
        self.adopted & (1 << id.index()) != 0
    }

    /// `true` if `id` is adopted or leased out
    pub fn is_in_use(&self, id: TimerId) -> bool {
        self.is_adopted(id) || self.leases[id.index()] != 0
    }

    pub fn acquire(&mut self, id: TimerId) -> TimerLease {
        let timer = PwmTimer::new(id, &self.clocks);
        let lease = if self.is_in_use(id) {
            TimerLease::Shared(SharedTimer(timer))
        } else {
            TimerLease::Owned(OwnedTimer(timer))
        };
        self.leases[id.index()] = self.leases[id.index()].saturating_add(1);
        trace!("timer lease {} owned={}", id, lease.is_owned());
        lease
    }

    /// Returns `lease`
    ///
    /// The timer is stopped once the owner and every lease sharing it are gone.
    /// Adopted timers are never stopped.
    pub fn release<B: RegisterBus + ?Sized>(&mut self, bus: &B, lease: TimerLease) {
        let id = lease.id();
        let bit = 1 << id.index();
        let count = &mut self.leases[id.index()];
        *count = count.saturating_sub(1);
        let remaining = *count;

        if lease.is_owned() {
            self.orphaned |= bit;
        }
        if remaining == 0 && self.orphaned & bit != 0 {
            self.orphaned &= !bit;
            if !self.is_adopted(id) {
                debug!("stopping {}", id);
                lease.timer().stop(bus);
            }
        }
    }
}
