//! VREFINT scaler bridge arbitration
//!
//! Both comparators share one scaler bridge, switched by `SCALER_EN` in the
//! COMP1 CSR. Each instance registers its demand once it is started and
//! withdraws it while reconfiguring, so the bridge stays powered exactly as
//! long as a started comparator compares against a VREFINT tap.
use crate::bus::RegisterBus;
use crate::pac::comp;

use super::Instance;

#[derive(Debug, Default)]
pub struct ReferenceScaler {
    demand: [bool; 2],
}

impl ReferenceScaler {
    pub const fn new() -> Self {
        ReferenceScaler {
            demand: [false; 2],
        }
    }

    /// Records whether started `instance` needs the bridge
    pub fn register(&mut self, instance: Instance, needed: bool) {
        self.demand[instance.index()] = needed;
    }

    /// Drops the demand of `instance`, which is no longer started
    pub fn withdraw(&mut self, instance: Instance) {
        self.demand[instance.index()] = false;
    }

    pub fn is_demanded_by(&self, instance: Instance) -> bool {
        self.demand[instance.index()]
    }

    /// Whether the bridge must be on when `instance` starts with `needed`
    pub fn required(&self, instance: Instance, needed: bool) -> bool {
        needed || self.is_demanded_by(instance.other())
    }

    pub fn is_enabled<B: RegisterBus + ?Sized>(bus: &B) -> bool {
        bus.is_set(comp::COMP1 + comp::CSR, comp::CSR_SCALER_EN)
    }

    /// Switches the bridge, returns `true` when it was just powered up
    pub fn switch<B: RegisterBus + ?Sized>(bus: &B, on: bool) -> bool {
        let was_on = Self::is_enabled(bus);
        bus.write_bits(comp::COMP1 + comp::CSR, comp::CSR_SCALER_EN, on);
        if on != was_on {
            trace!("scaler bridge {}", on);
        }
        on && !was_on
    }
}
