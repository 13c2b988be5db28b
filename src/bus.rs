//! Register access
//!
//! Every driver in this crate reaches the peripherals through a [`RegisterBus`].
//! On target the bus is [`Mmio`], which performs volatile accesses at the
//! physical addresses listed in [`crate::pac`]. It is built from the `py32f0`
//! PAC's comparator peripherals, or stolen when the PAC is not in use.

/// Word-wide access to memory mapped peripheral registers
pub trait RegisterBus {
    /// Reads the register at `addr`
    fn read(&self, addr: usize) -> u32;

    /// Writes `value` to the register at `addr`
    fn write(&self, addr: usize, value: u32);

    /// Read-modify-write of the register at `addr`
    #[inline(always)]
    fn modify<F>(&self, addr: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(addr);
        self.write(addr, f(value));
    }

    /// Sets every bit of `mask`
    #[inline(always)]
    fn set_bits(&self, addr: usize, mask: u32) {
        self.modify(addr, |r| r | mask);
    }

    /// Clears every bit of `mask`
    #[inline(always)]
    fn clear_bits(&self, addr: usize, mask: u32) {
        self.modify(addr, |r| r & !mask);
    }

    /// Sets or clears every bit of `mask`
    #[inline(always)]
    fn write_bits(&self, addr: usize, mask: u32, set: bool) {
        if set {
            self.set_bits(addr, mask);
        } else {
            self.clear_bits(addr, mask);
        }
    }

    /// Replaces the field selected by `mask` with `value` (already shifted)
    #[inline(always)]
    fn modify_field(&self, addr: usize, mask: u32, value: u32) {
        self.modify(addr, |r| (r & !mask) | (value & mask));
    }

    /// Returns `true` if any bit of `mask` is set
    #[inline(always)]
    fn is_set(&self, addr: usize, mask: u32) -> bool {
        self.read(addr) & mask != 0
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    #[inline(always)]
    fn read(&self, addr: usize) -> u32 {
        (**self).read(addr)
    }

    #[inline(always)]
    fn write(&self, addr: usize, value: u32) {
        (**self).write(addr, value)
    }
}

/// Memory mapped I/O at the physical peripheral addresses
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Creates the register bus
    ///
    /// # Safety
    ///
    /// The caller must ensure no other code drives the COMP, EXTI, SYSCFG,
    /// TIM and GPIO registers this crate touches in a conflicting way.
    pub unsafe fn steal() -> Self {
        Mmio { _private: () }
    }

    /// Creates the register bus from the comparator peripherals of the PAC
    ///
    /// The bus also drives the EXTI lines, SYSCFG break routing, TIM1 and the
    /// GPIO pins handed to the comparators; those stay shared with the rest of
    /// the application.
    #[cfg(feature = "device-selected")]
    pub fn new(comp1: crate::py32::COMP1, comp2: crate::py32::COMP2) -> Self {
        debug_assert_eq!(crate::py32::COMP1::PTR as usize, crate::pac::comp::COMP1);
        debug_assert_eq!(crate::py32::COMP2::PTR as usize, crate::pac::comp::COMP2);
        let _ = (comp1, comp2);
        Mmio { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read(&self, addr: usize) -> u32 {
        // NOTE(unsafe) addresses come from `crate::pac` and are aligned word registers
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline(always)]
    fn write(&self, addr: usize, value: u32) {
        // NOTE(unsafe) addresses come from `crate::pac` and are aligned word registers
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}
