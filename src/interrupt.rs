//! Interrupt controller access
use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

/// Device interrupts used by this crate
#[allow(non_camel_case_types)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Interrupt {
    /// ADC and COMP1/COMP2 (EXTI lines 17 and 18)
    ADC_COMP = 12,
}

// NOTE(unsafe) the discriminants are valid PY32F0 interrupt numbers
unsafe impl InterruptNumber for Interrupt {
    #[inline(always)]
    fn number(self) -> u16 {
        self as u16
    }
}

/// Number of priority bits implemented by the Cortex-M0+ NVIC
pub const NVIC_PRIO_BITS: u8 = 2;

/// Unmasking of device interrupts
pub trait InterruptControl {
    /// Sets the logical priority of `irq` (0 is the most urgent) and unmasks it
    fn enable(&mut self, irq: Interrupt, priority: u8);
}

/// [`InterruptControl`] backed by the core NVIC
pub struct Nvic {
    nvic: NVIC,
}

impl Nvic {
    pub fn new(nvic: NVIC) -> Self {
        Nvic { nvic }
    }

    /// Releases the NVIC peripheral
    pub fn free(self) -> NVIC {
        self.nvic
    }
}

impl InterruptControl for Nvic {
    fn enable(&mut self, irq: Interrupt, priority: u8) {
        let max = (1 << NVIC_PRIO_BITS) - 1;
        let hw = priority.min(max) << (8 - NVIC_PRIO_BITS);
        // NOTE(unsafe) the handlers installed through `comparator_interrupt!`
        // only touch state guarded by the caller's critical section
        unsafe {
            self.nvic.set_priority(irq, hw);
            NVIC::unmask(irq);
        }
    }
}

impl<T: InterruptControl + ?Sized> InterruptControl for &mut T {
    fn enable(&mut self, irq: Interrupt, priority: u8) {
        (**self).enable(irq, priority)
    }
}

/// Defines the shared ADC/COMP vector and forwards it to `$dispatch`
///
/// With the `rt` feature the handler is installed in the `cortex-m-rt`
/// vector table of the `py32f0` PAC, which names the vector `ADC_COMP`
/// (`ADC` on PY32F002A). Without it the macro defines the names used by the
/// vendor C startup files, `ADC_COMP_IRQHandler` and `ADC_IRQHandler`.
///
/// `$dispatch` usually borrows the [`Comparators`] registry and calls
/// [`Comparators::on_interrupt`], which runs the comparator callbacks while
/// the registry is still borrowed. A callback must therefore not borrow the
/// registry again; with a `RefCell` that panics.
///
/// ```ignore
/// static COMPARATORS: Mutex<RefCell<Option<Bank>>> = Mutex::new(RefCell::new(None));
///
/// fn on_comparator() {
///     cortex_m::interrupt::free(|cs| {
///         if let Some(bank) = COMPARATORS.borrow(cs).borrow_mut().as_mut() {
///             bank.on_interrupt();
///         }
///     });
/// }
///
/// py32f0xx_hal::comparator_interrupt!(on_comparator);
/// ```
///
/// [`Comparators`]: crate::analog::comparator::Comparators
/// [`Comparators::on_interrupt`]: crate::analog::comparator::Comparators::on_interrupt
#[cfg(feature = "rt")]
#[macro_export]
macro_rules! comparator_interrupt {
    ($dispatch:path) => {
        #[allow(non_snake_case)]
        #[no_mangle]
        pub extern "C" fn ADC_COMP() {
            $dispatch()
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        pub extern "C" fn ADC() {
            $dispatch()
        }
    };
}

#[cfg(not(feature = "rt"))]
#[macro_export]
macro_rules! comparator_interrupt {
    ($dispatch:path) => {
        #[allow(non_snake_case)]
        #[no_mangle]
        pub extern "C" fn ADC_COMP_IRQHandler() {
            $dispatch()
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        pub extern "C" fn ADC_IRQHandler() {
            $dispatch()
        }
    };
}
