#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]

#[cfg(any(
    all(feature = "py32f002a", feature = "py32f003"),
    all(feature = "py32f002a", feature = "py32f030"),
    all(feature = "py32f003", feature = "py32f030"),
))]
compile_error!("Only one of the py32f002a, py32f003 or py32f030 features can be enabled");

#[cfg(all(feature = "rt", not(feature = "device-selected")))]
compile_error!("The rt feature requires one of the py32f002a, py32f003 or py32f030 features");

pub extern crate cortex_m;
pub extern crate embedded_hal as hal;
pub extern crate py32f0;

#[cfg(feature = "py32f002a")]
pub use py32f0::py32f002a as py32;

#[cfg(feature = "py32f003")]
pub use py32f0::py32f003 as py32;

#[cfg(feature = "py32f030")]
pub use py32f0::py32f030 as py32;

#[macro_use]
pub mod debug;

pub mod analog;
pub mod bus;
pub mod delay;
pub mod device;
pub mod exti;
pub mod gpio;
pub mod interrupt;
pub mod pac;
pub mod prelude;
pub mod rcc;
pub mod time;
pub mod timer;

#[cfg(test)]
mod sim;
