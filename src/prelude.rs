pub use hal::delay::DelayNs as _;
pub use hal::digital::InputPin as _;
#[cfg(feature = "pwm")]
pub use hal::pwm::SetDutyCycle as _;

pub use crate::bus::RegisterBus as _;
pub use crate::delay::DelayExt as _;
pub use crate::interrupt::InterruptControl as _;
pub use crate::time::ExtU32 as _;
pub use crate::time::RateExtU32 as _;
