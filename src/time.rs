//! Time units
pub use fugit::{
    ExtU32, HertzU32 as Hertz, MicrosDurationU32 as MicroSecond, NanosDurationU32 as NanoSecond,
    RateExtU32,
};

/// Number of `clk` cycles elapsing during `duration`, rounded up
pub fn cycles(duration: NanoSecond, clk: Hertz) -> u32 {
    let ticks = (duration.ticks() as u64 * clk.raw() as u64 + 999_999_999) / 1_000_000_000;
    ticks.min(u32::MAX as u64) as u32
}
