//! Comparator 1 watches PA1 against half of VREFINT, mirrors its output on
//! PA6, cuts the TIM1 PWM on PA8 while the input is above the threshold and
//! counts rising edges in the ADC_COMP interrupt.
#![deny(warnings)]
#![no_main]
#![no_std]

extern crate cortex_m;
extern crate cortex_m_rt as rt;
extern crate panic_halt;
extern crate py32f0xx_hal as hal;

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::interrupt::Mutex;
use hal::analog::comparator::{Comparators, Instance, MinusInput};
use hal::bus::Mmio;
use hal::delay::{Delay, DelayExt};
use hal::gpio::{SignalEdge, PA1, PA6, PA8};
use hal::interrupt::Nvic;
use hal::prelude::*;
use hal::py32;
use hal::rcc::Clocks;
use rt::entry;

type Bank = Comparators<Mmio, Delay, Nvic>;

static COMPARATORS: Mutex<RefCell<Option<Bank>>> = Mutex::new(RefCell::new(None));
static RISING_EDGES: AtomicU32 = AtomicU32::new(0);

// Runs inside `on_interrupt` with COMPARATORS borrowed, so it only touches
// its own static.
fn on_rising() {
    RISING_EDGES.fetch_add(1, Ordering::Relaxed);
}

fn dispatch() {
    cortex_m::interrupt::free(|cs| {
        if let Some(bank) = COMPARATORS.borrow(cs).borrow_mut().as_mut() {
            bank.on_interrupt();
        }
    });
}

hal::comparator_interrupt!(dispatch);

#[entry]
fn main() -> ! {
    let dp = py32::Peripherals::take().expect("cannot take peripherals");
    let cp = cortex_m::Peripherals::take().expect("cannot take core peripherals");

    let clocks = Clocks::default();
    let mut bank = Comparators::new(
        Mmio::new(dp.COMP1, dp.COMP2),
        clocks.delay(),
        Nvic::new(cp.NVIC),
        &clocks,
    );

    let mut comp1 = bank.comparator(Instance::Comp1);
    comp1.begin(PA1, MinusInput::VrefHalf, Some(PA6)).unwrap();
    comp1.hysteresis(20u32).unwrap();
    comp1.duty(250);
    comp1.pwm(PA8, 20.kHz()).unwrap();
    comp1.attach_interrupt(on_rising, SignalEdge::Rising).unwrap();

    cortex_m::interrupt::free(|cs| COMPARATORS.borrow(cs).replace(Some(bank)));

    loop {
        cortex_m::asm::wfi();
    }
}
