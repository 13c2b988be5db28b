//! General Purpose Input / Output
//!
//! Pins are addressed at run time by [`PinName`], the way Arduino style code
//! passes pin numbers around, instead of through per-pin type states.
use embedded_hal::digital::PinState;

use crate::bus::RegisterBus;
use crate::pac::gpio;
use crate::rcc::{self, Peripheral};

/// GPIO port
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Port {
    A = 0,
    B = 1,
    F = 5,
}

impl Port {
    const fn base(self) -> usize {
        match self {
            Port::A => gpio::GPIOA,
            Port::B => gpio::GPIOB,
            Port::F => gpio::GPIOF,
        }
    }

    const fn clock(self) -> Peripheral {
        match self {
            Port::A => Peripheral::GPIOA,
            Port::B => Peripheral::GPIOB,
            Port::F => Peripheral::GPIOF,
        }
    }
}

/// Physical pin: a port and a line number
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinName {
    port: Port,
    pin: u8,
}

/// Raw encoding of "no pin"
pub const NC: u32 = 0xFFFF_FFFF;

impl PinName {
    pub const fn new(port: Port, pin: u8) -> Self {
        assert!(pin < 16);
        PinName { port, pin }
    }

    /// Decodes the packed `port << 4 | pin` form, `None` for [`NC`] or an
    /// unknown port
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw == NC || raw > 0xFF {
            return None;
        }
        let port = match raw >> 4 {
            0 => Port::A,
            1 => Port::B,
            5 => Port::F,
            _ => return None,
        };
        Some(PinName::new(port, (raw & 0xF) as u8))
    }

    pub const fn raw(self) -> u32 {
        (self.port as u32) << 4 | self.pin as u32
    }

    pub const fn port(self) -> Port {
        self.port
    }

    pub const fn pin(self) -> u8 {
        self.pin
    }

    fn reg(self, offset: usize) -> usize {
        self.port.base() + offset
    }
}

macro_rules! pins {
    ($($port:ident: [$($PXi:ident: $i:expr,)+],)+) => {
        $($(
            pub const $PXi: PinName = PinName::new(Port::$port, $i);
        )+)+
    };
}

pins! {
    A: [
        PA0: 0, PA1: 1, PA2: 2, PA3: 3, PA4: 4, PA5: 5, PA6: 6, PA7: 7,
        PA8: 8, PA9: 9, PA10: 10, PA11: 11, PA12: 12, PA13: 13, PA14: 14, PA15: 15,
    ],
    B: [
        PB0: 0, PB1: 1, PB2: 2, PB3: 3, PB4: 4, PB5: 5, PB6: 6, PB7: 7, PB8: 8,
    ],
    F: [
        PF0: 0, PF1: 1, PF2: 2, PF3: 3, PF4: 4,
    ],
}

/// Pin configuration
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Floating input
    Input,
    InputPullUp,
    InputPullDown,
    Analog,
    /// Push pull output
    Output,
    OutputOpenDrain,
}

/// GPIO Pin speed selection
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Speed {
    VeryLow = 0,
    Low = 1,
    High = 2,
    VeryHigh = 3,
}

/// Trigger edge
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalEdge {
    Rising,
    Falling,
    All,
}

const MODER_INPUT: u32 = 0b00;
const MODER_OUTPUT: u32 = 0b01;
const MODER_ALTERNATE: u32 = 0b10;
const MODER_ANALOG: u32 = 0b11;

const PUPDR_NONE: u32 = 0b00;
const PUPDR_UP: u32 = 0b01;
const PUPDR_DOWN: u32 = 0b10;

/// Pin level helpers over a register bus
pub struct Gpio<'a, B: ?Sized> {
    bus: &'a B,
}

impl<'a, B: RegisterBus + ?Sized> Gpio<'a, B> {
    pub fn new(bus: &'a B) -> Self {
        Gpio { bus }
    }

    /// Configures `pin`, enabling its port clock first
    pub fn pin_mode(&self, pin: PinName, mode: PinMode) {
        rcc::enable(self.bus, pin.port.clock());

        let (moder, open_drain, pull) = match mode {
            PinMode::Input => (MODER_INPUT, false, PUPDR_NONE),
            PinMode::InputPullUp => (MODER_INPUT, false, PUPDR_UP),
            PinMode::InputPullDown => (MODER_INPUT, false, PUPDR_DOWN),
            PinMode::Analog => (MODER_ANALOG, false, PUPDR_NONE),
            PinMode::Output => (MODER_OUTPUT, false, PUPDR_NONE),
            PinMode::OutputOpenDrain => (MODER_OUTPUT, true, PUPDR_NONE),
        };

        let offset = 2 * pin.pin as u32;
        self.bus
            .modify_field(pin.reg(gpio::PUPDR), 0b11 << offset, pull << offset);
        if moder == MODER_OUTPUT {
            self.bus
                .write_bits(pin.reg(gpio::OTYPER), 1 << pin.pin, open_drain);
            self.set_speed(pin, Speed::High);
        }
        self.bus
            .modify_field(pin.reg(gpio::MODER), 0b11 << offset, moder << offset);
    }

    /// Hands `pin` over to the peripheral behind alternate function `af`
    pub fn set_alternate(&self, pin: PinName, af: u8) {
        rcc::enable(self.bus, pin.port.clock());

        let (afr, shift) = if pin.pin < 8 {
            (gpio::AFRL, 4 * pin.pin as u32)
        } else {
            (gpio::AFRH, 4 * (pin.pin as u32 - 8))
        };
        self.bus
            .modify_field(pin.reg(afr), 0b1111 << shift, (af as u32 & 0b1111) << shift);
        self.set_speed(pin, Speed::High);

        let offset = 2 * pin.pin as u32;
        self.bus.modify_field(
            pin.reg(gpio::MODER),
            0b11 << offset,
            MODER_ALTERNATE << offset,
        );
    }

    pub fn set_speed(&self, pin: PinName, speed: Speed) {
        let offset = 2 * pin.pin as u32;
        self.bus.modify_field(
            pin.reg(gpio::OSPEEDR),
            0b11 << offset,
            (speed as u32) << offset,
        );
    }

    pub fn digital_write(&self, pin: PinName, state: PinState) {
        // NOTE atomic write to a stateless register
        let bits = match state {
            PinState::High => 1 << pin.pin,
            PinState::Low => 1 << (pin.pin + 16),
        };
        self.bus.write(pin.reg(gpio::BSRR), bits);
    }

    pub fn digital_read(&self, pin: PinName) -> PinState {
        PinState::from(self.bus.is_set(pin.reg(gpio::IDR), 1 << pin.pin))
    }

    /// Level currently driven by the output data register
    pub fn output_level(&self, pin: PinName) -> PinState {
        PinState::from(self.bus.is_set(pin.reg(gpio::ODR), 1 << pin.pin))
    }

    pub fn digital_toggle(&self, pin: PinName) {
        let next = !self.output_level(pin);
        self.digital_write(pin, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::rcc as rcc_regs;
    use crate::sim::SimBus;

    #[test]
    fn raw_encoding() {
        assert_eq!(PinName::from_raw(0x13), Some(PB3));
        assert_eq!(PinName::from_raw(0x53), Some(PF3));
        assert_eq!(PinName::from_raw(PA15.raw()), Some(PA15));
        assert_eq!(PinName::from_raw(NC), None);
        assert_eq!(PinName::from_raw(0x23), None);
    }

    #[test]
    fn analog_mode_sets_both_moder_bits() {
        let sim = SimBus::new();
        let gpio = Gpio::new(&sim);
        gpio.pin_mode(PA1, PinMode::Analog);
        assert_eq!(sim.peek(gpio::GPIOA + gpio::MODER), 0b11 << 2);
        assert_eq!(
            sim.peek(rcc_regs::IOPENR) & rcc_regs::IOPENR_GPIOAEN,
            rcc_regs::IOPENR_GPIOAEN
        );
    }

    #[test]
    fn open_drain_output() {
        let sim = SimBus::new();
        let gpio = Gpio::new(&sim);
        gpio.pin_mode(PB5, PinMode::OutputOpenDrain);
        assert_eq!(sim.peek(gpio::GPIOB + gpio::MODER), 0b01 << 10);
        assert_eq!(sim.peek(gpio::GPIOB + gpio::OTYPER), 1 << 5);

        gpio.pin_mode(PB5, PinMode::InputPullDown);
        assert_eq!(sim.peek(gpio::GPIOB + gpio::MODER), 0);
        assert_eq!(sim.peek(gpio::GPIOB + gpio::PUPDR), 0b10 << 10);
    }

    #[test]
    fn write_and_toggle() {
        let sim = SimBus::new();
        let gpio = Gpio::new(&sim);
        gpio.digital_write(PA5, PinState::High);
        assert_eq!(gpio.output_level(PA5), PinState::High);
        gpio.digital_toggle(PA5);
        assert_eq!(gpio.output_level(PA5), PinState::Low);
        gpio.digital_toggle(PA5);
        assert_eq!(sim.peek(gpio::GPIOA + gpio::ODR), 1 << 5);
    }

    #[test]
    fn read_samples_idr() {
        let sim = SimBus::new();
        let gpio = Gpio::new(&sim);
        sim.poke(gpio::GPIOF + gpio::IDR, 1 << 2);
        assert_eq!(gpio.digital_read(PF2), PinState::High);
        assert_eq!(gpio.digital_read(PF1), PinState::Low);
    }

    #[test]
    fn alternate_function_high_register() {
        let sim = SimBus::new();
        let gpio = Gpio::new(&sim);
        gpio.set_alternate(PA9, 2);
        assert_eq!(sim.peek(gpio::GPIOA + gpio::AFRH), 2 << 4);
        assert_eq!(sim.peek(gpio::GPIOA + gpio::MODER), 0b10 << 18);
    }
}
