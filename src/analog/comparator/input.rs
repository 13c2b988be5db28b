//! Comparator input selection
//!
//! Maps pins and internal sources onto the CSR `INPSEL` and `INMSEL` codes of
//! each comparator.
use crate::device::Variant;
use crate::gpio::*;

use super::{Error, Instance};

/// Comparator inverting input
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MinusInput {
    /// External pin
    Pin(PinName),
    /// VREFINT * 1/4
    VrefQuarter,
    /// VREFINT * 1/2
    VrefHalf,
    /// VREFINT * 3/4
    VrefThreeQuarter,
    /// VREFINT
    Vref,
    /// Supply rail
    Vcc,
    /// Temperature sensor
    TempSensor,
}

impl From<PinName> for MinusInput {
    fn from(pin: PinName) -> Self {
        MinusInput::Pin(pin)
    }
}

impl MinusInput {
    pub const fn is_internal(self) -> bool {
        !matches!(self, MinusInput::Pin(_))
    }

    /// `true` for the VREFINT taps, which are fed through the scaler bridge
    pub const fn needs_scaler(self) -> bool {
        matches!(
            self,
            MinusInput::VrefQuarter
                | MinusInput::VrefHalf
                | MinusInput::VrefThreeQuarter
                | MinusInput::Vref
        )
    }
}

const INMSEL_VREF_1_4: u32 = 0b0000;
const INMSEL_VREF_1_2: u32 = 0b0001;
const INMSEL_VREF_3_4: u32 = 0b0010;
const INMSEL_VREF: u32 = 0b0011;
const INMSEL_VCC: u32 = 0b0100;
const INMSEL_TS: u32 = 0b0101;
const INMSEL_IO1: u32 = 0b0110;
const INMSEL_IO2: u32 = 0b0111;
const INMSEL_IO3: u32 = 0b1000;

const INPSEL_IO1: u32 = 0b00;
const INPSEL_IO2: u32 = 0b01;
const INPSEL_IO3: u32 = 0b10;
const INPSEL_IO4: u32 = 0b11;

struct InputPin {
    instance: Instance,
    pin: PinName,
    bits: u32,
}

macro_rules! input_pins {
    ($TABLE:ident: [$(($COMP:ident, $pin:ident, $bits:expr),)+]) => {
        const $TABLE: &[InputPin] = &[
            $(InputPin { instance: Instance::$COMP, pin: $pin, bits: $bits },)+
        ];
    };
}

input_pins!(PLUS_PINS: [
    (Comp1, PB8, INPSEL_IO1),
    (Comp1, PB2, INPSEL_IO2),
    (Comp1, PA1, INPSEL_IO3),
    (Comp2, PB4, INPSEL_IO1),
    (Comp2, PB6, INPSEL_IO2),
    (Comp2, PA3, INPSEL_IO3),
    (Comp2, PF3, INPSEL_IO4),
]);

input_pins!(MINUS_PINS: [
    (Comp1, PB1, INMSEL_IO1),
    (Comp1, PA0, INMSEL_IO3),
    (Comp2, PB3, INMSEL_IO1),
    (Comp2, PB7, INMSEL_IO2),
    (Comp2, PA2, INMSEL_IO3),
]);

fn lookup(table: &[InputPin], instance: Instance, pin: PinName) -> Option<u32> {
    table
        .iter()
        .find(|e| e.instance == instance && e.pin == pin)
        .map(|e| e.bits)
}

/// `INPSEL` code of `pin` on `instance`
pub fn plus_selector(instance: Instance, pin: PinName, variant: Variant) -> Result<u32, Error> {
    if pin == PF3 && !variant.has_pf3() {
        return Err(Error::UnmappedPin);
    }
    lookup(PLUS_PINS, instance, pin).ok_or(Error::UnmappedPin)
}

/// `INMSEL` code of `minus` on `instance`
pub fn minus_selector(instance: Instance, minus: MinusInput) -> Result<u32, Error> {
    match minus {
        MinusInput::Pin(pin) => lookup(MINUS_PINS, instance, pin).ok_or(Error::UnmappedPin),
        MinusInput::VrefQuarter => Ok(INMSEL_VREF_1_4),
        MinusInput::VrefHalf => Ok(INMSEL_VREF_1_2),
        MinusInput::VrefThreeQuarter => Ok(INMSEL_VREF_3_4),
        MinusInput::Vref => Ok(INMSEL_VREF),
        MinusInput::Vcc => Ok(INMSEL_VCC),
        MinusInput::TempSensor => Ok(INMSEL_TS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_tables() {
        let v = Variant::Py32f003;
        let comp1 = [(PB8, 0), (PB2, 1), (PA1, 2)];
        for (pin, code) in comp1 {
            assert_eq!(plus_selector(Instance::Comp1, pin, v), Ok(code));
            assert_eq!(plus_selector(Instance::Comp2, pin, v), Err(Error::UnmappedPin));
        }
        let comp2 = [(PB4, 0), (PB6, 1), (PA3, 2), (PF3, 3)];
        for (pin, code) in comp2 {
            assert_eq!(plus_selector(Instance::Comp2, pin, v), Ok(code));
            assert_eq!(plus_selector(Instance::Comp1, pin, v), Err(Error::UnmappedPin));
        }
    }

    #[test]
    fn pf3_depends_on_package() {
        assert_eq!(
            plus_selector(Instance::Comp2, PF3, Variant::Py32f002a),
            Err(Error::UnmappedPin)
        );
        assert_eq!(plus_selector(Instance::Comp2, PF3, Variant::Py32f030), Ok(3));
    }

    #[test]
    fn minus_tables() {
        let comp1 = [(PB1, 0b0110), (PA0, 0b1000)];
        for (pin, code) in comp1 {
            assert_eq!(minus_selector(Instance::Comp1, pin.into()), Ok(code));
            assert_eq!(minus_selector(Instance::Comp2, pin.into()), Err(Error::UnmappedPin));
        }
        let comp2 = [(PB3, 0b0110), (PB7, 0b0111), (PA2, 0b1000)];
        for (pin, code) in comp2 {
            assert_eq!(minus_selector(Instance::Comp2, pin.into()), Ok(code));
            assert_eq!(minus_selector(Instance::Comp1, pin.into()), Err(Error::UnmappedPin));
        }
        assert_eq!(minus_selector(Instance::Comp1, PA5.into()), Err(Error::UnmappedPin));
    }

    #[test]
    fn internal_sources() {
        let expected = [
            (MinusInput::VrefQuarter, 0b0000, true),
            (MinusInput::VrefHalf, 0b0001, true),
            (MinusInput::VrefThreeQuarter, 0b0010, true),
            (MinusInput::Vref, 0b0011, true),
            (MinusInput::Vcc, 0b0100, false),
            (MinusInput::TempSensor, 0b0101, false),
        ];
        for (minus, code, scaler) in expected {
            assert!(minus.is_internal());
            assert_eq!(minus.needs_scaler(), scaler);
            for instance in [Instance::Comp1, Instance::Comp2] {
                assert_eq!(minus_selector(instance, minus), Ok(code));
            }
        }
        assert!(!MinusInput::Pin(PB1).is_internal());
        assert!(!MinusInput::Pin(PB1).needs_scaler());
    }
}
