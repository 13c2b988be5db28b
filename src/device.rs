//! Silicon variants
//!
//! The PY32F0 parts share one comparator design but differ in a few details
//! the drivers have to know about at run time.
use crate::pac::{comp, syscfg};

/// PY32F0 part
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Variant {
    Py32f002a,
    Py32f003,
    Py32f030,
}

impl Default for Variant {
    /// The part selected by the device cargo feature, PY32F002A when none is
    fn default() -> Self {
        if cfg!(feature = "py32f030") {
            Variant::Py32f030
        } else if cfg!(feature = "py32f003") {
            Variant::Py32f003
        } else {
            Variant::Py32f002a
        }
    }
}

impl Variant {
    /// `true` if the package bonds PF3 (COMP2 positive input IO4)
    pub const fn has_pf3(self) -> bool {
        !matches!(self, Variant::Py32f002a)
    }

    /// SYSCFG CFGR2 bit routing comparator `n` (1 or 2) into the TIM1 break input
    pub const fn tim1_break_route(self, n: u8) -> Option<u32> {
        match (self, n) {
            (Variant::Py32f002a | Variant::Py32f003, 1) => Some(syscfg::CFGR2_COMP1_BRK_TIM1),
            (Variant::Py32f002a | Variant::Py32f003, 2) => Some(syscfg::CFGR2_COMP2_BRK_TIM1),
            _ => None,
        }
    }

    /// Encodes a power mode into the CSR PWRMODE field value (unshifted)
    ///
    /// PY32F002A silicon decodes the field differently from the other parts:
    /// high speed is `0b10` and medium speed `0b01`.
    pub(crate) fn pwrmode_bits(self, mode: crate::analog::comparator::PowerMode) -> u32 {
        use crate::analog::comparator::PowerMode;

        let field = comp::CSR_PWRMODE >> comp::CSR_PWRMODE_POS;
        match self {
            Variant::Py32f002a => match mode {
                PowerMode::HighSpeed => 0b10,
                PowerMode::MediumSpeed => 0b01,
                PowerMode::Raw(bits) => bits as u32 & field,
            },
            _ => match mode {
                PowerMode::HighSpeed => 0b00,
                PowerMode::MediumSpeed => 0b01,
                PowerMode::Raw(bits) => bits as u32 & field,
            },
        }
    }
}
