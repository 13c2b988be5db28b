//! Register addresses and fields used by the drivers
//!
//! The drivers address registers by number through [`crate::bus::RegisterBus`],
//! so the simulated bus in the host tests and [`crate::bus::Mmio`] on target
//! share one map. Peripheral base addresses are those of the `py32f0` PAC
//! (checked against its `PTR`s when a device feature is enabled). Field
//! positions follow the PY32F0 reference manual.

/// Reset and clock control
pub mod rcc {
    pub const RCC: usize = 0x4002_1000;

    pub const IOPENR: usize = RCC + 0x34;
    pub const APBENR1: usize = RCC + 0x3C;
    pub const APBENR2: usize = RCC + 0x40;

    pub const IOPENR_GPIOAEN: u32 = 1 << 0;
    pub const IOPENR_GPIOBEN: u32 = 1 << 1;
    pub const IOPENR_GPIOFEN: u32 = 1 << 5;

    pub const APBENR1_TIM3EN: u32 = 1 << 1;

    pub const APBENR2_SYSCFGEN: u32 = 1 << 0;
    pub const APBENR2_TIM1EN: u32 = 1 << 11;
    pub const APBENR2_TIM14EN: u32 = 1 << 15;
    pub const APBENR2_TIM16EN: u32 = 1 << 17;
    pub const APBENR2_TIM17EN: u32 = 1 << 18;
    pub const APBENR2_COMP1EN: u32 = 1 << 21;
    pub const APBENR2_COMP2EN: u32 = 1 << 22;
}

/// System configuration controller
pub mod syscfg {
    pub const SYSCFG: usize = 0x4001_0000;

    pub const CFGR2: usize = SYSCFG + 0x18;

    /// COMP1 output drives the TIM1 break input
    pub const CFGR2_COMP1_BRK_TIM1: u32 = 1 << 3;
    /// COMP2 output drives the TIM1 break input
    pub const CFGR2_COMP2_BRK_TIM1: u32 = 1 << 4;
}

/// Analog comparators
///
/// Bits marked "common" are only implemented in the COMP1 CSR and act on
/// both comparators.
pub mod comp {
    pub const COMP1: usize = 0x4001_0200;
    pub const COMP2: usize = 0x4001_0210;

    /// Control and status register offset
    pub const CSR: usize = 0x00;
    /// Digital filter register offset
    pub const FR: usize = 0x04;

    pub const CSR_EN: u32 = 1 << 0;
    pub const CSR_INMSEL_POS: u32 = 4;
    pub const CSR_INMSEL: u32 = 0b1111 << CSR_INMSEL_POS;
    pub const CSR_INPSEL_POS: u32 = 8;
    pub const CSR_INPSEL: u32 = 0b11 << CSR_INPSEL_POS;
    /// common
    pub const CSR_WINMODE: u32 = 1 << 11;
    pub const CSR_POLARITY: u32 = 1 << 15;
    /// common
    pub const CSR_HYST: u32 = 1 << 16;
    pub const CSR_PWRMODE_POS: u32 = 18;
    pub const CSR_PWRMODE: u32 = 0b11 << CSR_PWRMODE_POS;
    /// common: VREFINT scaler bridge
    pub const CSR_SCALER_EN: u32 = 1 << 23;
    /// read-only comparator output
    pub const CSR_VALUE: u32 = 1 << 30;
    pub const CSR_LOCK: u32 = 1 << 31;

    pub const FR_FLTEN: u32 = 1 << 0;
    pub const FR_FLTCNT_POS: u32 = 16;
}

/// Extended interrupt and event controller
pub mod exti {
    pub const EXTI: usize = 0x4002_1800;

    pub const RTSR: usize = EXTI;
    pub const FTSR: usize = EXTI + 0x04;
    /// pending register, write 1 to clear
    pub const PR: usize = EXTI + 0x0C;
    pub const IMR: usize = EXTI + 0x80;
    pub const EMR: usize = EXTI + 0x84;
}

/// Advanced/general purpose timers
pub mod tim {
    pub const TIM1: usize = 0x4001_2C00;
    pub const TIM3: usize = 0x4000_0400;
    pub const TIM14: usize = 0x4000_2000;
    pub const TIM16: usize = 0x4001_4400;
    pub const TIM17: usize = 0x4001_4800;

    pub const CR1: usize = 0x00;
    pub const SMCR: usize = 0x08;
    /// status register, write 0 to clear
    pub const SR: usize = 0x10;
    pub const EGR: usize = 0x14;
    pub const CCMR1: usize = 0x18;
    pub const CCMR2: usize = 0x1C;
    pub const CCER: usize = 0x20;
    pub const PSC: usize = 0x28;
    pub const ARR: usize = 0x2C;
    pub const CCR1: usize = 0x34;
    pub const BDTR: usize = 0x44;

    pub const CR1_CEN: u32 = 1 << 0;
    pub const CR1_ARPE: u32 = 1 << 7;

    /// OCREF clear selection: 0 = OCREF_CLR_INT, 1 = ETRF
    pub const SMCR_OCCS: u32 = 1 << 3;

    pub const SR_BIF: u32 = 1 << 7;

    pub const EGR_UG: u32 = 1 << 0;

    /// Per-channel bit offset inside CCMR1/CCMR2 (channels 1/3 low, 2/4 high)
    pub const CCMR_CH_SHIFT: u32 = 8;
    pub const CCMR_OCPE: u32 = 1 << 3;
    pub const CCMR_OCM_POS: u32 = 4;
    pub const CCMR_OCM: u32 = 0b111 << CCMR_OCM_POS;
    pub const CCMR_OCCE: u32 = 1 << 7;
    pub const OCM_PWM1: u32 = 0b110;

    /// Per-channel bit offset inside CCER
    pub const CCER_CH_SHIFT: u32 = 4;
    pub const CCER_CCE: u32 = 1 << 0;

    pub const BDTR_BKE: u32 = 1 << 12;
    pub const BDTR_BKP: u32 = 1 << 13;
    pub const BDTR_AOE: u32 = 1 << 14;
    pub const BDTR_MOE: u32 = 1 << 15;
}

/// General purpose I/O ports
pub mod gpio {
    pub const GPIOA: usize = 0x5000_0000;
    pub const GPIOB: usize = 0x5000_0400;
    pub const GPIOF: usize = 0x5000_1400;

    pub const MODER: usize = 0x00;
    pub const OTYPER: usize = 0x04;
    pub const OSPEEDR: usize = 0x08;
    pub const PUPDR: usize = 0x0C;
    pub const IDR: usize = 0x10;
    pub const ODR: usize = 0x14;
    /// bit set/reset register, write only
    pub const BSRR: usize = 0x18;
    pub const AFRL: usize = 0x20;
    pub const AFRH: usize = 0x24;
    /// bit reset register, write only
    pub const BRR: usize = 0x28;
}

#[cfg(all(test, feature = "device-selected"))]
mod tests {
    use crate::py32;

    #[test]
    fn bases_match_device_pac() {
        assert_eq!(py32::RCC::PTR as usize, super::rcc::RCC);
        assert_eq!(py32::SYSCFG::PTR as usize, super::syscfg::SYSCFG);
        assert_eq!(py32::COMP1::PTR as usize, super::comp::COMP1);
        assert_eq!(py32::COMP2::PTR as usize, super::comp::COMP2);
        assert_eq!(py32::EXTI::PTR as usize, super::exti::EXTI);
        assert_eq!(py32::TIM1::PTR as usize, super::tim::TIM1);
        assert_eq!(py32::GPIOA::PTR as usize, super::gpio::GPIOA);
        assert_eq!(py32::GPIOB::PTR as usize, super::gpio::GPIOB);
        assert_eq!(py32::GPIOF::PTR as usize, super::gpio::GPIOF);
    }
}
