//! Simulated register file for host tests
//!
//! Models the access semantics the drivers depend on: write-1-to-clear EXTI
//! pending bits, clear-by-writing-0 timer status flags, read-only comparator
//! output and sticky lock bits, self-clearing event generation and the GPIO
//! set/reset registers.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::vec::Vec;

use crate::bus::RegisterBus;
use crate::pac::{comp, exti, gpio, tim};

const TIMERS: [usize; 5] = [tim::TIM1, tim::TIM3, tim::TIM14, tim::TIM16, tim::TIM17];
const PORTS: [usize; 3] = [gpio::GPIOA, gpio::GPIOB, gpio::GPIOF];

#[derive(Default)]
pub struct SimBus {
    regs: RefCell<BTreeMap<usize, u32>>,
    log: RefCell<Vec<(usize, u32)>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current register content, without logging an access
    pub fn peek(&self, addr: usize) -> u32 {
        self.regs.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Hardware side update, bypassing the bus write semantics
    pub fn poke(&self, addr: usize, value: u32) {
        self.regs.borrow_mut().insert(addr, value);
    }

    /// Drives the comparator output bit of the CSR at `base`
    pub fn set_comparator_output(&self, base: usize, high: bool) {
        let csr = self.peek(base + comp::CSR);
        let csr = if high {
            csr | comp::CSR_VALUE
        } else {
            csr & !comp::CSR_VALUE
        };
        self.poke(base + comp::CSR, csr);
    }

    /// Latches an edge on EXTI `line`
    pub fn raise_exti(&self, line: u8) {
        let pr = self.peek(exti::PR);
        self.poke(exti::PR, pr | 1 << line);
    }

    /// Every bus write so far, in order
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.log.borrow().clone()
    }

    /// Number of bus writes to `addr`
    pub fn writes_to(&self, addr: usize) -> usize {
        self.log.borrow().iter().filter(|(a, _)| *a == addr).count()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    /// Copy of the whole register file
    pub fn snapshot(&self) -> BTreeMap<usize, u32> {
        self.regs.borrow().clone()
    }

    fn is_timer_reg(addr: usize, offset: usize) -> bool {
        TIMERS.iter().any(|base| base + offset == addr)
    }

    fn is_port_reg(addr: usize, offset: usize) -> Option<usize> {
        PORTS.iter().copied().find(|base| base + offset == addr)
    }
}

impl RegisterBus for SimBus {
    fn read(&self, addr: usize) -> u32 {
        if Self::is_port_reg(addr, gpio::BSRR).is_some() || Self::is_port_reg(addr, gpio::BRR).is_some() {
            return 0;
        }
        self.peek(addr)
    }

    fn write(&self, addr: usize, value: u32) {
        self.log.borrow_mut().push((addr, value));
        let current = self.peek(addr);

        let stored = if addr == exti::PR {
            current & !value
        } else if Self::is_timer_reg(addr, tim::SR) {
            current & value
        } else if Self::is_timer_reg(addr, tim::EGR) {
            0
        } else if addr == comp::COMP1 + comp::CSR || addr == comp::COMP2 + comp::CSR {
            let kept = current & (comp::CSR_VALUE | comp::CSR_LOCK);
            (value & !comp::CSR_VALUE) | kept
        } else if let Some(port) = Self::is_port_reg(addr, gpio::BSRR) {
            let odr = self.peek(port + gpio::ODR);
            let odr = (odr & !(value >> 16)) | (value & 0xFFFF);
            self.poke(port + gpio::ODR, odr);
            return;
        } else if let Some(port) = Self::is_port_reg(addr, gpio::BRR) {
            let odr = self.peek(port + gpio::ODR);
            self.poke(port + gpio::ODR, odr & !(value & 0xFFFF));
            return;
        } else {
            value
        };

        self.poke(addr, stored);
    }
}
