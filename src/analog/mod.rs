//! Analog peripherals
pub mod comparator;
