use crate::gpio::*;
use crate::timer::TimerId;

/// Timer output reachable from a pin
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerPin {
    pub pin: PinName,
    pub timer: TimerId,
    /// Channel number as listed in the datasheet alternate function table
    pub channel: u8,
    /// Alternate function number
    pub af: u8,
}

macro_rules! timer_pins {
    ($($TIMX:ident: [$(($ch:expr, $pin:ident, $af:expr),)+],)+) => {
        const TIMER_PINS: &[TimerPin] = &[
            $($(
                TimerPin { pin: $pin, timer: TimerId::$TIMX, channel: $ch, af: $af },
            )+)+
        ];
    };
}

// The first entry of a pin wins when it can reach several timers.
timer_pins! {
    TIM1: [
        (1, PA3, 13),
        (1, PA8, 2),
        (2, PA9, 2),
        (2, PB3, 1),
        (3, PA0, 13),
        (3, PA10, 2),
        (3, PB6, 1),
        (4, PA1, 13),
        (4, PA11, 2),
    ],
    TIM3: [
        (1, PA6, 1),
        (1, PB4, 1),
        (2, PA7, 1),
        (2, PB5, 1),
        (3, PB0, 1),
        (4, PB1, 1),
    ],
    TIM14: [
        (1, PA4, 4),
        (1, PF0, 2),
    ],
    TIM16: [
        (1, PB8, 2),
    ],
    TIM17: [
        (1, PF1, 2),
    ],
}

/// Looks up the timer output routed to `pin`
pub fn timer_pin(pin: PinName) -> Option<TimerPin> {
    TIMER_PINS.iter().copied().find(|tp| tp.pin == pin)
}
