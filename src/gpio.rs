//! Pin to PWM channel mapping
//!
//! Routing a pin to its alternate function (the PFC registers) is left to the
//! application. The driver only needs to know which output channel a pin
//! drives; [`PinMap`] answers that, and reports the alternate function number
//! so the caller can configure the multiplexer.
//!
//! Output pins for reset-synchronized PWM mode on the RZ/A1H:
//!
//! | Channel | Pins                                   |
//! |---------|----------------------------------------|
//! | TIOC3B  | P8_11, (P7_9), (P3_5)                  |
//! | TIOC4A  | P3_8, P4_4, (P7_12), (P11_0)           |
//! | TIOC4B  | P3_9, P4_5, (P7_13), (P11_1)           |
//!
//! Pins in parentheses are not usable on the GR-PEACH.

use crate::pwm::Channel;

/// A port pin, `P<port>_<bit>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinName {
    /// Port number
    pub port: u8,
    /// Bit within the port
    pub bit: u8,
}

impl PinName {
    /// `P<port>_<bit>`
    pub const fn new(port: u8, bit: u8) -> Self {
        PinName { port, bit }
    }
}

macro_rules! pins {
    ($($name:ident = ($port:literal, $bit:literal),)+) => {
        $(
            #[doc = concat!("Port ", stringify!($port), " bit ", stringify!($bit))]
            pub const $name: PinName = PinName::new($port, $bit);
        )+
    };
}

pins! {
    P3_5 = (3, 5),
    P3_8 = (3, 8),
    P3_9 = (3, 9),
    P4_4 = (4, 4),
    P4_5 = (4, 5),
    P7_9 = (7, 9),
    P7_12 = (7, 12),
    P7_13 = (7, 13),
    P8_11 = (8, 11),
    P11_0 = (11, 0),
    P11_1 = (11, 1),
}

/// Alternate function number to select in the pin multiplexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltFunction(pub u8);

/// What a pin provides when routed to the MTU2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmFunction {
    /// Output channel driven by the pin
    pub channel: Channel,
    /// Alternate function that connects the pin to `channel`
    pub alt: AltFunction,
}

/// Lookup from pins to PWM output channels.
pub trait PinMap {
    /// The PWM function of `pin`, or `None` if it is not connected to any
    /// reset-synchronized output.
    fn resolve(&self, pin: PinName) -> Option<PwmFunction>;
}

impl<T: PinMap + ?Sized> PinMap for &T {
    #[inline]
    fn resolve(&self, pin: PinName) -> Option<PwmFunction> {
        (**self).resolve(pin)
    }
}

/// One row of a pin table.
pub type PinMapping = (PinName, Channel, AltFunction);

impl PinMap for [PinMapping] {
    fn resolve(&self, pin: PinName) -> Option<PwmFunction> {
        self.iter()
            .find(|(name, _, _)| *name == pin)
            .map(|&(_, channel, alt)| PwmFunction { channel, alt })
    }
}

/// The RZ/A1H pin table.
pub const RZA1_PWM_PINS: [PinMapping; 11] = [
    (P7_9, Channel::Tioc3b, AltFunction(7)),
    (P8_11, Channel::Tioc3b, AltFunction(4)),
    (P3_5, Channel::Tioc3b, AltFunction(6)),
    (P7_12, Channel::Tioc4a, AltFunction(7)),
    (P3_8, Channel::Tioc4a, AltFunction(6)),
    (P4_4, Channel::Tioc4a, AltFunction(3)),
    (P11_0, Channel::Tioc4a, AltFunction(2)),
    (P7_13, Channel::Tioc4b, AltFunction(7)),
    (P3_9, Channel::Tioc4b, AltFunction(6)),
    (P4_5, Channel::Tioc4b, AltFunction(3)),
    (P11_1, Channel::Tioc4b, AltFunction(2)),
];

/// [`PinMap`] backed by [`RZA1_PWM_PINS`].
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rza1Pins;

impl PinMap for Rza1Pins {
    #[inline]
    fn resolve(&self, pin: PinName) -> Option<PwmFunction> {
        RZA1_PWM_PINS[..].resolve(pin)
    }
}
