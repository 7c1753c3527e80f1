//! Clock Pulse Generator
//!
//! The MTU2 counts peripheral clock 0 (P0φ). Its frequency depends on the
//! clock mode the device was strapped to at reset, which is board specific.

use embedded_time::rate::Hertz;

use crate::reg::{Reg8, Registers};

/// MSTP33: MTU2 module stop bit in STBCR3.
const MSTP33: u8 = 0x08;

/// Clock mode the device booted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockMode {
    /// 13.33 MHz EXTAL, P0φ = 33.33 MHz
    Mode0,
    /// 48 MHz USB_X1, P0φ = 32 MHz
    Mode1,
}

/// Source of the frequency feeding the MTU2 prescaler.
pub trait ClockSource {
    /// The clock mode currently in effect.
    fn clock_mode(&self) -> ClockMode;

    /// P0φ frequency for the given clock mode.
    fn frequency(&self, mode: ClockMode) -> Hertz;

    /// P0φ frequency for the clock mode currently in effect.
    #[inline]
    fn p0clk(&self) -> Hertz {
        self.frequency(self.clock_mode())
    }
}

/// Fixed RZ/A1H clock tree.
///
/// The mode is board configuration: GR-PEACH boots in [`ClockMode::Mode1`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cpg {
    mode: ClockMode,
}

impl Cpg {
    /// P0φ in clock mode 0
    pub const CM0_P0_CLK: Hertz = Hertz(33_333_333);
    /// P0φ in clock mode 1
    pub const CM1_P0_CLK: Hertz = Hertz(32_000_000);

    /// Describe the clock tree of a device running in `mode`.
    pub const fn new(mode: ClockMode) -> Self {
        Cpg { mode }
    }
}

impl Default for Cpg {
    fn default() -> Self {
        Cpg::new(ClockMode::Mode1)
    }
}

impl ClockSource for Cpg {
    #[inline]
    fn clock_mode(&self) -> ClockMode {
        self.mode
    }

    #[inline]
    fn frequency(&self, mode: ClockMode) -> Hertz {
        match mode {
            ClockMode::Mode0 => Self::CM0_P0_CLK,
            ClockMode::Mode1 => Self::CM1_P0_CLK,
        }
    }
}

/// Release the MTU2 from module standby.
#[inline]
pub(crate) fn enable_mtu2<R: Registers>(registers: &mut R) {
    registers.modify8(Reg8::Stbcr3, |value| value & !MSTP33);
}

/// Whether the MTU2 is out of module standby.
#[inline]
pub(crate) fn is_mtu2_enabled<R: Registers>(registers: &R) -> bool {
    registers.read8(Reg8::Stbcr3) & MSTP33 == 0
}
