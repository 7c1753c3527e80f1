//! # Timers
//!
//! Counter control of the MTU2 channel 3/4 pair and the conversion from a
//! period in microseconds to counter ticks.
//!
//! The counter is 16 bits wide and clocked by P0φ through the TPSC prescaler
//! of TCR_3, which divides by 1, 4, 16, 64, 256 or 1024. [`resolve`] picks
//! the smallest divider that keeps the period representable.

use core::convert::TryFrom;

use embedded_time::rate::Hertz;

use crate::reg::{Reg16, Reg8, Registers};

/// Shortest accepted period in microseconds.
pub const MIN_PERIOD_US: u32 = 1;
/// Longest accepted period in microseconds.
pub const MAX_PERIOD_US: u32 = 2_000_000;

const US_PER_SECOND: u64 = 1_000_000;
/// Exclusive bound of the tick count before the prescaler is raised.
const TICKS_LIMIT: u64 = 65_535;
/// Each TPSC step divides the clock by four.
const PRESCALER_STEP_SHIFT: u8 = 2;
/// TPSC = 0b101, P0φ/1024
const MAX_PRESCALER: u8 = 5;

/// TSTR: CST3, starts channels 3 and 4 together in reset-synchronized mode.
const TSTR_CST3: u8 = 0x40;
/// TCR_3: CCLR = TGRA compare match.
const TCR_CCLR_TGRA: u8 = 0x20;
/// TOCR1: PSYE = 1, toggle output disabled
const TOCR1_VALUE: u8 = 0x04;
/// TOCR2: negative phase low to high, positive phase high to low
const TOCR2_VALUE: u8 = 0x40;
/// TMDR_3: buffer operation on, reset-synchronized PWM mode
const TMDR3_RESET_SYNC_PWM: u8 = 0x38;
/// TMDR_4: buffer operation on
const TMDR4_BUFFERED: u8 = 0x30;
/// TOER bits 6 and 7 are reserved and must be written as one.
pub(crate) const TOER_RESERVED: u8 = 0xC0;

/// Prescaler select value (TPSC field of TCR_3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Prescaler(u8);

impl Prescaler {
    /// P0φ/1
    pub const DIV1: Prescaler = Prescaler(0);
    /// P0φ/1024
    pub const DIV1024: Prescaler = Prescaler(MAX_PRESCALER);

    /// The raw TPSC field value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Power of two the clock is divided by.
    #[inline]
    pub const fn shift(self) -> u8 {
        self.0 * PRESCALER_STEP_SHIFT
    }

    /// Clock divider, `2^shift`.
    #[inline]
    pub const fn divider(self) -> u32 {
        1 << self.shift()
    }
}

/// Counter configuration for one period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Counter top value
    pub ticks: u16,
    /// Clock divider in front of the counter
    pub prescaler: Prescaler,
}

impl Timing {
    /// No period programmed yet.
    pub const UNSET: Timing = Timing {
        ticks: 0,
        prescaler: Prescaler::DIV1,
    };
}

/// Clamp a requested period to `[MIN_PERIOD_US, MAX_PERIOD_US]`.
///
/// Out of range requests are not an error; they silently saturate.
#[inline]
pub fn clamp_period_us(us: i64) -> u32 {
    if us < i64::from(MIN_PERIOD_US) {
        MIN_PERIOD_US
    } else if us > i64::from(MAX_PERIOD_US) {
        MAX_PERIOD_US
    } else {
        us as u32
    }
}

/// Compute counter ticks and prescaler for a period of `period_us` when the
/// timer is clocked at `clock`.
///
/// `period_us` is clamped first. The product of clock and period is formed
/// in 64 bits, shifted down two bits per prescaler step until the tick count
/// drops below 65535, then truncated to whole ticks.
pub fn resolve(period_us: u32, clock: Hertz) -> Timing {
    let period_us = clamp_period_us(i64::from(period_us));

    let mut cycles = u64::from(clock.0) * u64::from(period_us);
    let mut cks = 0;
    while cycles >= TICKS_LIMIT * US_PER_SECOND && cks < MAX_PRESCALER {
        cycles >>= PRESCALER_STEP_SHIFT;
        cks += 1;
    }

    let ticks = cycles / US_PER_SECOND;
    let ticks = u16::try_from(ticks).unwrap_or_else(|_| {
        warn!("period of {} us exceeds the slowest prescaler", period_us);
        u16::MAX
    });

    Timing {
        ticks,
        prescaler: Prescaler(cks),
    }
}

/// Counter operations on the reset-synchronized channel 3/4 pair.
///
/// Implemented for every [`Registers`] backend.
pub trait CounterExt: Registers {
    /// Start or stop both counters.
    #[inline]
    fn set_counting(&mut self, enable: bool) {
        self.modify8(Reg8::Tstr, |tstr| {
            if enable {
                tstr | TSTR_CST3
            } else {
                tstr & !TSTR_CST3
            }
        });
    }

    /// Whether the counters are running.
    #[inline]
    fn is_counting(&self) -> bool {
        self.read8(Reg8::Tstr) & TSTR_CST3 != 0
    }

    /// Program prescaler, output mode and output enables.
    ///
    /// The counter must be stopped.
    #[inline]
    fn configure_reset_sync(&mut self, prescaler: Prescaler, outputs: u8) {
        self.write8(Reg8::Tcr3, TCR_CCLR_TGRA | prescaler.bits());
        self.write8(Reg8::Tocr1, TOCR1_VALUE);
        self.write8(Reg8::Tocr2, TOCR2_VALUE);
        self.write8(Reg8::Tmdr3, TMDR3_RESET_SYNC_PWM);
        self.write8(Reg8::Tmdr4, TMDR4_BUFFERED);
        self.write_output_enable(outputs);
    }

    /// Write the output enable register. `outputs` holds one bit per channel.
    #[inline]
    fn write_output_enable(&mut self, outputs: u8) {
        self.write8(Reg8::Toer, TOER_RESERVED | outputs);
    }

    /// Reset both counters to zero.
    #[inline]
    fn clear_counters(&mut self) {
        self.write16(Reg16::Tcnt3, 0);
        self.write16(Reg16::Tcnt4, 0);
    }

    /// Set the counter top. Written to TGRA_3 and its buffer TGRC_3.
    #[inline]
    fn set_top(&mut self, ticks: u16) {
        self.write16(Reg16::Tgra3, ticks);
        self.write16(Reg16::Tgrc3, ticks);
    }
}

impl<R: Registers> CounterExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpg::Cpg;

    #[test]
    fn fast_clock_one_millisecond() {
        let timing = resolve(1_000, Hertz(66_666_000));
        assert_eq!(timing.prescaler.bits(), 1);
        assert_eq!(timing.prescaler.shift(), 2);
        assert_eq!(timing.ticks, 16_666);
        assert_eq!(
            u64::from(timing.ticks),
            66_666_000 * 1_000 / 1_000_000 / u64::from(timing.prescaler.divider())
        );
    }

    #[test]
    fn no_prescaler_when_it_fits() {
        let timing = resolve(1_000, Cpg::CM0_P0_CLK);
        assert_eq!(timing.prescaler, Prescaler::DIV1);
        assert_eq!(timing.ticks, 33_333);
    }

    #[test]
    fn longest_period_fits_in_slowest_prescaler() {
        let timing = resolve(MAX_PERIOD_US, Cpg::CM0_P0_CLK);
        assert_eq!(timing.prescaler, Prescaler::DIV1024);
        assert_eq!(timing.ticks, 65_104);
    }

    #[test]
    fn saturates_beyond_slowest_prescaler() {
        let timing = resolve(MAX_PERIOD_US, Hertz(66_666_000));
        assert_eq!(timing.prescaler, Prescaler::DIV1024);
        assert_eq!(timing.ticks, u16::MAX);
    }

    #[test]
    fn clamps_period() {
        assert_eq!(clamp_period_us(0), MIN_PERIOD_US);
        assert_eq!(clamp_period_us(-25), MIN_PERIOD_US);
        assert_eq!(clamp_period_us(3_000_000), MAX_PERIOD_US);
        assert_eq!(clamp_period_us(20_000), 20_000);
        assert_eq!(
            resolve(3_000_000, Cpg::CM1_P0_CLK),
            resolve(2_000_000, Cpg::CM1_P0_CLK)
        );
        assert_eq!(resolve(0, Cpg::CM1_P0_CLK), resolve(1, Cpg::CM1_P0_CLK));
    }

    #[test]
    fn shortest_period() {
        assert_eq!(resolve(1, Cpg::CM0_P0_CLK).ticks, 33);
    }
}
