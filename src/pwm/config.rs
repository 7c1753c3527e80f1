//! Types for configuring the PWM group.

use embedded_time::duration::Microseconds;

/// Period applied when nothing else was requested.
pub const DEFAULT_PERIOD_US: u32 = 1_000;

/// Configuration of the shared PWM period.
///
/// Create a configuration by using `default` in combination with the
/// builder methods:
/// ```
/// # use mtu2_pwm::pwm::Config;
/// # use embedded_time::duration::Microseconds;
/// let config = Config::default().period(Microseconds(20_000_u32));
///
/// assert!(config.period == Microseconds(20_000_u32));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Config {
    /// Period shared by all outputs. Clamped to
    /// [`MIN_PERIOD_US`](crate::timer::MIN_PERIOD_US)..=[`MAX_PERIOD_US`](crate::timer::MAX_PERIOD_US)
    /// when applied.
    pub period: Microseconds,
}

impl Config {
    /// Sets the period.
    pub fn period(mut self, period: impl Into<Microseconds>) -> Self {
        self.period = period.into();
        self
    }
}

impl Default for Config {
    /// 1 ms, i.e. 1 kHz
    fn default() -> Config {
        Config {
            period: Microseconds(DEFAULT_PERIOD_US),
        }
    }
}

impl From<Microseconds> for Config {
    fn from(period: Microseconds) -> Self {
        Self::default().period(period)
    }
}
