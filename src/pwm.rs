//! # Reset-synchronized PWM
//!
//! MTU2 channels 3 and 4 run as one synchronized pair. Channel 3 counts up to
//! TGRA_3 and clears both counters, so every output shares a single period.
//! Three outputs are available, each with its own match register:
//!
//! | Output | Match register | TOER bit |
//! |--------|----------------|----------|
//! | TIOC3B | TGRD_3         | 0        |
//! | TIOC4A | TGRC_4         | 1        |
//! | TIOC4B | TGRD_4         | 2        |
//!
//! [`Mtu2`] owns the hardware and the group state. [`Mtu2::pwm_out`] hands out
//! one [`PwmOut`] per output; the handle frees its output when dropped.
//!
//! ```no_run
//! use mtu2_pwm::cpg::Cpg;
//! use mtu2_pwm::gpio::{Rza1Pins, P4_4};
//! use mtu2_pwm::reg::Mmio;
//! use mtu2_pwm::pwm::Mtu2;
//!
//! let mtu2 = Mtu2::new(unsafe { Mmio::steal() }, Cpg::default(), Rza1Pins);
//! let mut out = mtu2.pwm_out(P4_4).unwrap();
//! mtu2.set_period_us(20_000);
//! out.pulsewidth_us(1_500);
//! ```

use core::cell::RefCell;
use core::convert::TryFrom;

use critical_section::Mutex;
use embedded_time::duration::Microseconds;

use crate::cpg::{self, ClockSource};
use crate::gpio::{AltFunction, PinMap, PinName};
use crate::hal::PwmPin;
use crate::reg::{Reg16, Registers};
use crate::timer::{self, CounterExt, Prescaler, Timing};

pub mod config;

pub use config::Config;

/// Number of reset-synchronized outputs.
pub const CHANNELS: usize = 3;

/// Match registers zeroed when the group is first used.
const RESET_MATCH_REGISTERS: [Reg16; 6] = [
    Reg16::Tgrb3,
    Reg16::Tgrd3,
    Reg16::Tgra4,
    Reg16::Tgrc4,
    Reg16::Tgrb4,
    Reg16::Tgrd4,
];

/// Reset-synchronized PWM output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// TIOC3B
    Tioc3b = 0,
    /// TIOC4A
    Tioc4a = 1,
    /// TIOC4B
    Tioc4b = 2,
}

impl Channel {
    /// All outputs, in TOER bit order.
    pub const ALL: [Channel; CHANNELS] = [Channel::Tioc3b, Channel::Tioc4a, Channel::Tioc4b];

    /// The bit of this output in the allocation and TOER masks.
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }

    /// The register holding the duty cycle of this output.
    #[inline]
    pub const fn match_register(self) -> Reg16 {
        match self {
            Channel::Tioc3b => Reg16::Tgrd3,
            Channel::Tioc4a => Reg16::Tgrc4,
            Channel::Tioc4b => Reg16::Tgrd4,
        }
    }
}

/// PWM error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The pin is not connected to any reset-synchronized output.
    NoSuchPeripheralMapping,
    /// The output is already owned by another [`PwmOut`].
    AlreadyInUse,
}

/// Lifecycle of the shared counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// The MTU2 is still in module standby.
    Uninitialized,
    /// The module clock runs but no period was programmed yet.
    ModuleEnabled,
    /// The counter is halted while being reconfigured.
    Stopped,
    /// The counter runs with the programmed period.
    Running,
}

/// State shared by all outputs.
struct Group<R, C> {
    registers: R,
    clocks: C,
    /// Last requested period, clamped.
    period_us: u32,
    timing: Timing,
    /// Outputs owned by a handle.
    allocated: u8,
    /// Outputs enabled in TOER.
    outputs: u8,
    module_enabled: bool,
    /// Set once the match registers were reset, cleared when the last output is freed.
    initialized: bool,
    state: State,
}

impl<R, C> Group<R, C> {
    const fn new(registers: R, clocks: C, period_us: u32) -> Self {
        Group {
            registers,
            clocks,
            period_us,
            timing: Timing::UNSET,
            allocated: 0,
            outputs: 0,
            module_enabled: false,
            initialized: false,
            state: State::Uninitialized,
        }
    }
}

impl<R, C> Group<R, C>
where
    R: Registers,
    C: ClockSource,
{
    fn allocate(&mut self, channel: Channel) -> Result<(), Error> {
        if self.allocated & channel.mask() != 0 {
            return Err(Error::AlreadyInUse);
        }

        if !self.module_enabled {
            self.enable_module();
        }
        if !self.initialized {
            self.reset_match_registers();
        }

        self.allocated |= channel.mask();
        self.outputs |= channel.mask();
        self.apply_period(self.period_us);
        Ok(())
    }

    fn free(&mut self, channel: Channel) {
        self.write(channel, 0.0);
        self.allocated &= !channel.mask();
        self.outputs &= !channel.mask();
        if self.allocated == 0 {
            self.initialized = false;
        }
        debug!("freed {}", channel);
    }

    fn enable_module(&mut self) {
        if !cpg::is_mtu2_enabled(&self.registers) {
            cpg::enable_mtu2(&mut self.registers);
        }
        self.module_enabled = true;
        if self.state == State::Uninitialized {
            self.state = State::ModuleEnabled;
        }
        trace!("MTU2 out of module standby");
    }

    fn reset_match_registers(&mut self) {
        self.registers.set_counting(false);
        if self.state == State::Running {
            self.state = State::Stopped;
        }
        for &register in RESET_MATCH_REGISTERS.iter() {
            self.registers.write16(register, 0);
        }
        self.initialized = true;
        trace!("match registers reset");
    }

    /// Reprogram the counter for `period_us`, which must already be clamped.
    ///
    /// Before the module is enabled the period is only remembered.
    fn apply_period(&mut self, period_us: u32) {
        self.period_us = period_us;
        if !self.module_enabled {
            trace!("period {} us deferred", period_us);
            return;
        }

        self.registers.set_counting(false);
        self.state = State::Stopped;

        let previous = self.timing.ticks;
        let timing = timer::resolve(period_us, self.clocks.p0clk());

        self.registers
            .configure_reset_sync(timing.prescaler, self.outputs);
        self.registers.clear_counters();
        self.registers.set_top(timing.ticks);

        // Keep the duty ratio of every output, allocated or not.
        for channel in Channel::ALL.iter() {
            self.rescale(channel.match_register(), previous, timing.ticks);
        }

        self.registers.set_counting(true);
        self.state = State::Running;
        self.timing = timing;
        debug!(
            "period {} us: {} ticks, prescaler {}",
            period_us,
            timing.ticks,
            timing.prescaler.bits()
        );
    }

    fn rescale(&mut self, register: Reg16, previous: u16, ticks: u16) {
        let raw = if previous == 0 {
            0
        } else {
            let scaled =
                u32::from(self.registers.read16(register)) * u32::from(ticks) / u32::from(previous);
            u16::try_from(scaled).unwrap_or(u16::MAX)
        };
        self.registers.write16(register, raw);
    }

    fn write(&mut self, channel: Channel, value: f32) {
        let value = if value < 0.0 {
            0.0
        } else if value > 1.0 {
            1.0
        } else {
            value
        };
        // NaN compares false both ways and converts to zero.
        let raw = (f32::from(self.timing.ticks) * value) as u16;
        self.write_raw(channel, raw);
    }

    fn write_raw(&mut self, channel: Channel, raw: u16) {
        let ticks = self.timing.ticks;
        let mut raw = raw.min(ticks);
        // A match at the counter top never fires, the output would stay low.
        if raw == ticks && raw != 0 {
            raw -= 1;
        }
        self.registers.write16(channel.match_register(), raw);
    }

    fn raw(&self, channel: Channel) -> u16 {
        self.registers.read16(channel.match_register())
    }

    fn read(&self, channel: Channel) -> f32 {
        let ticks = self.timing.ticks;
        if ticks == 0 {
            return 0.0;
        }
        let duty = f32::from(self.raw(channel)) / f32::from(ticks);
        if duty > 1.0 {
            1.0
        } else {
            duty
        }
    }

    fn pulsewidth_us(&mut self, channel: Channel, us: i64) {
        let value = us as f32 / self.period_us as f32;
        self.write(channel, value);
    }

    fn set_output(&mut self, channel: Channel, enable: bool) {
        if enable {
            self.outputs |= channel.mask();
        } else {
            self.outputs &= !channel.mask();
        }
        self.registers.write_output_enable(self.outputs);
    }
}

/// The MTU2 channel 3/4 pair in reset-synchronized PWM mode.
///
/// The period is shared: changing it through any handle, or through
/// `Mtu2` directly, affects every output. Duty cycles are kept as ratios
/// across period changes.
pub struct Mtu2<R, C, P> {
    group: Mutex<RefCell<Group<R, C>>>,
    pins: P,
}

impl<R, C, P> Mtu2<R, C, P> {
    /// Take ownership of the register backend, the clock description and
    /// the pin table. Nothing is written until the first output is
    /// allocated. The period defaults to 1 ms.
    pub const fn new(registers: R, clocks: C, pins: P) -> Self {
        Mtu2 {
            group: Mutex::new(RefCell::new(Group::new(
                registers,
                clocks,
                config::DEFAULT_PERIOD_US,
            ))),
            pins,
        }
    }

    /// Releases the hardware.
    ///
    /// All [`PwmOut`] handles must have been dropped. The counter keeps its
    /// last configuration.
    pub fn release(self) -> (R, C, P) {
        let group = self.group.into_inner().into_inner();
        (group.registers, group.clocks, self.pins)
    }
}

impl<R, C, P> Mtu2<R, C, P>
where
    R: Registers,
    C: ClockSource,
    P: PinMap,
{
    /// Like [`Mtu2::new`], with the initial period taken from `config`.
    pub fn with_config(registers: R, clocks: C, pins: P, config: Config) -> Self {
        let period_us = timer::clamp_period_us(i64::from(config.period.0));
        Mtu2 {
            group: Mutex::new(RefCell::new(Group::new(registers, clocks, period_us))),
            pins,
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Group<R, C>) -> T) -> T {
        critical_section::with(|cs| f(&mut self.group.borrow_ref_mut(cs)))
    }

    /// Claim the output driven by `pin`.
    ///
    /// The first allocation takes the MTU2 out of module standby and zeroes
    /// the match registers. Every allocation reprograms the counter with the
    /// current period and enables the output.
    ///
    /// Routing `pin` to the returned alternate function is up to the caller.
    pub fn pwm_out(&self, pin: PinName) -> Result<PwmOut<'_, R, C, P>, Error> {
        let function = self
            .pins
            .resolve(pin)
            .ok_or(Error::NoSuchPeripheralMapping)?;
        let channel = function.channel;

        self.with(|group| group.allocate(channel))?;
        debug!("P{}_{} drives {}", pin.port, pin.bit, channel);

        Ok(PwmOut {
            mtu2: self,
            channel,
            alt: function.alt,
        })
    }

    /// Set the period in seconds. Fractions of a microsecond are dropped.
    pub fn set_period(&self, seconds: f32) {
        self.set_period_clamped((seconds * 1_000_000.0) as i64);
    }

    /// Set the period in milliseconds.
    pub fn set_period_ms(&self, ms: i32) {
        self.set_period_clamped(i64::from(ms) * 1_000);
    }

    /// Set the period in microseconds.
    ///
    /// The period is clamped to
    /// [`MIN_PERIOD_US`](timer::MIN_PERIOD_US)..=[`MAX_PERIOD_US`](timer::MAX_PERIOD_US).
    pub fn set_period_us(&self, us: i32) {
        self.set_period_clamped(i64::from(us));
    }

    fn set_period_clamped(&self, us: i64) {
        let period_us = timer::clamp_period_us(us);
        self.with(|group| group.apply_period(period_us));
    }

    /// The last requested period, after clamping.
    pub fn period(&self) -> Microseconds {
        Microseconds(self.with(|group| group.period_us))
    }

    /// Counter top for the current period, zero before the counter was
    /// first programmed.
    pub fn period_ticks(&self) -> u16 {
        self.with(|group| group.timing.ticks)
    }

    /// Prescaler for the current period.
    pub fn prescaler(&self) -> Prescaler {
        self.with(|group| group.timing.prescaler)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.with(|group| group.state)
    }

    /// Whether a [`PwmOut`] currently owns `channel`.
    pub fn is_allocated(&self, channel: Channel) -> bool {
        self.with(|group| group.allocated & channel.mask() != 0)
    }
}

/// A claimed PWM output.
///
/// Dropping the handle sets the duty cycle to zero and frees the output.
pub struct PwmOut<'a, R, C, P>
where
    R: Registers,
    C: ClockSource,
    P: PinMap,
{
    mtu2: &'a Mtu2<R, C, P>,
    channel: Channel,
    alt: AltFunction,
}

impl<'a, R, C, P> PwmOut<'a, R, C, P>
where
    R: Registers,
    C: ClockSource,
    P: PinMap,
{
    /// The output this handle owns.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Alternate function the pin has to be switched to.
    pub fn alt_function(&self) -> AltFunction {
        self.alt
    }

    /// The group this output belongs to.
    pub fn group(&self) -> &'a Mtu2<R, C, P> {
        self.mtu2
    }

    /// Set the duty cycle as a fraction of the period, clamped to `0.0..=1.0`.
    ///
    /// `1.0` is one tick short of the period so the output keeps toggling.
    pub fn write(&mut self, value: f32) {
        let channel = self.channel;
        self.mtu2.with(|group| group.write(channel, value));
    }

    /// The duty cycle as a fraction of the period.
    pub fn read(&self) -> f32 {
        let channel = self.channel;
        self.mtu2.with(|group| group.read(channel))
    }

    /// Set the high time in seconds, relative to the current period.
    pub fn pulsewidth(&mut self, seconds: f32) {
        self.set_pulsewidth_us((seconds * 1_000_000.0) as i64);
    }

    /// Set the high time in milliseconds.
    pub fn pulsewidth_ms(&mut self, ms: i32) {
        self.set_pulsewidth_us(i64::from(ms) * 1_000);
    }

    /// Set the high time in microseconds.
    pub fn pulsewidth_us(&mut self, us: i32) {
        self.set_pulsewidth_us(i64::from(us));
    }

    fn set_pulsewidth_us(&mut self, us: i64) {
        let channel = self.channel;
        self.mtu2.with(|group| group.pulsewidth_us(channel, us));
    }

    /// Set the period of the whole group. See [`Mtu2::set_period_us`].
    pub fn period_us(&mut self, us: i32) {
        self.mtu2.set_period_us(us);
    }

    /// Set the period of the whole group. See [`Mtu2::set_period_ms`].
    pub fn period_ms(&mut self, ms: i32) {
        self.mtu2.set_period_ms(ms);
    }

    /// Set the period of the whole group. See [`Mtu2::set_period`].
    pub fn period(&mut self, seconds: f32) {
        self.mtu2.set_period(seconds);
    }

    /// Free the output. Same as dropping the handle.
    pub fn free(self) {}
}

impl<'a, R, C, P> Drop for PwmOut<'a, R, C, P>
where
    R: Registers,
    C: ClockSource,
    P: PinMap,
{
    fn drop(&mut self) {
        let channel = self.channel;
        self.mtu2.with(|group| group.free(channel));
    }
}

impl<'a, R, C, P> PwmPin for PwmOut<'a, R, C, P>
where
    R: Registers,
    C: ClockSource,
    P: PinMap,
{
    type Duty = u16;

    fn disable(&mut self) {
        let channel = self.channel;
        self.mtu2.with(|group| group.set_output(channel, false));
    }

    fn enable(&mut self) {
        let channel = self.channel;
        self.mtu2.with(|group| group.set_output(channel, true));
    }

    fn get_duty(&self) -> u16 {
        let channel = self.channel;
        self.mtu2.with(|group| group.raw(channel))
    }

    /// Counter ticks per period.
    fn get_max_duty(&self) -> u16 {
        self.mtu2.with(|group| group.timing.ticks)
    }

    fn set_duty(&mut self, duty: u16) {
        let channel = self.channel;
        self.mtu2.with(|group| group.write_raw(channel, duty));
    }
}
