//! # DC motor on a direction pin pair
//!
//! A brushed motor behind an H-bridge with two direction inputs and one PWM
//! enable input (TB6612, L298N and similar):
//!
//! | IN1 | IN2 | Function |
//! |-----|-----|----------|
//! | L   | H   | Forward  |
//! | H   | L   | Reverse  |
//! | L   | L   | Stop     |
//!
//! The speed magnitude drives the duty cycle of the enable input.

use crate::hal::digital::v2::OutputPin;
use crate::hal::PwmPin;

/// Direction the motor was last commanded to turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// IN1 low, IN2 high
    Forward,
    /// IN1 high, IN2 low
    Reverse,
    /// Both inputs low, zero duty
    Stopped,
}

/// A DC motor driven by two direction pins and a PWM output.
pub struct Motor<IN1, IN2, PWM> {
    in1: IN1,
    in2: IN2,
    pwm: PWM,
    direction: Direction,
}

impl<IN1, IN2, PWM, E> Motor<IN1, IN2, PWM>
where
    IN1: OutputPin<Error = E>,
    IN2: OutputPin<Error = E>,
    PWM: PwmPin<Duty = u16>,
{
    /// Take the pins and stop the motor.
    pub fn new(in1: IN1, in2: IN2, pwm: PWM) -> Result<Self, E> {
        let mut motor = Motor {
            in1,
            in2,
            pwm,
            direction: Direction::Stopped,
        };
        motor.stop()?;
        Ok(motor)
    }

    /// Turn at `speed`. Positive values turn forward, negative values in
    /// reverse; `i16::MAX` is full duty.
    pub fn drive(&mut self, speed: i16) -> Result<(), E> {
        if speed >= 0 {
            self.in1.set_low()?;
            self.in2.set_high()?;
            self.direction = Direction::Forward;
        } else {
            self.in1.set_high()?;
            self.in2.set_low()?;
            self.direction = Direction::Reverse;
        }

        let magnitude = speed.unsigned_abs().min(i16::MAX as u16);
        let max = self.pwm.get_max_duty();
        let duty = u32::from(max) * u32::from(magnitude) / i16::MAX as u32;
        // `magnitude <= i16::MAX` keeps `duty <= max`
        self.pwm.set_duty(duty as u16);
        trace!("drive {}: duty {}/{}", speed, duty, max);
        Ok(())
    }

    /// Pull both direction pins low and drop the duty to zero.
    pub fn stop(&mut self) -> Result<(), E> {
        self.in1.set_low()?;
        self.in2.set_low()?;
        self.pwm.set_duty(0);
        self.direction = Direction::Stopped;
        Ok(())
    }

    /// Last commanded direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Hand back the pins. The motor keeps its last command.
    pub fn release(self) -> (IN1, IN2, PWM) {
        (self.in1, self.in2, self.pwm)
    }
}
