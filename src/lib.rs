/*!
 # MTU2 reset-synchronized PWM for the RZ/A1H

   Drives the three outputs of the MTU2 channel 3/4 pair (TIOC3B, TIOC4A,
   TIOC4B) in reset-synchronized PWM mode. All outputs share one period; each
   has its own duty cycle.

   The hardware is reached through three collaborators, so the driver runs
   unchanged against the real device and against in-memory fakes:

   *   [`reg::Registers`]: register access, [`reg::Mmio`] on the device
   *   [`cpg::ClockSource`]: the P0φ frequency, [`cpg::Cpg`] on the device
   *   [`gpio::PinMap`]: pin to output lookup, [`gpio::Rza1Pins`] on the device

   Start with [`pwm::Mtu2`]. [`motor::Motor`] builds a direction pin pair and
   one output into a DC motor driver.

   Every operation on the group runs inside a [`critical_section`]. The
   application has to provide an implementation for its target.

   ## Logging

   Enable the `defmt` feature to log allocation, period programming and
   prescaler saturation through `defmt`.
*/
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod macros;

pub use embedded_hal as hal;
pub use embedded_time as time;

pub mod cpg;
pub mod gpio;
pub mod motor;
pub mod prelude;
pub mod pwm;
pub mod reg;
pub mod timer;
