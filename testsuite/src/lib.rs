//! Host side fakes for the MTU2 driver.
//!
//! [`FakeRegisters`] is a shared in-memory register bank that records every
//! write, so a test can hand one clone to the driver and inspect the other.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;
use embedded_time::rate::Hertz;
use void::Void;

use mtu2_pwm::cpg::{ClockMode, ClockSource};
use mtu2_pwm::gpio::Rza1Pins;
use mtu2_pwm::pwm::Mtu2;
use mtu2_pwm::reg::{Reg16, Reg8, Registers};

/// One recorded register write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Write {
    Byte(Reg8, u8),
    Half(Reg16, u16),
}

impl Write {
    /// Address of the written register.
    pub fn address(&self) -> usize {
        match self {
            Write::Byte(reg, _) => reg.address(),
            Write::Half(reg, _) => reg.address(),
        }
    }
}

#[derive(Debug)]
struct Bank {
    bytes: Vec<u8>,
    halves: Vec<u16>,
    log: Vec<Write>,
}

impl Bank {
    fn reset() -> Self {
        let mut bytes = vec![0; Reg8::ALL.len()];
        // MTU2 in module standby
        bytes[Reg8::Stbcr3.index()] = 0xFF;
        bytes[Reg8::Toer.index()] = 0xC0;
        Bank {
            bytes,
            halves: vec![0xFFFF; Reg16::ALL.len()],
            log: Vec::new(),
        }
    }
}

/// In-memory [`Registers`] with reset values of the RZ/A1H.
#[derive(Clone, Debug)]
pub struct FakeRegisters(Rc<RefCell<Bank>>);

impl FakeRegisters {
    pub fn new() -> Self {
        FakeRegisters(Rc::new(RefCell::new(Bank::reset())))
    }

    /// Current value of an 8-bit register.
    pub fn peek8(&self, reg: Reg8) -> u8 {
        self.0.borrow().bytes[reg.index()]
    }

    /// Current value of a 16-bit register.
    pub fn peek16(&self, reg: Reg16) -> u16 {
        self.0.borrow().halves[reg.index()]
    }

    /// Set a register without recording the write.
    pub fn poke16(&self, reg: Reg16, value: u16) {
        self.0.borrow_mut().halves[reg.index()] = value;
    }

    /// Every write since creation or the last [`FakeRegisters::clear_log`].
    pub fn writes(&self) -> Vec<Write> {
        self.0.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }

    /// Snapshot of all register values.
    pub fn snapshot(&self) -> (Vec<u8>, Vec<u16>) {
        let bank = self.0.borrow();
        (bank.bytes.clone(), bank.halves.clone())
    }
}

impl Default for FakeRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers for FakeRegisters {
    fn read8(&self, reg: Reg8) -> u8 {
        self.peek8(reg)
    }

    fn write8(&mut self, reg: Reg8, value: u8) {
        let mut bank = self.0.borrow_mut();
        bank.bytes[reg.index()] = value;
        bank.log.push(Write::Byte(reg, value));
    }

    fn read16(&self, reg: Reg16) -> u16 {
        self.peek16(reg)
    }

    fn write16(&mut self, reg: Reg16, value: u16) {
        let mut bank = self.0.borrow_mut();
        bank.halves[reg.index()] = value;
        bank.log.push(Write::Half(reg, value));
    }
}

/// Clock source with an arbitrary P0φ.
#[derive(Clone, Copy, Debug)]
pub struct FakeClock(pub Hertz);

impl ClockSource for FakeClock {
    fn clock_mode(&self) -> ClockMode {
        ClockMode::Mode1
    }

    fn frequency(&self, _mode: ClockMode) -> Hertz {
        self.0
    }
}

/// P0φ of a GR-PEACH.
pub const GR_PEACH_CLOCK: FakeClock = FakeClock(Hertz(32_000_000));

/// A group on fresh fake registers, clocked like a GR-PEACH.
pub fn mtu2() -> (Mtu2<FakeRegisters, FakeClock, Rza1Pins>, FakeRegisters) {
    mtu2_clocked(GR_PEACH_CLOCK)
}

/// A group on fresh fake registers with the given clock.
pub fn mtu2_clocked(clock: FakeClock) -> (Mtu2<FakeRegisters, FakeClock, Rza1Pins>, FakeRegisters) {
    let registers = FakeRegisters::new();
    (Mtu2::new(registers.clone(), clock, Rza1Pins), registers)
}

/// Output pin remembering its level.
#[derive(Clone, Debug, Default)]
pub struct FakePin(Rc<Cell<Option<bool>>>);

impl FakePin {
    /// `None` until the pin was first driven.
    pub fn level(&self) -> Option<bool> {
        self.0.get()
    }
}

impl OutputPin for FakePin {
    type Error = Void;

    fn set_low(&mut self) -> Result<(), Void> {
        self.0.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Void> {
        self.0.set(Some(true));
        Ok(())
    }
}

/// PWM output remembering its raw duty.
#[derive(Clone, Debug)]
pub struct FakePwm {
    duty: Rc<Cell<u16>>,
    max: u16,
}

impl FakePwm {
    pub fn new(max: u16) -> Self {
        FakePwm {
            duty: Rc::new(Cell::new(u16::MAX)),
            max,
        }
    }
}

impl PwmPin for FakePwm {
    type Duty = u16;

    fn disable(&mut self) {}

    fn enable(&mut self) {}

    fn get_duty(&self) -> u16 {
        self.duty.get()
    }

    fn get_max_duty(&self) -> u16 {
        self.max
    }

    fn set_duty(&mut self, duty: u16) {
        self.duty.set(duty);
    }
}
