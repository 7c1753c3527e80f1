//! Register access support
//!
//! The driver never touches memory directly. Every access goes through the
//! [`Registers`] trait, addressed by the typed identifiers [`Reg8`] and
//! [`Reg16`]. [`Mmio`] implements it with volatile accesses to the RZ/A1H
//! peripheral space; tests substitute an in-memory bank.

use core::ptr;

/// Declare a register width class together with the physical address of each member.
macro_rules! registers {
    ($(
        $bits:literal => {
            $($(#[$meta:meta])* $name:ident = $address:literal,)+
        }
    )+) => {
        paste::paste! {
            $(
                /// Registers of one access width used by the driver.
                #[derive(Clone, Copy, Debug, PartialEq, Eq)]
                #[cfg_attr(feature = "defmt", derive(defmt::Format))]
                pub enum [<Reg $bits>] {
                    $($(#[$meta])* $name,)+
                }

                impl [<Reg $bits>] {
                    /// Every register of this width, in declaration order.
                    pub const ALL: &'static [Self] = &[$(Self::$name),+];

                    /// Physical address of the register.
                    #[inline]
                    pub const fn address(self) -> usize {
                        match self {
                            $(Self::$name => $address,)+
                        }
                    }

                    /// Position of the register in [`Self::ALL`].
                    #[inline]
                    pub const fn index(self) -> usize {
                        self as usize
                    }
                }
            )+
        }
    };
}

registers! {
    8 => {
        /// CPG standby control register 3 (holds MSTP33, the MTU2 module stop bit)
        Stbcr3 = 0xFCFE_0420,
        /// Timer control register, channel 3
        Tcr3 = 0xFCFF_0200,
        /// Timer mode register, channel 3
        Tmdr3 = 0xFCFF_0202,
        /// Timer mode register, channel 4
        Tmdr4 = 0xFCFF_0203,
        /// Timer output master enable register
        Toer = 0xFCFF_020A,
        /// Timer output control register 1
        Tocr1 = 0xFCFF_020E,
        /// Timer output control register 2
        Tocr2 = 0xFCFF_020F,
        /// Timer start register
        Tstr = 0xFCFF_0280,
    }
    16 => {
        /// Timer counter, channel 3
        Tcnt3 = 0xFCFF_0210,
        /// Timer counter, channel 4
        Tcnt4 = 0xFCFF_0212,
        /// Period (counter clear) register of the synchronized pair
        Tgra3 = 0xFCFF_0218,
        Tgrb3 = 0xFCFF_021A,
        Tgra4 = 0xFCFF_021C,
        Tgrb4 = 0xFCFF_021E,
        /// Buffer register of [`Reg16::Tgra3`]
        Tgrc3 = 0xFCFF_0224,
        /// Match register of TIOC3B
        Tgrd3 = 0xFCFF_0226,
        /// Match register of TIOC4A
        Tgrc4 = 0xFCFF_0228,
        /// Match register of TIOC4B
        Tgrd4 = 0xFCFF_022A,
    }
}

/// Register level access to the MTU2 block and its clock gate.
///
/// All accesses are synchronous and cannot fail.
pub trait Registers {
    /// Read an 8-bit register.
    fn read8(&self, reg: Reg8) -> u8;

    /// Write an 8-bit register.
    fn write8(&mut self, reg: Reg8, value: u8);

    /// Read a 16-bit register.
    fn read16(&self, reg: Reg16) -> u16;

    /// Write a 16-bit register.
    fn write16(&mut self, reg: Reg16, value: u16);

    /// Read-modify-write an 8-bit register.
    #[inline]
    fn modify8(&mut self, reg: Reg8, f: impl FnOnce(u8) -> u8) {
        let value = self.read8(reg);
        self.write8(reg, f(value));
    }
}

/// Volatile access to the memory mapped registers of the RZ/A1H.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mmio {
    _0: (),
}

impl Mmio {
    /// Obtain the register backend.
    ///
    /// # Safety
    ///
    /// Only one instance may exist at a time, and it must be used on an RZ/A1H
    /// (or compatible) device where the addresses of [`Reg8`] and [`Reg16`]
    /// refer to the MTU2 and CPG blocks.
    pub const unsafe fn steal() -> Self {
        Mmio { _0: () }
    }
}

impl Registers for Mmio {
    #[inline]
    fn read8(&self, reg: Reg8) -> u8 {
        // SAFETY: `steal` guarantees the address maps to a readable peripheral register.
        unsafe { ptr::read_volatile(reg.address() as *const u8) }
    }

    #[inline]
    fn write8(&mut self, reg: Reg8, value: u8) {
        // SAFETY: see `read8`; `&mut self` serializes writers.
        unsafe { ptr::write_volatile(reg.address() as *mut u8, value) }
    }

    #[inline]
    fn read16(&self, reg: Reg16) -> u16 {
        // SAFETY: see `read8`. All 16-bit registers are halfword aligned.
        unsafe { ptr::read_volatile(reg.address() as *const u16) }
    }

    #[inline]
    fn write16(&mut self, reg: Reg16, value: u16) {
        // SAFETY: see `read16`.
        unsafe { ptr::write_volatile(reg.address() as *mut u16, value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfword_registers_are_aligned() {
        assert!(Reg16::ALL.iter().all(|reg| reg.address() % 2 == 0));
    }

    #[test]
    fn indices_follow_declaration_order() {
        for (position, reg) in Reg8::ALL.iter().enumerate() {
            assert_eq!(reg.index(), position);
        }
        for (position, reg) in Reg16::ALL.iter().enumerate() {
            assert_eq!(reg.index(), position);
        }
    }

    #[test]
    fn synchronized_pair_addresses() {
        assert_eq!(Reg16::Tgra3.address(), 0xFCFF_0218);
        assert_eq!(Reg16::Tgrc3.address(), 0xFCFF_0224);
        assert_eq!(Reg8::Tstr.address(), 0xFCFF_0280);
    }
}
