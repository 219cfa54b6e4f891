//! Register file.
//!
//! Every register lives in one 30-byte array so that each 8-bit register
//! is also the low or high half of a 16-bit pair. Pairs sit at even
//! offsets, low byte first, which keeps pair/half aliasing exact: writing
//! `Reg16::Hl` is observable through `Reg8::H` and `Reg8::L` and the other
//! way around.

pub const REGISTER_FILE_SIZE: usize = 30;

/// 8-bit view of the register file. The discriminant is the byte offset.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg8 {
    Pcl = 0,
    Pch = 1,
    R = 2,
    I = 3,
    Z = 4,
    W = 5,
    Spl = 6,
    Sph = 7,
    Iyl = 8,
    Iyh = 9,
    Ixl = 10,
    Ixh = 11,
    L = 12,
    H = 13,
    LAlt = 14,
    HAlt = 15,
    E = 16,
    D = 17,
    EAlt = 18,
    DAlt = 19,
    C = 20,
    B = 21,
    CAlt = 22,
    BAlt = 23,
    F = 24,
    A = 25,
    FAlt = 26,
    AAlt = 27,
    Iff1 = 28,
    Iff2 = 29,
}

/// 16-bit view of the register file. The discriminant is the byte offset
/// of the low half.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg16 {
    Pc = 0,
    /// R in the low byte, I in the high byte: the refresh address.
    Ir = 2,
    Wz = 4,
    Sp = 6,
    Iy = 8,
    Ix = 10,
    Hl = 12,
    HlAlt = 14,
    De = 16,
    DeAlt = 18,
    Bc = 20,
    BcAlt = 22,
    Af = 24,
    AfAlt = 26,
    /// IFF1 in the low byte, IFF2 in the high byte.
    Iff = 28,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    bytes: [u8; REGISTER_FILE_SIZE],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every register, including the hidden WZ latch and the
    /// interrupt flip-flops.
    pub fn clear(&mut self) {
        self.bytes = [0; REGISTER_FILE_SIZE];
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        self.bytes[reg as usize]
    }

    pub fn set8(&mut self, reg: Reg8, val: u8) {
        self.bytes[reg as usize] = val;
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        let i = reg as usize;
        u16::from_le_bytes([self.bytes[i], self.bytes[i + 1]])
    }

    pub fn set16(&mut self, reg: Reg16, val: u16) {
        let i = reg as usize;
        self.bytes[i..i + 2].copy_from_slice(&val.to_le_bytes());
    }

    /// Swap the contents of two register pairs.
    pub fn exchange(&mut self, a: Reg16, b: Reg16) {
        let tmp = self.get16(a);
        self.set16(a, self.get16(b));
        self.set16(b, tmp);
    }

    /// Raw backing store, in offset order.
    pub fn as_bytes(&self) -> &[u8; REGISTER_FILE_SIZE] {
        &self.bytes
    }

    // Shorthands for the registers the step machine touches on almost
    // every instruction.
    pub fn a(&self) -> u8 {
        self.get8(Reg8::A)
    }

    pub fn set_a(&mut self, val: u8) {
        self.set8(Reg8::A, val)
    }

    pub fn f(&self) -> u8 {
        self.get8(Reg8::F)
    }

    pub fn set_f(&mut self, val: u8) {
        self.set8(Reg8::F, val)
    }

    pub fn pc(&self) -> u16 {
        self.get16(Reg16::Pc)
    }

    pub fn set_pc(&mut self, val: u16) {
        self.set16(Reg16::Pc, val)
    }

    pub fn sp(&self) -> u16 {
        self.get16(Reg16::Sp)
    }

    pub fn set_sp(&mut self, val: u16) {
        self.set16(Reg16::Sp, val)
    }

    pub fn wz(&self) -> u16 {
        self.get16(Reg16::Wz)
    }

    pub fn set_wz(&mut self, val: u16) {
        self.set16(Reg16::Wz, val)
    }

    pub fn iff1(&self) -> bool {
        self.get8(Reg8::Iff1) != 0
    }

    pub fn iff2(&self) -> bool {
        self.get8(Reg8::Iff2) != 0
    }
}
