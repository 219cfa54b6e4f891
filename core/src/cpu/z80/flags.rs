//! Flag and ALU engine.
//!
//! Every flag rule lives here as a pure function of its inputs and the
//! incoming flag byte; the step machine only moves the results around.
//! Each entry point returns the new flag byte alongside its result.

use super::Quirks;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

const XY: u8 = Flag::X as u8 | Flag::Y as u8;

/// Which flags a result refreshes. Flags not selected keep their value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affects {
    pub carry: bool,
    pub parity: bool,
    pub zero: bool,
    pub sign: bool,
    pub xy: bool,
}

impl Affects {
    pub const NONE: Affects = Affects { carry: false, parity: false, zero: false, sign: false, xy: false };
    /// Logical results: everything except carry.
    pub const LOGIC: Affects = Affects { carry: false, parity: true, zero: true, sign: true, xy: true };
    /// Arithmetic results: overflow replaces parity and is set separately.
    pub const ARITH: Affects = Affects { carry: true, parity: false, zero: true, sign: true, xy: true };
    /// Accumulator rotates only touch carry and the mirror bits.
    pub const ROT_A: Affects = Affects { carry: true, parity: false, zero: false, sign: false, xy: true };
    pub const ROT: Affects = Affects { carry: true, parity: true, zero: true, sign: true, xy: true };
}

#[inline]
pub fn set_flag(f: u8, flag: Flag, on: bool) -> u8 {
    if on { f | flag as u8 } else { f & !(flag as u8) }
}

#[inline]
pub fn parity_even(val: u32) -> bool {
    val.count_ones() % 2 == 0
}

/// Update `f` from a raw (unmasked) result.
///
/// Carry is set when the raw value does not fit the 8 or 16-bit width;
/// subtraction callers pass a wrapped `u32`, so a borrow also overflows.
/// Zero, sign and parity look at the masked result. The mirror bits come
/// from bits 3 and 5 of the raw value.
pub fn opflags(f: u8, raw: u32, wide: bool, affects: Affects) -> u8 {
    let (mask, top) = if wide { (0xFFFF, 0x8000) } else { (0xFF, 0x80) };
    let result = raw & mask;
    let mut f = f;
    if affects.carry {
        f = set_flag(f, Flag::C, raw > mask);
    }
    if affects.parity {
        f = set_flag(f, Flag::PV, parity_even(result));
    }
    if affects.zero {
        f = set_flag(f, Flag::Z, result == 0);
    }
    if affects.sign {
        f = set_flag(f, Flag::S, result & top != 0);
    }
    if affects.xy {
        f = (f & !XY) | (raw as u8 & XY);
    }
    f
}

// --- 8-bit arithmetic/logical ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    /// Operation selected by the y field of `10 yyy zzz` / `11 yyy 110`.
    pub fn from_y(y: u8) -> AluOp {
        match y & 7 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// Combine the accumulator with an operand. Returns (new A, new F); CP
/// returns A unchanged.
pub fn alu(op: AluOp, a: u8, operand: u8, f: u8, quirks: Quirks) -> (u8, u8) {
    let carry = (f & Flag::C as u8) as u32;
    match op {
        AluOp::Add | AluOp::Adc => {
            let c = if op == AluOp::Adc { carry } else { 0 };
            let raw = a as u32 + operand as u32 + c;
            let res = raw as u8;
            let mut f = opflags(f, raw, false, Affects::ARITH);
            f = set_flag(f, Flag::PV, (a ^ res) & (operand ^ res) & 0x80 != 0);
            f = set_flag(f, Flag::N, false);
            if !quirks.simplified_half_carry {
                f = set_flag(f, Flag::H, (a & 0x0F) as u32 + (operand & 0x0F) as u32 + c > 0x0F);
            }
            (res, f)
        }
        AluOp::Sub | AluOp::Sbc | AluOp::Cp => {
            let c = if op == AluOp::Sbc { carry } else { 0 };
            let raw = (a as u32).wrapping_sub(operand as u32).wrapping_sub(c);
            let res = raw as u8;
            let mut f = opflags(f, raw, false, Affects::ARITH);
            f = set_flag(f, Flag::PV, (a ^ operand) & (a ^ res) & 0x80 != 0);
            f = set_flag(f, Flag::N, true);
            if !quirks.simplified_half_carry {
                f = set_flag(f, Flag::H, ((a & 0x0F) as u32) < (operand & 0x0F) as u32 + c);
            }
            if op == AluOp::Cp {
                // Mirror bits follow the operand for compare.
                f = (f & !XY) | (operand & XY);
                (a, f)
            } else {
                (res, f)
            }
        }
        AluOp::And | AluOp::Xor | AluOp::Or => {
            let res = match op {
                AluOp::And => a & operand,
                AluOp::Xor => a ^ operand,
                _ => a | operand,
            };
            let mut f = opflags(f, res as u32, false, Affects::LOGIC);
            f &= !(Flag::N as u8 | Flag::C as u8);
            f = set_flag(f, Flag::H, op == AluOp::And);
            (res, f)
        }
    }
}

/// INC r / INC (HL). Carry is preserved.
pub fn inc8(val: u8, f: u8, quirks: Quirks) -> (u8, u8) {
    let res = val.wrapping_add(1);
    let mut f = opflags(f, res as u32, false, Affects { zero: true, sign: true, xy: true, ..Affects::NONE });
    f = set_flag(f, Flag::PV, val == 0x7F);
    f = set_flag(f, Flag::N, false);
    if !quirks.simplified_half_carry {
        f = set_flag(f, Flag::H, val & 0x0F == 0x0F);
    }
    (res, f)
}

/// DEC r / DEC (HL). Carry is preserved.
pub fn dec8(val: u8, f: u8, quirks: Quirks) -> (u8, u8) {
    let res = val.wrapping_sub(1);
    let mut f = opflags(f, res as u32, false, Affects { zero: true, sign: true, xy: true, ..Affects::NONE });
    f = set_flag(f, Flag::PV, val == 0x80);
    f = set_flag(f, Flag::N, true);
    if !quirks.simplified_half_carry {
        f = set_flag(f, Flag::H, val & 0x0F == 0);
    }
    (res, f)
}

// --- Rotates and shifts ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    /// Undocumented: shift left, inserting 1.
    Sll,
    Srl,
}

impl RotOp {
    pub fn from_y(y: u8) -> RotOp {
        match y & 7 {
            0 => RotOp::Rlc,
            1 => RotOp::Rrc,
            2 => RotOp::Rl,
            3 => RotOp::Rr,
            4 => RotOp::Sla,
            5 => RotOp::Sra,
            6 => RotOp::Sll,
            _ => RotOp::Srl,
        }
    }
}

/// Rotate or shift `val`. `accumulator_form` selects the reduced flag set
/// of RLCA/RRCA/RLA/RRA; every other form updates S, Z and parity too.
/// H and N are always cleared.
pub fn rot(op: RotOp, val: u8, f: u8, accumulator_form: bool) -> (u8, u8) {
    let v = val as u32;
    let carry_in = (f & Flag::C as u8) as u32;
    // Bit 8 of the intermediate holds the outgoing carry.
    let raw = match op {
        RotOp::Rlc => (v << 1) | (v >> 7),
        RotOp::Rrc => (v >> 1) | ((v & 1) << 7) | ((v & 1) << 8),
        RotOp::Rl => (v << 1) | carry_in,
        RotOp::Rr => (v >> 1) | (carry_in << 7) | ((v & 1) << 8),
        RotOp::Sla => v << 1,
        RotOp::Sra => (v >> 1) | (v & 0x80) | ((v & 1) << 8),
        RotOp::Sll => (v << 1) | 1,
        RotOp::Srl => (v >> 1) | ((v & 1) << 8),
    };
    let affects = if accumulator_form { Affects::ROT_A } else { Affects::ROT };
    let mut f = opflags(f, raw, false, affects);
    f &= !(Flag::N as u8 | Flag::H as u8);
    (raw as u8, f)
}

/// BIT b,v. The operand is not modified; only flags change.
pub fn bit(b: u8, val: u8, f: u8, quirks: Quirks) -> u8 {
    let set = val & (1 << (b & 7)) != 0;
    let mut f = opflags(f, val as u32, false, Affects { xy: true, ..Affects::NONE });
    f = set_flag(f, Flag::Z, !set);
    f = set_flag(f, Flag::PV, !set);
    if b == 7 && set {
        f |= Flag::S as u8;
    } else if !quirks.simplified_half_carry {
        f &= !(Flag::S as u8);
    }
    if !quirks.simplified_half_carry {
        f = set_flag(f, Flag::H, true);
        f = set_flag(f, Flag::N, false);
    }
    f
}

// --- 16-bit arithmetic ---

/// ADD HL,rr (no carry-in) and ADC HL,rr (carry-in). The carry-in form
/// also refreshes zero, sign and overflow.
pub fn add16(a: u16, b: u16, f: u8, carry_in: bool, quirks: Quirks) -> (u16, u8) {
    let c = if carry_in { (f & Flag::C as u8) as u32 } else { 0 };
    let raw = a as u32 + b as u32 + c;
    let res = raw as u16;
    let affects = Affects { carry: true, zero: carry_in, sign: carry_in, ..Affects::NONE };
    let mut f = opflags(f, raw, true, affects);
    if carry_in {
        f = set_flag(f, Flag::PV, (a ^ res) & (b ^ res) & 0x8000 != 0);
    }
    f = set_flag(f, Flag::N, false);
    f = (f & !XY) | ((res >> 8) as u8 & XY);
    if !quirks.simplified_half_carry {
        f = set_flag(f, Flag::H, (a & 0x0FFF) as u32 + (b & 0x0FFF) as u32 + c > 0x0FFF);
    }
    (res, f)
}

/// SBC HL,rr.
pub fn sbc16(a: u16, b: u16, f: u8, quirks: Quirks) -> (u16, u8) {
    let c = (f & Flag::C as u8) as u32;
    let raw = (a as u32).wrapping_sub(b as u32).wrapping_sub(c);
    let res = raw as u16;
    let affects = Affects { carry: true, zero: true, sign: true, ..Affects::NONE };
    let mut f = opflags(f, raw, true, affects);
    f = set_flag(f, Flag::PV, (a ^ b) & (a ^ res) & 0x8000 != 0);
    f = set_flag(f, Flag::N, true);
    f = (f & !XY) | ((res >> 8) as u8 & XY);
    if !quirks.simplified_half_carry {
        f = set_flag(f, Flag::H, ((a & 0x0FFF) as u32) < (b & 0x0FFF) as u32 + c);
    }
    (res, f)
}

// --- Accumulator specials ---

/// Decimal adjust after a BCD add or subtract.
pub fn daa(a: u8, f: u8) -> (u8, u8) {
    let n = f & Flag::N as u8 != 0;
    let old_h = f & Flag::H as u8 != 0;
    let old_c = f & Flag::C as u8 != 0;

    let mut correction = 0u8;
    let mut new_c = old_c;
    if old_h || (a & 0x0F) > 9 {
        correction |= 0x06;
    }
    if old_c || a > 0x99 {
        correction |= 0x60;
        new_c = true;
    }
    let res = if n { a.wrapping_sub(correction) } else { a.wrapping_add(correction) };
    let new_h = if n { old_h && (a & 0x0F) < 6 } else { (a & 0x0F) > 9 };

    let mut f = opflags(f, res as u32, false, Affects::LOGIC);
    f = set_flag(f, Flag::C, new_c);
    f = set_flag(f, Flag::H, new_h);
    (res, f)
}

/// CPL: complement A, set H and N.
pub fn cpl(a: u8, f: u8) -> (u8, u8) {
    let res = !a;
    let f = (f & !XY) | (res & XY) | Flag::H as u8 | Flag::N as u8;
    (res, f)
}

/// SCF: set carry, clear H and N.
pub fn scf(a: u8, f: u8) -> u8 {
    let f = f & !(Flag::H as u8 | Flag::N as u8 | XY);
    f | Flag::C as u8 | (a & XY)
}

/// CCF: H takes the old carry, carry is inverted, N cleared.
pub fn ccf(a: u8, f: u8) -> u8 {
    let old_c = f & Flag::C as u8 != 0;
    let mut f = f & !(Flag::N as u8 | XY);
    f = set_flag(f, Flag::H, old_c);
    f = set_flag(f, Flag::C, !old_c);
    f | (a & XY)
}

/// Flags for results that are loaded rather than computed: IN r,(C),
/// RRD/RLD and LD A,I/R. S, Z, parity and the mirror bits follow the
/// value, H and N clear, carry preserved.
pub fn load_flags(val: u8, f: u8) -> u8 {
    opflags(f, val as u32, false, Affects::LOGIC) & !(Flag::H as u8 | Flag::N as u8)
}

// --- Block transfers ---

/// LDI/LDD/LDIR/LDDR: parity/overflow reports BC != 0, X and Y come from
/// bits 3 and 1 of (value + A). S, Z and C are preserved.
pub fn block_ld_flags(val: u8, a: u8, bc: u16, f: u8) -> u8 {
    let n = val.wrapping_add(a);
    let mut f = f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
    f = set_flag(f, Flag::PV, bc != 0);
    f = set_flag(f, Flag::X, n & 0x08 != 0);
    set_flag(f, Flag::Y, n & 0x02 != 0)
}

/// CPI/CPD/CPIR/CPDR: compare without storing, carry preserved,
/// parity/overflow reports BC != 0.
pub fn block_cp_flags(a: u8, val: u8, bc: u16, f: u8, quirks: Quirks) -> u8 {
    let res = a.wrapping_sub(val);
    let h = if quirks.simplified_half_carry {
        f & Flag::H as u8 != 0
    } else {
        (a & 0x0F) < (val & 0x0F)
    };
    let mut f = opflags(f, res as u32, false, Affects { zero: true, sign: true, ..Affects::NONE });
    f = set_flag(f, Flag::N, true);
    f = set_flag(f, Flag::H, h);
    f = set_flag(f, Flag::PV, bc != 0);
    let n = res.wrapping_sub(h as u8);
    f = set_flag(f, Flag::X, n & 0x08 != 0);
    set_flag(f, Flag::Y, n & 0x02 != 0)
}

/// INI/IND/OUTI/OUTD and repeats: flags follow the decremented B.
pub fn block_io_flags(b: u8, f: u8) -> u8 {
    let f = opflags(f, b as u32, false, Affects { zero: true, sign: true, xy: true, ..Affects::NONE });
    set_flag(f, Flag::N, true)
}
