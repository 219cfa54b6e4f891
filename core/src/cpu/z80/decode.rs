//! Opcode decoding.
//!
//! An opcode byte splits into the classic fields
//! `x = bits 7-6, y = bits 5-3, z = bits 2-0, p = y >> 1, q = y & 1`.
//! Together with the latched prefix they select one [`Op`], the
//! instruction class the step machine runs.

use super::regs::{Reg8, Reg16};

/// Extracted opcode fields. Recomputed on every fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fields {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub p: u8,
    pub q: u8,
}

impl Fields {
    pub fn decode(opcode: u8) -> Self {
        let y = (opcode >> 3) & 7;
        Self {
            x: opcode >> 6,
            y,
            z: opcode & 7,
            p: y >> 1,
            q: y & 1,
        }
    }
}

/// Prefix byte latched ahead of the opcode it modifies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Prefix {
    #[default]
    None,
    Cb,
    Ed,
    Dd,
    Fd,
}

/// Register that stands in for HL under the active prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    Hl,
    Ix,
    Iy,
}

impl Index {
    pub fn pair(self) -> Reg16 {
        match self {
            Index::Hl => Reg16::Hl,
            Index::Ix => Reg16::Ix,
            Index::Iy => Reg16::Iy,
        }
    }
}

impl Prefix {
    pub fn index(self) -> Index {
        match self {
            Prefix::Dd => Index::Ix,
            Prefix::Fd => Index::Iy,
            _ => Index::Hl,
        }
    }
}

/// 8-bit operand table indexed by y or z. Slot 6 is the memory operand.
pub const R: [Option<Reg8>; 8] = [
    Some(Reg8::B),
    Some(Reg8::C),
    Some(Reg8::D),
    Some(Reg8::E),
    Some(Reg8::H),
    Some(Reg8::L),
    None,
    Some(Reg8::A),
];

/// Register pairs indexed by p for loads and 16-bit arithmetic.
pub const RP: [Reg16; 4] = [Reg16::Bc, Reg16::De, Reg16::Hl, Reg16::Sp];

/// Register pairs indexed by p for PUSH and POP.
pub const RP2: [Reg16; 4] = [Reg16::Bc, Reg16::De, Reg16::Hl, Reg16::Af];

/// Kind of ED block transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Ld,
    Cp,
    In,
    Out,
}

/// Instruction class selected by prefix and opcode.
///
/// Operand fields keep the decoder's naming: `y`/`z` index [`R`], `p`
/// indexes [`RP`] or [`RP2`], `cc` is a condition code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Op {
    #[default]
    Nop,
    ExAf,
    Djnz,
    Jr,
    JrCc(u8),
    LdRpNn(u8),
    AddHlRp(u8),
    /// LD (BC),A / LD (DE),A
    LdIndA(u8),
    /// LD A,(BC) / LD A,(DE)
    LdAInd(u8),
    LdNnHl,
    LdHlNn,
    LdNnA,
    LdANn,
    IncRp(u8),
    DecRp(u8),
    IncR(u8),
    DecR(u8),
    LdRN(u8),
    /// RLCA, RRCA, RLA, RRA
    RotA(u8),
    Daa,
    Cpl,
    Scf,
    Ccf,
    Halt,
    LdRR(u8, u8),
    AluR(u8, u8),
    AluN(u8),
    RetCc(u8),
    Pop(u8),
    Ret,
    Exx,
    JpHl,
    LdSpHl,
    JpCc(u8),
    Jp,
    OutNA,
    InAN,
    ExSpHl,
    ExDeHl,
    CallCc(u8),
    Call,
    Push(u8),
    Rst(u8),
    /// A prefix byte: latch it and fetch again.
    Prefix(Prefix),
    /// CB table: rotate/shift (x=0), BIT (1), RES (2), SET (3).
    Cb { x: u8, y: u8, z: u8 },
    /// DD CB d op / FD CB d op.
    IndexBits,
    InRC(u8),
    OutCR(u8),
    SbcHl(u8),
    AdcHl(u8),
    LdNnRp(u8),
    LdRpInd(u8),
    Neg,
    /// RETN and RETI.
    Retn,
    LdIA,
    LdRA,
    LdAI,
    LdAR,
    Rrd,
    Rld,
    Block { kind: BlockKind, decrement: bool, repeat: bool },
    /// Undefined ED opcode, executes as a two-fetch no-op.
    EdNop,
    /// DI, EI, IM n: interrupt machinery is not modelled.
    Unimplemented,
}

/// Decode an opcode under the latched prefix.
pub fn decode(prefix: Prefix, opcode: u8) -> Op {
    let f = Fields::decode(opcode);
    match prefix {
        Prefix::Cb => Op::Cb { x: f.x, y: f.y, z: f.z },
        Prefix::Ed => decode_ed(f),
        Prefix::Dd | Prefix::Fd if opcode == 0xCB => Op::IndexBits,
        Prefix::None | Prefix::Dd | Prefix::Fd => decode_main(f),
    }
}

fn decode_main(f: Fields) -> Op {
    let Fields { x, y, z, p, q } = f;
    match (x, z) {
        (0, 0) => match y {
            0 => Op::Nop,
            1 => Op::ExAf,
            2 => Op::Djnz,
            3 => Op::Jr,
            _ => Op::JrCc(y - 4),
        },
        (0, 1) if q == 0 => Op::LdRpNn(p),
        (0, 1) => Op::AddHlRp(p),
        (0, 2) => match (q, p) {
            (0, 0 | 1) => Op::LdIndA(p),
            (0, 2) => Op::LdNnHl,
            (0, _) => Op::LdNnA,
            (_, 0 | 1) => Op::LdAInd(p),
            (_, 2) => Op::LdHlNn,
            _ => Op::LdANn,
        },
        (0, 3) if q == 0 => Op::IncRp(p),
        (0, 3) => Op::DecRp(p),
        (0, 4) => Op::IncR(y),
        (0, 5) => Op::DecR(y),
        (0, 6) => Op::LdRN(y),
        (0, _) => match y {
            0..=3 => Op::RotA(y),
            4 => Op::Daa,
            5 => Op::Cpl,
            6 => Op::Scf,
            _ => Op::Ccf,
        },
        (1, 6) if y == 6 => Op::Halt,
        (1, _) => Op::LdRR(y, z),
        (2, _) => Op::AluR(y, z),
        (_, 0) => Op::RetCc(y),
        (_, 1) if q == 0 => Op::Pop(p),
        (_, 1) => match p {
            0 => Op::Ret,
            1 => Op::Exx,
            2 => Op::JpHl,
            _ => Op::LdSpHl,
        },
        (_, 2) => Op::JpCc(y),
        (_, 3) => match y {
            0 => Op::Jp,
            1 => Op::Prefix(Prefix::Cb),
            2 => Op::OutNA,
            3 => Op::InAN,
            4 => Op::ExSpHl,
            5 => Op::ExDeHl,
            _ => Op::Unimplemented,
        },
        (_, 4) => Op::CallCc(y),
        (_, 5) if q == 0 => Op::Push(p),
        (_, 5) => match p {
            0 => Op::Call,
            1 => Op::Prefix(Prefix::Dd),
            2 => Op::Prefix(Prefix::Ed),
            _ => Op::Prefix(Prefix::Fd),
        },
        (_, 6) => Op::AluN(y),
        _ => Op::Rst(y),
    }
}

fn decode_ed(f: Fields) -> Op {
    let Fields { x, y, z, p, q } = f;
    match (x, z) {
        (1, 0) => Op::InRC(y),
        (1, 1) => Op::OutCR(y),
        (1, 2) if q == 0 => Op::SbcHl(p),
        (1, 2) => Op::AdcHl(p),
        (1, 3) if q == 0 => Op::LdNnRp(p),
        (1, 3) => Op::LdRpInd(p),
        (1, 4) => Op::Neg,
        (1, 5) => Op::Retn,
        (1, 6) => Op::Unimplemented,
        (1, _) => match y {
            0 => Op::LdIA,
            1 => Op::LdRA,
            2 => Op::LdAI,
            3 => Op::LdAR,
            4 => Op::Rrd,
            5 => Op::Rld,
            _ => Op::EdNop,
        },
        (2, 0..=3) if y >= 4 => Op::Block {
            kind: match z {
                0 => BlockKind::Ld,
                1 => BlockKind::Cp,
                2 => BlockKind::In,
                _ => BlockKind::Out,
            },
            decrement: q == 1,
            repeat: y >= 6,
        },
        _ => Op::EdNop,
    }
}
