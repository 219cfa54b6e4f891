//! Half-clock accurate Z80 core.
//!
//! Two nested state machines share one instance. The bus-cycle machine
//! ([`cycle`]) walks the eight half-phases of the active bus cycle and
//! drives the pins. At fixed phase boundaries it calls the instruction
//! step machine ([`execute`]), which runs one numbered step of the current
//! instruction and asks for the next bus cycle. Nothing loops or blocks:
//! every call to [`Z80::tick`] processes exactly one clock edge.

mod alu;
mod bit;
mod block;
mod branch;
mod cycle;
pub mod decode;
mod execute;
pub mod flags;
mod load_store;
pub mod regs;
mod stack;

pub use cycle::{BusCycle, Phase};
pub use decode::{Fields, Index, Op, Prefix};
pub use flags::Flag;
pub use regs::{Reg8, Reg16, Registers};

use log::{debug, warn};

use crate::core::bus::{ControlLine, Level, PinBus};
use crate::cpu::state::{CpuStateTrait, Z80State};

/// Minimum number of rising clock edges RESET must stay asserted for the
/// part to come out of reset.
pub const RESET_MIN_CYCLES: u64 = 3;

/// Clock edge delivered to [`Z80::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Behaviour switches for places where the historical model and the real
/// part disagree. The default is the real part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// Arithmetic leaves H untouched; only AND/XOR/OR force it.
    pub simplified_half_carry: bool,
    /// The P and M conditions both test "sign clear".
    pub shared_sign_condition: bool,
}

/// Record of an opcode the core executed as a no-op because it does not
/// model what it does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unimplemented {
    pub prefix: Prefix,
    pub opcode: u8,
    /// Address the opcode was fetched from.
    pub address: u16,
}

pub struct Z80 {
    pub regs: Registers,
    pub quirks: Quirks,

    // Bus cycle state
    pub(crate) cycle: BusCycle,
    pub(crate) next_cycle: BusCycle,
    pub(crate) phase: Phase,
    pub(crate) addr: u16, // Address for the requested cycle
    pub(crate) data: u8,  // Last sampled byte, or byte to write

    // Instruction step state
    pub(crate) step: u8,
    pub(crate) hold: bool,
    pub(crate) done: bool,
    pub(crate) opcode: u8,
    pub(crate) fields: Fields,
    pub(crate) prefix: Prefix,
    pub(crate) op: Op,
    pub(crate) ea: u16,       // Effective address of a memory operand
    pub(crate) fetch_pc: u16, // Address of the opcode being executed
    pub(crate) halted: bool,
    pub(crate) unimplemented: Option<Unimplemented>,
    pub(crate) unimplemented_count: u64,

    // Reset/clock controller
    clock_count: u64,
    running: bool,
    reset_start: Option<u64>,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    /// A powered-down core. It ignores clock edges until RESET has been
    /// asserted for at least [`RESET_MIN_CYCLES`] cycles and released.
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        Self {
            regs: Registers::new(),
            quirks,
            cycle: BusCycle::Fetch,
            next_cycle: BusCycle::Fetch,
            phase: Phase::T1p,
            addr: 0,
            data: 0,
            step: 0,
            hold: false,
            done: false,
            opcode: 0,
            fields: Fields::default(),
            prefix: Prefix::None,
            op: Op::Nop,
            ea: 0,
            fetch_pc: 0,
            halted: false,
            unimplemented: None,
            unimplemented_count: 0,
            clock_count: 0,
            running: false,
            reset_start: None,
        }
    }

    /// Process one clock edge. Returns true when an instruction (including
    /// any prefix bytes) completed on this edge.
    pub fn tick<B: PinBus + ?Sized>(&mut self, edge: Edge, bus: &mut B) -> bool {
        if edge == Edge::Rising {
            self.clock_count += 1;
        }
        if !self.running || self.halted {
            return false;
        }
        self.half_phase(bus);
        self.done && self.prefix == Prefix::None
    }

    /// Drive the RESET input. Asserting it re-initialises every register
    /// and state machine and parks the pins; releasing it starts the core
    /// only if it was held for at least [`RESET_MIN_CYCLES`] clock cycles.
    pub fn reset<B: PinBus + ?Sized>(&mut self, asserted: bool, bus: &mut B) {
        if asserted {
            if self.reset_start.is_none() {
                self.reset_start = Some(self.clock_count);
                self.running = false;
                self.reset_state(bus);
            }
        } else if let Some(start) = self.reset_start.take() {
            let held = self.clock_count - start;
            if held < RESET_MIN_CYCLES {
                warn!("reset released after {held} cycles, need {RESET_MIN_CYCLES}; core stays inactive");
            } else {
                debug!("reset released after {held} cycles");
                self.running = true;
            }
        }
    }

    fn reset_state<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        self.regs.clear();
        self.cycle = BusCycle::Fetch;
        self.next_cycle = BusCycle::Fetch;
        self.phase = Phase::T1p;
        self.addr = 0;
        self.data = 0;
        self.step = 0;
        self.hold = false;
        self.done = false;
        self.opcode = 0;
        self.fields = Fields::default();
        self.prefix = Prefix::None;
        self.op = Op::Nop;
        self.ea = 0;
        self.fetch_pc = 0;
        self.halted = false;
        self.unimplemented = None;

        for line in ControlLine::ALL {
            bus.set_line(line, Level::High);
        }
        bus.float_address_bus();
        bus.float_data_bus(None);
    }

    /// True once a valid reset pulse has been released.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Rising clock edges seen since construction.
    pub fn clock_count(&self) -> u64 {
        self.clock_count
    }

    pub fn cycle(&self) -> BusCycle {
        self.cycle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current instruction step; 0 when no instruction is in progress.
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_holding(&self) -> bool {
        self.hold
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn fields(&self) -> Fields {
        self.fields
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// Take the most recent unimplemented-opcode record, if any.
    pub fn take_unimplemented(&mut self) -> Option<Unimplemented> {
        self.unimplemented.take()
    }

    /// Unimplemented opcodes executed since construction.
    pub fn unimplemented_count(&self) -> u64 {
        self.unimplemented_count
    }

    /// Register pair standing in for HL under the active prefix.
    pub(crate) fn index(&self) -> Index {
        self.prefix.index()
    }

    pub(crate) fn hl(&self) -> u16 {
        self.regs.get16(self.index().pair())
    }

    pub(crate) fn set_hl(&mut self, val: u16) {
        self.regs.set16(self.index().pair(), val);
    }

    /// 8-bit register by table index, with H/L redirected to the index
    /// register halves under DD/FD. Index 6 is the memory operand and is
    /// handled by callers.
    pub(crate) fn reg8(&self, r: u8) -> Reg8 {
        match (r, self.index()) {
            (4, Index::Ix) => Reg8::Ixh,
            (5, Index::Ix) => Reg8::Ixl,
            (4, Index::Iy) => Reg8::Iyh,
            (5, Index::Iy) => Reg8::Iyl,
            _ => Self::reg8_plain(r),
        }
    }

    /// 8-bit register by table index, ignoring any index prefix. Used when
    /// the same instruction also addresses (IX+d).
    pub(crate) fn reg8_plain(r: u8) -> Reg8 {
        match decode::R[(r & 7) as usize] {
            Some(reg) => reg,
            None => unreachable!("register index 6 is the memory operand"),
        }
    }

    pub(crate) fn get_r(&self, r: u8) -> u8 {
        self.regs.get8(self.reg8(r))
    }

    pub(crate) fn set_r(&mut self, r: u8, val: u8) {
        self.regs.set8(self.reg8(r), val);
    }

    /// Register pair by p for loads and arithmetic (BC, DE, HL/IX/IY, SP).
    pub(crate) fn get_rp(&self, p: u8) -> u16 {
        match p {
            2 => self.hl(),
            _ => self.regs.get16(decode::RP[(p & 3) as usize]),
        }
    }

    pub(crate) fn set_rp(&mut self, p: u8, val: u16) {
        match p {
            2 => self.set_hl(val),
            _ => self.regs.set16(decode::RP[(p & 3) as usize], val),
        }
    }

    /// Register pair by p for PUSH/POP (BC, DE, HL/IX/IY, AF).
    pub(crate) fn get_rp2(&self, p: u8) -> u16 {
        match p {
            2 => self.hl(),
            _ => self.regs.get16(decode::RP2[(p & 3) as usize]),
        }
    }

    pub(crate) fn set_rp2(&mut self, p: u8, val: u16) {
        match p {
            2 => self.set_hl(val),
            _ => self.regs.set16(decode::RP2[(p & 3) as usize], val),
        }
    }

    /// Evaluate condition code `cc` (NZ, Z, NC, C, PO, PE, P, M).
    pub(crate) fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f();
        let set = |flag: Flag| f & flag as u8 != 0;
        match cc & 7 {
            0 => !set(Flag::Z),
            1 => set(Flag::Z),
            2 => !set(Flag::C),
            3 => set(Flag::C),
            4 => !set(Flag::PV),
            5 => set(Flag::PV),
            6 => !set(Flag::S),
            _ => {
                if self.quirks.shared_sign_condition {
                    !set(Flag::S)
                } else {
                    set(Flag::S)
                }
            }
        }
    }
}

impl CpuStateTrait for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        let r = &self.regs;
        Z80State {
            a: r.get8(Reg8::A),
            f: r.get8(Reg8::F),
            b: r.get8(Reg8::B),
            c: r.get8(Reg8::C),
            d: r.get8(Reg8::D),
            e: r.get8(Reg8::E),
            h: r.get8(Reg8::H),
            l: r.get8(Reg8::L),
            a_prime: r.get8(Reg8::AAlt),
            f_prime: r.get8(Reg8::FAlt),
            b_prime: r.get8(Reg8::BAlt),
            c_prime: r.get8(Reg8::CAlt),
            d_prime: r.get8(Reg8::DAlt),
            e_prime: r.get8(Reg8::EAlt),
            h_prime: r.get8(Reg8::HAlt),
            l_prime: r.get8(Reg8::LAlt),
            ix: r.get16(Reg16::Ix),
            iy: r.get16(Reg16::Iy),
            sp: r.sp(),
            pc: r.pc(),
            i: r.get8(Reg8::I),
            r: r.get8(Reg8::R),
            wz: r.wz(),
            iff1: r.iff1(),
            iff2: r.iff2(),
            halted: self.halted,
            cycle: self.cycle,
            phase: self.phase,
            step: self.step,
        }
    }
}
