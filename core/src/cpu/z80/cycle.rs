//! Bus-cycle state machine.
//!
//! Each bus cycle is a run of half-clock phases. Every phase drives a
//! fixed set of pins; the cycle-specific phase invokes the step machine.
//! FETCH, IOREAD and IOWRITE span T1..T4 (eight edges), READ and WRITE
//! span T1..T3 (six edges), EXEC is a single edge that repeats while the
//! instruction holds.

use log::trace;

use super::{Reg8, Reg16, Z80, decode};
use crate::core::bus::{
    ControlLine, DATA_FLOAT_DELAY_PS, Level, PinBus, REFRESH_ADDRESS_DELAY_PS,
    REFRESH_STROBE_DELAY_PS,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BusCycle {
    /// Opcode fetch (M1) with refresh.
    #[default]
    Fetch,
    Read,
    Write,
    IoRead,
    IoWrite,
    /// Internal cycle with no bus transaction.
    Exec,
}

impl BusCycle {
    /// Last half-phase of the cycle.
    pub fn last_phase(self) -> Phase {
        match self {
            BusCycle::Fetch | BusCycle::IoRead | BusCycle::IoWrite => Phase::T4n,
            BusCycle::Read | BusCycle::Write => Phase::T3n,
            BusCycle::Exec => Phase::T1p,
        }
    }
}

/// Half-clock phase: `p` is the rising half of a T-state, `n` the falling.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    #[default]
    T1p = 0,
    T1n = 1,
    T2p = 2,
    T2n = 3,
    T3p = 4,
    T3n = 5,
    T4p = 6,
    T4n = 7,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::T1p => Phase::T1n,
            Phase::T1n => Phase::T2p,
            Phase::T2p => Phase::T2n,
            Phase::T2n => Phase::T3p,
            Phase::T3p => Phase::T3n,
            Phase::T3n => Phase::T4p,
            Phase::T4p => Phase::T4n,
            Phase::T4n => Phase::T1p,
        }
    }
}

impl Z80 {
    /// Run the current phase's pin actions, then advance.
    pub(crate) fn half_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        self.done = false;
        match self.cycle {
            BusCycle::Fetch => self.fetch_phase(bus),
            BusCycle::Read => self.read_phase(bus),
            BusCycle::Write => self.write_phase(bus),
            BusCycle::IoRead => self.io_read_phase(bus),
            BusCycle::IoWrite => self.io_write_phase(bus),
            BusCycle::Exec => self.exec_phase(bus),
        }
        self.advance();
    }

    fn advance(&mut self) {
        match self.cycle {
            BusCycle::Exec => {
                if !self.hold {
                    debug_assert_ne!(self.next_cycle, BusCycle::Exec, "EXEC requested without hold");
                    self.enter(self.next_cycle);
                }
            }
            // Holding at the end of a fetch keeps re-running T4n until the
            // instruction requests a cycle or finishes.
            BusCycle::Fetch if self.hold && self.phase == Phase::T4n => {}
            cycle => {
                if self.phase == cycle.last_phase() {
                    self.enter(self.next_cycle);
                } else {
                    self.phase = self.phase.next();
                }
            }
        }
    }

    fn enter(&mut self, cycle: BusCycle) {
        if !(cycle == BusCycle::Exec && self.cycle == BusCycle::Exec) {
            trace!("{:?} -> {:?} step {}", self.cycle, cycle, self.step);
        }
        self.cycle = cycle;
        self.phase = Phase::T1p;
    }

    fn fetch_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        match self.phase {
            Phase::T1p => {
                self.fetch_pc = self.regs.pc();
                bus.set_line(ControlLine::M1, Level::Low);
                bus.set_address(self.fetch_pc);
            }
            Phase::T1n => {
                bus.set_line(ControlLine::Mreq, Level::Low);
                bus.set_line(ControlLine::Rd, Level::Low);
            }
            Phase::T2p => {
                self.regs.set_pc(self.regs.pc().wrapping_add(1));
            }
            Phase::T3p => {
                self.opcode = bus.read_data();
                self.fields = decode::Fields::decode(self.opcode);
                self.op = decode::decode(self.prefix, self.opcode);
                trace!(
                    "fetch {:04X}: {:02X} {:?} {:?}",
                    self.fetch_pc, self.opcode, self.prefix, self.op
                );
                bus.set_line(ControlLine::Mreq, Level::High);
                bus.set_line(ControlLine::Rd, Level::High);
                bus.set_line(ControlLine::M1, Level::High);
                bus.set_address_with_delay(self.regs.get16(Reg16::Ir), REFRESH_ADDRESS_DELAY_PS);
                let r = self.regs.get8(Reg8::R);
                self.regs.set8(Reg8::R, (r & 0x80) | (r.wrapping_add(1) & 0x7F));
                bus.set_line_with_delay(ControlLine::Rfsh, Level::Low, REFRESH_STROBE_DELAY_PS);
            }
            Phase::T3n => {
                bus.set_line(ControlLine::Mreq, Level::Low);
            }
            Phase::T4n => {
                bus.set_line(ControlLine::Mreq, Level::High);
                if !self.hold {
                    self.step = 1;
                }
                self.execute();
                bus.set_line(ControlLine::Rfsh, Level::High);
                if self.halted {
                    bus.set_line(ControlLine::Halt, Level::Low);
                }
            }
            Phase::T2n | Phase::T4p => {}
        }
    }

    fn read_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        match self.phase {
            Phase::T1p => bus.set_address(self.addr),
            Phase::T1n => {
                bus.set_line(ControlLine::Mreq, Level::Low);
                bus.set_line(ControlLine::Rd, Level::Low);
            }
            Phase::T3n => {
                self.data = bus.read_data();
                bus.set_line(ControlLine::Mreq, Level::High);
                bus.set_line(ControlLine::Rd, Level::High);
                self.execute();
            }
            _ => {}
        }
    }

    fn write_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        match self.phase {
            Phase::T1p => bus.set_address(self.addr),
            Phase::T1n => {
                bus.set_line(ControlLine::Mreq, Level::Low);
                bus.set_data(self.data);
            }
            Phase::T2n => bus.set_line(ControlLine::Wr, Level::Low),
            Phase::T3n => {
                bus.set_line(ControlLine::Mreq, Level::High);
                bus.set_line(ControlLine::Wr, Level::High);
                bus.float_data_bus(Some(DATA_FLOAT_DELAY_PS));
                self.execute();
            }
            _ => {}
        }
    }

    fn io_read_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        match self.phase {
            Phase::T1p => bus.set_address(self.addr),
            Phase::T2p => {
                bus.set_line(ControlLine::Iorq, Level::Low);
                bus.set_line(ControlLine::Rd, Level::Low);
            }
            Phase::T4p => self.data = bus.read_data(),
            Phase::T4n => {
                bus.set_line(ControlLine::Iorq, Level::High);
                bus.set_line(ControlLine::Rd, Level::High);
                self.execute();
            }
            _ => {}
        }
    }

    fn io_write_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        match self.phase {
            Phase::T1p => bus.set_address(self.addr),
            Phase::T1n => bus.set_data(self.data),
            Phase::T2p => {
                bus.set_line(ControlLine::Iorq, Level::Low);
                bus.set_line(ControlLine::Wr, Level::Low);
            }
            Phase::T4n => {
                bus.set_line(ControlLine::Iorq, Level::High);
                bus.set_line(ControlLine::Wr, Level::High);
                bus.float_data_bus(Some(DATA_FLOAT_DELAY_PS));
                self.execute();
            }
            _ => {}
        }
    }

    fn exec_phase<B: PinBus + ?Sized>(&mut self, bus: &mut B) {
        bus.set_line(ControlLine::Mreq, Level::High);
        self.execute();
        bus.set_line(ControlLine::Rfsh, Level::High);
    }
}
