//! Instruction step machine.
//!
//! [`Z80::execute`] is called by the bus-cycle machine once per completed
//! bus cycle (and once per edge while an instruction holds). It bumps the
//! step counter and dispatches on the decoded [`Op`]; the per-class
//! handlers live in the sibling modules and match on the step number.
//!
//! A handler either requests the next bus cycle ([`Z80::read`],
//! [`Z80::write`], [`Z80::io_read`], [`Z80::io_write`]), burns internal
//! edges ([`Z80::idle`]), or ends the instruction ([`Z80::finish`]).
//! Steps that do none of these leave the current request in place, which
//! only happens while holding.

use log::{debug, trace, warn};

use super::decode::{Op, Prefix};
use super::{BusCycle, Unimplemented, Z80};

impl Z80 {
    pub(crate) fn execute(&mut self) {
        let step = self.step;
        self.step = self.step.wrapping_add(1);
        trace!("step {step} {:?} {:?}", self.op, self.cycle);

        match self.op {
            Op::Nop | Op::EdNop => self.finish(),
            Op::Prefix(prefix) => self.latch_prefix(prefix),
            Op::Halt => self.op_halt(),
            Op::Unimplemented => self.op_unimplemented(),

            // Loads and exchanges
            Op::LdRR(y, z) => self.op_ld_r_r(y, z, step),
            Op::LdRN(y) => self.op_ld_r_n(y, step),
            Op::LdRpNn(p) => self.op_ld_rp_nn(p, step),
            Op::LdIndA(p) => self.op_ld_ind_a(p, step),
            Op::LdAInd(p) => self.op_ld_a_ind(p, step),
            Op::LdNnHl => self.op_ld_nn_rp(2, step),
            Op::LdNnRp(p) => self.op_ld_nn_rp(p, step),
            Op::LdHlNn => self.op_ld_rp_ind(2, step),
            Op::LdRpInd(p) => self.op_ld_rp_ind(p, step),
            Op::LdNnA => self.op_ld_nn_a(step),
            Op::LdANn => self.op_ld_a_nn(step),
            Op::LdSpHl => self.op_ld_sp_hl(step),
            Op::LdIA | Op::LdRA => self.op_ld_ir_a(step),
            Op::LdAI | Op::LdAR => self.op_ld_a_ir(step),
            Op::ExAf => self.op_ex_af(),
            Op::Exx => self.op_exx(),
            Op::ExDeHl => self.op_ex_de_hl(),
            Op::OutNA => self.op_out_n_a(step),
            Op::InAN => self.op_in_a_n(step),
            Op::InRC(y) => self.op_in_r_c(y, step),
            Op::OutCR(y) => self.op_out_c_r(y, step),

            // Arithmetic and logic
            Op::AluR(y, z) => self.op_alu_r(y, z, step),
            Op::AluN(y) => self.op_alu_n(y, step),
            Op::IncR(y) | Op::DecR(y) => self.op_inc_dec_r(y, step),
            Op::IncRp(p) | Op::DecRp(p) => self.op_inc_dec_rp(p, step),
            Op::AddHlRp(p) => self.op_add_hl_rp(p, step),
            Op::AdcHl(p) | Op::SbcHl(p) => self.op_adc_sbc_hl(p, step),
            Op::RotA(y) => self.op_rot_a(y),
            Op::Daa => self.op_daa(),
            Op::Cpl => self.op_cpl(),
            Op::Scf => self.op_scf(),
            Op::Ccf => self.op_ccf(),
            Op::Neg => self.op_neg(),
            Op::Rrd | Op::Rld => self.op_rrd_rld(step),

            // Control flow
            Op::Jp => self.op_jp(None, step),
            Op::JpCc(cc) => self.op_jp(Some(cc), step),
            Op::JpHl => self.op_jp_hl(),
            Op::Jr => self.op_jr(None, step),
            Op::JrCc(cc) => self.op_jr(Some(cc), step),
            Op::Djnz => self.op_djnz(step),
            Op::Call => self.op_call(None, step),
            Op::CallCc(cc) => self.op_call(Some(cc), step),
            Op::Ret | Op::Retn => self.op_ret(step),
            Op::RetCc(cc) => self.op_ret_cc(cc, step),
            Op::Rst(y) => self.op_rst(y, step),

            // Stack
            Op::Push(p) => self.op_push(p, step),
            Op::Pop(p) => self.op_pop(p, step),
            Op::ExSpHl => self.op_ex_sp_hl(step),

            // Bit operations
            Op::Cb { x, y, z } => self.op_cb(x, y, z, step),
            Op::IndexBits => self.op_index_bits(step),

            // Block transfers
            Op::Block { kind, decrement, repeat } => self.op_block(kind, decrement, repeat, step),
        }
    }

    // --- Requests ---

    /// Request a memory read of `addr`; the byte lands in `self.data`.
    pub(crate) fn read(&mut self, addr: u16) {
        self.addr = addr;
        self.next_cycle = BusCycle::Read;
        self.hold = false;
    }

    /// Request a memory read at PC and advance PC.
    pub(crate) fn read_immediate(&mut self) {
        let pc = self.regs.pc();
        self.regs.set_pc(pc.wrapping_add(1));
        self.read(pc);
    }

    pub(crate) fn write(&mut self, addr: u16, data: u8) {
        self.addr = addr;
        self.data = data;
        self.next_cycle = BusCycle::Write;
        self.hold = false;
    }

    pub(crate) fn io_read(&mut self, port: u16) {
        self.addr = port;
        self.next_cycle = BusCycle::IoRead;
        self.hold = false;
    }

    pub(crate) fn io_write(&mut self, port: u16, data: u8) {
        self.addr = port;
        self.data = data;
        self.next_cycle = BusCycle::IoWrite;
        self.hold = false;
    }

    /// Spend the following edges on internal work: one step per edge until
    /// another request or `finish`.
    pub(crate) fn idle(&mut self) {
        self.next_cycle = BusCycle::Exec;
        self.hold = true;
    }

    /// The instruction has produced its final effect.
    pub(crate) fn finish(&mut self) {
        self.done = true;
        self.hold = false;
        self.step = 0;
        self.next_cycle = BusCycle::Fetch;
        self.prefix = Prefix::None;
    }

    fn latch_prefix(&mut self, prefix: Prefix) {
        self.finish();
        self.prefix = prefix;
    }

    /// Idle from step 1 and finish at `last`. For instructions whose work
    /// is done at step 1 and that only need to burn internal time.
    pub(crate) fn internal_then_finish(&mut self, step: u8, last: u8) {
        if step == last {
            self.finish();
        } else if step == 1 {
            self.idle();
        }
    }

    /// Resolve the `(HL)` / `(IX+d)` / `(IY+d)` operand into `self.ea`.
    ///
    /// Returns the instruction-local step once the address is known, or
    /// `None` while the displacement is still being read and added. Under
    /// an index prefix that costs one read and five internal T-states, so
    /// local step 1 lands on step 12.
    pub(crate) fn memory_operand(&mut self, step: u8) -> Option<u8> {
        if !matches!(self.prefix, Prefix::Dd | Prefix::Fd) {
            if step == 1 {
                self.ea = self.hl();
            }
            return Some(step);
        }
        match step {
            1 => {
                self.read_immediate();
                None
            }
            2 => {
                self.ea = self.hl().wrapping_add(self.data as i8 as u16);
                self.regs.set_wz(self.ea);
                self.idle();
                None
            }
            3..=11 => None,
            _ => Some(step - 11),
        }
    }

    fn op_halt(&mut self) {
        debug!("HALT at {:04X}", self.fetch_pc);
        self.halted = true;
        self.finish();
    }

    fn op_unimplemented(&mut self) {
        let record = Unimplemented {
            prefix: self.prefix,
            opcode: self.opcode,
            address: self.fetch_pc,
        };
        warn!(
            "unimplemented opcode {:?} {:02X} at {:04X}, executed as no-op",
            record.prefix, record.opcode, record.address
        );
        self.unimplemented = Some(record);
        self.unimplemented_count += 1;
        self.finish();
    }
}
