use crate::cpu::z80::Z80;
use crate::cpu::z80::decode::BlockKind;
use crate::cpu::z80::flags;
use crate::cpu::z80::regs::{Reg8, Reg16};

impl Z80 {
    /// ED block transfers. Single forms 16 T; a repeating form that loops
    /// spends 5 more internal T-states, rewinds PC by 2 and runs again
    /// from the fetch of the ED prefix.
    pub(crate) fn op_block(&mut self, kind: BlockKind, decrement: bool, repeat: bool, step: u8) {
        let delta: u16 = if decrement { 0xFFFF } else { 1 };
        match kind {
            BlockKind::Ld => self.block_ld(delta, repeat, step),
            BlockKind::Cp => self.block_cp(delta, repeat, step),
            BlockKind::In => self.block_in(delta, repeat, step),
            BlockKind::Out => self.block_out(delta, repeat, step),
        }
    }

    /// Rewind PC to the ED prefix so the instruction runs again.
    fn block_repeat(&mut self) {
        let pc = self.regs.pc().wrapping_sub(2);
        self.regs.set_pc(pc);
        self.regs.set_wz(pc.wrapping_add(1));
        self.finish();
    }

    /// LDI/LDD/LDIR/LDDR — 16 T / 21 T: M1(4) + M1(4) + MR(3) + MW(5) [+ 5]
    fn block_ld(&mut self, delta: u16, repeat: bool, step: u8) {
        match step {
            1 => self.read(self.regs.get16(Reg16::Hl)),
            2 => self.write(self.regs.get16(Reg16::De), self.data),
            3 => {
                let hl = self.regs.get16(Reg16::Hl);
                let de = self.regs.get16(Reg16::De);
                let bc = self.regs.get16(Reg16::Bc).wrapping_sub(1);
                self.regs.set16(Reg16::Hl, hl.wrapping_add(delta));
                self.regs.set16(Reg16::De, de.wrapping_add(delta));
                self.regs.set16(Reg16::Bc, bc);
                let f = flags::block_ld_flags(self.data, self.regs.a(), bc, self.regs.f());
                self.regs.set_f(f);
                self.idle();
            }
            7 if !repeat || self.regs.get16(Reg16::Bc) == 0 => self.finish(),
            17 => self.block_repeat(),
            _ => {}
        }
    }

    /// CPI/CPD/CPIR/CPDR — 16 T / 21 T: M1(4) + M1(4) + MR(3) + internal(5) [+ 5]
    /// Repeating forms stop when BC reaches 0 or A matches.
    fn block_cp(&mut self, delta: u16, repeat: bool, step: u8) {
        match step {
            1 => self.read(self.regs.get16(Reg16::Hl)),
            2 => {
                let hl = self.regs.get16(Reg16::Hl);
                let bc = self.regs.get16(Reg16::Bc).wrapping_sub(1);
                self.regs.set16(Reg16::Hl, hl.wrapping_add(delta));
                self.regs.set16(Reg16::Bc, bc);
                self.regs.set_wz(self.regs.wz().wrapping_add(delta));
                let f = flags::block_cp_flags(self.regs.a(), self.data, bc, self.regs.f(), self.quirks);
                self.regs.set_f(f);
                self.idle();
            }
            12 => {
                let matched = self.regs.f() & flags::Flag::Z as u8 != 0;
                if !repeat || matched || self.regs.get16(Reg16::Bc) == 0 {
                    self.finish();
                }
            }
            22 => self.block_repeat(),
            _ => {}
        }
    }

    /// INI/IND/INIR/INDR — 16 T / 21 T: M1(4) + M1(5) + IOR(4) + MW(3) [+ 5]
    /// The port address uses B before it is decremented.
    fn block_in(&mut self, delta: u16, repeat: bool, step: u8) {
        match step {
            1 => self.idle(),
            3 => {
                let bc = self.regs.get16(Reg16::Bc);
                self.regs.set_wz(bc.wrapping_add(delta));
                self.io_read(bc);
            }
            4 => self.write(self.regs.get16(Reg16::Hl), self.data),
            5 => self.block_io_done(delta, repeat),
            15 => self.block_repeat(),
            _ => {}
        }
    }

    /// OUTI/OUTD/OTIR/OTDR — 16 T / 21 T: M1(4) + M1(5) + MR(3) + IOW(4) [+ 5]
    /// B is decremented before it is placed on the port address.
    fn block_out(&mut self, delta: u16, repeat: bool, step: u8) {
        match step {
            1 => self.idle(),
            3 => self.read(self.regs.get16(Reg16::Hl)),
            4 => {
                let b = self.regs.get8(Reg8::B).wrapping_sub(1);
                self.regs.set8(Reg8::B, b);
                let bc = self.regs.get16(Reg16::Bc);
                self.regs.set_wz(bc.wrapping_add(delta));
                self.io_write(bc, self.data);
            }
            5 => self.block_io_done(delta, repeat),
            15 => self.block_repeat(),
            _ => {}
        }
    }

    fn block_io_done(&mut self, delta: u16, repeat: bool) {
        let hl = self.regs.get16(Reg16::Hl);
        self.regs.set16(Reg16::Hl, hl.wrapping_add(delta));
        // INI-style transfers decrement B only after the input.
        if self.fields.z == 2 {
            let b = self.regs.get8(Reg8::B).wrapping_sub(1);
            self.regs.set8(Reg8::B, b);
        }
        let b = self.regs.get8(Reg8::B);
        self.regs.set_f(flags::block_io_flags(b, self.regs.f()));
        if repeat && b != 0 {
            self.idle();
        } else {
            self.finish();
        }
    }
}
