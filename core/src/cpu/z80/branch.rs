use crate::cpu::z80::Z80;
use crate::cpu::z80::decode::Prefix;
use crate::cpu::z80::regs::{Reg8, Reg16};

impl Z80 {
    /// JP nn / JP cc,nn — 10 T: M1(4) + MR(3) + MR(3)
    /// The operand is always read; the jump only happens if the condition
    /// holds. WZ is loaded with nn either way.
    pub(crate) fn op_jp(&mut self, cc: Option<u8>, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                self.regs.set8(Reg8::Z, self.data);
                self.read_immediate();
            }
            3 => {
                self.regs.set8(Reg8::W, self.data);
                if cc.is_none_or(|cc| self.condition(cc)) {
                    self.regs.set_pc(self.regs.wz());
                }
                self.finish();
            }
            _ => {}
        }
    }

    /// JP (HL) — 4 T. Under DD/FD this is JP (IX) / JP (IY).
    pub(crate) fn op_jp_hl(&mut self) {
        self.regs.set_pc(self.hl());
        self.finish();
    }

    fn relative_jump(&mut self) {
        let target = self.regs.pc().wrapping_add(self.data as i8 as u16);
        self.regs.set_pc(target);
        self.regs.set_wz(target);
    }

    /// JR e — 12 T: M1(4) + MR(3) + internal(5)
    /// JR cc,e — 12 T taken, 7 T not taken.
    /// The displacement is relative to the address after the operand.
    pub(crate) fn op_jr(&mut self, cc: Option<u8>, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                if cc.is_none_or(|cc| self.condition(cc)) {
                    self.relative_jump();
                    self.idle();
                } else {
                    self.finish();
                }
            }
            12 => self.finish(),
            _ => {}
        }
    }

    /// DJNZ e — 13 T taken, 8 T not taken: M1(5) + MR(3) [+ internal(5)]
    pub(crate) fn op_djnz(&mut self, step: u8) {
        match step {
            1 => {
                let b = self.regs.get8(Reg8::B).wrapping_sub(1);
                self.regs.set8(Reg8::B, b);
                self.idle();
            }
            3 => self.read_immediate(),
            4 => {
                if self.regs.get8(Reg8::B) == 0 {
                    self.finish();
                } else {
                    self.relative_jump();
                    self.idle();
                }
            }
            14 => self.finish(),
            _ => {}
        }
    }

    /// CALL nn — 17 T: M1(4) + MR(3) + MR(4) + MW(3) + MW(3)
    /// CALL cc,nn — 17 T taken, 10 T not taken.
    /// Pushes the low byte of the return address first, at SP-2.
    pub(crate) fn op_call(&mut self, cc: Option<u8>, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                self.regs.set8(Reg8::Z, self.data);
                self.read_immediate();
            }
            3 => {
                self.regs.set8(Reg8::W, self.data);
                if cc.is_none_or(|cc| self.condition(cc)) {
                    self.idle();
                } else {
                    self.finish();
                }
            }
            5 => {
                let sp = self.regs.sp().wrapping_sub(2);
                self.regs.set_sp(sp);
                self.write(sp, self.regs.pc() as u8);
            }
            6 => {
                let sp = self.regs.sp().wrapping_add(1);
                self.write(sp, (self.regs.pc() >> 8) as u8);
            }
            7 => {
                self.regs.set_pc(self.regs.wz());
                self.finish();
            }
            _ => {}
        }
    }

    /// RET — 10 T: M1(4) + MR(3) + MR(3)
    /// RETN / RETI — 14 T; both also copy IFF2 into IFF1.
    pub(crate) fn op_ret(&mut self, step: u8) {
        self.pop_pc(step, 1);
    }

    /// Pop the return address starting at `first`; finish two steps later.
    fn pop_pc(&mut self, step: u8, first: u8) {
        match step.wrapping_sub(first) {
            0 => {
                let sp = self.regs.sp();
                self.regs.set_sp(sp.wrapping_add(1));
                self.read(sp);
            }
            1 => {
                self.regs.set8(Reg8::Z, self.data);
                let sp = self.regs.sp();
                self.regs.set_sp(sp.wrapping_add(1));
                self.read(sp);
            }
            2 => {
                self.regs.set8(Reg8::W, self.data);
                self.regs.set_pc(self.regs.wz());
                if self.prefix == Prefix::Ed {
                    self.regs.set8(Reg8::Iff1, self.regs.get8(Reg8::Iff2));
                }
                self.finish();
            }
            _ => {}
        }
    }

    /// RET cc — 11 T taken, 5 T not taken: M1(5) [+ MR(3) + MR(3)]
    pub(crate) fn op_ret_cc(&mut self, cc: u8, step: u8) {
        match step {
            1 => self.idle(),
            3 if !self.condition(cc) => self.finish(),
            3.. => self.pop_pc(step, 3),
            _ => {}
        }
    }

    /// RST p — 11 T: M1(5) + MW(3) + MW(3). Jumps to y * 8.
    pub(crate) fn op_rst(&mut self, y: u8, step: u8) {
        match step {
            1 => self.idle(),
            3 => {
                let sp = self.regs.sp().wrapping_sub(2);
                self.regs.set_sp(sp);
                self.write(sp, self.regs.pc() as u8);
            }
            4 => {
                let sp = self.regs.sp().wrapping_add(1);
                self.write(sp, (self.regs.pc() >> 8) as u8);
            }
            5 => {
                let target = (y as u16) * 8;
                self.regs.set_pc(target);
                self.regs.set16(Reg16::Wz, target);
                self.finish();
            }
            _ => {}
        }
    }
}
