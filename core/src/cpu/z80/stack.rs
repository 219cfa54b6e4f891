use crate::cpu::z80::Z80;
use crate::cpu::z80::regs::Reg8;

impl Z80 {
    /// PUSH rr — 11 T: M1(5) + MW(3) + MW(3)
    /// Opcode mask: 11 pp0 101 (pp: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    /// SP drops by two first; the low byte is written to SP, then the high
    /// byte to SP+1.
    pub(crate) fn op_push(&mut self, p: u8, step: u8) {
        match step {
            1 => self.idle(),
            3 => {
                let sp = self.regs.sp().wrapping_sub(2);
                self.regs.set_sp(sp);
                self.write(sp, self.get_rp2(p) as u8);
            }
            4 => {
                let sp = self.regs.sp().wrapping_add(1);
                self.write(sp, (self.get_rp2(p) >> 8) as u8);
            }
            5 => self.finish(),
            _ => {}
        }
    }

    /// POP rr — 10 T: M1(4) + MR(3) + MR(3)
    /// Opcode mask: 11 pp0 001 (pp: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub(crate) fn op_pop(&mut self, p: u8, step: u8) {
        match step {
            1 | 2 => {
                if step == 2 {
                    self.ea = self.data as u16;
                }
                let sp = self.regs.sp();
                self.regs.set_sp(sp.wrapping_add(1));
                self.read(sp);
            }
            3 => {
                let val = ((self.data as u16) << 8) | self.ea;
                self.set_rp2(p, val);
                self.finish();
            }
            _ => {}
        }
    }

    /// EX (SP),HL — 19 T: M1(4) + internal(3) + MR(3) + MR(3) + MW(3) + MW(3)
    /// WZ ends up holding the value read from the stack.
    /// The internal T-states come before the first read here; the real part
    /// spends them after the second read and on the final write. The total
    /// is the same.
    pub(crate) fn op_ex_sp_hl(&mut self, step: u8) {
        let sp = self.regs.sp();
        match step {
            1 => self.idle(),
            7 => self.read(sp),
            8 => {
                self.regs.set8(Reg8::Z, self.data);
                self.read(sp.wrapping_add(1));
            }
            9 => {
                self.regs.set8(Reg8::W, self.data);
                self.write(sp, self.hl() as u8);
            }
            10 => self.write(sp.wrapping_add(1), (self.hl() >> 8) as u8),
            11 => {
                self.set_hl(self.regs.wz());
                self.finish();
            }
            _ => {}
        }
    }
}
