use crate::cpu::z80::Z80;
use crate::cpu::z80::flags::{self, AluOp, RotOp};
use crate::cpu::z80::regs::{Reg8, Reg16};

impl Z80 {
    fn apply_alu(&mut self, y: u8, operand: u8) {
        let (a, f) = flags::alu(AluOp::from_y(y), self.regs.a(), operand, self.regs.f(), self.quirks);
        self.regs.set_a(a);
        self.regs.set_f(f);
    }

    /// ALU A,r — 4 T (reg), 7 T ((HL)), 19 T ((IX+d))
    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP. Opcode mask: 10 yyy zzz
    pub(crate) fn op_alu_r(&mut self, y: u8, z: u8, step: u8) {
        if z != 6 {
            self.apply_alu(y, self.get_r(z));
            self.finish();
            return;
        }
        match self.memory_operand(step) {
            Some(1) => self.read(self.ea),
            Some(2) => {
                self.apply_alu(y, self.data);
                self.finish();
            }
            _ => {}
        }
    }

    /// ALU A,n — 7 T. Opcode mask: 11 yyy 110
    pub(crate) fn op_alu_n(&mut self, y: u8, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                self.apply_alu(y, self.data);
                self.finish();
            }
            _ => {}
        }
    }

    fn inc_or_dec(&mut self, val: u8) -> u8 {
        // z = 4 is INC, z = 5 is DEC
        let (res, f) = if self.fields.z == 4 {
            flags::inc8(val, self.regs.f(), self.quirks)
        } else {
            flags::dec8(val, self.regs.f(), self.quirks)
        };
        self.regs.set_f(f);
        res
    }

    /// INC r / DEC r — 4 T; INC (HL) / DEC (HL) — 11 T read-modify-write
    pub(crate) fn op_inc_dec_r(&mut self, y: u8, step: u8) {
        if y != 6 {
            let res = self.inc_or_dec(self.get_r(y));
            self.set_r(y, res);
            self.finish();
            return;
        }
        match self.memory_operand(step) {
            Some(1) => self.read(self.ea),
            Some(2) => {
                self.data = self.inc_or_dec(self.data);
                self.idle();
            }
            Some(4) => self.write(self.ea, self.data),
            Some(5) => self.finish(),
            _ => {}
        }
    }

    /// INC rr / DEC rr — 6 T. No flags affected.
    pub(crate) fn op_inc_dec_rp(&mut self, p: u8, step: u8) {
        if step == 1 {
            let val = self.get_rp(p);
            let res = if self.fields.q == 0 { val.wrapping_add(1) } else { val.wrapping_sub(1) };
            self.set_rp(p, res);
        }
        self.internal_then_finish(step, 5);
    }

    /// ADD HL,rr — 11 T: M1(4) + internal(7)
    /// H from bit 11, C from bit 15, N cleared, S/Z/PV preserved.
    pub(crate) fn op_add_hl_rp(&mut self, p: u8, step: u8) {
        if step == 1 {
            let hl = self.hl();
            let (res, f) = flags::add16(hl, self.get_rp(p), self.regs.f(), false, self.quirks);
            self.regs.set_wz(hl.wrapping_add(1));
            self.regs.set_f(f);
            self.set_hl(res);
        }
        self.internal_then_finish(step, 15);
    }

    /// ADC HL,rr / SBC HL,rr — 15 T: M1(4) + M1(4) + internal(7)
    pub(crate) fn op_adc_sbc_hl(&mut self, p: u8, step: u8) {
        if step == 1 {
            let hl = self.regs.get16(Reg16::Hl);
            let rr = self.get_rp(p);
            let (res, f) = if self.fields.q == 1 {
                flags::add16(hl, rr, self.regs.f(), true, self.quirks)
            } else {
                flags::sbc16(hl, rr, self.regs.f(), self.quirks)
            };
            self.regs.set_wz(hl.wrapping_add(1));
            self.regs.set_f(f);
            self.regs.set16(Reg16::Hl, res);
        }
        self.internal_then_finish(step, 15);
    }

    /// RLCA / RRCA / RLA / RRA — 4 T. Only C, H, N and the mirror bits change.
    pub(crate) fn op_rot_a(&mut self, y: u8) {
        let (a, f) = flags::rot(RotOp::from_y(y), self.regs.a(), self.regs.f(), true);
        self.regs.set_a(a);
        self.regs.set_f(f);
        self.finish();
    }

    pub(crate) fn op_daa(&mut self) {
        let (a, f) = flags::daa(self.regs.a(), self.regs.f());
        self.regs.set_a(a);
        self.regs.set_f(f);
        self.finish();
    }

    pub(crate) fn op_cpl(&mut self) {
        let (a, f) = flags::cpl(self.regs.a(), self.regs.f());
        self.regs.set_a(a);
        self.regs.set_f(f);
        self.finish();
    }

    pub(crate) fn op_scf(&mut self) {
        self.regs.set_f(flags::scf(self.regs.a(), self.regs.f()));
        self.finish();
    }

    pub(crate) fn op_ccf(&mut self) {
        self.regs.set_f(flags::ccf(self.regs.a(), self.regs.f()));
        self.finish();
    }

    /// NEG — 8 T. A = 0 - A.
    pub(crate) fn op_neg(&mut self) {
        let (a, f) = flags::alu(AluOp::Sub, 0, self.regs.a(), self.regs.f(), self.quirks);
        self.regs.set_a(a);
        self.regs.set_f(f);
        self.finish();
    }

    /// RRD / RLD — 18 T: M1(4) + M1(4) + MR(3) + internal(4) + MW(3)
    /// Rotates a BCD digit between A and (HL).
    pub(crate) fn op_rrd_rld(&mut self, step: u8) {
        match step {
            1 => {
                let hl = self.regs.get16(Reg16::Hl);
                self.ea = hl;
                self.read(hl);
            }
            2 => {
                let a = self.regs.a();
                let m = self.data;
                // y = 4 is RRD, y = 5 is RLD
                let (new_a, new_m) = if self.fields.y == 4 {
                    ((a & 0xF0) | (m & 0x0F), (a << 4) | (m >> 4))
                } else {
                    ((a & 0xF0) | (m >> 4), (m << 4) | (a & 0x0F))
                };
                self.regs.set8(Reg8::A, new_a);
                self.regs.set_f(flags::load_flags(new_a, self.regs.f()));
                self.regs.set_wz(self.ea.wrapping_add(1));
                self.data = new_m;
                self.idle();
            }
            10 => self.write(self.ea, self.data),
            11 => self.finish(),
            _ => {}
        }
    }
}
