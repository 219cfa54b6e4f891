use crate::cpu::z80::decode::Prefix;
use crate::cpu::z80::flags::{self, Flag};
use crate::cpu::z80::regs::{Reg8, Reg16};
use crate::cpu::z80::Z80;

impl Z80 {
    /// LD r,r' — 4 T; LD r,(HL) / LD (HL),r — 7 T; indexed forms 19 T.
    /// Opcode mask: 01 yyy zzz (y = destination, z = source).
    pub(crate) fn op_ld_r_r(&mut self, y: u8, z: u8, step: u8) {
        if y != 6 && z != 6 {
            self.set_r(y, self.get_r(z));
            self.finish();
            return;
        }
        // With a memory operand H and L keep their plain meaning.
        match self.memory_operand(step) {
            Some(1) if z == 6 => self.read(self.ea),
            Some(1) => {
                let val = self.regs.get8(Self::reg8_plain(z));
                self.write(self.ea, val);
            }
            Some(2) => {
                if z == 6 {
                    self.regs.set8(Self::reg8_plain(y), self.data);
                }
                self.finish();
            }
            _ => {}
        }
    }

    /// LD r,n — 7 T; LD (HL),n — 10 T; LD (IX+d),n — 19 T
    pub(crate) fn op_ld_r_n(&mut self, y: u8, step: u8) {
        if y != 6 {
            match step {
                1 => self.read_immediate(),
                2 => {
                    self.set_r(y, self.data);
                    self.finish();
                }
                _ => {}
            }
            return;
        }
        if matches!(self.prefix, Prefix::Dd | Prefix::Fd) {
            // Displacement and immediate are both read before the
            // internal address computation.
            match step {
                1 => self.read_immediate(),
                2 => {
                    self.ea = self.hl().wrapping_add(self.data as i8 as u16);
                    self.regs.set_wz(self.ea);
                    self.read_immediate();
                }
                3 => self.idle(),
                7 => self.write(self.ea, self.data),
                8 => self.finish(),
                _ => {}
            }
            return;
        }
        match step {
            1 => {
                self.ea = self.hl();
                self.read_immediate();
            }
            2 => self.write(self.ea, self.data),
            3 => self.finish(),
            _ => {}
        }
    }

    /// LD rr,nn — 10 T: M1(4) + MR(3) + MR(3). Opcode mask: 00 pp0 001
    pub(crate) fn op_ld_rp_nn(&mut self, p: u8, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                self.regs.set8(Reg8::Z, self.data);
                self.read_immediate();
            }
            3 => {
                self.regs.set8(Reg8::W, self.data);
                self.set_rp(p, self.regs.wz());
                self.finish();
            }
            _ => {}
        }
    }

    /// LD (BC),A / LD (DE),A — 7 T
    pub(crate) fn op_ld_ind_a(&mut self, p: u8, step: u8) {
        match step {
            1 => {
                let addr = self.get_rp(p);
                let a = self.regs.a();
                self.regs.set_wz(((a as u16) << 8) | (addr.wrapping_add(1) & 0x00FF));
                self.write(addr, a);
            }
            2 => self.finish(),
            _ => {}
        }
    }

    /// LD A,(BC) / LD A,(DE) — 7 T
    pub(crate) fn op_ld_a_ind(&mut self, p: u8, step: u8) {
        match step {
            1 => {
                let addr = self.get_rp(p);
                self.regs.set_wz(addr.wrapping_add(1));
                self.read(addr);
            }
            2 => {
                self.regs.set_a(self.data);
                self.finish();
            }
            _ => {}
        }
    }

    /// Read the 16-bit address operand into WZ over steps 1-3. Returns
    /// true at step 3 once W has been latched.
    fn address_operand(&mut self, step: u8) -> bool {
        match step {
            1 => {
                self.read_immediate();
                false
            }
            2 => {
                self.regs.set8(Reg8::Z, self.data);
                self.read_immediate();
                false
            }
            3 => {
                self.regs.set8(Reg8::W, self.data);
                true
            }
            _ => false,
        }
    }

    /// LD (nn),HL — 16 T; ED LD (nn),rr — 20 T. Low byte first.
    pub(crate) fn op_ld_nn_rp(&mut self, p: u8, step: u8) {
        if step <= 3 {
            if self.address_operand(step) {
                let val = self.get_rp(p);
                self.write(self.regs.wz(), val as u8);
            }
            return;
        }
        match step {
            4 => {
                let val = self.get_rp(p);
                self.write(self.regs.wz().wrapping_add(1), (val >> 8) as u8);
            }
            5 => {
                self.regs.set_wz(self.regs.wz().wrapping_add(1));
                self.finish();
            }
            _ => {}
        }
    }

    /// LD HL,(nn) — 16 T; ED LD rr,(nn) — 20 T
    pub(crate) fn op_ld_rp_ind(&mut self, p: u8, step: u8) {
        if step <= 3 {
            if self.address_operand(step) {
                self.ea = self.regs.wz();
                self.read(self.ea);
            }
            return;
        }
        match step {
            4 => {
                let val = (self.get_rp(p) & 0xFF00) | self.data as u16;
                self.set_rp(p, val);
                self.read(self.ea.wrapping_add(1));
            }
            5 => {
                let val = (self.get_rp(p) & 0x00FF) | ((self.data as u16) << 8);
                self.set_rp(p, val);
                self.regs.set_wz(self.ea.wrapping_add(1));
                self.finish();
            }
            _ => {}
        }
    }

    /// LD (nn),A — 13 T
    pub(crate) fn op_ld_nn_a(&mut self, step: u8) {
        if step <= 3 {
            if self.address_operand(step) {
                self.ea = self.regs.wz();
                self.write(self.ea, self.regs.a());
            }
            return;
        }
        if step == 4 {
            let a = self.regs.a() as u16;
            self.regs.set_wz((a << 8) | (self.ea.wrapping_add(1) & 0x00FF));
            self.finish();
        }
    }

    /// LD A,(nn) — 13 T
    pub(crate) fn op_ld_a_nn(&mut self, step: u8) {
        if step <= 3 {
            if self.address_operand(step) {
                self.read(self.regs.wz());
            }
            return;
        }
        if step == 4 {
            self.regs.set_a(self.data);
            self.regs.set_wz(self.regs.wz().wrapping_add(1));
            self.finish();
        }
    }

    /// LD SP,HL — 6 T
    pub(crate) fn op_ld_sp_hl(&mut self, step: u8) {
        if step == 1 {
            self.regs.set_sp(self.hl());
        }
        self.internal_then_finish(step, 5);
    }

    /// LD I,A / LD R,A — 9 T
    pub(crate) fn op_ld_ir_a(&mut self, step: u8) {
        if step == 1 {
            let target = if self.fields.y == 0 { Reg8::I } else { Reg8::R };
            self.regs.set8(target, self.regs.a());
        }
        self.internal_then_finish(step, 3);
    }

    /// LD A,I / LD A,R — 9 T. Parity/overflow takes IFF2.
    pub(crate) fn op_ld_a_ir(&mut self, step: u8) {
        if step == 1 {
            let source = if self.fields.y == 2 { Reg8::I } else { Reg8::R };
            let val = self.regs.get8(source);
            self.regs.set_a(val);
            let f = flags::load_flags(val, self.regs.f());
            self.regs.set_f(flags::set_flag(f, Flag::PV, self.regs.iff2()));
        }
        self.internal_then_finish(step, 3);
    }

    /// EX AF,AF' — 4 T
    pub(crate) fn op_ex_af(&mut self) {
        self.regs.exchange(Reg16::Af, Reg16::AfAlt);
        self.finish();
    }

    /// EXX — 4 T
    pub(crate) fn op_exx(&mut self) {
        self.regs.exchange(Reg16::Bc, Reg16::BcAlt);
        self.regs.exchange(Reg16::De, Reg16::DeAlt);
        self.regs.exchange(Reg16::Hl, Reg16::HlAlt);
        self.finish();
    }

    /// EX DE,HL — 4 T. Not affected by index prefixes.
    pub(crate) fn op_ex_de_hl(&mut self) {
        self.regs.exchange(Reg16::De, Reg16::Hl);
        self.finish();
    }

    /// OUT (n),A — 11 T: M1(4) + MR(3) + IOW(4). Port is (A << 8) | n.
    pub(crate) fn op_out_n_a(&mut self, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                let a = self.regs.a();
                let port = ((a as u16) << 8) | self.data as u16;
                self.regs.set_wz(((a as u16) << 8) | (self.data.wrapping_add(1) as u16));
                self.io_write(port, a);
            }
            3 => self.finish(),
            _ => {}
        }
    }

    /// IN A,(n) — 11 T: M1(4) + MR(3) + IOR(4). Port is (A << 8) | n.
    pub(crate) fn op_in_a_n(&mut self, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                let port = ((self.regs.a() as u16) << 8) | self.data as u16;
                self.regs.set_wz(port.wrapping_add(1));
                self.io_read(port);
            }
            3 => {
                self.regs.set_a(self.data);
                self.finish();
            }
            _ => {}
        }
    }

    /// IN r,(C) — 12 T. y = 6 only sets flags.
    pub(crate) fn op_in_r_c(&mut self, y: u8, step: u8) {
        match step {
            1 => {
                let bc = self.regs.get16(Reg16::Bc);
                self.regs.set_wz(bc.wrapping_add(1));
                self.io_read(bc);
            }
            2 => {
                let val = self.data;
                self.regs.set_f(flags::load_flags(val, self.regs.f()));
                if y != 6 {
                    self.regs.set8(Self::reg8_plain(y), val);
                }
                self.finish();
            }
            _ => {}
        }
    }

    /// OUT (C),r — 12 T. y = 6 outputs 0.
    pub(crate) fn op_out_c_r(&mut self, y: u8, step: u8) {
        match step {
            1 => {
                let bc = self.regs.get16(Reg16::Bc);
                let val = if y == 6 { 0 } else { self.regs.get8(Self::reg8_plain(y)) };
                self.regs.set_wz(bc.wrapping_add(1));
                self.io_write(bc, val);
            }
            2 => self.finish(),
            _ => {}
        }
    }
}
