use crate::cpu::z80::Z80;
use crate::cpu::z80::decode::Fields;
use crate::cpu::z80::flags::{self, RotOp};

impl Z80 {
    /// Apply a CB-table operation to `val`. Returns the value to store
    /// back, or `None` for BIT, which only changes flags.
    fn cb_apply(&mut self, x: u8, y: u8, val: u8) -> Option<u8> {
        match x {
            0 => {
                let (res, f) = flags::rot(RotOp::from_y(y), val, self.regs.f(), false);
                self.regs.set_f(f);
                Some(res)
            }
            1 => {
                self.regs.set_f(flags::bit(y, val, self.regs.f(), self.quirks));
                None
            }
            2 => Some(val & !(1 << y)),
            _ => Some(val | (1 << y)),
        }
    }

    /// CB-prefixed rotate/shift, BIT, RES, SET.
    /// Register forms 8 T; BIT n,(HL) 12 T; others on (HL) 15 T.
    pub(crate) fn op_cb(&mut self, x: u8, y: u8, z: u8, step: u8) {
        if z != 6 {
            let val = self.get_r(z);
            if let Some(res) = self.cb_apply(x, y, val) {
                self.set_r(z, res);
            }
            self.finish();
            return;
        }
        match step {
            1 => {
                self.ea = self.hl();
                self.read(self.ea);
            }
            2 => {
                if let Some(res) = self.cb_apply(x, y, self.data) {
                    self.data = res;
                }
                self.idle();
            }
            4 if x == 1 => self.finish(),
            4 => self.write(self.ea, self.data),
            5 => self.finish(),
            _ => {}
        }
    }

    /// DD CB d op / FD CB d op — BIT 20 T, others 23 T.
    ///
    /// The displacement and the sub-opcode are ordinary memory reads, not
    /// M1 fetches, so R is not incremented for them. For rotate/shift,
    /// RES and SET with z != 6 the result is also copied into register z.
    pub(crate) fn op_index_bits(&mut self, step: u8) {
        match step {
            1 => self.read_immediate(),
            2 => {
                self.ea = self.hl().wrapping_add(self.data as i8 as u16);
                self.regs.set_wz(self.ea);
                self.read_immediate();
            }
            3 => {
                self.fields = Fields::decode(self.data);
                self.idle();
            }
            7 => self.read(self.ea),
            8 => {
                let Fields { x, y, z, .. } = self.fields;
                if let Some(res) = self.cb_apply(x, y, self.data) {
                    self.data = res;
                    if z != 6 {
                        self.regs.set8(Self::reg8_plain(z), res);
                    }
                }
                self.idle();
            }
            10 if self.fields.x == 1 => self.finish(),
            10 => self.write(self.ea, self.data),
            11 => self.finish(),
            _ => {}
        }
    }
}
