//! Bench boards for the Z80 core.
//!
//! A [`PinBoard`] answers the core's pins the way a minimal RAM/ROM plus
//! I/O-latch circuit would: it watches the control strobes, commits writes
//! when WR goes low, and puts memory or port contents on the data bus
//! while RD is asserted together with MREQ or IORQ.

use log::debug;
use tstate_core::core::machine::Machine;
use tstate_core::core::{ControlLine, Level, PinBus};
use tstate_core::cpu::z80::{Edge, Quirks, Z80};

use crate::registry::MachineEntry;

/// Writes to this port (low address byte) are collected as console output.
pub const CONSOLE_PORT: u8 = 0x01;

/// Size of the write-protected region on the `rom32k` board.
pub const ROM32K_SIZE: usize = 0x8000;

/// Memory, I/O ports and the glue logic that decodes the core's strobes.
pub struct PinBoard {
    memory: Vec<u8>,
    ports: [u8; 256],
    /// Addresses below this are ROM; writes there are dropped.
    rom_size: usize,
    address: Option<u16>,
    data: Option<u8>,
    lines: [Level; 8],
    output: Vec<u8>,
}

impl PinBoard {
    pub fn new(rom_size: usize) -> Self {
        Self {
            memory: vec![0; 0x10000],
            ports: [0xFF; 256],
            rom_size: rom_size.min(0x10000),
            address: None,
            data: None,
            lines: [Level::High; 8],
            output: Vec::new(),
        }
    }

    /// Copy `data` into memory starting at `addr`, ROM included.
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        let len = data.len().min(self.memory.len() - start);
        self.memory[start..start + len].copy_from_slice(&data[..len]);
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    /// Value returned by IN from `port` (low address byte).
    pub fn set_port(&mut self, port: u8, value: u8) {
        self.ports[port as usize] = value;
    }

    /// Last value written to `port` by OUT.
    pub fn port(&self, port: u8) -> u8 {
        self.ports[port as usize]
    }

    pub fn line(&self, line: ControlLine) -> Level {
        self.lines[line.index()]
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    fn asserted(&self, line: ControlLine) -> bool {
        self.lines[line.index()].is_low()
    }

    /// WR just went low: latch whatever is on the data bus.
    fn commit_write(&mut self) {
        let (Some(addr), Some(data)) = (self.address, self.data) else {
            return;
        };
        if self.asserted(ControlLine::Mreq) {
            if (addr as usize) < self.rom_size {
                debug!("write of {data:02X} to ROM at {addr:04X} dropped");
            } else {
                self.memory[addr as usize] = data;
            }
        } else if self.asserted(ControlLine::Iorq) {
            let port = addr as u8;
            self.ports[port as usize] = data;
            if port == CONSOLE_PORT {
                self.output.push(data);
            }
        }
    }
}

impl PinBus for PinBoard {
    fn set_address_with_delay(&mut self, addr: u16, _delay_ps: u32) {
        self.address = Some(addr);
    }

    fn float_address_bus(&mut self) {
        self.address = None;
    }

    fn set_data(&mut self, data: u8) {
        self.data = Some(data);
    }

    fn read_data(&mut self) -> u8 {
        let Some(addr) = self.address else {
            return 0xFF;
        };
        if !self.asserted(ControlLine::Rd) {
            return 0xFF;
        }
        if self.asserted(ControlLine::Mreq) {
            self.memory[addr as usize]
        } else if self.asserted(ControlLine::Iorq) {
            self.ports[(addr & 0xFF) as usize]
        } else {
            0xFF
        }
    }

    fn float_data_bus(&mut self, _delay_ps: Option<u32>) {
        self.data = None;
    }

    fn set_line_with_delay(&mut self, line: ControlLine, level: Level, _delay_ps: u32) {
        let previous = self.lines[line.index()];
        self.lines[line.index()] = level;
        if line == ControlLine::Wr && previous == Level::High && level == Level::Low {
            self.commit_write();
        }
    }
}

/// A Z80 wired to a [`PinBoard`].
pub struct SimpleZ80System {
    pub cpu: Z80,
    pub board: PinBoard,
    description: &'static str,
}

impl SimpleZ80System {
    /// 64 KiB of RAM.
    pub fn flat(quirks: Quirks) -> Self {
        Self {
            cpu: Z80::with_quirks(quirks),
            board: PinBoard::new(0),
            description: "Z80 with 64 KiB RAM and 256 I/O ports",
        }
    }

    /// 32 KiB of ROM at 0x0000 followed by 32 KiB of RAM.
    pub fn rom32k(quirks: Quirks) -> Self {
        Self {
            cpu: Z80::with_quirks(quirks),
            board: PinBoard::new(ROM32K_SIZE),
            description: "Z80 with 32 KiB ROM, 32 KiB RAM and 256 I/O ports",
        }
    }
}

impl Machine for SimpleZ80System {
    fn description(&self) -> &'static str {
        self.description
    }

    fn load(&mut self, addr: u16, data: &[u8]) {
        self.board.load(addr, data);
    }

    fn set_reset(&mut self, asserted: bool) {
        self.cpu.reset(asserted, &mut self.board);
    }

    fn clock_edge(&mut self, edge: Edge) -> bool {
        self.cpu.tick(edge, &mut self.board)
    }

    fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    fn peek(&self, addr: u16) -> u8 {
        self.board.peek(addr)
    }

    fn take_output(&mut self) -> Vec<u8> {
        self.board.take_output()
    }
}

fn create_flat(quirks: Quirks) -> Box<dyn Machine> {
    Box::new(SimpleZ80System::flat(quirks))
}

fn create_rom32k(quirks: Quirks) -> Box<dyn Machine> {
    Box::new(SimpleZ80System::rom32k(quirks))
}

inventory::submit! {
    MachineEntry::new("flat", "Z80 with 64 KiB RAM and 256 I/O ports", create_flat)
}

inventory::submit! {
    MachineEntry::new("rom32k", "Z80 with 32 KiB ROM, 32 KiB RAM and 256 I/O ports", create_rom32k)
}
