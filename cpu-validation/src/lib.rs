use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tstate_core::core::{ControlLine, Level, PinBus};
use tstate_core::cpu::z80::{Edge, Reg8, Reg16, Z80};

// --- TracingPinBus: flat 64KB memory with edge-by-edge pin recording ---

/// One change the core made to its outputs, or one sample it took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinEvent {
    Address { addr: u16, delay_ps: u32 },
    FloatAddress,
    Data(u8),
    FloatData { delay_ps: Option<u32> },
    Sample(u8),
    Line { line: ControlLine, level: Level, delay_ps: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TracedEvent {
    /// Half-clock edge index, counted from the start of the trace.
    pub edge: u32,
    pub event: PinEvent,
}

pub struct TracingPinBus {
    pub memory: [u8; 0x10000],
    pub ports: [u8; 256],
    pub events: Vec<TracedEvent>,
    /// Edge index stamped on new events. Advanced by [`clock`].
    pub edge: u32,
    address: Option<u16>,
    data: Option<u8>,
    lines: [Level; 8],
}

impl TracingPinBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0xFF; 256],
            events: Vec::new(),
            edge: 0,
            address: None,
            data: None,
            lines: [Level::High; 8],
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    /// Drop recorded events and restart edge numbering.
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.edge = 0;
    }

    pub fn events_at(&self, edge: u32) -> Vec<PinEvent> {
        self.events
            .iter()
            .filter(|e| e.edge == edge)
            .map(|e| e.event)
            .collect()
    }

    fn record(&mut self, event: PinEvent) {
        self.events.push(TracedEvent {
            edge: self.edge,
            event,
        });
    }

    fn asserted(&self, line: ControlLine) -> bool {
        self.lines[line.index()].is_low()
    }
}

impl Default for TracingPinBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PinBus for TracingPinBus {
    fn set_address_with_delay(&mut self, addr: u16, delay_ps: u32) {
        self.address = Some(addr);
        self.record(PinEvent::Address { addr, delay_ps });
    }

    fn float_address_bus(&mut self) {
        self.address = None;
        self.record(PinEvent::FloatAddress);
    }

    fn set_data(&mut self, data: u8) {
        self.data = Some(data);
        self.record(PinEvent::Data(data));
    }

    fn read_data(&mut self) -> u8 {
        let value = match self.address {
            Some(addr) if self.asserted(ControlLine::Rd) && self.asserted(ControlLine::Mreq) => {
                self.memory[addr as usize]
            }
            Some(addr) if self.asserted(ControlLine::Rd) && self.asserted(ControlLine::Iorq) => {
                self.ports[(addr & 0xFF) as usize]
            }
            _ => 0xFF,
        };
        self.record(PinEvent::Sample(value));
        value
    }

    fn float_data_bus(&mut self, delay_ps: Option<u32>) {
        self.data = None;
        self.record(PinEvent::FloatData { delay_ps });
    }

    fn set_line_with_delay(&mut self, line: ControlLine, level: Level, delay_ps: u32) {
        let falling_wr = line == ControlLine::Wr && level.is_low() && !self.asserted(line);
        self.lines[line.index()] = level;
        if falling_wr {
            if let (Some(addr), Some(data)) = (self.address, self.data) {
                if self.asserted(ControlLine::Mreq) {
                    self.memory[addr as usize] = data;
                } else if self.asserted(ControlLine::Iorq) {
                    self.ports[(addr & 0xFF) as usize] = data;
                }
            }
        }
        self.record(PinEvent::Line {
            line,
            level,
            delay_ps,
        });
    }
}

/// Deliver one edge, alternating rising and falling from edge 0.
pub fn clock(cpu: &mut Z80, bus: &mut TracingPinBus) -> bool {
    let edge = if bus.edge % 2 == 0 {
        Edge::Rising
    } else {
        Edge::Falling
    };
    let done = cpu.tick(edge, bus);
    bus.edge += 1;
    done
}

/// A core that has come out of a valid reset with events cleared.
pub fn powered_cpu(bus: &mut TracingPinBus) -> Z80 {
    let mut cpu = Z80::new();
    cpu.reset(true, bus);
    for _ in 0..6 {
        clock(&mut cpu, bus);
    }
    cpu.reset(false, bus);
    bus.clear_events();
    cpu
}

/// Clock until one instruction completes. Returns the edges it took, or
/// `None` if it ran past `limit`.
pub fn run_instruction(cpu: &mut Z80, bus: &mut TracingPinBus, limit: u32) -> Option<u32> {
    let start = bus.edge;
    loop {
        if clock(cpu, bus) {
            return Some(bus.edge - start);
        }
        if bus.edge - start >= limit {
            return None;
        }
    }
}

// --- Bus transaction reconstruction ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Fetch,
    Refresh,
    MemRead,
    MemWrite,
    IoRead,
    IoWrite,
}

/// One strobe window as the board saw it: from the edge the strobes
/// combined into a request to the edge they were released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub addr: u16,
    pub data: u8,
    pub start: u32,
    pub end: u32,
}

fn classify(lines: &[Level; 8]) -> Option<TransactionKind> {
    let low = |line: ControlLine| lines[line.index()].is_low();
    if low(ControlLine::Mreq) {
        if low(ControlLine::Rd) {
            Some(if low(ControlLine::M1) {
                TransactionKind::Fetch
            } else {
                TransactionKind::MemRead
            })
        } else if low(ControlLine::Wr) {
            Some(TransactionKind::MemWrite)
        } else if low(ControlLine::Rfsh) {
            Some(TransactionKind::Refresh)
        } else {
            None
        }
    } else if low(ControlLine::Iorq) {
        if low(ControlLine::Rd) {
            Some(TransactionKind::IoRead)
        } else if low(ControlLine::Wr) {
            Some(TransactionKind::IoWrite)
        } else {
            None
        }
    } else {
        None
    }
}

/// Group a pin-event trace into bus transactions.
pub fn transactions(events: &[TracedEvent]) -> Vec<Transaction> {
    let mut out = Vec::new();
    let mut lines = [Level::High; 8];
    let mut address = 0u16;
    let mut data = 0xFFu8;
    let mut open: Option<Transaction> = None;

    for traced in events {
        match traced.event {
            PinEvent::Address { addr, .. } => address = addr,
            PinEvent::Data(value) | PinEvent::Sample(value) => {
                data = value;
                if let Some(t) = open.as_mut() {
                    t.data = value;
                }
            }
            PinEvent::Line { line, level, .. } => {
                lines[line.index()] = level;
                let kind = classify(&lines);
                match (open, kind) {
                    (Some(t), Some(k)) if t.kind == k => {}
                    (current, next) => {
                        if let Some(mut t) = current {
                            t.end = traced.edge;
                            out.push(t);
                        }
                        open = next.map(|kind| Transaction {
                            kind,
                            addr: address,
                            data: if matches!(kind, TransactionKind::MemWrite | TransactionKind::IoWrite) {
                                data
                            } else {
                                0xFF
                            },
                            start: traced.edge,
                            end: traced.edge,
                        });
                    }
                }
            }
            PinEvent::FloatAddress | PinEvent::FloatData { .. } => {}
        }
    }
    if let Some(t) = open {
        out.push(t);
    }
    out
}

// --- JSON timing vector types ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub ix: u16,
    pub iy: u16,
    pub af_prime: u16,
    pub bc_prime: u16,
    pub de_prime: u16,
    pub hl_prime: u16,
    pub wz: u16,
    pub i: u8,
    pub r: u8,
    pub ram: Vec<(u16, u8)>,
}

const STATE_PAIRS: [Reg16; 13] = [
    Reg16::Pc,
    Reg16::Sp,
    Reg16::Af,
    Reg16::Bc,
    Reg16::De,
    Reg16::Hl,
    Reg16::Ix,
    Reg16::Iy,
    Reg16::AfAlt,
    Reg16::BcAlt,
    Reg16::DeAlt,
    Reg16::HlAlt,
    Reg16::Wz,
];

impl Z80CpuState {
    fn pairs(&self) -> [u16; 13] {
        [
            self.pc,
            self.sp,
            self.af,
            self.bc,
            self.de,
            self.hl,
            self.ix,
            self.iy,
            self.af_prime,
            self.bc_prime,
            self.de_prime,
            self.hl_prime,
            self.wz,
        ]
    }

    /// Registers of `cpu`, with no RAM entries.
    pub fn capture(cpu: &Z80) -> Self {
        let r = &cpu.regs;
        Self {
            pc: r.get16(Reg16::Pc),
            sp: r.get16(Reg16::Sp),
            af: r.get16(Reg16::Af),
            bc: r.get16(Reg16::Bc),
            de: r.get16(Reg16::De),
            hl: r.get16(Reg16::Hl),
            ix: r.get16(Reg16::Ix),
            iy: r.get16(Reg16::Iy),
            af_prime: r.get16(Reg16::AfAlt),
            bc_prime: r.get16(Reg16::BcAlt),
            de_prime: r.get16(Reg16::DeAlt),
            hl_prime: r.get16(Reg16::HlAlt),
            wz: r.get16(Reg16::Wz),
            i: r.get8(Reg8::I),
            r: r.get8(Reg8::R),
            ram: Vec::new(),
        }
    }

    pub fn apply(&self, cpu: &mut Z80) {
        for (reg, value) in STATE_PAIRS.iter().zip(self.pairs()) {
            cpu.regs.set16(*reg, value);
        }
        cpu.regs.set8(Reg8::I, self.i);
        cpu.regs.set8(Reg8::R, self.r);
    }

    /// Name of the first register that differs from `other`.
    pub fn first_mismatch(&self, other: &Self) -> Option<String> {
        const NAMES: [&str; 13] = [
            "PC", "SP", "AF", "BC", "DE", "HL", "IX", "IY", "AF'", "BC'", "DE'", "HL'", "WZ",
        ];
        for ((name, got), exp) in NAMES.iter().zip(self.pairs()).zip(other.pairs()) {
            if got != exp {
                return Some(format!("{name} (got 0x{got:04X} exp 0x{exp:04X})"));
            }
        }
        if self.i != other.i {
            return Some(format!("I (got 0x{:02X} exp 0x{:02X})", self.i, other.i));
        }
        if self.r != other.r {
            return Some(format!("R (got 0x{:02X} exp 0x{:02X})", self.r, other.r));
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    /// Half-clock edges from the first fetch edge to completion.
    pub edges: u32,
    pub transactions: Vec<Transaction>,
}

/// Run `case` on a fresh core and describe the first difference from the
/// recorded result.
pub fn replay(case: &TimingCase) -> Option<String> {
    let mut bus = TracingPinBus::new();
    let mut cpu = powered_cpu(&mut bus);
    case.initial.apply(&mut cpu);
    for &(addr, value) in &case.initial.ram {
        bus.memory[addr as usize] = value;
    }
    for t in &case.transactions {
        if t.kind == TransactionKind::IoRead {
            bus.ports[(t.addr & 0xFF) as usize] = t.data;
        }
    }

    let Some(edges) = run_instruction(&mut cpu, &mut bus, 1000) else {
        return Some(format!("{}: instruction did not complete in 1000 edges", case.name));
    };

    let got = Z80CpuState::capture(&cpu);
    if let Some(reg) = got.first_mismatch(&case.final_state) {
        return Some(format!("{}: {reg}", case.name));
    }
    for &(addr, expected) in &case.final_state.ram {
        let value = bus.memory[addr as usize];
        if value != expected {
            return Some(format!(
                "{}: RAM[0x{addr:04X}] (got 0x{value:02X} exp 0x{expected:02X})",
                case.name
            ));
        }
    }
    if edges != case.edges {
        return Some(format!("{}: edges (got {edges} exp {})", case.name, case.edges));
    }
    let traced = transactions(&bus.events);
    if traced != case.transactions {
        let index = traced
            .iter()
            .zip(&case.transactions)
            .position(|(a, b)| a != b)
            .unwrap_or(traced.len().min(case.transactions.len()));
        return Some(format!(
            "{}: transaction {index} (got {:?} exp {:?})",
            case.name,
            traced.get(index),
            case.transactions.get(index)
        ));
    }
    None
}

// --- Vector files ---

#[derive(Debug)]
pub enum VectorError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "malformed vector file: {e}"),
        }
    }
}

impl std::error::Error for VectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for VectorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read a vector file; `.gz` files are decompressed.
pub fn read_cases(path: &Path) -> Result<Vec<TimingCase>, VectorError> {
    let file = BufReader::new(File::open(path)?);
    let mut reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut json = String::new();
    reader.read_to_string(&mut json)?;
    Ok(serde_json::from_str(&json)?)
}

/// Write a vector file; `.gz` paths are compressed.
pub fn write_cases(path: &Path, cases: &[TimingCase]) -> Result<(), VectorError> {
    let mut file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, cases)?;
        encoder.finish()?.flush()?;
    } else {
        serde_json::to_writer(&mut file, cases)?;
        file.flush()?;
    }
    Ok(())
}
