#![allow(dead_code)]

use tstate_core::core::bus::{ControlLine, Level, PinBus};
use tstate_core::cpu::z80::{Edge, Quirks, Z80};

/// Pin activity seen by the bus, tagged with the edge it happened on.
#[derive(Clone, Debug, PartialEq)]
pub enum PinEvent {
    Address(u16, u32),
    FloatAddress,
    Data(u8),
    FloatData,
    Sample(u8),
    Line(ControlLine, Level, u32),
}

/// Minimal board for testing: flat 64KB memory and 256 I/O ports that
/// answer the CPU's strobes like real hardware would.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub ports: [u8; 256],
    pub io_writes: Vec<(u16, u8)>,
    pub io_reads: Vec<u16>,
    pub events: Vec<(u32, PinEvent)>,
    /// Edges delivered since power-on.
    pub edge: u32,
    next_edge: Edge,
    address: Option<u16>,
    data: Option<u8>,
    lines: [Level; 8],
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0xFF; 256],
            io_writes: Vec::new(),
            io_reads: Vec::new(),
            events: Vec::new(),
            edge: 0,
            next_edge: Edge::Rising,
            address: None,
            data: None,
            lines: [Level::High; 8],
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn line(&self, line: ControlLine) -> Level {
        self.lines[line.index()]
    }

    pub fn address(&self) -> Option<u16> {
        self.address
    }

    pub fn data(&self) -> Option<u8> {
        self.data
    }

    /// Events recorded on a given edge, in order.
    pub fn events_at(&self, edge: u32) -> Vec<PinEvent> {
        self.events
            .iter()
            .filter(|(e, _)| *e == edge)
            .map(|(_, ev)| ev.clone())
            .collect()
    }

    /// Memory writes in bus order: the address and data driven when WR
    /// went low with MREQ asserted.
    pub fn memory_writes(&self) -> Vec<(u16, u8)> {
        let mut writes = Vec::new();
        let (mut address, mut data, mut mreq) = (0u16, 0u8, false);
        for (_, ev) in &self.events {
            match *ev {
                PinEvent::Address(addr, _) => address = addr,
                PinEvent::Data(value) => data = value,
                PinEvent::Line(ControlLine::Mreq, level, _) => mreq = level.is_low(),
                PinEvent::Line(ControlLine::Wr, Level::Low, _) if mreq => {
                    writes.push((address, data))
                }
                _ => {}
            }
        }
        writes
    }

    fn record(&mut self, event: PinEvent) {
        self.events.push((self.edge, event));
    }
}

impl PinBus for TestBus {
    fn set_address_with_delay(&mut self, addr: u16, delay_ps: u32) {
        self.address = Some(addr);
        self.record(PinEvent::Address(addr, delay_ps));
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
        let addr = self.address.unwrap_or(0xFFFF);
        let rd = self.line(ControlLine::Rd).is_low();
        let value = if rd && self.line(ControlLine::Mreq).is_low() {
            self.memory[addr as usize]
        } else if rd && self.line(ControlLine::Iorq).is_low() {
            self.io_reads.push(addr);
            self.ports[(addr & 0xFF) as usize]
        } else {
            0xFF
        };
        self.record(PinEvent::Sample(value));
        value
    }

    fn float_data_bus(&mut self, _delay_ps: Option<u32>) {
        self.data = None;
        self.record(PinEvent::FloatData);
    }

    fn set_line_with_delay(&mut self, line: ControlLine, level: Level, delay_ps: u32) {
        let previous = self.lines[line.index()];
        self.lines[line.index()] = level;
        self.record(PinEvent::Line(line, level, delay_ps));

        // Writes commit on the falling edge of WR.
        if line == ControlLine::Wr && previous == Level::High && level == Level::Low {
            let addr = self.address.unwrap_or(0);
            let data = self.data.unwrap_or(0xFF);
            if self.line(ControlLine::Mreq).is_low() {
                self.memory[addr as usize] = data;
            } else if self.line(ControlLine::Iorq).is_low() {
                self.io_writes.push((addr, data));
            }
        }
    }
}

/// Deliver the next clock edge, alternating rising and falling.
pub fn tick(cpu: &mut Z80, bus: &mut TestBus) -> bool {
    let edge = bus.next_edge;
    bus.next_edge = match edge {
        Edge::Rising => Edge::Falling,
        Edge::Falling => Edge::Rising,
    };
    let done = cpu.tick(edge, bus);
    bus.edge += 1;
    done
}

/// Hold reset for `cycles` full clock periods, then release it.
pub fn pulse_reset(cpu: &mut Z80, bus: &mut TestBus, cycles: u32) {
    cpu.reset(true, bus);
    for _ in 0..cycles * 2 {
        tick(cpu, bus);
    }
    cpu.reset(false, bus);
}

/// A core that has been through a valid reset and is ready to fetch from 0.
pub fn powered_cpu(bus: &mut TestBus) -> Z80 {
    powered_cpu_with(bus, Quirks::default())
}

pub fn powered_cpu_with(bus: &mut TestBus, quirks: Quirks) -> Z80 {
    let mut cpu = Z80::with_quirks(quirks);
    pulse_reset(&mut cpu, bus, 3);
    bus.events.clear();
    bus.edge = 0;
    cpu
}

/// Clock until an instruction completes. Returns the number of edges
/// (two per T-state).
pub fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    let mut edges = 0;
    loop {
        let done = tick(cpu, bus);
        edges += 1;
        if done {
            return edges;
        }
        assert!(edges < 10_000, "instruction never completed");
    }
}

/// Run `count` instructions, returning the total edge count.
pub fn run_instructions(cpu: &mut Z80, bus: &mut TestBus, count: usize) -> u32 {
    (0..count).map(|_| run_instruction(cpu, bus)).sum()
}
