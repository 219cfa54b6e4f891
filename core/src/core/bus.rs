/// Delay between the rising T3 edge of an opcode fetch and the refresh
/// address appearing on the bus.
pub const REFRESH_ADDRESS_DELAY_PS: u32 = 20_000;

/// Delay between the rising T3 edge of an opcode fetch and RFSH going low.
pub const REFRESH_STROBE_DELAY_PS: u32 = 22_000;

/// Hold time before the data bus is released after a write strobe ends.
pub const DATA_FLOAT_DELAY_PS: u32 = 20_000;

/// Control outputs driven by the CPU. All of them are active low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlLine {
    M1,
    Mreq,
    Iorq,
    Rd,
    Wr,
    Rfsh,
    Halt,
    Busak,
}

impl ControlLine {
    pub const ALL: [ControlLine; 8] = [
        ControlLine::M1,
        ControlLine::Mreq,
        ControlLine::Iorq,
        ControlLine::Rd,
        ControlLine::Wr,
        ControlLine::Rfsh,
        ControlLine::Halt,
        ControlLine::Busak,
    ];

    /// Stable index into per-line tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            ControlLine::M1 => "M1",
            ControlLine::Mreq => "MREQ",
            ControlLine::Iorq => "IORQ",
            ControlLine::Rd => "RD",
            ControlLine::Wr => "WR",
            ControlLine::Rfsh => "RFSH",
            ControlLine::Halt => "HALT",
            ControlLine::Busak => "BUSAK",
        }
    }
}

/// Logic level of a driven output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    #[default]
    High,
}

impl Level {
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

/// Pin-level interface between the core and the simulated board.
///
/// The core never reads or writes memory directly. It drives the address
/// bus, the data bus and the control strobes at specific half-clock phases
/// and samples the data bus when a read or fetch requires it; whatever sits
/// on the other side of the pins decides what the strobes mean.
///
/// Delays are in picoseconds relative to the clock edge being processed.
/// Boards that do not model propagation delays may ignore them.
pub trait PinBus {
    /// Drive a 16-bit value onto the address bus after `delay_ps`.
    fn set_address_with_delay(&mut self, addr: u16, delay_ps: u32);

    /// Drive the address bus immediately.
    fn set_address(&mut self, addr: u16) {
        self.set_address_with_delay(addr, 0);
    }

    /// Release the address bus (high impedance).
    fn float_address_bus(&mut self);

    /// Drive an 8-bit value onto the data bus.
    fn set_data(&mut self, data: u8);

    /// Sample the 8-bit value currently present on the data bus.
    fn read_data(&mut self) -> u8;

    /// Release the data bus, optionally after a hold delay.
    fn float_data_bus(&mut self, delay_ps: Option<u32>);

    /// Drive a control output to `level` after `delay_ps`.
    fn set_line_with_delay(&mut self, line: ControlLine, level: Level, delay_ps: u32);

    /// Drive a control output immediately.
    fn set_line(&mut self, line: ControlLine, level: Level) {
        self.set_line_with_delay(line, level, 0);
    }
}
