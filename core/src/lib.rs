pub mod core;
pub mod cpu;

pub mod prelude {
    pub use crate::core::machine::Machine;
    pub use crate::core::{ControlLine, Level, PinBus};
    pub use crate::cpu::CpuStateTrait;
    pub use crate::cpu::z80::{Edge, Quirks, Z80};
}
