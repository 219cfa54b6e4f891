pub mod bus;
pub mod machine;

pub use bus::{ControlLine, Level, PinBus};
pub use machine::Machine;
