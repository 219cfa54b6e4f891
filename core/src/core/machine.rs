use crate::cpu::z80::{Edge, Z80};

/// Board-agnostic interface for a clocked system built around the core.
///
/// Each board owns the CPU and whatever answers its pins (memory, ports).
/// The frontend drives boards only through this trait: it loads a program,
/// pulses reset, then feeds clock edges until the CPU halts or a cycle
/// budget runs out.
pub trait Machine {
    /// Short description shown by the frontend.
    fn description(&self) -> &'static str;

    /// Copy `data` into memory starting at `addr`, bypassing any write
    /// protection. Bytes past the top of the address space are dropped.
    fn load(&mut self, addr: u16, data: &[u8]);

    /// Drive the RESET input. `true` asserts it (active low on the part).
    fn set_reset(&mut self, asserted: bool);

    /// Process one half-clock edge. Returns true when an instruction
    /// completed on this edge.
    fn clock_edge(&mut self, edge: Edge) -> bool;

    fn cpu(&self) -> &Z80;

    fn cpu_mut(&mut self) -> &mut Z80;

    /// Memory contents as the board sees them, without bus side effects.
    fn peek(&self, addr: u16) -> u8;

    /// Drain bytes written to the console port since the last call.
    fn take_output(&mut self) -> Vec<u8>;

    /// Hold RESET for `cycles` full clock periods, then release it.
    fn power_on(&mut self, cycles: u32) {
        self.set_reset(true);
        for _ in 0..cycles {
            self.clock_edge(Edge::Rising);
            self.clock_edge(Edge::Falling);
        }
        self.set_reset(false);
    }

    /// Run one full clock period (rising then falling edge). Returns the
    /// number of instructions completed.
    fn run_cycle(&mut self) -> u32 {
        let mut completed = 0;
        if self.clock_edge(Edge::Rising) {
            completed += 1;
        }
        if self.clock_edge(Edge::Falling) {
            completed += 1;
        }
        completed
    }
}
