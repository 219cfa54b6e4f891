use std::io::{self, Write};

use log::{info, warn};
use tstate_core::core::machine::Machine;
use tstate_core::cpu::{CpuStateTrait, Z80State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub cycles: u64,
    pub instructions: u64,
    pub halted: bool,
}

/// Clock a powered board until the CPU halts or `max_cycles` full clock
/// periods have elapsed, streaming console output to `out`.
pub fn run(machine: &mut dyn Machine, max_cycles: u64, out: &mut impl Write) -> io::Result<RunOutcome> {
    let mut outcome = RunOutcome {
        cycles: 0,
        instructions: 0,
        halted: false,
    };
    if !machine.cpu().is_running() {
        warn!("CPU did not come out of reset; nothing to run");
        return Ok(outcome);
    }

    while outcome.cycles < max_cycles {
        let completed = machine.run_cycle();
        outcome.cycles += 1;
        if completed > 0 {
            outcome.instructions += completed as u64;
            let bytes = machine.take_output();
            if !bytes.is_empty() {
                out.write_all(&bytes)?;
                out.flush()?;
            }
        }
        if machine.cpu().is_halted() {
            outcome.halted = true;
            break;
        }
    }

    if outcome.halted {
        info!("halted after {} cycles", outcome.cycles);
    } else {
        warn!("cycle budget of {max_cycles} exhausted before HALT");
    }
    Ok(outcome)
}

/// Final register dump, one line per group.
pub fn write_state(out: &mut impl Write, s: &Z80State) -> io::Result<()> {
    writeln!(
        out,
        "PC={:04X} SP={:04X} IX={:04X} IY={:04X} WZ={:04X} I={:02X} R={:02X}",
        s.pc, s.sp, s.ix, s.iy, s.wz, s.i, s.r
    )?;
    writeln!(
        out,
        "A={:02X} F={:02X} B={:02X} C={:02X} D={:02X} E={:02X} H={:02X} L={:02X}",
        s.a, s.f, s.b, s.c, s.d, s.e, s.h, s.l
    )?;
    writeln!(
        out,
        "A'={:02X} F'={:02X} B'={:02X} C'={:02X} D'={:02X} E'={:02X} H'={:02X} L'={:02X}",
        s.a_prime, s.f_prime, s.b_prime, s.c_prime, s.d_prime, s.e_prime, s.h_prime, s.l_prime
    )?;
    writeln!(
        out,
        "halted={} cycle={:?} phase={:?} step={}",
        s.halted, s.cycle, s.phase, s.step
    )
}

/// Summary printed after a run.
pub fn write_report(out: &mut impl Write, machine: &dyn Machine, outcome: &RunOutcome) -> io::Result<()> {
    let cpu = machine.cpu();
    writeln!(
        out,
        "{} after {} cycles, {} instructions",
        if outcome.halted { "Halted" } else { "Stopped" },
        outcome.cycles,
        outcome.instructions
    )?;
    writeln!(out, "Unimplemented opcodes executed: {}", cpu.unimplemented_count())?;
    write_state(out, &cpu.snapshot())
}
