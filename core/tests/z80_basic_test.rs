use tstate_core::cpu::CpuStateTrait;
use tstate_core::cpu::z80::{BusCycle, Flag, Reg8, Reg16};
mod common;
use common::{TestBus, powered_cpu, run_instruction, run_instructions};

#[test]
fn test_nop() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    bus.load(0, &[0x00]);

    let edges = run_instruction(&mut cpu, &mut bus);
    assert_eq!(edges, 8);
    assert_eq!(cpu.regs.pc(), 1);
    assert_eq!(cpu.step(), 0);
    assert_eq!(cpu.cycle(), BusCycle::Fetch);
}

#[test]
fn test_nop_sequence_advances_pc() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);

    let edges = run_instructions(&mut cpu, &mut bus, 5);
    assert_eq!(edges, 40);
    assert_eq!(cpu.regs.pc(), 5);
}

#[test]
fn test_ld_a_n() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    // LD A, 0x42
    bus.load(0, &[0x3E, 0x42]);

    let edges = run_instruction(&mut cpu, &mut bus);
    assert_eq!(edges, 14);
    assert_eq!(cpu.regs.a(), 0x42);
    assert_eq!(cpu.regs.pc(), 2);
}

#[test]
fn test_ld_r_n_all_registers() {
    // LD B..L with distinct immediates
    let program = [0x06, 0x11, 0x0E, 0x22, 0x16, 0x33, 0x1E, 0x44, 0x26, 0x55, 0x2E, 0x66];
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    bus.load(0, &program);

    let edges = run_instructions(&mut cpu, &mut bus, 6);
    assert_eq!(edges, 6 * 14);
    let state = cpu.snapshot();
    assert_eq!(
        (state.b, state.c, state.d, state.e, state.h, state.l),
        (0x11, 0x22, 0x33, 0x44, 0x55, 0x66)
    );
}

#[test]
fn test_ld_r_r() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set8(Reg8::E, 0x9A);
    // LD B,E ; LD A,B
    bus.load(0, &[0x43, 0x78]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.get8(Reg8::B), 0x9A);
    assert_eq!(cpu.regs.a(), 0x9A);
}

#[test]
fn test_refresh_counter_increments_per_fetch() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set8(Reg8::R, 0xFF);

    run_instructions(&mut cpu, &mut bus, 2);
    // Bit 7 is preserved, the low seven bits wrap.
    assert_eq!(cpu.regs.get8(Reg8::R), 0x81);
}

#[test]
fn test_refresh_counter_counts_prefix_fetches() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    // LD IX,0x1234 — two M1 cycles
    bus.load(0, &[0xDD, 0x21, 0x34, 0x12]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.get8(Reg8::R), 2);
}

#[test]
fn test_ex_af_af() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Af, 0x1234);
    cpu.regs.set16(Reg16::AfAlt, 0xABCD);
    bus.load(0, &[0x08]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.get16(Reg16::Af), 0xABCD);
    assert_eq!(cpu.regs.get16(Reg16::AfAlt), 0x1234);
}

#[test]
fn test_exx() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Bc, 0x0102);
    cpu.regs.set16(Reg16::De, 0x0304);
    cpu.regs.set16(Reg16::Hl, 0x0506);
    cpu.regs.set16(Reg16::BcAlt, 0x1112);
    cpu.regs.set16(Reg16::DeAlt, 0x1314);
    cpu.regs.set16(Reg16::HlAlt, 0x1516);
    cpu.regs.set16(Reg16::Af, 0x7788);
    bus.load(0, &[0xD9]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.get16(Reg16::Bc), 0x1112);
    assert_eq!(cpu.regs.get16(Reg16::De), 0x1314);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0x1516);
    assert_eq!(cpu.regs.get16(Reg16::HlAlt), 0x0506);
    // AF is not part of EXX
    assert_eq!(cpu.regs.get16(Reg16::Af), 0x7788);
}

#[test]
fn test_ex_de_hl() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::De, 0x1111);
    cpu.regs.set16(Reg16::Hl, 0x2222);
    bus.load(0, &[0xEB]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.get16(Reg16::De), 0x2222);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0x1111);
}

#[test]
fn test_ex_de_hl_ignores_index_prefix() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::De, 0x1111);
    cpu.regs.set16(Reg16::Hl, 0x2222);
    cpu.regs.set16(Reg16::Ix, 0x3333);
    bus.load(0, &[0xDD, 0xEB]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.regs.get16(Reg16::De), 0x2222);
    assert_eq!(cpu.regs.get16(Reg16::Ix), 0x3333);
}

#[test]
fn test_scf_ccf() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x28);
    cpu.regs.set_f(Flag::H as u8 | Flag::N as u8);
    // SCF ; CCF
    bus.load(0, &[0x37, 0x3F]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.f(), Flag::C as u8 | 0x28);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.f() & Flag::C as u8, 0);
    assert_ne!(cpu.regs.f() & Flag::H as u8, 0);
}

#[test]
fn test_cpl() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x5A);
    bus.load(0, &[0x2F]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0xA5);
    let f = cpu.regs.f();
    assert_ne!(f & Flag::H as u8, 0);
    assert_ne!(f & Flag::N as u8, 0);
}

#[test]
fn test_daa_after_add() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x19);
    // ADD A,0x28 ; DAA
    bus.load(0, &[0xC6, 0x28, 0x27]);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a(), 0x47);
    assert_eq!(cpu.regs.f() & Flag::C as u8, 0);
}

#[test]
fn test_daa_after_sub() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x42);
    // SUB 0x15 ; DAA
    bus.load(0, &[0xD6, 0x15, 0x27]);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a(), 0x27);
}

#[test]
fn test_rlca_rrca() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x81);
    cpu.regs.set_f(Flag::Z as u8);
    // RLCA ; RRCA
    bus.load(0, &[0x07, 0x0F]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x03);
    assert_ne!(cpu.regs.f() & Flag::C as u8, 0);
    // Z untouched by the accumulator form
    assert_ne!(cpu.regs.f() & Flag::Z as u8, 0);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x81);
    assert_ne!(cpu.regs.f() & Flag::C as u8, 0);
}

#[test]
fn test_rla_rra_through_carry() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x80);
    cpu.regs.set_f(0);
    // RLA ; RRA
    bus.load(0, &[0x17, 0x1F]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x00);
    assert_ne!(cpu.regs.f() & Flag::C as u8, 0);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x80);
    assert_eq!(cpu.regs.f() & Flag::C as u8, 0);
}

#[test]
fn test_snapshot_reports_registers_and_position() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    bus.load(0, &[0x3E, 0x7F]);

    run_instruction(&mut cpu, &mut bus);
    let state = cpu.snapshot();
    assert_eq!(state.a, 0x7F);
    assert_eq!(state.pc, 2);
    assert_eq!(state.step, 0);
    assert_eq!(state.cycle, BusCycle::Fetch);
    assert!(!state.halted);
}
