use tstate_core::cpu::z80::{Flag, Quirks, Reg8, Reg16};
mod common;
use common::{TestBus, powered_cpu, powered_cpu_with, run_instruction};

const C: u8 = Flag::C as u8;
const N: u8 = Flag::N as u8;
const PV: u8 = Flag::PV as u8;
const H: u8 = Flag::H as u8;
const Z: u8 = Flag::Z as u8;
const S: u8 = Flag::S as u8;

#[test]
fn test_add_a_b() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x0F);
    cpu.regs.set8(Reg8::B, 0x01);
    bus.load(0, &[0x80]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.a(), 0x10);
    let f = cpu.regs.f();
    assert_ne!(f & H, 0);
    assert_eq!(f & (C | N | Z | S | PV), 0);
}

#[test]
fn test_add_overflow_to_zero() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0xFF);
    // ADD A,1
    bus.load(0, &[0xC6, 0x01]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.regs.a(), 0x00);
    let f = cpu.regs.f();
    assert_ne!(f & C, 0);
    assert_ne!(f & Z, 0);
    assert_ne!(f & H, 0);
    assert_eq!(f & PV, 0);
}

#[test]
fn test_add_signed_overflow() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x7F);
    cpu.regs.set8(Reg8::C, 0x01);
    // ADD A,C
    bus.load(0, &[0x81]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x80);
    assert_ne!(cpu.regs.f() & PV, 0);
    assert_ne!(cpu.regs.f() & S, 0);
}

#[test]
fn test_adc_uses_carry() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x10);
    cpu.regs.set8(Reg8::D, 0x20);
    cpu.regs.set_f(C);
    // ADC A,D
    bus.load(0, &[0x8A]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x31);
    assert_eq!(cpu.regs.f() & C, 0);
}

#[test]
fn test_sub_borrow() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x10);
    cpu.regs.set8(Reg8::E, 0x20);
    // SUB E
    bus.load(0, &[0x93]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0xF0);
    let f = cpu.regs.f();
    assert_ne!(f & C, 0);
    assert_ne!(f & N, 0);
    assert_ne!(f & S, 0);
    assert_eq!(f & H, 0);
}

#[test]
fn test_sbc_with_carry() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x10);
    cpu.regs.set_f(C);
    // SBC A,0x0F
    bus.load(0, &[0xDE, 0x0F]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x00);
    let f = cpu.regs.f();
    assert_ne!(f & Z, 0);
    assert_ne!(f & H, 0);
    assert_eq!(f & C, 0);
}

#[test]
fn test_cp_leaves_a_and_mirrors_operand() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x40);
    // CP 0x28
    bus.load(0, &[0xFE, 0x28]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.regs.a(), 0x40);
    let f = cpu.regs.f();
    assert_eq!(f & 0x28, 0x28);
    assert_ne!(f & N, 0);
    assert_eq!(f & (C | Z), 0);
}

#[test]
fn test_cp_equal_sets_zero() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x42);
    cpu.regs.set8(Reg8::B, 0x42);
    bus.load(0, &[0xB8]);

    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.regs.f() & Z, 0);
}

#[test]
fn test_and_xor_or() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0xF0);
    cpu.regs.set_f(C | N);
    // AND 0x3C ; XOR 0xFF ; OR 0x01
    bus.load(0, &[0xE6, 0x3C, 0xEE, 0xFF, 0xF6, 0x01]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x30);
    assert_eq!(cpu.regs.f() & (C | N | H), H);
    // 0x30 has even parity
    assert_ne!(cpu.regs.f() & PV, 0);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0xCF);
    assert_eq!(cpu.regs.f() & (H | S), S);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0xCF);
    assert_eq!(cpu.regs.f() & H, 0);
}

#[test]
fn test_xor_a_clears_accumulator() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x5A);
    bus.load(0, &[0xAF]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0);
    assert_eq!(cpu.regs.f(), Z | PV);
}

#[test]
fn test_alu_hl_ind() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x01);
    cpu.regs.set16(Reg16::Hl, 0x3000);
    bus.memory[0x3000] = 0x41;
    // ADD A,(HL)
    bus.load(0, &[0x86]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.regs.a(), 0x42);
}

#[test]
fn test_inc_dec_r() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set8(Reg8::B, 0x7F);
    cpu.regs.set8(Reg8::C, 0x80);
    cpu.regs.set_f(C);
    // INC B ; DEC C
    bus.load(0, &[0x04, 0x0D]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.get8(Reg8::B), 0x80);
    let f = cpu.regs.f();
    assert_ne!(f & PV, 0);
    assert_ne!(f & H, 0);
    // Carry is preserved
    assert_ne!(f & C, 0);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.regs.get8(Reg8::C), 0x7F);
    let f = cpu.regs.f();
    assert_ne!(f & PV, 0);
    assert_ne!(f & N, 0);
    assert_ne!(f & H, 0);
    assert_ne!(f & C, 0);
}

#[test]
fn test_inc_hl_ind_read_modify_write() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x2000);
    bus.memory[0x2000] = 0xFF;
    // INC (HL)
    bus.load(0, &[0x34]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 22);
    assert_eq!(bus.memory[0x2000], 0x00);
    assert_ne!(cpu.regs.f() & Z, 0);
}

#[test]
fn test_dec_hl_ind() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x2000);
    bus.memory[0x2000] = 0x01;
    bus.load(0, &[0x35]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 22);
    assert_eq!(bus.memory[0x2000], 0x00);
    assert_ne!(cpu.regs.f() & Z, 0);
    assert_ne!(cpu.regs.f() & N, 0);
}

#[test]
fn test_inc_dec_rp_leaves_flags() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::De, 0xFFFF);
    cpu.regs.set16(Reg16::Bc, 0x0000);
    cpu.regs.set_f(0);
    // INC DE ; DEC BC
    bus.load(0, &[0x13, 0x0B]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_eq!(cpu.regs.get16(Reg16::De), 0x0000);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_eq!(cpu.regs.get16(Reg16::Bc), 0xFFFF);
    assert_eq!(cpu.regs.f(), 0);
}

#[test]
fn test_add_hl_de() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x0FFF);
    cpu.regs.set16(Reg16::De, 0x0001);
    cpu.regs.set_f(Z | S | PV);
    bus.load(0, &[0x19]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 22);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0x1000);
    let f = cpu.regs.f();
    assert_ne!(f & H, 0);
    assert_eq!(f & (C | N), 0);
    // S, Z and P/V are untouched
    assert_eq!(f & (Z | S | PV), Z | S | PV);
    assert_eq!(cpu.regs.wz(), 0x1000);
}

#[test]
fn test_add_hl_hl_carry() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x8000);
    bus.load(0, &[0x29]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0x0000);
    assert_ne!(cpu.regs.f() & C, 0);
}

#[test]
fn test_simplified_half_carry_quirk() {
    let quirks = Quirks { simplified_half_carry: true, ..Quirks::default() };
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu_with(&mut bus, quirks);
    cpu.regs.set_a(0x0F);
    cpu.regs.set_f(0);
    // ADD A,1 ; AND 0xFF ; SUB 0
    bus.load(0, &[0xC6, 0x01, 0xE6, 0xFF, 0xD6, 0x00]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x10);
    assert_eq!(cpu.regs.f() & H, 0);

    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.regs.f() & H, 0);

    // Arithmetic leaves the H set by AND in place.
    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.regs.f() & H, 0);
}
