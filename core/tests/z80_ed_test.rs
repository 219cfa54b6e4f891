use tstate_core::cpu::z80::{Flag, Prefix, Reg8, Reg16};
mod common;
use common::{TestBus, powered_cpu, run_instruction};

#[test]
fn test_sbc_hl_de() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x1000);
    cpu.regs.set16(Reg16::De, 0x0001);
    cpu.regs.set_f(Flag::C as u8);
    bus.load(0, &[0xED, 0x52]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 30);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0x0FFE);
    let f = cpu.regs.f();
    assert_ne!(f & Flag::N as u8, 0);
    assert_ne!(f & Flag::H as u8, 0);
    assert_eq!(f & (Flag::C as u8 | Flag::Z as u8), 0);
    assert_eq!(cpu.regs.wz(), 0x1001);
}

#[test]
fn test_sbc_hl_hl_to_zero() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x8000);
    cpu.regs.set_f(0);
    bus.load(0, &[0xED, 0x62]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0);
    assert_ne!(cpu.regs.f() & Flag::Z as u8, 0);
}

#[test]
fn test_adc_hl_bc_overflow() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Hl, 0x7FFF);
    cpu.regs.set16(Reg16::Bc, 0x0000);
    cpu.regs.set_f(Flag::C as u8);
    bus.load(0, &[0xED, 0x4A]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 30);
    assert_eq!(cpu.regs.get16(Reg16::Hl), 0x8000);
    let f = cpu.regs.f();
    assert_ne!(f & Flag::PV as u8, 0);
    assert_ne!(f & Flag::S as u8, 0);
    assert_eq!(f & Flag::C as u8, 0);
}

#[test]
fn test_neg() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x01);
    bus.load(0, &[0xED, 0x44]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.regs.a(), 0xFF);
    let f = cpu.regs.f();
    assert_ne!(f & Flag::C as u8, 0);
    assert_ne!(f & Flag::N as u8, 0);
}

#[test]
fn test_neg_0x80_overflows() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x80);
    bus.load(0, &[0xED, 0x44]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a(), 0x80);
    assert_ne!(cpu.regs.f() & Flag::PV as u8, 0);
}

#[test]
fn test_ld_nn_de_and_back() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::De, 0x1357);
    // LD (0x5000),DE ; LD SP,(0x5000)
    bus.load(0, &[0xED, 0x53, 0x00, 0x50, 0xED, 0x7B, 0x00, 0x50]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 40);
    assert_eq!(bus.memory[0x5000], 0x57);
    assert_eq!(bus.memory[0x5001], 0x13);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 40);
    assert_eq!(cpu.regs.sp(), 0x1357);
    assert_eq!(cpu.regs.pc(), 8);
}

#[test]
fn test_in_r_c() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Bc, 0x1234);
    cpu.regs.set_f(Flag::C as u8);
    bus.ports[0x34] = 0x00;
    // IN D,(C)
    bus.load(0, &[0xED, 0x50]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 24);
    assert_eq!(cpu.regs.get8(Reg8::D), 0x00);
    assert_eq!(bus.io_reads, vec![0x1234]);
    let f = cpu.regs.f();
    assert_ne!(f & Flag::Z as u8, 0);
    assert_ne!(f & Flag::PV as u8, 0);
    assert_ne!(f & Flag::C as u8, 0);
    assert_eq!(cpu.regs.wz(), 0x1235);
}

#[test]
fn test_in_flags_only() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Bc, 0x0010);
    bus.ports[0x10] = 0x80;
    // IN (C)
    bus.load(0, &[0xED, 0x70]);

    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.regs.f() & Flag::S as u8, 0);
    assert_eq!(cpu.regs.get8(Reg8::H), 0);
    assert_eq!(cpu.regs.get8(Reg8::L), 0);
}

#[test]
fn test_out_c_r_and_out_c_zero() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set16(Reg16::Bc, 0xAB20);
    cpu.regs.set_a(0x42);
    // OUT (C),A ; OUT (C),0
    bus.load(0, &[0xED, 0x79, 0xED, 0x71]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 24);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 24);
    assert_eq!(bus.io_writes, vec![(0xAB20, 0x42), (0xAB20, 0x00)]);
}

#[test]
fn test_retn_restores_iff1() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_sp(0x7FFE);
    cpu.regs.set8(Reg8::Iff2, 1);
    bus.load(0x7FFE, &[0x00, 0x30]);
    bus.load(0, &[0xED, 0x45]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 28);
    assert_eq!(cpu.regs.pc(), 0x3000);
    assert!(cpu.regs.iff1());
}

#[test]
fn test_rrd() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x84);
    cpu.regs.set16(Reg16::Hl, 0x5000);
    bus.memory[0x5000] = 0x20;
    bus.load(0, &[0xED, 0x67]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 36);
    assert_eq!(cpu.regs.a(), 0x80);
    assert_eq!(bus.memory[0x5000], 0x42);
}

#[test]
fn test_rld() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x7A);
    cpu.regs.set16(Reg16::Hl, 0x5000);
    bus.memory[0x5000] = 0x31;
    bus.load(0, &[0xED, 0x6F]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 36);
    assert_eq!(cpu.regs.a(), 0x73);
    assert_eq!(bus.memory[0x5000], 0x1A);
}

#[test]
fn test_undefined_ed_is_two_fetch_nop() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    cpu.regs.set_a(0x11);
    bus.load(0, &[0xED, 0x00]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.regs.pc(), 2);
    assert_eq!(cpu.regs.a(), 0x11);
    assert!(cpu.take_unimplemented().is_none());
}

#[test]
fn test_im_is_reported_unimplemented() {
    let mut bus = TestBus::new();
    let mut cpu = powered_cpu(&mut bus);
    // IM 1
    bus.load(0, &[0xED, 0x56]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    let record = cpu.take_unimplemented().expect("IM should be reported");
    assert_eq!(record.prefix, Prefix::Ed);
    assert_eq!(record.opcode, 0x56);
    assert_eq!(record.address, 1);
    assert_eq!(cpu.unimplemented_count(), 1);
}
