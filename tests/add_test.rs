//! Tests for ADD and ADC, including the 16-bit carry chain.

use oper8::{Cpu, FlatMemory};

fn setup_cpu() -> Cpu<FlatMemory> {
    Cpu::new(FlatMemory::new())
}

// ========== ADD ==========

#[test]
fn test_add_basic() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x10);
    cpu.set_reg(2, 0x05);
    cpu.load_program(&[0x30, 0x12], 0x0200); // ADD R1, R2

    cpu.step();

    assert_eq!(cpu.reg(1), 0x15);
    assert_eq!(cpu.reg(2), 0x05);
    assert!(!cpu.flag_c());
    assert!(!cpu.flag_z());
    assert!(!cpu.flag_n());
    assert_eq!(cpu.pc(), 0x0202);
}

#[test]
fn test_add_sets_carry_on_overflow() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x01);
    cpu.set_reg(2, 0xFF);
    cpu.load_program(&[0x30, 0x12], 0x0200);

    cpu.step();

    assert_eq!(cpu.reg(1), 0x00);
    assert!(cpu.flag_c());
    assert!(cpu.flag_z());
}

#[test]
fn test_add_ignores_incoming_carry() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(1, 0x10);
    cpu.set_reg(2, 0x05);
    cpu.load_program(&[0x30, 0x12], 0x0200);

    cpu.step();
    assert_eq!(cpu.reg(1), 0x15); // not 0x16
}

#[test]
fn test_add_negative_flag() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x7F);
    cpu.set_reg(2, 0x01);
    cpu.load_program(&[0x30, 0x12], 0x0200);

    cpu.step();

    assert_eq!(cpu.reg(1), 0x80);
    assert!(cpu.flag_n());
    assert!(!cpu.flag_c());
}

#[test]
fn test_add_register_to_itself_doubles() {
    let mut cpu = setup_cpu();
    cpu.set_reg(6, 0x21);
    cpu.load_program(&[0x30, 0x66], 0x0200); // ADD R6, R6

    cpu.step();
    assert_eq!(cpu.reg(6), 0x42);
}

// ========== ADC ==========

#[test]
fn test_adc_adds_incoming_carry() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(1, 0x10);
    cpu.set_reg(2, 0x05);
    cpu.load_program(&[0x31, 0x12], 0x0200); // ADC R1, R2

    cpu.step();
    assert_eq!(cpu.reg(1), 0x16);
    assert!(!cpu.flag_c());
}

#[test]
fn test_adc_carry_out_with_carry_in() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(1, 0xFF);
    cpu.set_reg(2, 0x00);
    cpu.load_program(&[0x31, 0x12], 0x0200);

    cpu.step();

    assert_eq!(cpu.reg(1), 0x00);
    assert!(cpu.flag_c());
    assert!(cpu.flag_z());
}

#[test]
fn test_add_adc_chain_is_16_bit_addition() {
    // 0x1234 + 0x5678 = 0x68AC: low bytes with ADD, high bytes with ADC
    let mut cpu = setup_cpu();
    cpu.set_reg(0, 0x12); // high A
    cpu.set_reg(1, 0x34); // low A
    cpu.set_reg(2, 0x56); // high B
    cpu.set_reg(3, 0x78); // low B
    cpu.load_program(&[0x30, 0x13, 0x31, 0x02], 0x0200); // ADD R1,R3; ADC R0,R2

    cpu.run(2);

    assert_eq!(cpu.reg(0), 0x68);
    assert_eq!(cpu.reg(1), 0xAC);
    assert!(!cpu.flag_c());
}

#[test]
fn test_add_adc_chain_carries_out_of_16_bits() {
    // 0xFFFF + 0x0001 = 0x10000: the final carry is the 17th bit
    let mut cpu = setup_cpu();
    cpu.set_reg(0, 0xFF);
    cpu.set_reg(1, 0xFF);
    cpu.set_reg(2, 0x00);
    cpu.set_reg(3, 0x01);
    cpu.load_program(&[0x30, 0x13, 0x31, 0x02], 0x0200);

    cpu.run(2);

    assert_eq!(cpu.reg(0), 0x00);
    assert_eq!(cpu.reg(1), 0x00);
    assert!(cpu.flag_c());
}
