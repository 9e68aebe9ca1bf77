//! Tests for AND, OR, XOR, NOT, and TEST, with attention to the carry flag:
//! the logical ops clear it, TEST preserves it.

use oper8::{Cpu, FlatMemory};

fn setup_cpu() -> Cpu<FlatMemory> {
    Cpu::new(FlatMemory::new())
}

#[test]
fn test_and_masks_bits() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0b1100_1100);
    cpu.set_reg(2, 0b1010_1010);
    cpu.load_program(&[0x40, 0x12], 0x0200); // AND R1, R2

    cpu.step();

    assert_eq!(cpu.reg(1), 0b1000_1000);
    assert!(cpu.flag_n());
    assert!(!cpu.flag_z());
}

#[test]
fn test_and_clears_carry() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(1, 0xFF);
    cpu.set_reg(2, 0x0F);
    cpu.load_program(&[0x40, 0x12], 0x0200);

    cpu.step();
    assert!(!cpu.flag_c());
}

#[test]
fn test_or_merges_bits() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(1, 0b0000_1111);
    cpu.set_reg(2, 0b1111_0000);
    cpu.load_program(&[0x41, 0x12], 0x0200); // OR R1, R2

    cpu.step();

    assert_eq!(cpu.reg(1), 0xFF);
    assert!(!cpu.flag_c());
    assert!(cpu.flag_n());
}

#[test]
fn test_xor_toggles_bits() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0b1111_0000);
    cpu.set_reg(2, 0b1010_1010);
    cpu.load_program(&[0x42, 0x12], 0x0200); // XOR R1, R2

    cpu.step();
    assert_eq!(cpu.reg(1), 0b0101_1010);
}

#[test]
fn test_xor_self_clears_register() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_flag_n(true);
    cpu.set_reg(5, 0xA5);
    cpu.load_program(&[0x42, 0x55], 0x0200); // XOR R5, R5

    cpu.step();

    assert_eq!(cpu.reg(5), 0x00);
    assert!(cpu.flag_z());
    assert!(!cpu.flag_c());
    assert!(!cpu.flag_n());
}

#[test]
fn test_not_complements() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(7, 0b0101_0101);
    cpu.load_program(&[0x43, 0x70], 0x0200); // NOT R7

    cpu.step();

    assert_eq!(cpu.reg(7), 0b1010_1010);
    assert!(cpu.flag_n());
    assert!(!cpu.flag_c());
    assert!(!cpu.flag_z());
}

#[test]
fn test_not_ff_is_the_only_zero_producer() {
    let mut cpu = setup_cpu();
    cpu.set_reg(7, 0xFF);
    cpu.load_program(&[0x43, 0x70], 0x0200);

    cpu.step();

    assert_eq!(cpu.reg(7), 0x00);
    assert!(cpu.flag_z());
}

#[test]
fn test_test_sets_zn_without_storing() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0b1000_0001);
    cpu.set_reg(2, 0b1000_0000);
    cpu.load_program(&[0x46, 0x12], 0x0200); // TEST R1, R2

    cpu.step();

    assert_eq!(cpu.reg(1), 0b1000_0001); // unchanged
    assert!(!cpu.flag_z());
    assert!(cpu.flag_n());
}

#[test]
fn test_test_preserves_carry_set() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(true);
    cpu.set_reg(1, 0x0F);
    cpu.set_reg(2, 0xF0);
    cpu.load_program(&[0x46, 0x12], 0x0200);

    cpu.step();

    assert!(cpu.flag_z()); // no common bits
    assert!(cpu.flag_c()); // still set
}

#[test]
fn test_test_preserves_carry_clear() {
    let mut cpu = setup_cpu();
    cpu.set_flag_c(false);
    cpu.set_reg(1, 0xFF);
    cpu.set_reg(2, 0xFF);
    cpu.load_program(&[0x46, 0x12], 0x0200);

    cpu.step();
    assert!(!cpu.flag_c());
}
