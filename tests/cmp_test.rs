//! Tests for CMP.

use oper8::{Cpu, FlatMemory};

fn setup_cpu() -> Cpu<FlatMemory> {
    Cpu::new(FlatMemory::new())
}

#[test]
fn test_cmp_equal_sets_zero() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x42);
    cpu.set_reg(2, 0x42);
    cpu.load_program(&[0x36, 0x12], 0x0200); // CMP R1, R2

    cpu.step();

    assert!(cpu.flag_z());
    assert!(!cpu.flag_c());
    assert!(!cpu.flag_n());
}

#[test]
fn test_cmp_greater_clears_borrow() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x50);
    cpu.set_reg(2, 0x10);
    cpu.load_program(&[0x36, 0x12], 0x0200);

    cpu.step();

    assert!(!cpu.flag_z());
    assert!(!cpu.flag_c());
}

#[test]
fn test_cmp_less_sets_borrow() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x10);
    cpu.set_reg(2, 0x50);
    cpu.load_program(&[0x36, 0x12], 0x0200);

    cpu.step();

    assert!(cpu.flag_c());
    assert!(cpu.flag_n()); // 0x10 - 0x50 = 0xC0, bit 7 set
}

#[test]
fn test_cmp_does_not_store() {
    let mut cpu = setup_cpu();
    cpu.set_reg(1, 0x10);
    cpu.set_reg(2, 0x50);
    cpu.load_program(&[0x36, 0x12], 0x0200);

    cpu.step();

    assert_eq!(cpu.reg(1), 0x10);
    assert_eq!(cpu.reg(2), 0x50);
}

#[test]
fn test_cmp_flags_match_sub() {
    for (x, y) in [(0x00, 0x00), (0x10, 0x20), (0xFF, 0x01), (0x80, 0x80)] {
        let mut cmp_cpu = setup_cpu();
        cmp_cpu.set_reg(1, x);
        cmp_cpu.set_reg(2, y);
        cmp_cpu.load_program(&[0x36, 0x12], 0x0200);
        cmp_cpu.step();

        let mut sub_cpu = setup_cpu();
        sub_cpu.set_reg(1, x);
        sub_cpu.set_reg(2, y);
        sub_cpu.load_program(&[0x32, 0x12], 0x0200);
        sub_cpu.step();

        assert_eq!(cmp_cpu.flag_z(), sub_cpu.flag_z(), "Z for {:02X},{:02X}", x, y);
        assert_eq!(cmp_cpu.flag_c(), sub_cpu.flag_c(), "C for {:02X},{:02X}", x, y);
        assert_eq!(cmp_cpu.flag_n(), sub_cpu.flag_n(), "N for {:02X},{:02X}", x, y);
    }
}
