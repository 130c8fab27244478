// mips/registers.rs
use super::arch::STACK_SIZE;

pub const ZERO: u8 = 0; // always reads as 0
pub const AT: u8 = 1; // assembler scratch
pub const V0: u8 = 2; // syscall number / return value
pub const V1: u8 = 3;
pub const A0: u8 = 4;
pub const A1: u8 = 5;
pub const A2: u8 = 6;
pub const A3: u8 = 7;
pub const T0: u8 = 8;
pub const T1: u8 = 9;
pub const T2: u8 = 10;
pub const T3: u8 = 11;
pub const T4: u8 = 12;
pub const T5: u8 = 13;
pub const T6: u8 = 14;
pub const T7: u8 = 15;
pub const S0: u8 = 16;
pub const S1: u8 = 17;
pub const S2: u8 = 18;
pub const S3: u8 = 19;
pub const S4: u8 = 20;
pub const S5: u8 = 21;
pub const S6: u8 = 22;
pub const S7: u8 = 23;
pub const T8: u8 = 24;
pub const T9: u8 = 25;
pub const K0: u8 = 26;
pub const K1: u8 = 27;
pub const GP: u8 = 28; // base of the data segment
pub const SP: u8 = 29;
pub const FP: u8 = 30;
pub const RA: u8 = 31; // link register

pub const REG_COUNT: usize = 32;

const NAMES: [&str; REG_COUNT] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp", "fp",
    "ra",
];

/// ABI name of a register, without the `$` sigil.
pub fn reg_name(r: u8) -> &'static str {
    NAMES.get(r as usize).copied().unwrap_or("?")
}

/// Looks up a register by ABI alias (`$t0`, `t0`) or number (`$8`).
pub fn reg_by_name(name: &str) -> Option<u8> {
    let name = name.trim();
    let name = name.strip_prefix('$').unwrap_or(name);
    if let Ok(n) = name.parse::<u8>() {
        return (usize::from(n) < REG_COUNT).then_some(n);
    }
    NAMES.iter().position(|n| *n == name).map(|i| i as u8)
}

/// Architectural state of one run: general registers plus `hi`, `lo`, `pc`
/// and the halt flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub x: [i32; REG_COUNT],
    pub hi: i32,
    pub lo: i32,
    pub pc: u32,
    pub halted: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(STACK_SIZE, 0)
    }
}

impl Cpu {
    /// Reset state: everything zero except `$sp` and `pc`.
    pub fn new(stack_size: u32, entry: u32) -> Self {
        let mut x = [0; REG_COUNT];
        x[SP as usize] = stack_size as i32;
        Self {
            x,
            hi: 0,
            lo: 0,
            pc: entry,
            halted: false,
        }
    }

    #[inline]
    pub fn read(&self, r: u8) -> i32 {
        if r == ZERO { 0 } else { self.x[r as usize] }
    }

    #[inline]
    pub fn read_u(&self, r: u8) -> u32 {
        self.read(r) as u32
    }

    /// Writes to `$zero` are dropped.
    #[inline]
    pub fn write(&mut self, r: u8, v: i32) {
        if r != ZERO {
            self.x[r as usize] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let cpu = Cpu::default();
        assert_eq!(cpu.read(SP), STACK_SIZE as i32);
        assert_eq!(cpu.pc, 0);
        assert_eq!((cpu.hi, cpu.lo), (0, 0));
        assert!(!cpu.halted);
        assert!(cpu.x.iter().enumerate().all(|(i, v)| i == SP as usize || *v == 0));
    }

    #[test]
    fn zero_register_is_hardwired() {
        let mut cpu = Cpu::default();
        cpu.write(ZERO, 1234);
        assert_eq!(cpu.read(ZERO), 0);
        assert_eq!(cpu.x[0], 0);
    }

    #[test]
    fn names_round_trip() {
        for r in 0..REG_COUNT as u8 {
            assert_eq!(reg_by_name(reg_name(r)), Some(r));
        }
        assert_eq!(reg_by_name("$t0"), Some(T0));
        assert_eq!(reg_by_name("$31"), Some(RA));
        assert_eq!(reg_by_name("$32"), None);
        assert_eq!(reg_by_name("x1"), None);
    }
}
