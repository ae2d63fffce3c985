use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::ast::{AddressingMode, Mnemonic};

/// Informational execution time of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Base number of cycles
    pub cycles: u8,
    /// One extra cycle when the effective address crosses a page boundary
    pub page_penalty: bool,
    /// One extra cycle when the branch is taken
    pub branch_penalty: bool,
}

/// Encoding of one instruction in one addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: u8,
    pub timing: Timing,
}

/// A mapper between instruction definitions and opcodes.
#[derive(Debug)]
pub struct OpcodeMapping {
    forward_map: HashMap<Mnemonic, HashMap<AddressingMode, OpcodeInfo>>,
}

/// No timing penalty
const NP: u8 = 0;
/// Page boundary penalty
const PB: u8 = 1;
/// Branch instruction, page boundary and taken branch penalties
const BR: u8 = 2;

impl OpcodeMapping {
    /// Find the opcode corresponding to the given instruction.
    pub fn find_opcode(&self, instruction: (Mnemonic, AddressingMode)) -> Option<OpcodeInfo> {
        self.forward_map
            .get(&instruction.0)
            .and_then(|modes| modes.get(&instruction.1))
            .copied()
    }

    /// Does the mnemonic have an encoding for the addressing mode?
    pub fn supports(&self, mnemonic: Mnemonic, addr_mode: AddressingMode) -> bool {
        self.find_opcode((mnemonic, addr_mode)).is_some()
    }

    /// Number of addressing modes the mnemonic can be encoded with.
    pub fn mode_count(&self, mnemonic: Mnemonic) -> usize {
        self.forward_map.get(&mnemonic).map_or(0, |modes| modes.len())
    }

    /// The addressing mode of a mnemonic that only has one.
    pub fn single_mode(&self, mnemonic: Mnemonic) -> Option<AddressingMode> {
        match self.forward_map.get(&mnemonic) {
            Some(modes) if modes.len() == 1 => modes.keys().next().copied(),
            _ => None,
        }
    }

    fn new() -> Self {
        let mut forward_map: HashMap<Mnemonic, HashMap<AddressingMode, OpcodeInfo>> =
            HashMap::new();

        use AddressingMode::*;
        use Mnemonic::*;

        let mappings = vec![
            (ADC, Immediate, 0x69, 2, NP),
            (ADC, ZeroPage, 0x65, 3, NP),
            (ADC, ZeroPageX, 0x75, 4, NP),
            (ADC, Absolute, 0x6D, 4, NP),
            (ADC, AbsoluteX, 0x7D, 4, PB),
            (ADC, AbsoluteY, 0x79, 4, PB),
            (ADC, IndirectIndexedX, 0x61, 6, NP),
            (ADC, IndirectIndexedY, 0x71, 5, PB),
            (AND, Immediate, 0x29, 2, NP),
            (AND, ZeroPage, 0x25, 3, NP),
            (AND, ZeroPageX, 0x35, 4, NP),
            (AND, Absolute, 0x2D, 4, NP),
            (AND, AbsoluteX, 0x3D, 4, PB),
            (AND, AbsoluteY, 0x39, 4, PB),
            (AND, IndirectIndexedX, 0x21, 6, NP),
            (AND, IndirectIndexedY, 0x31, 5, PB),
            (ASL, Accumulator, 0x0A, 2, NP),
            (ASL, ZeroPage, 0x06, 5, NP),
            (ASL, ZeroPageX, 0x16, 6, NP),
            (ASL, Absolute, 0x0E, 6, NP),
            (ASL, AbsoluteX, 0x1E, 7, NP),
            (BCC, Relative, 0x90, 2, BR),
            (BCS, Relative, 0xB0, 2, BR),
            (BEQ, Relative, 0xF0, 2, BR),
            (BIT, ZeroPage, 0x24, 3, NP),
            (BIT, Absolute, 0x2C, 4, NP),
            (BMI, Relative, 0x30, 2, BR),
            (BNE, Relative, 0xD0, 2, BR),
            (BPL, Relative, 0x10, 2, BR),
            (BRK, Implied, 0x00, 7, NP),
            (BVC, Relative, 0x50, 2, BR),
            (BVS, Relative, 0x70, 2, BR),
            (CLC, Implied, 0x18, 2, NP),
            (CLD, Implied, 0xD8, 2, NP),
            (CLI, Implied, 0x58, 2, NP),
            (CLV, Implied, 0xB8, 2, NP),
            (CMP, Immediate, 0xC9, 2, NP),
            (CMP, ZeroPage, 0xC5, 3, NP),
            (CMP, ZeroPageX, 0xD5, 4, NP),
            (CMP, Absolute, 0xCD, 4, NP),
            (CMP, AbsoluteX, 0xDD, 4, PB),
            (CMP, AbsoluteY, 0xD9, 4, PB),
            (CMP, IndirectIndexedX, 0xC1, 6, NP),
            (CMP, IndirectIndexedY, 0xD1, 5, PB),
            (CPX, Immediate, 0xE0, 2, NP),
            (CPX, ZeroPage, 0xE4, 3, NP),
            (CPX, Absolute, 0xEC, 4, NP),
            (CPY, Immediate, 0xC0, 2, NP),
            (CPY, ZeroPage, 0xC4, 3, NP),
            (CPY, Absolute, 0xCC, 4, NP),
            (DEC, ZeroPage, 0xC6, 5, NP),
            (DEC, ZeroPageX, 0xD6, 6, NP),
            (DEC, Absolute, 0xCE, 6, NP),
            (DEC, AbsoluteX, 0xDE, 7, NP),
            (DEX, Implied, 0xCA, 2, NP),
            (DEY, Implied, 0x88, 2, NP),
            (EOR, Immediate, 0x49, 2, NP),
            (EOR, ZeroPage, 0x45, 3, NP),
            (EOR, ZeroPageX, 0x55, 4, NP),
            (EOR, Absolute, 0x4D, 4, NP),
            (EOR, AbsoluteX, 0x5D, 4, PB),
            (EOR, AbsoluteY, 0x59, 4, PB),
            (EOR, IndirectIndexedX, 0x41, 6, NP),
            (EOR, IndirectIndexedY, 0x51, 5, PB),
            (INC, ZeroPage, 0xE6, 5, NP),
            (INC, ZeroPageX, 0xF6, 6, NP),
            (INC, Absolute, 0xEE, 6, NP),
            (INC, AbsoluteX, 0xFE, 7, NP),
            (INX, Implied, 0xE8, 2, NP),
            (INY, Implied, 0xC8, 2, NP),
            (JMP, Absolute, 0x4C, 3, NP),
            (JMP, Indirect, 0x6C, 5, NP),
            (JSR, Absolute, 0x20, 6, NP),
            (LDA, Immediate, 0xA9, 2, NP),
            (LDA, ZeroPage, 0xA5, 3, NP),
            (LDA, ZeroPageX, 0xB5, 4, NP),
            (LDA, Absolute, 0xAD, 4, NP),
            (LDA, AbsoluteX, 0xBD, 4, PB),
            (LDA, AbsoluteY, 0xB9, 4, PB),
            (LDA, IndirectIndexedX, 0xA1, 6, NP),
            (LDA, IndirectIndexedY, 0xB1, 5, PB),
            (LDX, Immediate, 0xA2, 2, NP),
            (LDX, ZeroPage, 0xA6, 3, NP),
            (LDX, ZeroPageY, 0xB6, 4, NP),
            (LDX, Absolute, 0xAE, 4, NP),
            (LDX, AbsoluteY, 0xBE, 4, PB),
            (LDY, Immediate, 0xA0, 2, NP),
            (LDY, ZeroPage, 0xA4, 3, NP),
            (LDY, ZeroPageX, 0xB4, 4, NP),
            (LDY, Absolute, 0xAC, 4, NP),
            (LDY, AbsoluteX, 0xBC, 4, PB),
            (LSR, Accumulator, 0x4A, 2, NP),
            (LSR, ZeroPage, 0x46, 5, NP),
            (LSR, ZeroPageX, 0x56, 6, NP),
            (LSR, Absolute, 0x4E, 6, NP),
            (LSR, AbsoluteX, 0x5E, 7, NP),
            (NOP, Implied, 0xEA, 2, NP),
            (ORA, Immediate, 0x09, 2, NP),
            (ORA, ZeroPage, 0x05, 3, NP),
            (ORA, ZeroPageX, 0x15, 4, NP),
            (ORA, Absolute, 0x0D, 4, NP),
            (ORA, AbsoluteX, 0x1D, 4, PB),
            (ORA, AbsoluteY, 0x19, 4, PB),
            (ORA, IndirectIndexedX, 0x01, 6, NP),
            (ORA, IndirectIndexedY, 0x11, 5, PB),
            (PHA, Implied, 0x48, 3, NP),
            (PHP, Implied, 0x08, 3, NP),
            (PLA, Implied, 0x68, 4, NP),
            (PLP, Implied, 0x28, 4, NP),
            (ROL, Accumulator, 0x2A, 2, NP),
            (ROL, ZeroPage, 0x26, 5, NP),
            (ROL, ZeroPageX, 0x36, 6, NP),
            (ROL, Absolute, 0x2E, 6, NP),
            (ROL, AbsoluteX, 0x3E, 7, NP),
            (ROR, Accumulator, 0x6A, 2, NP),
            (ROR, ZeroPage, 0x66, 5, NP),
            (ROR, ZeroPageX, 0x76, 6, NP),
            (ROR, Absolute, 0x6E, 6, NP),
            (ROR, AbsoluteX, 0x7E, 7, NP),
            (RTI, Implied, 0x40, 6, NP),
            (RTS, Implied, 0x60, 6, NP),
            (SBC, Immediate, 0xE9, 2, NP),
            (SBC, ZeroPage, 0xE5, 3, NP),
            (SBC, ZeroPageX, 0xF5, 4, NP),
            (SBC, Absolute, 0xED, 4, NP),
            (SBC, AbsoluteX, 0xFD, 4, PB),
            (SBC, AbsoluteY, 0xF9, 4, PB),
            (SBC, IndirectIndexedX, 0xE1, 6, NP),
            (SBC, IndirectIndexedY, 0xF1, 5, PB),
            (SEC, Implied, 0x38, 2, NP),
            (SED, Implied, 0xF8, 2, NP),
            (SEI, Implied, 0x78, 2, NP),
            (STA, ZeroPage, 0x85, 3, NP),
            (STA, ZeroPageX, 0x95, 4, NP),
            (STA, Absolute, 0x8D, 4, NP),
            (STA, AbsoluteX, 0x9D, 5, NP),
            (STA, AbsoluteY, 0x99, 5, NP),
            (STA, IndirectIndexedX, 0x81, 6, NP),
            (STA, IndirectIndexedY, 0x91, 6, NP),
            (STX, ZeroPage, 0x86, 3, NP),
            (STX, ZeroPageY, 0x96, 4, NP),
            (STX, Absolute, 0x8E, 4, NP),
            (STY, ZeroPage, 0x84, 3, NP),
            (STY, ZeroPageX, 0x94, 4, NP),
            (STY, Absolute, 0x8C, 4, NP),
            (TAX, Implied, 0xAA, 2, NP),
            (TAY, Implied, 0xA8, 2, NP),
            (TSX, Implied, 0xBA, 2, NP),
            (TXA, Implied, 0x8A, 2, NP),
            (TXS, Implied, 0x9A, 2, NP),
            (TYA, Implied, 0x98, 2, NP),
        ];

        for (mnemonic, addr_mode, opcode, cycles, penalty) in mappings {
            let timing = Timing {
                cycles,
                page_penalty: penalty != NP,
                branch_penalty: penalty == BR,
            };
            forward_map
                .entry(mnemonic)
                .or_default()
                .insert(addr_mode, OpcodeInfo { opcode, timing });
        }

        OpcodeMapping { forward_map }
    }
}

lazy_static! {
    pub static ref OPCODE_MAPPING: OpcodeMapping = OpcodeMapping::new();
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_mnemonic_is_mapped() {
        for mnemonic in Mnemonic::iter() {
            assert!(OPCODE_MAPPING.mode_count(mnemonic) > 0, "{}", mnemonic);
        }
    }

    #[test]
    fn test_opcodes_are_unique() {
        let mut seen = HashMap::new();
        for mnemonic in Mnemonic::iter() {
            for addr_mode in AddressingMode::iter() {
                if let Some(info) = OPCODE_MAPPING.find_opcode((mnemonic, addr_mode)) {
                    assert_eq!(seen.insert(info.opcode, (mnemonic, addr_mode)), None);
                }
            }
        }
        assert_eq!(seen.len(), 151);
    }

    #[test]
    fn test_find_opcode() {
        let lda = OPCODE_MAPPING
            .find_opcode((Mnemonic::LDA, AddressingMode::IndirectIndexedY))
            .unwrap();
        assert_eq!(lda.opcode, 0xB1);
        assert_eq!(
            lda.timing,
            Timing {
                cycles: 5,
                page_penalty: true,
                branch_penalty: false
            }
        );
        assert_eq!(OPCODE_MAPPING.find_opcode((Mnemonic::STA, AddressingMode::Immediate)), None);
        assert_eq!(OPCODE_MAPPING.single_mode(Mnemonic::BNE), Some(AddressingMode::Relative));
        assert_eq!(OPCODE_MAPPING.single_mode(Mnemonic::JMP), None);
    }
}
