pub mod addressing_mode;
pub mod mnemonic;
pub mod operand;

use std::{fmt, str::FromStr};

use thiserror::Error;

pub use addressing_mode::AddressingMode;
pub use mnemonic::Mnemonic;
pub use operand::{ArithmeticOp, Argument, Modifier, SELF_REFERENCE};

use crate::assembler::codegen::opcode::{Timing, OPCODE_MAPPING};

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum InstructionError {
    #[error("Unknown mnemonic: {0}")]
    UnknownMnemonic(String),
    #[error("Addressing mode {mode} is not supported by {mnemonic}")]
    UnsupportedAddressingMode {
        mnemonic: Mnemonic,
        mode: AddressingMode,
    },
    #[error("No addressing mode of {mnemonic} handles the argument ${value:02x}")]
    NoByteMode { mnemonic: Mnemonic, value: i64 },
    #[error("Argument {value} out of range for {mnemonic}")]
    ArgumentOutOfRange { mnemonic: Mnemonic, value: i64 },
    #[error("{mnemonic} takes no argument in {mode} mode")]
    UnexpectedArgument {
        mnemonic: Mnemonic,
        mode: AddressingMode,
    },
    #[error("{mnemonic} needs a numeric argument in {mode} mode")]
    MissingArgument {
        mnemonic: Mnemonic,
        mode: AddressingMode,
    },
    #[error("Label {label} used with {mnemonic} which has no absolute or relative mode")]
    LabelNotSupported { mnemonic: Mnemonic, label: String },
    #[error("Label {label} used with {mnemonic} in the wrong addressing mode {mode}")]
    LabelWithWrongMode {
        mnemonic: Mnemonic,
        mode: AddressingMode,
        label: String,
    },
    #[error("Modifier used with non-label argument of {0}")]
    ModifierWithoutLabel(Mnemonic),
    #[error("Byte modifier used with {0} which has no immediate mode")]
    ByteModifierUnsupported(Mnemonic),
    #[error("Modifier {modifier:?} cannot be applied to {value}")]
    InvalidModifier { modifier: Modifier, value: i64 },
    #[error("Operand {0} is already resolved")]
    AlreadyReady(Mnemonic),
    #[error("No addressing mode selected for {0}")]
    MissingAddressingMode(Mnemonic),
}

/// A CPU instruction with an optional argument and the addressing mode which tells the CPU how
/// to interpret the argument.
///
/// The addressing mode is inferred on construction when possible:
///
/// 1. Mnemonics with an implied mode, the accumulator mode when no argument is given, or
///    mnemonics with a single mode (branches, `JSR`) get that mode.
/// 2. Literals `$00-$ff` prefer zero page over immediate, `$100-$ffff` need absolute.
/// 3. Labels prefer absolute over relative and are resolved during linking.
///
/// [`Instruction::with_mode`] selects the mode explicitly instead.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Instruction {
    mnemonic: Mnemonic,
    addr_mode: Option<AddressingMode>,
    argument: Argument,
    modifier: Option<Modifier>,
    /// Numeric value of the argument once it is known
    value: Option<i64>,
    ready: bool,
}

impl Instruction {
    /// Create an instruction, inferring its addressing mode from the argument.
    pub fn new(
        mnemonic: Mnemonic,
        argument: impl Into<Argument>,
        modifier: Option<Modifier>,
    ) -> Result<Instruction, InstructionError> {
        let argument = argument.into();
        let mut ins = Instruction {
            mnemonic,
            addr_mode: None,
            argument: argument.clone(),
            modifier: None,
            value: None,
            ready: false,
        };

        if ins.supports(AddressingMode::Implied) {
            ins.addr_mode = Some(AddressingMode::Implied);
        } else if argument.is_none() && ins.supports(AddressingMode::Accumulator) {
            ins.addr_mode = Some(AddressingMode::Accumulator);
        } else if let Some(mode) = OPCODE_MAPPING.single_mode(mnemonic) {
            ins.addr_mode = Some(mode);
        } else if let Argument::Literal(value) = argument {
            ins.addr_mode = Some(ins.infer_from_literal(value)?);
        }

        if let Argument::Label(label) = &argument {
            ins.addr_mode = if ins.supports(AddressingMode::Absolute) {
                Some(AddressingMode::Absolute)
            } else if ins.supports(AddressingMode::Relative) {
                Some(AddressingMode::Relative)
            } else {
                return Err(InstructionError::LabelNotSupported {
                    mnemonic,
                    label: label.clone(),
                });
            };
        } else if let Some(mode) = ins.addr_mode {
            ins.value = ins.validate(mode, literal(&argument))?;
            ins.ready = true;
        }

        if let Some(modifier) = modifier {
            ins.attach_modifier(modifier, false)?;
        }

        Ok(ins)
    }

    /// Create an instruction from the name of its mnemonic.
    pub fn parse(
        name: &str,
        argument: impl Into<Argument>,
        modifier: Option<Modifier>,
    ) -> Result<Instruction, InstructionError> {
        let mnemonic = Mnemonic::from_str(name)
            .map_err(|_| InstructionError::UnknownMnemonic(name.to_string()))?;
        Instruction::new(mnemonic, argument, modifier)
    }

    /// Select the addressing mode explicitly, replacing argument and modifier.
    ///
    /// Fails if the instruction is already ready, e.g. `LDA $10` that was inferred to zero
    /// page. Create the instruction without argument first to force another mode.
    pub fn with_mode(
        self,
        mode: AddressingMode,
        argument: impl Into<Argument>,
        modifier: Option<Modifier>,
    ) -> Result<Instruction, InstructionError> {
        if self.ready {
            return Err(InstructionError::AlreadyReady(self.mnemonic));
        }
        Instruction::new_with_mode(self.mnemonic, mode, argument, modifier)
    }

    /// Create an instruction in the given addressing mode.
    ///
    /// Labels are accepted by the absolute modes and relative mode, and by immediate mode
    /// together with a modifier such as `#<label`.
    pub fn new_with_mode(
        mnemonic: Mnemonic,
        mode: AddressingMode,
        argument: impl Into<Argument>,
        modifier: Option<Modifier>,
    ) -> Result<Instruction, InstructionError> {
        if !OPCODE_MAPPING.supports(mnemonic, mode) {
            return Err(InstructionError::UnsupportedAddressingMode { mnemonic, mode });
        }

        let argument = argument.into();
        let mut ins = Instruction {
            mnemonic,
            addr_mode: Some(mode),
            argument: argument.clone(),
            modifier: None,
            value: None,
            ready: false,
        };

        match &argument {
            Argument::Label(label) => {
                let byte_label = modifier.is_some() && mode == AddressingMode::Immediate;
                if !(mode.admits_label() || byte_label) {
                    return Err(InstructionError::LabelWithWrongMode {
                        mnemonic: ins.mnemonic,
                        mode,
                        label: label.clone(),
                    });
                }
            }
            Argument::Literal(_) | Argument::None => {
                ins.value = ins.validate(mode, literal(&argument))?;
                ins.ready = true;
            }
        }

        if let Some(modifier) = modifier {
            ins.attach_modifier(modifier, true)?;
        }

        Ok(ins)
    }

    /// Resolve a label argument to its numeric value.
    ///
    /// The value is the label address, or the branch displacement for relative mode. The
    /// modifier is applied before validating the result against the addressing mode.
    pub fn resolve(&mut self, value: i64) -> Result<(), InstructionError> {
        if self.ready || self.label().is_none() {
            return Ok(());
        }
        let mode = self
            .addr_mode
            .ok_or(InstructionError::MissingAddressingMode(self.mnemonic))?;

        let value = match self.modifier {
            Some(modifier) => modifier
                .apply(value)
                .ok_or(InstructionError::InvalidModifier { modifier, value })?,
            None => value,
        };

        self.value = self.validate(mode, Some(value))?;
        self.ready = true;

        Ok(())
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    pub fn addr_mode(&self) -> Option<AddressingMode> {
        self.addr_mode
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn modifier(&self) -> Option<Modifier> {
        self.modifier
    }

    /// Numeric argument, known for literals and resolved labels.
    pub fn value(&self) -> Option<i64> {
        self.value
    }

    /// Name of the referenced label, if any.
    pub fn label(&self) -> Option<&str> {
        self.argument.label()
    }

    /// Is all data available to encode the instruction?
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Size of instruction opcode + operand in bytes
    pub fn size(&self) -> Option<usize> {
        self.addr_mode.map(|mode| 1 + mode.operand_len())
    }

    /// Cycle information of the selected addressing mode.
    pub fn timing(&self) -> Option<Timing> {
        let mode = self.addr_mode?;
        OPCODE_MAPPING
            .find_opcode((self.mnemonic, mode))
            .map(|info| info.timing)
    }

    fn supports(&self, mode: AddressingMode) -> bool {
        OPCODE_MAPPING.supports(self.mnemonic, mode)
    }

    fn infer_from_literal(&self, value: i64) -> Result<AddressingMode, InstructionError> {
        // Zero page takes priority over immediate since it is what a bare byte address means.
        let candidates: &[AddressingMode] = match value {
            0x00..=0xff => &[
                AddressingMode::ZeroPage,
                AddressingMode::Immediate,
                AddressingMode::Absolute,
            ],
            0x100..=0xffff => &[AddressingMode::Absolute],
            _ => &[],
        };

        match candidates.iter().find(|mode| self.supports(**mode)) {
            Some(mode) => Ok(*mode),
            None if (0x00..=0xff).contains(&value) => Err(InstructionError::NoByteMode {
                mnemonic: self.mnemonic,
                value,
            }),
            None => Err(InstructionError::ArgumentOutOfRange {
                mnemonic: self.mnemonic,
                value,
            }),
        }
    }

    /// Check that the argument fits the numeric domain of the mode.
    fn validate(
        &self,
        mode: AddressingMode,
        value: Option<i64>,
    ) -> Result<Option<i64>, InstructionError> {
        match (mode.domain(), value) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(InstructionError::UnexpectedArgument {
                mnemonic: self.mnemonic,
                mode,
            }),
            (Some(_), None) => Err(InstructionError::MissingArgument {
                mnemonic: self.mnemonic,
                mode,
            }),
            (Some(domain), Some(value)) if domain.contains(&value) => Ok(Some(value)),
            (Some(_), Some(value)) => Err(InstructionError::ArgumentOutOfRange {
                mnemonic: self.mnemonic,
                value,
            }),
        }
    }

    fn attach_modifier(
        &mut self,
        modifier: Modifier,
        explicit_mode: bool,
    ) -> Result<(), InstructionError> {
        let Some(label) = self.label() else {
            return Err(InstructionError::ModifierWithoutLabel(self.mnemonic));
        };

        if modifier.is_byte_extraction() && self.addr_mode != Some(AddressingMode::Immediate) {
            if explicit_mode {
                return Err(InstructionError::LabelWithWrongMode {
                    mnemonic: self.mnemonic,
                    mode: self.addr_mode.unwrap_or(AddressingMode::Absolute),
                    label: label.to_string(),
                });
            }
            if !self.supports(AddressingMode::Immediate) {
                return Err(InstructionError::ByteModifierUnsupported(self.mnemonic));
            }
            self.addr_mode = Some(AddressingMode::Immediate);
        }

        self.modifier = Some(modifier);
        Ok(())
    }
}

fn literal(argument: &Argument) -> Option<i64> {
    match argument {
        Argument::Literal(value) => Some(*value),
        _ => None,
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.addr_mode {
            Some(mode) if mode.operand_len() > 0 => mode,
            _ => return write!(f, "{}", self.mnemonic),
        };

        let argument = match &self.argument {
            Argument::Label(label) => match self.modifier {
                Some(modifier) => modifier.render(label),
                None => label.clone(),
            },
            // Relative literals are displacements from the following instruction
            Argument::Literal(offset) if mode == AddressingMode::Relative => {
                format!("*{:+}", offset + 2)
            }
            Argument::Literal(value) if mode.operand_len() == 2 => format!("${:04x}", value),
            Argument::Literal(value) => format!("${:02x}", value),
            Argument::None => String::new(),
        };

        write!(f, "{}{}", self.mnemonic, mode.render(&argument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn ins(
        mnemonic: Mnemonic,
        argument: impl Into<Argument>,
    ) -> Result<Instruction, InstructionError> {
        Instruction::new(mnemonic, argument, None)
    }

    #[test]
    fn test_implied_and_accumulator() -> Result<(), InstructionError> {
        let rts = ins(Mnemonic::RTS, ())?;
        assert_eq!(rts.addr_mode(), Some(AddressingMode::Implied));
        assert!(rts.is_ready());
        assert_eq!(rts.size(), Some(1));

        let asl = ins(Mnemonic::ASL, ())?;
        assert_eq!(asl.addr_mode(), Some(AddressingMode::Accumulator));
        assert!(asl.is_ready());

        let asl = ins(Mnemonic::ASL, 0xd019)?;
        assert_eq!(asl.addr_mode(), Some(AddressingMode::Absolute));

        assert_eq!(
            ins(Mnemonic::INX, 1),
            Err(InstructionError::UnexpectedArgument {
                mnemonic: Mnemonic::INX,
                mode: AddressingMode::Implied
            })
        );
        Ok(())
    }

    #[test]
    fn test_infer_from_literal() -> Result<(), InstructionError> {
        let tests = vec![
            (Mnemonic::LDA, 0x10, AddressingMode::ZeroPage),
            (Mnemonic::LDA, 0x0400, AddressingMode::Absolute),
            (Mnemonic::CPX, 0xff, AddressingMode::ZeroPage),
            (Mnemonic::JSR, 0xffd2, AddressingMode::Absolute),
            (Mnemonic::JMP, 0x10, AddressingMode::Absolute),
            (Mnemonic::BNE, -2, AddressingMode::Relative),
        ];

        for (mnemonic, value, expected) in tests {
            let ins = ins(mnemonic, value)?;
            assert_eq!(ins.addr_mode(), Some(expected));
            assert_eq!(ins.value(), Some(value));
            assert!(ins.is_ready());
        }
        Ok(())
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            ins(Mnemonic::LDA, 0x10000),
            Err(InstructionError::ArgumentOutOfRange {
                mnemonic: Mnemonic::LDA,
                value: 0x10000
            })
        );
        assert_eq!(
            ins(Mnemonic::LDA, -1),
            Err(InstructionError::ArgumentOutOfRange {
                mnemonic: Mnemonic::LDA,
                value: -1
            })
        );
        assert_eq!(
            ins(Mnemonic::BEQ, 128),
            Err(InstructionError::ArgumentOutOfRange {
                mnemonic: Mnemonic::BEQ,
                value: 128
            })
        );
        assert!(ins(Mnemonic::LDA, ())
            .and_then(|i| i.with_mode(AddressingMode::ZeroPage, 256, None))
            .is_err());
    }

    #[test]
    fn test_label_mode() -> Result<(), InstructionError> {
        let jmp = ins(Mnemonic::JMP, "loop")?;
        assert_eq!(jmp.addr_mode(), Some(AddressingMode::Absolute));
        assert_eq!(jmp.label(), Some("loop"));
        assert!(!jmp.is_ready());

        let bne = ins(Mnemonic::BNE, "loop")?;
        assert_eq!(bne.addr_mode(), Some(AddressingMode::Relative));

        assert_eq!(
            ins(Mnemonic::TAX, "loop"),
            Err(InstructionError::LabelNotSupported {
                mnemonic: Mnemonic::TAX,
                label: "loop".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn test_with_mode() -> Result<(), InstructionError> {
        let lda = ins(Mnemonic::LDA, ())?;
        assert_eq!(lda.addr_mode(), None);
        assert!(!lda.is_ready());

        let lda = lda.with_mode(AddressingMode::Absolute, 0x10, None)?;
        assert_eq!(lda.addr_mode(), Some(AddressingMode::Absolute));
        assert_eq!(lda.size(), Some(3));

        assert_eq!(
            lda.with_mode(AddressingMode::Immediate, 0x10, None),
            Err(InstructionError::AlreadyReady(Mnemonic::LDA))
        );

        assert_eq!(
            ins(Mnemonic::STA, ())?.with_mode(AddressingMode::Immediate, 1, None),
            Err(InstructionError::UnsupportedAddressingMode {
                mnemonic: Mnemonic::STA,
                mode: AddressingMode::Immediate
            })
        );

        let lda = ins(Mnemonic::LDA, ())?.with_mode(AddressingMode::AbsoluteX, "msg", None)?;
        assert_eq!(lda.addr_mode(), Some(AddressingMode::AbsoluteX));
        assert!(!lda.is_ready());

        assert_eq!(
            ins(Mnemonic::LDA, ())?.with_mode(AddressingMode::ZeroPage, "msg", None),
            Err(InstructionError::LabelWithWrongMode {
                mnemonic: Mnemonic::LDA,
                mode: AddressingMode::ZeroPage,
                label: "msg".to_string()
            })
        );

        // ASL without argument is already ready in accumulator mode
        let asl = Instruction::new_with_mode(Mnemonic::ASL, AddressingMode::AbsoluteX, 0xd019, None)?;
        assert_eq!(asl.to_string(), "asl $d019,x");
        Ok(())
    }

    #[test]
    fn test_modifiers() -> Result<(), InstructionError> {
        let lda = Instruction::new(Mnemonic::LDA, "irq", Some(Modifier::LowByte))?;
        assert_eq!(lda.addr_mode(), Some(AddressingMode::Immediate));
        assert_eq!(lda.to_string(), "lda #<irq");

        assert_eq!(
            Instruction::new(Mnemonic::JMP, "irq", Some(Modifier::HighByte)),
            Err(InstructionError::ByteModifierUnsupported(Mnemonic::JMP))
        );
        assert_eq!(
            Instruction::new(Mnemonic::LDA, 0x10, Some(Modifier::offset(1))),
            Err(InstructionError::ModifierWithoutLabel(Mnemonic::LDA))
        );

        let sta = Instruction::new(Mnemonic::STA, "uno", Some(Modifier::offset(2)))?;
        assert_eq!(sta.to_string(), "sta uno+2");
        Ok(())
    }

    #[test]
    fn test_resolve() -> Result<(), InstructionError> {
        let mut lda = Instruction::new(Mnemonic::LDA, "irq", Some(Modifier::HighByte))?;
        lda.resolve(0x4012)?;
        assert!(lda.is_ready());
        assert_eq!(lda.value(), Some(0x40));

        let mut sta = Instruction::new(Mnemonic::STA, "uno", Some(Modifier::offset(2)))?;
        sta.resolve(0x1000)?;
        assert_eq!(sta.value(), Some(0x1002));

        let mut sta = Instruction::new(Mnemonic::STA, "top", Some(Modifier::offset(2)))?;
        assert_eq!(
            sta.resolve(0xfffe),
            Err(InstructionError::ArgumentOutOfRange {
                mnemonic: Mnemonic::STA,
                value: 0x10000
            })
        );

        let mut lda = Instruction::new(
            Mnemonic::LDA,
            "tbl",
            Some(Modifier::Arithmetic(ArithmeticOp::Div, 0)),
        )?;
        assert_eq!(
            lda.resolve(0x1000),
            Err(InstructionError::InvalidModifier {
                modifier: Modifier::Arithmetic(ArithmeticOp::Div, 0),
                value: 0x1000
            })
        );

        let mut bne = Instruction::new(Mnemonic::BNE, "far", None)?;
        assert_eq!(
            bne.resolve(128),
            Err(InstructionError::ArgumentOutOfRange {
                mnemonic: Mnemonic::BNE,
                value: 128
            })
        );
        assert!(!bne.is_ready());
        Ok(())
    }

    #[test]
    fn test_display() -> Result<(), InstructionError> {
        let tests = vec![
            (ins(Mnemonic::RTS, ())?, "rts"),
            (ins(Mnemonic::LSR, ())?, "lsr"),
            (ins(Mnemonic::LDA, 0x20)?, "lda $20"),
            (ins(Mnemonic::JSR, 0xe544)?, "jsr $e544"),
            (ins(Mnemonic::BNE, -2)?, "bne *+0"),
            (
                ins(Mnemonic::LDA, ())?.with_mode(AddressingMode::Immediate, 0, None)?,
                "lda #$00",
            ),
            (
                ins(Mnemonic::LDA, ())?.with_mode(AddressingMode::IndirectIndexedY, 0x27, None)?,
                "lda ($27),y",
            ),
            (
                ins(Mnemonic::JMP, ())?.with_mode(AddressingMode::Indirect, 0xfffc, None)?,
                "jmp ($fffc)",
            ),
            (
                ins(Mnemonic::LDA, ())?.with_mode(AddressingMode::AbsoluteX, "msg", None)?,
                "lda msg,x",
            ),
        ];

        for (ins, expected) in tests {
            assert_eq!(ins.to_string(), expected);
        }
        Ok(())
    }

    #[test]
    fn test_timing() -> Result<(), InstructionError> {
        let lda = ins(Mnemonic::LDA, 0x0400)?;
        assert_eq!(lda.timing().map(|t| t.cycles), Some(4));
        assert_eq!(ins(Mnemonic::LDA, ())?.timing(), None);
        Ok(())
    }
}
