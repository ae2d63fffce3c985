/// Addressing mode of an instruction.
///
/// This represents the way the instruction uses the operand.
#[derive(
    Debug, Hash, Eq, PartialEq, Clone, Copy, strum_macros::EnumIter, strum_macros::Display,
)]
pub enum AddressingMode {
    /// `a`
    Absolute,
    /// `zp`
    ZeroPage,
    /// `zp,x`
    ZeroPageX,
    /// `zp,y`
    ZeroPageY,
    /// `a,x`
    AbsoluteX,
    /// `a,y`
    AbsoluteY,
    /// `r` for branch instructions.
    /// Labels are resolved to relative offsets during linking.
    Relative,
    /// `(a)`
    Indirect,
    /// `(zp,x)`
    IndirectIndexedX,
    /// `(zp),y`
    IndirectIndexedY,

    /// `#v`
    Immediate,

    Accumulator,
    Implied,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub fn operand_len(&self) -> usize {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectIndexedX
            | AddressingMode::IndirectIndexedY
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }

    /// Source template for the operand, `{}` is replaced by the rendered argument.
    pub fn template(&self) -> &'static str {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => "",
            AddressingMode::Immediate => " #{}",
            AddressingMode::ZeroPage | AddressingMode::Absolute | AddressingMode::Relative => " {}",
            AddressingMode::ZeroPageX | AddressingMode::AbsoluteX => " {},x",
            AddressingMode::ZeroPageY | AddressingMode::AbsoluteY => " {},y",
            AddressingMode::IndirectIndexedX => " ({},x)",
            AddressingMode::IndirectIndexedY => " ({}),y",
            AddressingMode::Indirect => " ({})",
        }
    }

    /// Render the operand part of an instruction with the template of this mode.
    pub fn render(&self, argument: &str) -> String {
        self.template().replace("{}", argument)
    }

    /// Range of argument values the mode can encode.
    pub fn domain(&self) -> Option<std::ops::RangeInclusive<i64>> {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => None,
            AddressingMode::Relative => Some(-128..=127),
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => Some(0..=0xffff),
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectIndexedX
            | AddressingMode::IndirectIndexedY => Some(0..=0xff),
        }
    }

    /// Modes that accept a label as argument without a modifier.
    pub fn admits_label(&self) -> bool {
        matches!(
            self,
            AddressingMode::Absolute
                | AddressingMode::AbsoluteX
                | AddressingMode::AbsoluteY
                | AddressingMode::Indirect
                | AddressingMode::Relative
        )
    }
}
