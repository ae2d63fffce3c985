use std::fmt;

/// Label name that refers to the address of the instruction using it.
pub const SELF_REFERENCE: &str = "*";

/// The argument given to an [`instruction`][super::Instruction].
///
/// Literals are kept as `i64` so that out of range values can be reported instead of being
/// silently truncated.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Default)]
pub enum Argument {
    #[default]
    None,
    Literal(i64),
    /// A reference to a [`Label`][crate::ast::Label], resolved during linking.
    Label(String),
}

impl Argument {
    pub fn label(&self) -> Option<&str> {
        match self {
            Argument::Label(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Argument::None)
    }
}

impl From<()> for Argument {
    fn from(_: ()) -> Self {
        Argument::None
    }
}

macro_rules! literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Argument {
                fn from(value: $ty) -> Self {
                    Argument::Literal(value as i64)
                }
            }
        )*
    };
}

literal_from!(i8, u8, i16, u16, i32, u32, i64);

impl From<&str> for Argument {
    fn from(name: &str) -> Self {
        Argument::Label(name.to_string())
    }
}

impl From<String> for Argument {
    fn from(name: String) -> Self {
        Argument::Label(name)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::None => Ok(()),
            Argument::Literal(value) => write!(f, "{}", value),
            Argument::Label(name) => write!(f, "{}", name),
        }
    }
}

/// Arithmetic operation of a [`Modifier::Arithmetic`].
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, strum_macros::Display)]
pub enum ArithmeticOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "<<")]
    Shl,
    #[strum(serialize = ">>")]
    Shr,
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "|")]
    Or,
}

impl ArithmeticOp {
    /// Apply the operation, `None` on division by zero or overflow.
    pub fn apply(&self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            ArithmeticOp::Add => lhs.checked_add(rhs),
            ArithmeticOp::Div => lhs.checked_div(rhs),
            ArithmeticOp::Mul => lhs.checked_mul(rhs),
            ArithmeticOp::Shl => u32::try_from(rhs).ok().and_then(|n| lhs.checked_shl(n)),
            ArithmeticOp::Shr => u32::try_from(rhs).ok().and_then(|n| lhs.checked_shr(n)),
            ArithmeticOp::And => Some(lhs & rhs),
            ArithmeticOp::Or => Some(lhs | rhs),
        }
    }
}

/// Transformation applied to the resolved address of a label argument.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub enum Modifier {
    /// `<label`, the least significant byte of the address
    LowByte,
    /// `>label`, the most significant byte of the address
    HighByte,
    /// `label+1`, `label/2`, ...
    Arithmetic(ArithmeticOp, i64),
}

impl Modifier {
    pub fn offset(value: i64) -> Modifier {
        Modifier::Arithmetic(ArithmeticOp::Add, value)
    }

    pub fn is_byte_extraction(&self) -> bool {
        matches!(self, Modifier::LowByte | Modifier::HighByte)
    }

    /// Apply the modifier to an address.
    pub fn apply(&self, address: i64) -> Option<i64> {
        match self {
            Modifier::LowByte => Some(address & 0xff),
            Modifier::HighByte => Some((address >> 8) & 0xff),
            Modifier::Arithmetic(op, rhs) => op.apply(address, *rhs),
        }
    }

    /// Render the label with the modifier notation, e.g. `<msg` or `uno+1`.
    pub fn render(&self, label: &str) -> String {
        match self {
            Modifier::LowByte => format!("<{}", label),
            Modifier::HighByte => format!(">{}", label),
            Modifier::Arithmetic(ArithmeticOp::Add, value) => format!("{}{:+}", label, value),
            Modifier::Arithmetic(op, value) => format!("{}{}{}", label, op, value),
        }
    }
}

impl From<i64> for Modifier {
    fn from(value: i64) -> Self {
        Modifier::offset(value)
    }
}

impl From<i32> for Modifier {
    fn from(value: i32) -> Self {
        Modifier::offset(value as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_modifier_apply() {
        assert_eq!(Modifier::LowByte.apply(0xc012), Some(0x12));
        assert_eq!(Modifier::HighByte.apply(0xc012), Some(0xc0));
        assert_eq!(Modifier::offset(-2).apply(0x1000), Some(0x0ffe));
        assert_eq!(
            Modifier::Arithmetic(ArithmeticOp::Shr, 4).apply(0x1230),
            Some(0x0123)
        );
        assert_eq!(Modifier::Arithmetic(ArithmeticOp::Div, 0).apply(0x10), None);
        assert_eq!(Modifier::Arithmetic(ArithmeticOp::Shl, -1).apply(0x10), None);
    }

    #[test]
    fn test_modifier_render() {
        assert_eq!(Modifier::LowByte.render("msg"), "<msg");
        assert_eq!(Modifier::HighByte.render("msg"), ">msg");
        assert_eq!(Modifier::offset(2).render("uno"), "uno+2");
        assert_eq!(Modifier::offset(-1).render("uno"), "uno-1");
        assert_eq!(
            Modifier::Arithmetic(ArithmeticOp::And, 255).render("tbl"),
            "tbl&255"
        );
    }

    #[test]
    fn test_argument_from() {
        assert_eq!(Argument::from(()), Argument::None);
        assert_eq!(Argument::from(0x20), Argument::Literal(0x20));
        assert_eq!(Argument::from("loop"), Argument::Label("loop".to_string()));
    }
}
