use std::fmt;

use super::{NodeError, SELF_REFERENCE};

/// A named anchor, resolved to the address it appears at during linking.
///
/// E.g. `loop` in the listing. Labels are scoped to the [`Block`][super::Block] they appear
/// directly in.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label {
    name: String,
}

impl Label {
    /// Label names are identifiers: a letter or `_` followed by letters, digits or `_`.
    pub fn new(name: impl Into<String>) -> Result<Label, NodeError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };

        if !valid || name == SELF_REFERENCE {
            return Err(NodeError::InvalidLabelName(name));
        }

        Ok(Label { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Defines where in the memory code from now on should be placed.
///
/// E.g. `* = $c000` in the listing. The linker pads the gap between the current address and
/// the alignment address with zeroes, alignment backwards is an error.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Align {
    address: u16,
}

impl Align {
    pub fn new(address: i64) -> Result<Align, NodeError> {
        let address =
            u16::try_from(address).map_err(|_| NodeError::AlignmentOutOfRange(address))?;
        Ok(Align { address })
    }

    pub fn address(&self) -> u16 {
        self.address
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* = ${:04x}", self.address)
    }
}
