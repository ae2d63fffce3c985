use thiserror::Error;

use self::{indexing::index_block, resolve::resolve_block};
use super::{codegen::CodeGenError, program::Program};
use crate::ast::{Align, Block, InstructionError, Node};

/// Assign addresses to nodes and collect labels.
mod indexing;

/// Resolving of labels to addresses and branch offsets.
mod resolve;

/// First address past the 64K address space.
pub const ADDRESS_SPACE_END: usize = 0x10000;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum LinkError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(i64),
    #[error("Invalid alignment from ${from:04x} to ${to:04x}")]
    Misaligned { from: usize, to: u16 },
    #[error("Label not found: {0}")]
    UnresolvedLabel(String),
    #[error("Instruction without addressing mode: {0}")]
    IncompleteInstruction(String),
    #[error("Program too large, ends at ${0:x}")]
    ProgramOverflow(usize),
    #[error("Cannot resolve `{instruction}`: {source}")]
    Operand {
        instruction: String,
        source: InstructionError,
    },
    #[error(transparent)]
    CodeGen(#[from] CodeGenError),
}

/// A label and the address it was linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: usize,
}

/// The labels of one block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            symbols: Vec::new(),
        }
    }

    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    /// Address of a label, if defined.
    pub fn address(&self, name: &str) -> Option<usize> {
        self.find_symbol(name).map(|symbol| symbol.address)
    }

    /// Define a label, returning the previous address when it is redefined.
    pub fn define(&mut self, name: &str, address: usize) -> Option<usize> {
        match self.symbols.iter_mut().find(|symbol| symbol.name == name) {
            Some(symbol) => Some(std::mem::replace(&mut symbol.address, address)),
            None => {
                self.symbols.push(Symbol {
                    name: name.to_string(),
                    address,
                });
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Link a block with the program starting at `origin`.
///
/// Both passes walk the nodes in order. Nested blocks continue at the address of their parent
/// but keep their own labels. Any failure aborts linking, there are no partial results.
#[tracing::instrument(skip(block))]
pub fn link(block: &Block, origin: i64) -> Result<Program, LinkError> {
    let mut origin = u16::try_from(origin).map_err(|_| LinkError::InvalidOrigin(origin))?;
    if let Some(align) = leading_align(block) {
        origin = align.address();
    }

    let mut warnings = vec![];
    let mut linked = index_block(block, origin as usize, &mut warnings)?;
    resolve_block(&mut linked)?;

    Ok(Program::new(linked, warnings))
}

/// An alignment as the first node of the program decides the origin.
fn leading_align(block: &Block) -> Option<Align> {
    match block.nodes().first() {
        Some(Node::Align(align)) => Some(*align),
        Some(Node::Block(nested)) => leading_align(nested),
        _ => None,
    }
}
