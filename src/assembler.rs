/// Generates machine code from a linked program.
pub mod codegen;

/// Source and dump listings.
pub mod listing;

/// The linked representation of a block.
pub mod program;

/// Linking: assigning addresses to nodes and resolving labels.
///
/// The steps are:
/// 1. **Indexing** - assigning addresses and collecting labels per block
/// 2. **Resolving** - replacing label references with addresses or branch offsets and
///    encoding the instructions
pub mod symbols;

pub use program::{LinkWarning, LinkedBlock, LinkedKind, LinkedNode, Program};
pub use symbols::{link, LinkError, SymbolTable};

use crate::{
    ast::{InstructionError, NodeError},
    basic::BasicError,
    dsl::MacroError,
};

#[derive(Debug, thiserror::Error)]
pub enum AssemblerError {
    #[error("Operand error: {0}")]
    Instruction(#[from] InstructionError),
    #[error("Node error: {0}")]
    Node(#[from] NodeError),
    #[error("Linker error: {0}")]
    Link(#[from] LinkError),
    #[error("Macro error: {0}")]
    Macro(#[from] MacroError),
    #[error("BASIC error: {0}")]
    Basic(#[from] BasicError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to write for a linked program.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Load address followed by the machine code
    Prg,
    /// Source code listing
    Src,
    /// Addresses, bytes and source side by side
    Dump,
}

/// Utility function for linking a block and returning the `.prg` image.
#[tracing::instrument(skip(block))]
pub fn assemble(block: &crate::ast::Block, origin: i64) -> Result<Vec<u8>, AssemblerError> {
    let program = link(block, origin)?;
    Ok(program.to_prg())
}
