use std::fmt;

use thiserror::Error;

use crate::{
    assembler::{link, LinkError, Program},
    charset::Charset,
};

mod data;
mod directive;
mod instruction;

pub use data::{Data, DataContent, DataMode};
pub use directive::{Align, Label};
pub use instruction::{
    AddressingMode, ArithmeticOp, Argument, Instruction, InstructionError, Mnemonic, Modifier,
    SELF_REFERENCE,
};

/// Origin used when linking without an explicit one.
pub const DEFAULT_ORIGIN: u16 = 0x1000;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum NodeError {
    #[error("Invalid label name: {0:?}")]
    InvalidLabelName(String),
    #[error("Alignment address has to be in range $0 - $ffff, got {0}")]
    AlignmentOutOfRange(i64),
    #[error("Unsupported data mode: {0}")]
    UnsupportedDataMode(DataMode),
    #[error("Character {0:?} not in the {1:?} character set")]
    InvalidCharacter(char, Charset),
    #[error("Invalid byte: {0}")]
    InvalidByte(i64),
    #[error("Invalid word: {0}")]
    InvalidWord(i64),
}

/// A single node in a [`Block`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Node {
    /// A CPU instruction
    Instruction(Instruction),
    /// A label to mark a location in the code
    Label(Label),
    /// Moves the current address forward
    Align(Align),
    /// Raw bytes
    Data(Data),
    /// A nested block with its own label scope
    Block(Block),
}

impl Node {
    /// Labels, alignments and data never wait for linking.
    pub fn is_ready(&self) -> bool {
        match self {
            Node::Instruction(ins) => ins.is_ready(),
            Node::Block(block) => block.is_ready(),
            Node::Label(_) | Node::Align(_) | Node::Data(_) => true,
        }
    }
}

impl From<Instruction> for Node {
    fn from(instruction: Instruction) -> Self {
        Node::Instruction(instruction)
    }
}

impl From<Label> for Node {
    fn from(label: Label) -> Self {
        Node::Label(label)
    }
}

impl From<Align> for Node {
    fn from(align: Align) -> Self {
        Node::Align(align)
    }
}

impl From<Data> for Node {
    fn from(data: Data) -> Self {
        Node::Data(data)
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(block)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Instruction(instruction) => write!(f, "{}", instruction),
            Node::Label(label) => write!(f, "{}", label),
            Node::Align(align) => write!(f, "{}", align),
            Node::Data(data) => write!(f, "{}", data),
            Node::Block(block) => write!(f, "{}", block.to_source().join("\n")),
        }
    }
}

/// An ordered sequence of nodes, the unit of linking.
///
/// A block only describes the program. [`Block::link`] derives the addresses and bytes into a
/// separate [`Program`], so appending nodes after linking never leaves stale state behind.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Block {
    nodes: Vec<Node>,
}

impl Block {
    pub fn new() -> Block {
        Block { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    /// Append the nodes of another block to this one, sharing its label scope.
    pub fn extend(&mut self, other: Block) {
        self.nodes.extend(other.nodes);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Are all instructions, nested ones included, encodable without linking?
    pub fn is_ready(&self) -> bool {
        self.nodes.iter().all(Node::is_ready)
    }

    /// Resolve addresses and labels with the program starting at `origin`.
    ///
    /// An [`Align`] as the very first node (looking into leading nested blocks) overrides
    /// the origin.
    pub fn link(&self, origin: i64) -> Result<Program, LinkError> {
        link(self, origin)
    }

    /// Link at [`DEFAULT_ORIGIN`].
    pub fn link_default(&self) -> Result<Program, LinkError> {
        link(self, DEFAULT_ORIGIN as i64)
    }

    /// Source code listing, wrapped in `.block`/`.bend`.
    pub fn to_source(&self) -> Vec<String> {
        crate::assembler::listing::source(self)
    }
}

impl FromIterator<Node> for Block {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Block {
            nodes: iter.into_iter().collect(),
        }
    }
}
