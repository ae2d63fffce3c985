use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use super::{codegen, listing, symbols::SymbolTable, OutputFormat};
use crate::ast::{Align, Data, Instruction, Label};

/// Something odd but not fatal noticed while linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkWarning {
    /// A label was defined twice in the same block, the later definition wins
    LabelRedefined {
        name: String,
        previous: usize,
        address: usize,
    },
}

impl fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkWarning::LabelRedefined {
                name,
                previous,
                address,
            } => write!(
                f,
                "Redefinition of label {} from ${:04x} to ${:04x}",
                name, previous, address
            ),
        }
    }
}

/// A node and the address it was placed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedNode {
    pub address: usize,
    pub kind: LinkedKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkedKind {
    /// A resolved instruction and its machine code
    Instruction {
        instruction: Instruction,
        bytes: Vec<u8>,
    },
    Label(Label),
    /// Zero bytes inserted to reach the alignment address
    Align { align: Align, padding: usize },
    Data(Data),
    Block(LinkedBlock),
}

impl LinkedKind {
    /// Number of bytes the node occupies in the output.
    pub fn size(&self) -> usize {
        match self {
            LinkedKind::Instruction { bytes, .. } => bytes.len(),
            LinkedKind::Label(_) => 0,
            LinkedKind::Align { padding, .. } => *padding,
            LinkedKind::Data(data) => data.size(),
            LinkedKind::Block(block) => block.size(),
        }
    }
}

/// A block after linking: every node has an address, labels are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedBlock {
    pub origin: usize,
    /// Address following the last byte of the block
    pub end: usize,
    pub labels: SymbolTable,
    pub nodes: Vec<LinkedNode>,
}

impl LinkedBlock {
    pub fn size(&self) -> usize {
        self.end - self.origin
    }
}

/// The result of linking a [`Block`][crate::ast::Block].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    block: LinkedBlock,
    warnings: Vec<LinkWarning>,
}

impl Program {
    pub(crate) fn new(block: LinkedBlock, warnings: Vec<LinkWarning>) -> Program {
        Program { block, warnings }
    }

    /// Load address of the program.
    pub fn origin(&self) -> u16 {
        // The linker only accepts origins within the address space
        self.block.origin as u16
    }

    /// Address following the last byte, may be `$10000` for a program filling memory.
    pub fn end(&self) -> usize {
        self.block.end
    }

    /// Labels of the top level block.
    pub fn labels(&self) -> &SymbolTable {
        &self.block.labels
    }

    pub fn block(&self) -> &LinkedBlock {
        &self.block
    }

    pub fn warnings(&self) -> &[LinkWarning] {
        &self.warnings
    }

    /// Machine code starting at the origin, alignment gaps filled with zeroes.
    pub fn code(&self) -> Vec<u8> {
        codegen::generate(&self.block)
    }

    /// The code prefixed with the little endian load address, as loaded by the C64.
    pub fn to_prg(&self) -> Vec<u8> {
        codegen::to_prg(self.origin(), &self.block)
    }

    /// Source code listing with resolved branch targets.
    pub fn to_source(&self) -> Vec<String> {
        listing::linked_source(&self.block)
    }

    /// Listing of addresses, bytes and source.
    pub fn dump(&self) -> Vec<String> {
        listing::dump(&self.block)
    }

    /// Write the program to `path` in the given format.
    #[tracing::instrument(skip(self, path))]
    pub fn write(&self, path: impl AsRef<Path>, format: OutputFormat) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        match format {
            OutputFormat::Prg => writer.write_all(&self.to_prg())?,
            OutputFormat::Src => write_lines(&mut writer, &self.to_source())?,
            OutputFormat::Dump => write_lines(&mut writer, &self.dump())?,
        }
        writer.flush()
    }
}

fn write_lines(writer: &mut impl Write, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}
