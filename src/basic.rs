//! Tokenizer for BASIC V2 listings.
//!
//! A tokenized program is a chain of lines, each stored as
//!
//! ```text
//! [next line address: u16 LE] [line number: u16 LE] [tokens and PETSCII...] [0]
//! ```
//!
//! and terminated by a null next line address. The usual use is a `SYS` stub starting machine
//! code, e.g. `10 SYS 49152`.

use std::path::PathBuf;

use anyhow::Context as _;
use thiserror::Error;

use crate::{
    assembler::OutputFormat,
    ast::{Align, Block, Data, DataMode, NodeError},
    charset::Charset,
};

/// Load address of BASIC programs on the C64.
pub const BASIC_START: u16 = 0x0801;

/// Highest line number the BASIC editor accepts.
pub const MAX_LINE_NUMBER: u32 = 63999;

/// Keywords and their tokens, in the order the interpreter matches them.
#[rustfmt::skip]
const BASIC_TOKENS: &[(&str, u8)] = &[
    ("END", 0x80), ("FOR", 0x81), ("NEXT", 0x82), ("DATA", 0x83), ("INPUT#", 0x84),
    ("INPUT", 0x85), ("DIM", 0x86), ("READ", 0x87), ("LET", 0x88), ("GOTO", 0x89),
    ("RUN", 0x8a), ("IF", 0x8b), ("RESTORE", 0x8c), ("GOSUB", 0x8d), ("RETURN", 0x8e),
    ("REM", 0x8f), ("STOP", 0x90), ("ON", 0x91), ("WAIT", 0x92), ("LOAD", 0x93),
    ("SAVE", 0x94), ("VERIFY", 0x95), ("DEF", 0x96), ("POKE", 0x97), ("PRINT#", 0x98),
    ("PRINT", 0x99), ("CONT", 0x9a), ("LIST", 0x9b), ("CLR", 0x9c), ("CMD", 0x9d),
    ("SYS", 0x9e), ("OPEN", 0x9f), ("CLOSE", 0xa0), ("GET", 0xa1), ("NEW", 0xa2),
    ("TAB(", 0xa3), ("TO", 0xa4), ("FN", 0xa5), ("SPC(", 0xa6), ("THEN", 0xa7),
    ("NOT", 0xa8), ("STEP", 0xa9), ("+", 0xaa), ("-", 0xab), ("*", 0xac),
    ("/", 0xad), ("^", 0xae), ("AND", 0xaf), ("OR", 0xb0), (">", 0xb1),
    ("=", 0xb2), ("<", 0xb3), ("SGN", 0xb4), ("INT", 0xb5), ("ABS", 0xb6),
    ("USR", 0xb7), ("FRE", 0xb8), ("POS", 0xb9), ("SQR", 0xba), ("RND", 0xbb),
    ("LOG", 0xbc), ("EXP", 0xbd), ("COS", 0xbe), ("SIN", 0xbf), ("TAN", 0xc0),
    ("ATN", 0xc1), ("PEEK", 0xc2), ("LEN", 0xc3), ("STR$", 0xc4), ("VAL", 0xc5),
    ("ASC", 0xc6), ("CHR$", 0xc7), ("LEFT$", 0xc8), ("RIGHT$", 0xc9), ("MID$", 0xca),
    ("GO", 0xcb),
];

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum BasicError {
    #[error("Origin has to be in range $0 - $ffff, got {0}")]
    InvalidOrigin(i64),
    #[error("Line {0} has to start with a line number")]
    MissingLineNumber(usize),
    #[error("Line number {0} out of range")]
    LineNumberOutOfRange(String),
    #[error("Unknown character {0:?}")]
    UnknownCharacter(char),
    #[error("Program does not fit in memory")]
    ProgramOverflow,
    #[error(transparent)]
    Node(#[from] NodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Keywords,
    /// Inside a string literal, `data` when it started within `DATA`
    Quoted { data: bool },
    /// After `DATA`, until a colon outside of a string
    Data,
    /// After `REM`, until the end of the line
    Remark,
}

/// A tokenized BASIC program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basic {
    listing: String,
    origin: u16,
    bytes: Vec<u8>,
    code: Block,
}

impl Basic {
    /// Tokenize `listing` for loading at `origin`.
    ///
    /// With `align` the resulting [`Basic::code`] starts with an alignment to the origin.
    #[tracing::instrument(skip(listing))]
    pub fn new(listing: &str, origin: i64, align: bool) -> Result<Basic, BasicError> {
        let origin = u16::try_from(origin).map_err(|_| BasicError::InvalidOrigin(origin))?;
        let bytes = tokenize(listing, origin)?;

        let mut code = Block::new();
        if align {
            code.push(Align::new(origin as i64)?);
        }
        code.push(Data::new(bytes.clone(), DataMode::Default)?);

        Ok(Basic {
            listing: listing.to_string(),
            origin,
            bytes,
            code,
        })
    }

    pub fn listing(&self) -> &str {
        &self.listing
    }

    pub fn origin(&self) -> u16 {
        self.origin
    }

    /// The tokenized program without load address.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The program as a block to be placed in front of machine code.
    pub fn code(&self) -> Block {
        self.code.clone()
    }
}

/// Split a line into its number and the rest.
fn line_number(index: usize, line: &str) -> Result<(u16, &str), BasicError> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return Err(BasicError::MissingLineNumber(index + 1));
    }

    let (number, rest) = line.split_at(digits);
    match number.parse::<u32>() {
        Ok(n) if n <= MAX_LINE_NUMBER => Ok((n as u16, rest.trim_start())),
        _ => Err(BasicError::LineNumberOutOfRange(number.to_string())),
    }
}

fn petscii(c: char) -> Result<u8, BasicError> {
    Charset::Petscii
        .encode_char(c)
        .ok_or(BasicError::UnknownCharacter(c))
}

/// Tokenize the statements of a single line.
fn tokenize_line(body: &str) -> Result<Vec<u8>, BasicError> {
    let body = body.to_uppercase();
    let mut bytes = vec![];
    let mut mode = Mode::Keywords;
    let mut rest = body.as_str();

    while let Some(c) = rest.chars().next() {
        let mut len = c.len_utf8();

        match mode {
            Mode::Keywords => {
                if let Some((keyword, token)) = BASIC_TOKENS
                    .iter()
                    .find(|(keyword, _)| rest.starts_with(keyword))
                {
                    bytes.push(*token);
                    len = keyword.len();
                    mode = match *keyword {
                        "REM" => Mode::Remark,
                        "DATA" => Mode::Data,
                        _ => Mode::Keywords,
                    };
                } else {
                    bytes.push(petscii(c)?);
                    if c == '"' {
                        mode = Mode::Quoted { data: false };
                    }
                }
            }
            Mode::Quoted { data } => {
                bytes.push(petscii(c)?);
                if c == '"' {
                    mode = if data { Mode::Data } else { Mode::Keywords };
                }
            }
            Mode::Data => {
                bytes.push(petscii(c)?);
                match c {
                    '"' => mode = Mode::Quoted { data: true },
                    ':' => mode = Mode::Keywords,
                    _ => (),
                }
            }
            Mode::Remark => bytes.push(petscii(c)?),
        }

        rest = &rest[len..];
    }

    Ok(bytes)
}

/// Tokenize a listing into the in-memory representation starting at `origin`.
pub fn tokenize(listing: &str, origin: u16) -> Result<Vec<u8>, BasicError> {
    let mut bytes = vec![];
    let mut addr = origin as usize;

    for (index, line) in listing.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (number, body) = line_number(index, line)?;
        let body = tokenize_line(body)?;

        // Pointer, line number, body and terminating zero
        addr += 2 + 2 + body.len() + 1;
        let next = u16::try_from(addr).map_err(|_| BasicError::ProgramOverflow)?;

        bytes.extend_from_slice(&next.to_le_bytes());
        bytes.extend_from_slice(&number.to_le_bytes());
        bytes.extend(body);
        bytes.push(0);
    }

    bytes.extend_from_slice(&[0, 0]);
    Ok(bytes)
}

#[derive(clap::Args, Debug, Clone)]
pub struct BasicArgs {
    /// BASIC listing to tokenize
    #[clap(required = true)]
    pub input: PathBuf,

    /// Load address
    #[clap(long, default_value = "0x0801", value_parser = crate::parse_address)]
    pub origin: u16,

    /// Output file, defaults to the input with a .prg extension
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Do not align the program to its origin
    #[clap(long)]
    pub no_align: bool,
}

/// Tokenize a BASIC file and write it as a `.prg`.
#[tracing::instrument]
pub fn convert(args: &BasicArgs) -> anyhow::Result<()> {
    let listing = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let basic = Basic::new(&listing, args.origin as i64, !args.no_align)?;
    let program = basic.code().link(args.origin as i64)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("prg"));
    program
        .write(&output, OutputFormat::Prg)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("Wrote {} bytes to {}", program.code().len() + 2, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_sys_stub() -> Result<(), BasicError> {
        let basic = Basic::new("10 sys 49152", BASIC_START as i64, true)?;
        assert_eq!(
            basic.bytes(),
            &[
                0x0d, 0x08, 0x0a, 0x00, 0x9e, 0x20, 0x34, 0x39, 0x31, 0x35, 0x32, 0x00, 0x00, 0x00
            ]
        );
        assert_eq!(basic.code().len(), 2);
        assert_eq!(Basic::new("10 SYS 49152", 0x0801, false)?.code().len(), 1);
        Ok(())
    }

    #[test]
    fn test_line_pointers() -> Result<(), BasicError> {
        let bytes = tokenize("10 PRINT\n\n20 GOTO 10\n", 0x0801)?;
        assert_eq!(
            bytes,
            vec![
                0x07, 0x08, 0x0a, 0x00, 0x99, 0x00, // 10 PRINT
                0x10, 0x08, 0x14, 0x00, 0x89, 0x20, 0x31, 0x30, 0x00, // 20 GOTO 10
                0x00, 0x00,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_strings_and_remarks() -> Result<(), BasicError> {
        assert_eq!(
            tokenize_line("PRINT \"TO\"")?,
            vec![0x99, 0x20, 0x22, 0x54, 0x4f, 0x22]
        );
        assert_eq!(tokenize_line("REM GOTO")?, vec![0x8f, 0x20, 0x47, 0x4f, 0x54, 0x4f]);
        assert_eq!(
            tokenize_line("DATA TO:END")?,
            vec![0x83, 0x20, 0x54, 0x4f, 0x3a, 0x80]
        );
        // A colon inside a quoted DATA item does not end the statement
        assert_eq!(
            tokenize_line("DATA \"A:TO\",1:END")?,
            vec![0x83, 0x20, 0x22, 0x41, 0x3a, 0x54, 0x4f, 0x22, 0x2c, 0x31, 0x3a, 0x80]
        );
        // INPUT# is matched before INPUT
        assert_eq!(tokenize_line("INPUT#1")?, vec![0x84, 0x31]);
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Basic::new("PRINT", 0x0801, true),
            Err(BasicError::MissingLineNumber(1))
        );
        assert_eq!(
            Basic::new("64000 END", 0x0801, true),
            Err(BasicError::LineNumberOutOfRange("64000".to_string()))
        );
        assert_eq!(
            Basic::new("10 PRINT \"£\"", 0x0801, true),
            Err(BasicError::UnknownCharacter('£'))
        );
        assert_eq!(
            Basic::new("10 END", 0x10000, true),
            Err(BasicError::InvalidOrigin(0x10000))
        );
        assert_eq!(tokenize("10 END", 0xfffa), Err(BasicError::ProgramOverflow));
    }
}
