/// Links blocks of nodes into machine code.
///
/// The steps are:
/// 1. **Indexing** - assigning addresses to nodes and collecting labels
/// 2. **Resolving** - resolving labels to addresses and branch offsets
/// 3. **Code generation** - encoding instructions and writing `.prg` files and listings
pub mod assembler;

/// Instructions, labels, alignments, data and blocks.
pub mod ast;

/// BASIC V2 tokenizer
pub mod basic;

/// PETSCII and screen code tables
pub mod charset;

pub mod demos;

pub mod dsl;

/// Logging and tracing setup
pub mod instrumentation;

/// Parse an address given as `$c000`, `0xc000` or decimal.
pub fn parse_address(s: &str) -> Result<u16, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix('$')) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("$0801"), Ok(0x0801));
        assert_eq!(parse_address("0xc000"), Ok(0xc000));
        assert_eq!(parse_address("2049"), Ok(0x0801));
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("sys").is_err());
    }
}
