use std::fmt;

use super::NodeError;
use crate::charset::Charset;

/// How the content of a [`Data`] node is encoded.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DataMode {
    /// PETSCII for text, single bytes for numbers
    #[default]
    Default,
    /// Screen codes, text only
    Screen,
    /// Little endian words, numbers only
    Word,
}

/// Content of a [`Data`] node.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DataContent {
    Text(String),
    Numbers(Vec<i64>),
}

impl From<&str> for DataContent {
    fn from(text: &str) -> Self {
        DataContent::Text(text.to_string())
    }
}

impl From<String> for DataContent {
    fn from(text: String) -> Self {
        DataContent::Text(text)
    }
}

impl From<Vec<i64>> for DataContent {
    fn from(numbers: Vec<i64>) -> Self {
        DataContent::Numbers(numbers)
    }
}

impl From<&[i64]> for DataContent {
    fn from(numbers: &[i64]) -> Self {
        DataContent::Numbers(numbers.to_vec())
    }
}

impl From<&[u8]> for DataContent {
    fn from(bytes: &[u8]) -> Self {
        DataContent::Numbers(bytes.iter().map(|b| *b as i64).collect())
    }
}

impl From<Vec<u8>> for DataContent {
    fn from(bytes: Vec<u8>) -> Self {
        DataContent::from(bytes.as_slice())
    }
}

impl<const N: usize> From<[i64; N]> for DataContent {
    fn from(numbers: [i64; N]) -> Self {
        DataContent::Numbers(numbers.to_vec())
    }
}

/// A bunch of bytes placed verbatim in the program.
///
/// The content is validated and encoded on construction, so the length is always known.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Data {
    content: DataContent,
    mode: DataMode,
    bytes: Vec<u8>,
}

impl Data {
    pub fn new(content: impl Into<DataContent>, mode: DataMode) -> Result<Data, NodeError> {
        let content = content.into();

        let bytes = match (&content, mode) {
            (DataContent::Text(text), DataMode::Default) => encode_text(text, Charset::Petscii)?,
            (DataContent::Text(text), DataMode::Screen) => encode_text(text, Charset::Screen)?,
            (DataContent::Numbers(numbers), DataMode::Default) => numbers
                .iter()
                .map(|n| u8::try_from(*n).map_err(|_| NodeError::InvalidByte(*n)))
                .collect::<Result<Vec<u8>, NodeError>>()?,
            (DataContent::Numbers(numbers), DataMode::Word) => {
                let mut bytes = Vec::with_capacity(numbers.len() * 2);
                for n in numbers {
                    let word = u16::try_from(*n).map_err(|_| NodeError::InvalidWord(*n))?;
                    bytes.extend_from_slice(&word.to_le_bytes());
                }
                bytes
            }
            (DataContent::Text(_), DataMode::Word) | (DataContent::Numbers(_), DataMode::Screen) => {
                return Err(NodeError::UnsupportedDataMode(mode))
            }
        };

        Ok(Data {
            content,
            mode,
            bytes,
        })
    }

    pub fn content(&self) -> &DataContent {
        &self.content
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    /// Encoded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn encode_text(text: &str, charset: Charset) -> Result<Vec<u8>, NodeError> {
    charset
        .encode(text)
        .map_err(|c| NodeError::InvalidCharacter(c, charset))
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.content, self.mode) {
            (DataContent::Text(text), DataMode::Screen) => write!(f, ".screen \"{}\"", text),
            (DataContent::Text(text), _) => write!(f, ".text \"{}\"", text),
            (DataContent::Numbers(numbers), mode) => {
                let (directive, width) = match mode {
                    DataMode::Word => (".word", 4),
                    _ => (".byte", 2),
                };
                let values = numbers
                    .iter()
                    .map(|n| format!("${:0width$x}", n, width = width))
                    .collect::<Vec<String>>()
                    .join(",");
                write!(f, "{} {}", directive, values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_text() -> Result<(), NodeError> {
        let data = Data::new("HELLO WORLD#", DataMode::Default)?;
        assert_eq!(data.size(), 12);
        assert_eq!(data.bytes(), b"HELLO WORLD#");
        assert_eq!(data.to_string(), ".text \"HELLO WORLD#\"");

        let data = Data::new("hi", DataMode::Screen)?;
        assert_eq!(data.bytes(), &[0x08, 0x09]);
        assert_eq!(data.to_string(), ".screen \"hi\"");
        Ok(())
    }

    #[test]
    fn test_unmapped_character() -> Result<(), NodeError> {
        // The pound sign only exists as a screen code
        assert_eq!(
            Data::new("£5", DataMode::Default),
            Err(NodeError::InvalidCharacter('£', Charset::Petscii))
        );
        let data = Data::new("£5", DataMode::Screen)?;
        assert_eq!(data.size(), 2);
        assert_eq!(data.bytes(), &[0x1c, 0x35]);
        Ok(())
    }

    #[test]
    fn test_numbers() -> Result<(), NodeError> {
        let data = Data::new([0x01_i64, 0xff], DataMode::Default)?;
        assert_eq!(data.bytes(), &[0x01, 0xff]);
        assert_eq!(data.to_string(), ".byte $01,$ff");

        let data = Data::new([0x0403_i64, 0xffd2], DataMode::Word)?;
        assert_eq!(data.bytes(), &[0x03, 0x04, 0xd2, 0xff]);
        assert_eq!(data.to_string(), ".word $0403,$ffd2");

        assert_eq!(
            Data::new([0x100_i64], DataMode::Default),
            Err(NodeError::InvalidByte(0x100))
        );
        assert_eq!(
            Data::new([-1_i64], DataMode::Word),
            Err(NodeError::InvalidWord(-1))
        );
        Ok(())
    }

    #[test]
    fn test_unsupported_mode() {
        assert_eq!(
            Data::new("text", DataMode::Word),
            Err(NodeError::UnsupportedDataMode(DataMode::Word))
        );
        assert_eq!(
            Data::new([1_i64, 2], DataMode::Screen),
            Err(NodeError::UnsupportedDataMode(DataMode::Screen))
        );
    }
}
