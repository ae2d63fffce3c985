use lazy_static::lazy_static;
use std::collections::HashMap;

/// Character set used to transcode text into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// PETSCII, as printed by the KERNAL `CHROUT` routine
    Petscii,
    /// Screen codes, as stored in video memory. Input is upper cased first.
    Screen,
}

impl Charset {
    /// Encode a single character, `None` if the character set lacks it.
    pub fn encode_char(&self, c: char) -> Option<u8> {
        match self {
            Charset::Petscii => PETSCII.get(&(c as u32)).copied(),
            Charset::Screen => c
                .to_uppercase()
                .next()
                .and_then(|c| SCREEN_CODES.get(&(c as u32)).copied()),
        }
    }

    /// Encode a string, returning the first character the character set lacks on failure.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, char> {
        text.chars()
            .map(|c| self.encode_char(c).ok_or(c))
            .collect()
    }
}

/// Unicode code point to PETSCII
#[rustfmt::skip]
const PETSCII_TABLE: &[(u32, u8)] = &[
        (0x0a, 0x8d), (0x20, 0x20), (0x21, 0x21), (0x22, 0x22), (0x23, 0x23), (0x24, 0x24),
        (0x25, 0x25), (0x26, 0x26), (0x27, 0x27), (0x28, 0x28), (0x29, 0x29), (0x2a, 0x2a),
        (0x2b, 0x2b), (0x2c, 0x2c), (0x2d, 0x2d), (0x2e, 0x2e), (0x2f, 0x2f), (0x30, 0x30),
        (0x31, 0x31), (0x32, 0x32), (0x33, 0x33), (0x34, 0x34), (0x35, 0x35), (0x36, 0x36),
        (0x37, 0x37), (0x38, 0x38), (0x39, 0x39), (0x3a, 0x3a), (0x3b, 0x3b), (0x3c, 0x3c), (0x3d, 0x3d),
        (0x3e, 0x3e), (0x3f, 0x3f), (0x40, 0x40), (0x41, 0x41), (0x42, 0x42), (0x43, 0x43),
        (0x44, 0x44), (0x45, 0x45), (0x46, 0x46), (0x47, 0x47), (0x48, 0x48), (0x49, 0x49),
        (0x4a, 0x4a), (0x4b, 0x4b), (0x4c, 0x4c), (0x4d, 0x4d), (0x4e, 0x4e), (0x4f, 0x4f),
        (0x50, 0x50), (0x51, 0x51), (0x52, 0x52), (0x53, 0x53), (0x54, 0x54), (0x55, 0x55),
        (0x56, 0x56), (0x57, 0x57), (0x58, 0x58), (0x59, 0x59), (0x5a, 0x5a), (0x5b, 0x5b),
        (0x5c, 0x5c), (0x5d, 0x5d), (0x5e, 0x5e), (0x5f, 0x5f), (0x60, 0x60), (0x61, 0x61),
        (0x62, 0x62), (0x63, 0x63), (0x64, 0x64), (0x65, 0x65), (0x66, 0x66), (0x67, 0x67),
        (0x68, 0x68), (0x69, 0x69), (0x6a, 0x6a), (0x6b, 0x6b), (0x6c, 0x6c), (0x6d, 0x6d),
        (0x6e, 0x6e), (0x6f, 0x6f), (0x70, 0x70), (0x71, 0x71), (0x72, 0x72), (0x73, 0x73),
        (0x74, 0x74), (0x75, 0x75), (0x76, 0x76), (0x77, 0x77), (0x78, 0x78), (0x79, 0x79),
        (0x7a, 0x7a), (0x7b, 0x7b), (0x7c, 0x7c), (0x7d, 0x7d), (0x7e, 0x7e), (0x7f, 0x7f),
        (0xa0, 0xe0), (0x03c0, 0xff), (0x2501, 0xc3), (0x2502, 0xdd), (0x250c, 0xf0),
        (0x2510, 0xee), (0x2514, 0xed), (0x2518, 0xfd), (0x251c, 0xeb), (0x2524, 0xf3),
        (0x252c, 0xf2), (0x2534, 0xf1), (0x253c, 0xdb), (0x256d, 0xd5), (0x256e, 0xc9),
        (0x256f, 0xcb), (0x2570, 0xca), (0x2571, 0xce), (0x2572, 0xcd), (0x2573, 0xd6),
        (0x2581, 0xe4), (0x2582, 0xef), (0x2583, 0xf9), (0x2584, 0xe2), (0x258c, 0xe1),
        (0x258d, 0xf5), (0x258e, 0xf4), (0x258f, 0xe5), (0x2592, 0xe6), (0x2594, 0xe3),
        (0x2595, 0xe7), (0x25cb, 0xd7), (0x25cf, 0xd1), (0x25e4, 0xe9), (0x25e5, 0xdf),
        (0x2660, 0xc1), (0x2663, 0xd8), (0x2665, 0xd3), (0x2666, 0xda), (0xf104, 0x81),
        (0xf105, 0x90), (0xf106, 0x95), (0xf107, 0x96), (0xf108, 0x97), (0xf109, 0x98),
        (0xf10a, 0x99), (0xf10b, 0x9a), (0xf10c, 0x9b), (0xf10d, 0x9c), (0xf10e, 0x9e),
        (0xf10f, 0x9f), (0xf110, 0x85), (0xf111, 0x89), (0xf112, 0x86), (0xf113, 0x8a),
        (0xf114, 0x87), (0xf115, 0x8b), (0xf116, 0x88), (0xf117, 0x8c), (0xf11b, 0x92),
        (0xf11d, 0x9d), (0xf11e, 0x91), (0xf121, 0x94), (0xf122, 0xc4), (0xf123, 0xc5),
        (0xf124, 0xc6), (0xf125, 0xd2), (0xf126, 0xc7), (0xf127, 0xd4), (0xf128, 0xc8),
        (0xf129, 0xd9), (0xf12a, 0xcc), (0xf12b, 0xcf), (0xf12c, 0xd0), (0xf12d, 0xfa),
        (0xf12e, 0xdc), (0xf12f, 0xe8), (0xf130, 0xea), (0xf131, 0xf6), (0xf132, 0xf7),
        (0xf133, 0xf8), (0xf134, 0xec), (0xf135, 0xfb), (0xf136, 0xfc), (0xf137, 0xfe),
        (0xf138, 0xbf),
];

/// Unicode code point to screen code
#[rustfmt::skip]
const SCREEN_CODE_TABLE: &[(u32, u8)] = &[
        (0x20, 0x20), (0x21, 0x21), (0x22, 0x22), (0x23, 0x23), (0x24, 0x24), (0x25, 0x25),
        (0x26, 0x26), (0x27, 0x27), (0x28, 0x28), (0x29, 0x29), (0x2a, 0x2a), (0x2b, 0x2b),
        (0x2c, 0x2c), (0x2d, 0x2d), (0x2e, 0x2e), (0x2f, 0x2f), (0x30, 0x30), (0x31, 0x31),
        (0x32, 0x32), (0x33, 0x33), (0x34, 0x34), (0x35, 0x35), (0x36, 0x36), (0x37, 0x37),
        (0x38, 0x38), (0x39, 0x39), (0x3a, 0x3a), (0x3b, 0x3b), (0x3c, 0x3c), (0x3d, 0x3d),
        (0x3e, 0x3e), (0x3f, 0x3f), (0x40, 0x00), (0x41, 0x01), (0x42, 0x02), (0x43, 0x03),
        (0x44, 0x04), (0x45, 0x05), (0x46, 0x06), (0x47, 0x07), (0x48, 0x08), (0x49, 0x09),
        (0x4a, 0x0a), (0x4b, 0x0b), (0x4c, 0x0c), (0x4d, 0x0d), (0x4e, 0x0e), (0x4f, 0x0f),
        (0x50, 0x10), (0x51, 0x11), (0x52, 0x12), (0x53, 0x13), (0x54, 0x14), (0x55, 0x15),
        (0x56, 0x16), (0x57, 0x17), (0x58, 0x18), (0x59, 0x19), (0x5a, 0x1a), (0x5b, 0x1b),
        (0x5d, 0x1d), (0xa3, 0x1c), (0x2190, 0x1f), (0x2191, 0x1e),
];

lazy_static! {
    static ref PETSCII: HashMap<u32, u8> = PETSCII_TABLE.iter().copied().collect();
    static ref SCREEN_CODES: HashMap<u32, u8> = SCREEN_CODE_TABLE.iter().copied().collect();
}
