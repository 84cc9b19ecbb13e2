use core::fmt;

use heapless::{String, Vec};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encode `bytes` as lowercase hex text, two characters per byte.
pub fn encode_hex<const N: usize>(bytes: &[u8]) -> Result<String<N>, EncodeHexError> {
    let mut out = String::new();
    for b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char)
            .and_then(|_| out.push(HEX_DIGITS[(b & 0x0f) as usize] as char))
            .map_err(|_| EncodeHexError::BufferFull)?;
    }
    Ok(out)
}

pub fn decode_hex<const N: usize>(s: &str) -> Result<Vec<u8, N>, DecodeHexError> {
    if s.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }

    let mut out = Vec::new();
    for pair in s.as_bytes().chunks(2) {
        let byte = decode_pair(pair[0], pair[1])?;
        out.push(byte).map_err(|_| DecodeHexError::BufferFull)?;
    }
    Ok(out)
}

/// Value of a single hex digit, either case.
pub fn nibble(c: u8) -> Result<u8, DecodeHexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(DecodeHexError::InvalidDigit(c)),
    }
}

pub fn decode_pair(high: u8, low: u8) -> Result<u8, DecodeHexError> {
    Ok(nibble(high)? << 4 | nibble(low)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeHexError {
    BufferFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeHexError {
    OddLength,
    InvalidDigit(u8),
    BufferFull,
}

impl fmt::Display for DecodeHexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeHexError::OddLength => "input string has an odd number of bytes".fmt(f),
            DecodeHexError::InvalidDigit(c) => write!(f, "invalid hex digit {:#04x}", c),
            DecodeHexError::BufferFull => "output buffer is full".fmt(f),
        }
    }
}
