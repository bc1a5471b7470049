//! Base58 codec using the Bitcoin/Solana alphabet.
//!
//! Leading zero bytes map one-to-one onto leading `'1'` characters; the rest
//! of the buffer is treated as a big-endian unsigned integer.

use crate::error::Base58Error;

/// The 58-symbol alphabet (no `0`, `O`, `I` or `l`).
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Encode a byte buffer as base58.
pub fn encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // Base-58 digits of the remaining integer, least significant first.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat_n('1', zeros));
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    out
}

/// Decode a base58 string back into bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, Base58Error> {
    let ones = input.chars().take_while(|&c| c == '1').count();

    // Bytes of the integer, least significant first.
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    for (position, character) in input.chars().enumerate().skip(ones) {
        let value = digit_value(character)
            .ok_or(Base58Error::InvalidCharacter { character, position })?;
        let mut carry = value as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; ones];
    out.extend(bytes.iter().rev());
    Ok(out)
}

fn digit_value(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    ALPHABET.iter().position(|&a| a == c as u8).map(|p| p as u8)
}
