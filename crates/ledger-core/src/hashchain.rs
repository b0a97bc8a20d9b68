//! Canonical block encoding, hashing and chain validity checks.
//!
//! The encoding is JSON text with keys sorted at every level, `", "` / `": "`
//! separators and every non printable-ASCII character escaped as `\uXXXX`.
//! Nodes written in other languages emit exactly these bytes, so hashes (and
//! therefore chain validity) agree across implementations.

use std::io;

use ibig::IBig;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::{HASH_HEX_SIZE, HASH_SIZE};
use crate::error::ChainViolation;
use crate::Block;

pub type Hash = [u8; HASH_SIZE];

pub fn sha256(bytes: &[u8]) -> Hash {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

/// Deterministic byte encoding of a block.
pub fn canonicalize(block: &Block) -> Vec<u8> {
    let value = serde_json::to_value(block).expect("block fields always map to JSON");
    encode_value(value)
}

fn encode_value(mut value: Value) -> Vec<u8> {
    value.sort_all_objects();
    let mut out = Vec::with_capacity(256);
    let mut ser = Serializer::with_formatter(&mut out, CanonicalFormatter);
    value
        .serialize(&mut ser)
        .expect("in-memory JSON encoding does not fail");
    out
}

/// Compact-but-spaced JSON: `", "` and `": "` separators, ASCII-only strings,
/// integers kept digit for digit and floats in shortest round-trip form.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    // Numbers arrive as their source text.
    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(number_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(|b| (b' '..=b'~').contains(&b)) {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                let mut buf = [0u8; 1];
                writer.write_all(c.encode_utf8(&mut buf).as_bytes())?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Integer literals keep every digit; anything with a fraction or exponent is a float.
fn number_repr(text: &str) -> String {
    if text.contains(['.', 'e', 'E']) {
        match text.parse::<f64>() {
            Ok(f) => float_repr(f),
            Err(_) => text.to_string(),
        }
    } else {
        match text.parse::<IBig>() {
            Ok(n) => n.to_string(),
            Err(_) => text.to_string(),
        }
    }
}

/// Lowercase hex SHA-256 of [`canonicalize`].
pub fn hash(block: &Block) -> String {
    hex::encode(sha256(&canonicalize(block)))
}

/// Number of leading `0` hex characters in a digest.
pub fn leading_zero_nibbles(hash: &Hash) -> usize {
    let mut total = 0;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

/// Decimal text of `candidate² − previous²`, exact for every `u64` pair.
pub fn proof_preimage(candidate: u64, previous: u64) -> String {
    let (c, p) = (i128::from(candidate), i128::from(previous));
    match c.checked_mul(c).zip(p.checked_mul(p)) {
        Some((c2, p2)) => (c2 - p2).to_string(),
        None => {
            let (c, p) = (IBig::from(candidate), IBig::from(previous));
            (&c * &c - &p * &p).to_string()
        }
    }
}

/// True iff the hex digest of [`proof_preimage`] starts with `difficulty` zeros.
pub fn satisfies_difficulty(candidate: u64, previous: u64, difficulty: usize) -> bool {
    if difficulty > HASH_HEX_SIZE {
        return false;
    }
    let digest = sha256(proof_preimage(candidate, previous).as_bytes());
    leading_zero_nibbles(&digest) >= difficulty
}

/// Walk the chain from its second block and report the first broken link or proof.
pub fn verify_chain(chain: &[Block], difficulty: usize) -> Result<(), ChainViolation> {
    if chain.is_empty() {
        return Err(ChainViolation::Empty);
    }
    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        if block.previous_hash != hash(previous) {
            return Err(ChainViolation::BrokenLink { index: block.index });
        }
        if !satisfies_difficulty(block.proof, previous.proof, difficulty) {
            return Err(ChainViolation::InvalidProof { index: block.index });
        }
    }
    Ok(())
}

pub fn is_chain_valid(chain: &[Block], difficulty: usize) -> bool {
    match verify_chain(chain, difficulty) {
        Ok(()) => true,
        Err(violation) => {
            debug!(%violation, len = chain.len(), "chain failed verification");
            false
        }
    }
}

/// Shortest round-trip float text, using exponent form outside `1e-4 <= |f| < 1e16`
/// with a signed, two-digit-minimum exponent (`1e+16`, `1.5e-05`).
pub fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "NaN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    let sci = format!("{f:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }
    if (-4..16).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                out.push_str(&digits);
                out.extend(std::iter::repeat('0').take(int_len - digits.len()));
                out.push_str(".0");
            } else {
                out.push_str(&digits[..int_len]);
                out.push('.');
                out.push_str(&digits[int_len..]);
            }
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take((-exp - 1) as usize));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let sign = if exp < 0 { '-' } else { '+' };
        out.push_str(&format!("e{sign}{:02}", exp.abs()));
    }
    out
}
