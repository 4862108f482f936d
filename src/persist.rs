// ===========================================================================
// Persistence — saving and loading a BbsGenerator's state as JSON.
//
// Hex-encoded BigUint fields, a file-size cap checked before the file is
// read, a hex-field length cap checked before the (otherwise O(n^2))
// BigUint parse, and a coherence check on load (x in (1, modulus), pos
// representable).
//
// Persisting p and q is deliberately NOT supported: a state record is
// meant to let a stream be paused and resumed, not to export key material.
// Only M, c, x0, x, and pos are serialized.
// ===========================================================================

use std::fs;
use std::io;
use std::path::Path;

use num_bigint::BigUint;
use num_traits::{Num, One, Zero};
use serde::{Deserialize, Serialize};

use crate::bbs::BbsGenerator;
use crate::error::BbsError;

/// Maximum size of a persisted state file in bytes. A BBS state record is
/// a handful of hex fields; this comfortably covers moduli up to several
/// tens of thousands of bits with room to spare.
const MAX_STATE_FILE_BYTES: u64 = 32_768;

/// Maximum length, in hex characters, of any single field. Covers moduli
/// up to roughly 16384 bits (4096 hex chars) plus margin; checked before
/// the BigUint parse, which is otherwise quadratic in input length.
const MAX_HEX_FIELD_LEN: usize = 4_608;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BbsStateJson {
    pub modulus: String,
    pub carmichael: String,
    pub x0: String,
    pub x: String,
    pub pos: u64,
}

pub fn biguint_to_hex(value: &BigUint) -> String {
    value.to_str_radix(16)
}

pub fn hex_to_biguint(hex_str: &str) -> Result<BigUint, BbsError> {
    if hex_str.len() > MAX_HEX_FIELD_LEN {
        return Err(BbsError::HexFieldTooLong { actual: hex_str.len(), maximum: MAX_HEX_FIELD_LEN });
    }
    BigUint::from_str_radix(hex_str, 16).map_err(|_| BbsError::HexParseError)
}

pub fn state_to_json(gen: &BbsGenerator) -> BbsStateJson {
    BbsStateJson {
        modulus: biguint_to_hex(gen.modulus()),
        carmichael: biguint_to_hex(gen.carmichael_exponent()),
        x0: biguint_to_hex(gen.x0()),
        x: biguint_to_hex(gen.x()),
        pos: gen.pos(),
    }
}

/// Rebuilds a generator from a JSON record. The record carries no p/q, so
/// the resulting generator always has `factors() == None`; it can still
/// step and seek, since both only need M and c.
pub fn json_to_state(json: &BbsStateJson) -> Result<BbsGenerator, BbsError> {
    let modulus = hex_to_biguint(&json.modulus)?;
    let carmichael = hex_to_biguint(&json.carmichael)?;
    let x0 = hex_to_biguint(&json.x0)?;
    let x = hex_to_biguint(&json.x)?;

    if modulus <= BigUint::one() {
        return Err(BbsError::StateCorrupt);
    }
    if x <= BigUint::one() || x >= modulus {
        return Err(BbsError::StateCorrupt);
    }
    if x0 <= BigUint::one() || x0 >= modulus {
        return Err(BbsError::StateCorrupt);
    }
    if carmichael.is_zero() {
        return Err(BbsError::StateCorrupt);
    }

    Ok(BbsGenerator::from_state_parts(modulus, carmichael, x0, x, json.pos))
}

fn check_file_size(filepath: &str) -> io::Result<()> {
    let meta = fs::metadata(filepath)?;
    if meta.len() > MAX_STATE_FILE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "state file too large: {} bytes (maximum {} bytes)",
                meta.len(),
                MAX_STATE_FILE_BYTES
            ),
        ));
    }
    Ok(())
}

pub fn save_state(gen: &BbsGenerator, filepath: &str) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&state_to_json(gen))?;
    fs::write(filepath, json)
}

pub fn load_state(filepath: &str) -> io::Result<BbsGenerator> {
    check_file_size(filepath)?;
    let raw = fs::read_to_string(filepath)?;
    let json: BbsStateJson = serde_json::from_str(&raw)?;
    json_to_state(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

pub fn state_file_exists(filepath: &str) -> bool {
    Path::new(filepath).exists()
}
