//! Types for snarkjs Groth16 artifacts
//!
//! These types read the `proof.json` / `public.json` files written by
//! `snarkjs groth16 prove` and turn them into the affine coordinates an
//! EVM verifier takes.

use std::path::Path;
use std::str::FromStr;

use alloy::primitives::U256;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parse a snarkjs field element (decimal, or `0x`-prefixed hex)
pub fn parse_field_element(s: &str) -> Option<U256> {
    let s = s.trim();
    // ruint reads "" and a bare radix prefix as zero
    let digits = ["0x", "0X", "0o", "0O", "0b", "0B"]
        .iter()
        .find_map(|prefix| s.strip_prefix(*prefix))
        .unwrap_or(s);
    if digits.is_empty() {
        return None;
    }
    U256::from_str(s).ok()
}

/// G1 point on BN254 (affine coordinates)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G1Point {
    pub x: U256,
    pub y: U256,
}

impl G1Point {
    /// Create from snarkjs JSON array format ["x", "y", "1"]
    /// The third element is the projective z, always "1" once normalized,
    /// and is not passed on-chain.
    pub fn from_json_array(arr: &[String]) -> Result<Self> {
        if arr.len() < 2 {
            return Err(Error::MalformedProof("G1 point requires at least 2 coordinates"));
        }
        Ok(Self {
            x: parse_field_element(&arr[0])
                .ok_or(Error::MalformedProof("invalid field element for x"))?,
            y: parse_field_element(&arr[1])
                .ok_or(Error::MalformedProof("invalid field element for y"))?,
        })
    }

    /// `uint256[2]` calldata form
    pub fn to_call_array(&self) -> [U256; 2] {
        [self.x, self.y]
    }
}

/// G2 point on BN254 (affine coordinates over Fq2)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G2Point {
    /// x coordinate: x[0] + x[1] * u
    pub x: [U256; 2],
    /// y coordinate: y[0] + y[1] * u
    pub y: [U256; 2],
}

impl G2Point {
    /// Create from snarkjs JSON array format [["x0", "x1"], ["y0", "y1"], ["1", "0"]]
    pub fn from_json_array(arr: &[Vec<String>]) -> Result<Self> {
        if arr.len() < 2 {
            return Err(Error::MalformedProof("G2 point requires at least 2 coordinate pairs"));
        }
        if arr[0].len() < 2 || arr[1].len() < 2 {
            return Err(Error::MalformedProof("each G2 coordinate requires 2 elements"));
        }
        let fe = |s: &String, what| parse_field_element(s).ok_or(Error::MalformedProof(what));
        Ok(Self {
            x: [
                fe(&arr[0][0], "invalid field element for x0")?,
                fe(&arr[0][1], "invalid field element for x1")?,
            ],
            y: [
                fe(&arr[1][0], "invalid field element for y0")?,
                fe(&arr[1][1], "invalid field element for y1")?,
            ],
        })
    }

    /// `uint256[2][2]` calldata form, limbs kept in snarkjs order
    pub fn to_call_array(&self) -> [[U256; 2]; 2] {
        [self.x, self.y]
    }
}

/// Groth16 proof (A, B, C)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub a: G1Point,
    pub b: G2Point,
    pub c: G1Point,
}

impl Proof {
    pub fn from_json(pi_a: &[String], pi_b: &[Vec<String>], pi_c: &[String]) -> Result<Self> {
        Ok(Self {
            a: G1Point::from_json_array(pi_a)?,
            b: G2Point::from_json_array(pi_b)?,
            c: G1Point::from_json_array(pi_c)?,
        })
    }
}

/// JSON format for snarkjs proof files
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProofJson {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    pub protocol: Option<String>,
    pub curve: Option<String>,
}

impl ProofJson {
    pub fn to_proof(&self) -> Result<Proof> {
        Proof::from_json(&self.pi_a, &self.pi_b, &self.pi_c)
    }
}

/// Ordered contents of a snarkjs `public.json`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PublicSignals(pub Vec<String>);

impl PublicSignals {
    /// Signal at `index` as a field element
    pub fn get(&self, index: usize) -> Result<U256> {
        let value = self.0.get(index).ok_or(Error::MissingPublicInput {
            index,
            len: self.0.len(),
        })?;
        parse_field_element(value).ok_or_else(|| Error::InvalidPublicInput {
            index,
            value: value.clone(),
        })
    }

    /// Every signal, in order
    pub fn to_field_elements(&self) -> Result<Vec<U256>> {
        (0..self.0.len()).map(|i| self.get(i)).collect()
    }
}

/// Parse JSON text, attributing failures to `path`
pub fn parse_json<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a JSON artifact from disk
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_json(path, &text)
}
