//! Stability payload generator
//!
//! Produces the circuit's `input.json`: a sample of quantized squared
//! gradient magnitudes `u`, the Poseidon transcript hash of that sample, and
//! the fixed-point regularization claim the circuit re-derives.
//!
//! Every quantity is scaled by `Q = 2^32 - 1`. Negative coefficients are
//! wrapped by adding `2^254` (the circuit's field modulus is just above it)
//! and the Horner steps floor-divide by `Q` after each multiply, so all
//! arithmetic here is on unsigned 512-bit integers.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use alloy::primitives::{U256, U512};
use log::{debug, info};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::parse_field_element;

/// Sample size
pub const N: usize = 128;
pub const H2_MAX: f64 = 16.0;
pub const G_MAX: f64 = 256.0;
/// Fixed-point scale
pub const Q: u64 = (1 << 32) - 1;
pub const MODEL_HASH: u64 = 9876543210123456789;

/// phi(u) = C*u + B*u^2 + A*u^3
const PHI_A: f64 = 0.864;
const PHI_B: f64 = 0.384;
const PHI_C: f64 = 0.256;
/// lambda(g) = p0 + p1*g + p2*g^2 + p3*g^3
const LAMBDA_P: [f64; 4] = [0.95, -0.4, 0.3, -0.05];

const SNARKJS_TIMEOUT: Duration = Duration::from_secs(10);

fn q() -> U512 {
    U512::from(Q)
}

/// Scale by Q and round; negatives wrap by 2^254
pub fn to_field_element(val: f64) -> U512 {
    let scaled = (val * Q as f64).round_ties_even() as i128;
    if scaled < 0 {
        (U512::from(1u8) << 254usize) - U512::from(scaled.unsigned_abs())
    } else {
        U512::from(scaled as u128)
    }
}

/// Q-scaled polynomial coefficients
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coefficients {
    pub a: U512,
    pub b: U512,
    pub c: U512,
    pub p: [U512; 4],
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            a: to_field_element(PHI_A),
            b: to_field_element(PHI_B),
            c: to_field_element(PHI_C),
            p: LAMBDA_P.map(to_field_element),
        }
    }
}

impl Coefficients {
    /// phi(u) * Q by Horner evaluation
    pub fn eval_phi_q(&self, u: u32) -> U512 {
        let u = U512::from(u);
        let t1 = self.c * u / q();
        let t3 = (t1 + self.b) * u / q();
        (t3 + self.a) * u / q()
    }

    /// lambda(g) * Q by Horner evaluation over p3..p0
    pub fn eval_lambda_q(&self, g_q: u64) -> U512 {
        let g = U512::from(g_q);
        self.p[..3]
            .iter()
            .rev()
            .fold(self.p[3], |v, p| v * g / q() + *p)
    }

    /// S_reg = sum of phi over the sample
    pub fn s_reg(&self, u: &[u32]) -> U512 {
        u.iter().map(|&x| self.eval_phi_q(x)).fold(U512::ZERO, |acc, x| acc + x)
    }

    /// L_reg = lambda * S_reg / Q
    pub fn l_reg_claim(&self, u: &[u32], g_q: u64) -> U512 {
        self.eval_lambda_q(g_q) * self.s_reg(u) / q()
    }
}

/// u_i = floor(min(h_i^2, H2_MAX) / H2_MAX * Q) with h_i ~ |N(0, 1)|
pub fn sample_u<R: Rng + ?Sized>(rng: &mut R) -> Vec<u32> {
    (0..N)
        .map(|_| {
            let h: f64 = rng.sample::<f64, _>(StandardNormal).abs();
            let h2 = (h * h).min(H2_MAX);
            (h2 / H2_MAX * Q as f64) as u32
        })
        .collect()
}

/// g_q = floor(min(g / G_MAX, 1) * Q) with g ~ U[0, G_MAX)
pub fn sample_g_q<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    let grad_norm_sq = rng.gen::<f64>() * G_MAX;
    ((grad_norm_sq / G_MAX).min(1.0) * Q as f64) as u64
}

/// Circuit input, fields in signal order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StabilityPayload {
    #[serde(rename = "modelHash")]
    pub model_hash: String,
    #[serde(rename = "transcriptHash")]
    pub transcript_hash: String,
    pub g_q_input: u64,
    #[serde(rename = "L_reg_q_claim")]
    pub l_reg_q_claim: String,
    #[serde(rename = "A_q")]
    pub a_q: String,
    #[serde(rename = "B_q")]
    pub b_q: String,
    #[serde(rename = "C_q")]
    pub c_q: String,
    pub p0_q: String,
    pub p1_q: String,
    pub p2_q: String,
    pub p3_q: String,
    #[serde(rename = "Q_scalar")]
    pub q_scalar: u64,
    pub u: Vec<u32>,
}

impl StabilityPayload {
    pub fn compute(u: Vec<u32>, g_q: u64, transcript_hash: U256) -> Self {
        let coeffs = Coefficients::default();
        let l_reg = coeffs.l_reg_claim(&u, g_q);
        let [p0, p1, p2, p3] = coeffs.p.map(|p| p.to_string());

        Self {
            model_hash: MODEL_HASH.to_string(),
            transcript_hash: transcript_hash.to_string(),
            g_q_input: g_q,
            l_reg_q_claim: l_reg.to_string(),
            a_q: coeffs.a.to_string(),
            b_q: coeffs.b.to_string(),
            c_q: coeffs.c.to_string(),
            p0_q: p0,
            p1_q: p1,
            p2_q: p2,
            p3_q: p3,
            q_scalar: Q,
            u,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)?;
        info!("wrote {}", path.display());
        Ok(())
    }
}

/// Poseidon hash of `u` via `snarkjs calculate poseidon`
pub async fn snarkjs_poseidon(u: &[u32]) -> Result<U256> {
    let inputs: Vec<String> = u.iter().map(|x| x.to_string()).collect();
    let mut file = tempfile::Builder::new()
        .prefix("temp_poseidon")
        .suffix(".json")
        .tempfile()
        .map_err(|e| Error::TranscriptHash(format!("temp file: {e}")))?;
    serde_json::to_writer(&mut file, &serde_json::json!({ "inputs": inputs }))
        .map_err(|e| Error::TranscriptHash(format!("temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::TranscriptHash(format!("temp file: {e}")))?;

    debug!("snarkjs calculate poseidon {}", file.path().display());
    let mut cmd = tokio::process::Command::new("snarkjs");
    cmd.arg("calculate")
        .arg("poseidon")
        .arg(file.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(SNARKJS_TIMEOUT, cmd.output())
        .await
        .map_err(|_| Error::TranscriptHash("snarkjs timed out".into()))?
        .map_err(|e| Error::TranscriptHash(format!("failed to run snarkjs: {e}")))?;

    if !output.status.success() {
        return Err(Error::TranscriptHash(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_field_element(&stdout).ok_or_else(|| {
        Error::TranscriptHash(format!("unexpected snarkjs output: {}", stdout.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(s: &str) -> U512 {
        s.parse().unwrap()
    }

    #[test]
    fn test_fixed_point_coefficients() {
        let c = Coefficients::default();
        assert_eq!(c.a, U512::from(3710851743u64));
        assert_eq!(c.b, U512::from(1649267441u64));
        assert_eq!(c.c, U512::from(1099511628u64));
        assert_eq!(c.p[0], U512::from(4080218930u64));
        assert_eq!(c.p[2], U512::from(1288490188u64));
    }

    #[test]
    fn test_negative_coefficients_wrap() {
        let c = Coefficients::default();
        assert_eq!(
            c.p[1],
            big("28948022309329048855892746252171976963317496166410141009864396001976564423066")
        );
        assert_eq!(
            c.p[3],
            big("28948022309329048855892746252171976963317496166410141009864396001978067661619")
        );
    }

    #[test]
    fn test_phi_at_bounds() {
        let c = Coefficients::default();
        assert_eq!(c.eval_phi_q(0), U512::ZERO);
        // phi(1) = A + B + C
        assert_eq!(c.eval_phi_q(Q as u32), c.a + c.b + c.c);
        assert_eq!(c.eval_phi_q((Q / 2) as u32), U512::from(2405181683u64));
    }

    #[test]
    fn test_lambda_at_zero_is_p0() {
        let c = Coefficients::default();
        assert_eq!(c.eval_lambda_q(0), c.p[0]);
    }

    #[test]
    fn test_l_reg_claim() {
        let c = Coefficients::default();
        let u = [0, Q as u32, (Q / 2) as u32, 123456789];
        assert_eq!(c.s_reg(&u), U512::from(8972867977u64));
        assert_eq!(
            c.eval_lambda_q(Q / 4),
            big("7689318419912727976503153221664957427699507522472437502583475288394679137072")
        );
        assert_eq!(
            c.l_reg_claim(&u, Q / 4),
            big("16064205912653208223108751747131028881576897741444511356183707607162921636688")
        );
    }

    #[test]
    fn test_samples_are_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let u = sample_u(&mut rng);
        assert_eq!(u.len(), N);
        let g_q = sample_g_q(&mut rng);
        assert!(g_q <= Q);
    }

    #[test]
    fn test_payload_json_field_names() {
        let payload = StabilityPayload::compute(vec![1, 2, 3], 42, U256::from(99u64));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["modelHash"], "9876543210123456789");
        assert_eq!(json["transcriptHash"], "99");
        assert_eq!(json["g_q_input"], 42);
        assert_eq!(json["Q_scalar"], Q);
        assert_eq!(json["A_q"], "3710851743");
        assert!(json["L_reg_q_claim"].is_string());
        assert_eq!(json["u"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_payload_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuits").join("input.json");
        let payload = StabilityPayload::compute(vec![5; 4], 1, U256::ZERO);
        payload.write(&path).unwrap();

        let back: StabilityPayload =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, payload);
    }
}
