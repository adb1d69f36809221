//! secp256k1 keys and the recoverable signatures oracle nodes attach to reports.
//!
//! Oracle nodes are identified by their Ethereum-style address. A signature is accepted only in
//! its canonical low-`s` form so that a single attestation cannot be presented twice under two
//! different encodings.

use std::fmt;

use alloy::primitives::{Address, B256};
use anyhow::{Result, anyhow};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// The number of recovery ids that fit in the `rawVs` word of a compact signature bundle.
pub const MAX_SIGNATURES: usize = 32;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("s value is in the upper half of the curve order")]
    HighS,
    #[error("r or s is not a valid scalar")]
    Malformed,
    #[error("no public key can be recovered")]
    Unrecoverable,
    #[error("bundle has {rs} r values but {ss} s values")]
    BundleLengthMismatch { rs: usize, ss: usize },
    #[error("bundle holds {0} signatures but at most {MAX_SIGNATURES} are supported")]
    TooManySignatures(usize),
}

/// An ECDSA signature over a 32-byte digest, with the recovery id needed to recover the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSignature {
    pub r: B256,
    pub s: B256,
    /// Either `0`/`1` or the Ethereum-style `27`/`28`.
    pub v: u8,
}

impl OracleSignature {
    pub fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        let id = match self.v {
            0 | 1 => self.v,
            27 | 28 => self.v - 27,
            v => return Err(SignatureError::InvalidRecoveryId(v)),
        };
        RecoveryId::from_byte(id).ok_or(SignatureError::InvalidRecoveryId(self.v))
    }

    /// Recovers the address which produced this signature over `digest`.
    pub fn recover(&self, digest: &B256) -> Result<Address, SignatureError> {
        let recovery_id = self.recovery_id()?;
        let signature =
            Signature::from_scalars(self.r.0, self.s.0).map_err(|_| SignatureError::Malformed)?;
        if signature.normalize_s().is_some() {
            return Err(SignatureError::HighS);
        }
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|_| SignatureError::Unrecoverable)?;
        Ok(address_of(&key))
    }

    /// Splits signatures into the compact `(rs, ss, rawVs)` layout, where byte `i` of `rawVs` is
    /// the recovery id (`0` or `1`) of signature `i`.
    pub fn to_compact(
        signatures: &[OracleSignature],
    ) -> Result<(Vec<B256>, Vec<B256>, B256), SignatureError> {
        if signatures.len() > MAX_SIGNATURES {
            return Err(SignatureError::TooManySignatures(signatures.len()));
        }
        let mut raw_vs = B256::ZERO;
        for (i, signature) in signatures.iter().enumerate() {
            raw_vs.0[i] = signature.recovery_id()?.to_byte();
        }
        Ok((
            signatures.iter().map(|s| s.r).collect(),
            signatures.iter().map(|s| s.s).collect(),
            raw_vs,
        ))
    }

    pub fn from_compact(
        rs: &[B256],
        ss: &[B256],
        raw_vs: B256,
    ) -> Result<Vec<OracleSignature>, SignatureError> {
        if rs.len() != ss.len() {
            return Err(SignatureError::BundleLengthMismatch {
                rs: rs.len(),
                ss: ss.len(),
            });
        }
        if rs.len() > MAX_SIGNATURES {
            return Err(SignatureError::TooManySignatures(rs.len()));
        }
        Ok(rs
            .iter()
            .zip(ss)
            .zip(raw_vs.0)
            .map(|((r, s), v)| OracleSignature { r: *r, s: *s, v })
            .collect())
    }
}

/// The address of a public key: the last 20 bytes of the Keccak-256 hash of its uncompressed
/// encoding.
pub fn address_of(key: &VerifyingKey) -> Address {
    // Skip the encoding tag byte.
    let point = key.to_encoded_point(false);
    Address::from_slice(&Keccak256::digest(&point.as_bytes()[1..])[12..32])
}

/// The secret key of an account, used by oracle nodes to attest to reports and by
/// administrators to authenticate calls.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl SecretKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<SecretKey> {
        let key = SigningKey::from_slice(bytes).map_err(|e| anyhow!("invalid secret key: {e}"))?;
        Ok(SecretKey(key))
    }

    pub fn from_hex(s: &str) -> Result<SecretKey> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    pub fn address(&self) -> Address {
        address_of(self.0.verifying_key())
    }

    pub fn sign_digest(&self, digest: &B256) -> Result<OracleSignature> {
        let (signature, recovery_id) = self.0.sign_prehash_recoverable(digest.as_slice())?;
        let (r, s) = signature.split_bytes();
        Ok(OracleSignature {
            r: B256::from_slice(&r),
            s: B256::from_slice(&s),
            v: recovery_id.to_byte(),
        })
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&self.address()).finish()
    }
}
