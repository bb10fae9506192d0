//! Cryptographic primitives for vault-sweep

use crate::error::SweepError;
use crate::types::{SuiAddress, ID_LENGTH};
use base64::{engine::general_purpose, Engine as _};
use bech32::{FromBase32, ToBase32, Variant};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{
    Signature, Signer, SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use rand::rngs::OsRng;

/// Human-readable prefix of bech32-encoded private keys.
pub const PRIVATE_KEY_HRP: &str = "suiprivkey";

/// Signature scheme flag byte for Ed25519.
pub const ED25519_FLAG: u8 = 0x00;

/// Length of a serialized signature: flag || signature || public key.
pub const SERIALIZED_SIGNATURE_LENGTH: usize = 1 + SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH;

/// Intent prefix for transaction data: scope, version, app id.
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

type Blake2b256 = Blake2b<U32>;

/// Blake2b with a 32-byte output, the hash used for addresses, intents and digests.
pub fn blake2b256(parts: &[&[u8]]) -> [u8; ID_LENGTH] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        KeyPair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, SweepError> {
        let secret: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            SweepError::KeyError(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// Decodes a `suiprivkey1...` string: bech32 over `flag || secret`.
    pub fn from_bech32(encoded: &str) -> Result<Self, SweepError> {
        let (hrp, data, variant) = bech32::decode(encoded.trim())
            .map_err(|e| SweepError::KeyError(format!("Invalid bech32 private key: {}", e)))?;

        if hrp != PRIVATE_KEY_HRP {
            return Err(SweepError::KeyError(format!(
                "Expected '{}' prefix, got '{}'",
                PRIVATE_KEY_HRP, hrp
            )));
        }
        if variant != Variant::Bech32 {
            return Err(SweepError::KeyError(
                "Private key must use the bech32 variant, not bech32m".to_string(),
            ));
        }

        let bytes = Vec::<u8>::from_base32(&data)
            .map_err(|e| SweepError::KeyError(format!("Invalid bech32 payload: {}", e)))?;
        Self::from_flagged_bytes(&bytes)
    }

    /// Decodes the legacy keystore form: base64 over `flag || secret`.
    pub fn from_base64(encoded: &str) -> Result<Self, SweepError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| SweepError::KeyError(format!("Invalid base64 private key: {}", e)))?;
        Self::from_flagged_bytes(&bytes)
    }

    fn from_flagged_bytes(bytes: &[u8]) -> Result<Self, SweepError> {
        match bytes.split_first() {
            Some((&ED25519_FLAG, secret)) => Self::from_secret_bytes(secret),
            Some((flag, _)) => Err(SweepError::KeyError(format!(
                "Unsupported signature scheme flag 0x{:02x}; only Ed25519 keys are supported",
                flag
            ))),
            None => Err(SweepError::KeyError("Private key is empty".to_string())),
        }
    }

    /// Encodes the secret as `suiprivkey1...`.
    pub fn to_bech32(&self) -> Result<String, SweepError> {
        let mut payload = Vec::with_capacity(1 + SECRET_KEY_LENGTH);
        payload.push(ED25519_FLAG);
        payload.extend_from_slice(&self.signing_key.to_bytes());
        bech32::encode(PRIVATE_KEY_HRP, payload.to_base32(), Variant::Bech32)
            .map_err(|e| SweepError::KeyError(format!("Failed to encode private key: {}", e)))
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sui address: blake2b-256 of `flag || public key`.
    pub fn address(&self) -> SuiAddress {
        SuiAddress::new(blake2b256(&[&[ED25519_FLAG], &self.public_key_bytes()]))
    }

    /// Signs `bcs(TransactionData)` under the transaction intent and returns the
    /// serialized signature `flag || signature || public key`.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> [u8; SERIALIZED_SIGNATURE_LENGTH] {
        let digest = blake2b256(&[&TRANSACTION_INTENT, tx_bytes]);
        let signature = self.signing_key.sign(&digest);

        let mut out = [0u8; SERIALIZED_SIGNATURE_LENGTH];
        out[0] = ED25519_FLAG;
        out[1..1 + SIGNATURE_LENGTH].copy_from_slice(&signature.to_bytes());
        out[1 + SIGNATURE_LENGTH..].copy_from_slice(&self.public_key_bytes());
        out
    }
}

/// Verifies a serialized transaction signature against the bytes it claims to sign.
pub fn verify_transaction_signature(tx_bytes: &[u8], serialized: &[u8]) -> Result<(), SweepError> {
    if serialized.len() != SERIALIZED_SIGNATURE_LENGTH {
        return Err(SweepError::CryptoError(format!(
            "Signature must be exactly {} bytes, got {}",
            SERIALIZED_SIGNATURE_LENGTH,
            serialized.len()
        )));
    }
    if serialized[0] != ED25519_FLAG {
        return Err(SweepError::CryptoError(format!(
            "Unsupported signature scheme flag 0x{:02x}",
            serialized[0]
        )));
    }

    let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
    sig_bytes.copy_from_slice(&serialized[1..1 + SIGNATURE_LENGTH]);
    let mut pk_bytes = [0u8; PUBLIC_KEY_LENGTH];
    pk_bytes.copy_from_slice(&serialized[1 + SIGNATURE_LENGTH..]);

    let public_key = VerifyingKey::from_bytes(&pk_bytes)
        .map_err(|e| SweepError::CryptoError(format!("Invalid public key: {}", e)))?;
    let signature = Signature::from_bytes(&sig_bytes);
    let digest = blake2b256(&[&TRANSACTION_INTENT, tx_bytes]);

    public_key
        .verify_strict(&digest, &signature)
        .map_err(|_| SweepError::CryptoError("Signature verification failed".to_string()))
}
