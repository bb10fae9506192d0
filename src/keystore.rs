//! Local key record (`keypair.json`) handling

use crate::crypto::KeyPair;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// The key record stored next to the tool.
///
/// Only `privateKey` is required; records written by `keygen` also carry the
/// derived address and a creation timestamp for reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    pub private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl KeyRecord {
    /// Creates a record for a freshly generated key pair.
    pub fn generate() -> Result<(Self, KeyPair)> {
        let keypair = KeyPair::generate();
        let record = KeyRecord {
            private_key: keypair.to_bech32()?,
            address: Some(keypair.address().to_string()),
            created: Some(chrono::Utc::now().to_rfc3339()),
        };
        Ok((record, keypair))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SweepError::KeyError(format!("Cannot read key record {}: {}", path.display(), e))
        })?;
        let record: KeyRecord = serde_json::from_str(&content).map_err(|e| {
            SweepError::KeyError(format!("Malformed key record {}: {}", path.display(), e))
        })?;
        debug!("Loaded key record from {}", path.display());
        Ok(record)
    }

    /// Writes the record, refusing to overwrite an existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Err(SweepError::KeyError(format!(
                "{} already exists; refusing to overwrite a key record",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Decodes the private key and checks it against the stored address, if any.
    pub fn keypair(&self) -> Result<KeyPair> {
        let keypair = if self.private_key.starts_with(crate::crypto::PRIVATE_KEY_HRP) {
            KeyPair::from_bech32(&self.private_key)?
        } else {
            KeyPair::from_base64(&self.private_key)?
        };

        if let Some(stored) = &self.address {
            let derived = keypair.address();
            if stored.parse::<crate::types::SuiAddress>()? != derived {
                return Err(SweepError::KeyError(format!(
                    "Stored address {} does not match derived address {}",
                    stored, derived
                )));
            }
        }
        Ok(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys").join("keypair.json");

        let (record, keypair) = KeyRecord::generate().unwrap();
        record.save(&path).unwrap();

        let loaded = KeyRecord::load(&path).unwrap();
        assert_eq!(loaded.private_key, record.private_key);
        assert_eq!(loaded.keypair().unwrap().address(), keypair.address());
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keypair.json");
        let (record, _) = KeyRecord::generate().unwrap();
        record.save(&path).unwrap();
        assert!(record.save(&path).is_err());
    }

    #[test]
    fn test_minimal_record_parses() {
        let keypair = KeyPair::from_secret_bytes(&[4u8; 32]).unwrap();
        let json = format!(r#"{{"privateKey": "{}"}}"#, keypair.to_bech32().unwrap());
        let record: KeyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.keypair().unwrap().address(), keypair.address());
    }

    #[test]
    fn test_address_mismatch_detected() {
        let (mut record, _) = KeyRecord::generate().unwrap();
        record.address = Some(crate::types::ObjectId::ZERO.to_string());
        let err = record.keypair().unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_missing_file_is_key_error() {
        let dir = TempDir::new().unwrap();
        let err = KeyRecord::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SweepError::KeyError(_)));
    }
}
