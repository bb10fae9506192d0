//! Configuration management for vault-sweep

use crate::error::{Result, SweepError};
use crate::hunt::Repetitions;
use crate::types::{ObjectId, TypeTag};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sweep.toml";

pub const DEFAULT_PACKAGE_ID: &str =
    "0xef97bc41cfa119c78905d8385e89b1ee5ce79b244f79834d44be213366dae105";
pub const DEFAULT_VAULT_ID: &str =
    "0x30055170c308f9cae917b3bcad0ad02002471fc020c3b725aac2acea254b739d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
        }
    }
}

impl FromStr for Network {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(SweepError::ConfigError(format!(
                "Unknown network alias '{}' (expected mainnet, testnet, devnet or localnet)",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alias())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub hunt: HuntConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub keystore: KeystoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_alias")]
    pub alias: String,
    /// Overrides the full node URL implied by `alias`.
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default = "default_explorer")]
    pub explorer: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HuntConfig {
    #[serde(default = "default_package_id")]
    pub package_id: String,
    #[serde(default = "default_vault_id")]
    pub vault_id: String,
    #[serde(default = "default_key_code")]
    pub key_code: u64,
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    #[serde(default = "default_coin_type")]
    pub coin_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    #[serde(default = "default_gas_budget")]
    pub budget: u64,
    /// Fixed gas price; the reference price is fetched when unset.
    #[serde(default)]
    pub price: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeystoreConfig {
    #[serde(default = "default_keystore_path")]
    pub path: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            alias: default_network_alias(),
            rpc_url: None,
            explorer: default_explorer(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            package_id: default_package_id(),
            vault_id: default_vault_id(),
            key_code: default_key_code(),
            repetitions: default_repetitions(),
            coin_type: default_coin_type(),
        }
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            budget: default_gas_budget(),
            price: None,
        }
    }
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            path: default_keystore_path(),
        }
    }
}

/// Parsed and range-checked hunt parameters.
#[derive(Debug, Clone)]
pub struct HuntSettings {
    pub package: ObjectId,
    pub vault: ObjectId,
    pub key_code: u64,
    pub coin_type: TypeTag,
    pub repetitions: Repetitions,
}

impl NetworkConfig {
    pub fn network(&self) -> Result<Network> {
        self.alias.parse()
    }

    pub fn rpc_url(&self) -> Result<String> {
        match &self.rpc_url {
            Some(url) if self.has_custom_endpoint() => Ok(url.trim().to_string()),
            _ => Ok(self.network()?.fullnode_url().to_string()),
        }
    }

    /// True when `rpc_url` replaces the alias endpoint.
    pub fn has_custom_endpoint(&self) -> bool {
        matches!(&self.rpc_url, Some(url) if !url.trim().is_empty())
    }

    /// Human-browsable lookup link for a transaction digest.
    ///
    /// `None` for localnet and for custom endpoints, which the public explorer
    /// cannot be assumed to index.
    pub fn explorer_tx_url(&self, digest: &str) -> Option<String> {
        let network = self.network().ok()?;
        if network == Network::Localnet || self.has_custom_endpoint() {
            return None;
        }
        Some(format!(
            "{}/{}/tx/{}",
            self.explorer.trim_end_matches('/'),
            network.alias(),
            digest
        ))
    }
}

impl HuntConfig {
    pub fn settings(&self) -> Result<HuntSettings> {
        Ok(HuntSettings {
            package: self.package_id.parse().map_err(|e: SweepError| {
                SweepError::ConfigError(format!("hunt.package_id: {}", e))
            })?,
            vault: self.vault_id.parse().map_err(|e: SweepError| {
                SweepError::ConfigError(format!("hunt.vault_id: {}", e))
            })?,
            key_code: self.key_code,
            coin_type: self.coin_type.parse().map_err(|e: SweepError| {
                SweepError::ConfigError(format!("hunt.coin_type: {}", e))
            })?,
            repetitions: Repetitions::new(self.repetitions).map_err(|e| {
                SweepError::ConfigError(format!("hunt.repetitions: {}", e))
            })?,
        })
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.network.network()?;
        self.hunt.settings()?;

        if self.gas.budget == 0 {
            return Err(SweepError::ConfigError(
                "gas.budget must be greater than zero".to_string(),
            ));
        }
        if self.gas.price == Some(0) {
            return Err(SweepError::ConfigError(
                "gas.price must be greater than zero when set".to_string(),
            ));
        }
        if self.keystore.path.trim().is_empty() {
            return Err(SweepError::ConfigError(
                "keystore.path must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn keystore_path(&self) -> PathBuf {
        PathBuf::from(&self.keystore.path)
    }
}

/// Loads configuration from `path`, or from `sweep.toml` when present.
///
/// An explicit path must exist. Without one, a missing default file yields the
/// built-in testnet defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_str = match path {
        Some(p) => read_config_source(p, true)?,
        None => read_config_source(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };

    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    config.validate()?;
    Ok(config)
}

/// Reads a config file. Only an optional file may be absent; any other read
/// failure is an error rather than a silent fall back to defaults.
fn read_config_source(path: &Path, required: bool) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if !required && e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(SweepError::ConfigError(format!(
            "Cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

fn default_network_alias() -> String {
    "testnet".to_string()
}

fn default_explorer() -> String {
    "https://suiscan.xyz".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_package_id() -> String {
    DEFAULT_PACKAGE_ID.to_string()
}

fn default_vault_id() -> String {
    DEFAULT_VAULT_ID.to_string()
}

fn default_key_code() -> u64 {
    1504
}

fn default_repetitions() -> u32 {
    crate::hunt::DEFAULT_REPETITIONS
}

fn default_coin_type() -> String {
    "0x2::sui::SUI".to_string()
}

fn default_gas_budget() -> u64 {
    50_000_000
}

fn default_keystore_path() -> String {
    "keypair.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_target_testnet() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.network.rpc_url().unwrap(),
            "https://fullnode.testnet.sui.io:443"
        );
        let settings = config.hunt.settings().unwrap();
        assert_eq!(settings.key_code, 1504);
        assert_eq!(settings.repetitions.get(), 2);
        assert_eq!(settings.package.to_string(), DEFAULT_PACKAGE_ID);
    }

    #[test]
    fn test_explorer_link() {
        let config = NetworkConfig::default();
        assert_eq!(
            config.explorer_tx_url("AbC").as_deref(),
            Some("https://suiscan.xyz/testnet/tx/AbC")
        );
    }

    #[test]
    fn test_no_explorer_link_off_public_networks() {
        let localnet = NetworkConfig {
            alias: "localnet".to_string(),
            ..NetworkConfig::default()
        };
        assert_eq!(localnet.explorer_tx_url("AbC"), None);

        let custom = NetworkConfig {
            rpc_url: Some("http://10.0.0.5:9000".to_string()),
            ..NetworkConfig::default()
        };
        assert_eq!(custom.rpc_url().unwrap(), "http://10.0.0.5:9000");
        assert_eq!(custom.explorer_tx_url("AbC"), None);
    }

    #[test]
    fn test_unreadable_optional_config_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();

        let err = read_config_source(file.path(), false).unwrap_err();
        assert!(matches!(err, SweepError::ConfigError(_)));
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_optional_config_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("sweep.toml");
        assert_eq!(read_config_source(&missing, false).unwrap(), "");
        assert!(read_config_source(&missing, true).is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[network]
alias = "devnet"

[hunt]
repetitions = 90
"#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.network.network().unwrap(), Network::Devnet);
        assert_eq!(config.hunt.repetitions, 90);
        assert_eq!(config.hunt.key_code, 1504);
        assert_eq!(config.gas.budget, 50_000_000);
    }

    #[test]
    fn test_rpc_url_override() {
        let file = write_config(
            r#"
[network]
alias = "localnet"
rpc_url = "http://10.0.0.5:9000"
"#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.network.rpc_url().unwrap(), "http://10.0.0.5:9000");
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let file = write_config("[hunt]\nrepetitions = 0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("hunt.repetitions"));
    }

    #[test]
    fn test_bad_vault_id_rejected() {
        let file = write_config("[hunt]\nvault_id = \"vault\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("hunt.vault_id"));
    }

    #[test]
    fn test_unknown_network_rejected() {
        assert!("moonnet".parse::<Network>().is_err());
        assert_eq!("TestNet".parse::<Network>().unwrap(), Network::Testnet);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(SweepError::ConfigError(_))));
    }
}
