use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use relief_types::Location;

/// Runtime configuration for a ReliefProof installation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding one file per persisted chain.
    pub data_dir: PathBuf,
    /// Leading part of generated relief ids (`<prefix>-<YYYYMMDD>-<NNN>`).
    pub relief_id_prefix: String,
    /// Enforce the Verhoeff checksum on identity credentials.
    pub require_checksum: bool,
    /// Byte limit of the in-memory store.
    pub storage_quota_bytes: Option<u64>,
    /// PIN code directory served by the static location lookup.
    pub locations: Vec<Location>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".reliefproof"),
            relief_id_prefix: "RP-WB".into(),
            require_checksum: false,
            storage_quota_bytes: None,
            locations: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relief_id_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("relief_id_prefix must not be empty".into()));
        }
        for location in &self.locations {
            Location::new(
                location.district.as_str(),
                location.state.as_str(),
                location.post_office.as_str(),
                location.block_code.as_str(),
                location.pin_code.as_str(),
            )
            .map_err(|e| ConfigError::Invalid(format!("location {}: {e}", location.pin_code)))?;
        }
        Ok(())
    }
}

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.data_dir, PathBuf::from(".reliefproof"));
        assert_eq!(c.relief_id_prefix, "RP-WB");
        assert!(!c.require_checksum);
        assert!(c.storage_quota_bytes.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = LedgerConfig::from_toml_str("require_checksum = true\n").unwrap();
        assert!(c.require_checksum);
        assert_eq!(c.relief_id_prefix, "RP-WB");
    }

    #[test]
    fn full_toml() {
        let c = LedgerConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/relief"
            relief_id_prefix = "RP-OD"
            storage_quota_bytes = 5242880
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/relief"));
        assert_eq!(c.relief_id_prefix, "RP-OD");
        assert_eq!(c.storage_quota_bytes, Some(5_242_880));
    }

    #[test]
    fn location_directory() {
        let c = LedgerConfig::from_toml_str(
            r#"
            [[locations]]
            district = "Nadia"
            state = "West Bengal"
            post_office = "Krishnanagar"
            block_code = "N/A"
            pin_code = "741101"
            "#,
        )
        .unwrap();
        assert_eq!(c.locations.len(), 1);
        assert_eq!(c.locations[0].district, "Nadia");
    }

    #[test]
    fn malformed_location_rejected() {
        let err = LedgerConfig::from_toml_str(
            r#"
            [[locations]]
            district = "Nadia"
            state = ""
            post_office = ""
            block_code = ""
            pin_code = "74"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_prefix_rejected() {
        let err = LedgerConfig::from_toml_str("relief_id_prefix = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn syntax_error_reported() {
        assert!(matches!(
            LedgerConfig::from_toml_str("data_dir = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.toml");
        std::fs::write(&path, "relief_id_prefix = \"RP-AS\"").unwrap();
        assert_eq!(LedgerConfig::load(&path).unwrap().relief_id_prefix, "RP-AS");
        assert!(matches!(
            LedgerConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
