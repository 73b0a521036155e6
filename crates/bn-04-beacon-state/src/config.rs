//! # Beacon State Configuration
//!
//! Capacity constants bounding the vector and list fields of the state.
//! Supplied once at process start and never mutated by the container.
//!
//! ## Presets
//!
//! | Constant | mainnet | minimal |
//! |----------|---------|---------|
//! | `slots_per_historical_root` | 8192 | 64 |
//! | `epochs_per_historical_vector` | 65536 | 64 |
//! | `epochs_per_slashings_vector` | 8192 | 64 |
//! | `slots_per_eth1_voting_period` | 1024 | 16 |
//! | `slots_per_epoch` | 32 | 8 |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config value `{name}` must be non-zero")]
    ZeroCapacity { name: &'static str },

    #[error("config value `{name}` overflows: {reason}")]
    Overflow {
        name: &'static str,
        reason: String,
    },

    #[error("batch was built against a different configuration")]
    Mismatch,

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Length of the block roots and state roots vectors.
    pub slots_per_historical_root: usize,
    /// Length of the randao mixes vector.
    pub epochs_per_historical_vector: usize,
    /// Length of the slashings vector.
    pub epochs_per_slashings_vector: usize,
    /// Maximum length of the historical roots list.
    pub historical_roots_limit: usize,
    /// Maximum number of validators (and balances).
    pub validator_registry_limit: usize,
    /// Maximum number of eth1 data votes.
    pub slots_per_eth1_voting_period: usize,
    pub slots_per_epoch: usize,
    /// Maximum attestations per block.
    pub max_attestations: usize,
    /// Maximum length of an attestation's aggregation bits.
    pub max_validators_per_committee: usize,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl BeaconConfig {
    pub fn mainnet() -> Self {
        Self {
            slots_per_historical_root: 8192,
            epochs_per_historical_vector: 65_536,
            epochs_per_slashings_vector: 8192,
            historical_roots_limit: 16_777_216,
            validator_registry_limit: 1 << 40,
            slots_per_eth1_voting_period: 1024,
            slots_per_epoch: 32,
            max_attestations: 128,
            max_validators_per_committee: 2048,
        }
    }

    /// Small preset for tests and local devnets.
    pub fn minimal() -> Self {
        Self {
            slots_per_historical_root: 64,
            epochs_per_historical_vector: 64,
            epochs_per_slashings_vector: 64,
            slots_per_eth1_voting_period: 16,
            slots_per_epoch: 8,
            ..Self::mainnet()
        }
    }

    /// Parse a TOML document. Missing keys fall back to the mainnet preset.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Maximum length of the previous/current epoch attestation lists.
    pub fn max_pending_attestations(&self) -> usize {
        self.max_attestations.saturating_mul(self.slots_per_epoch)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("slots_per_historical_root", self.slots_per_historical_root),
            ("epochs_per_historical_vector", self.epochs_per_historical_vector),
            ("epochs_per_slashings_vector", self.epochs_per_slashings_vector),
            ("historical_roots_limit", self.historical_roots_limit),
            ("validator_registry_limit", self.validator_registry_limit),
            ("slots_per_eth1_voting_period", self.slots_per_eth1_voting_period),
            ("slots_per_epoch", self.slots_per_epoch),
            ("max_attestations", self.max_attestations),
            ("max_validators_per_committee", self.max_validators_per_committee),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity { name });
            }
        }

        if self
            .max_attestations
            .checked_mul(self.slots_per_epoch)
            .is_none()
        {
            return Err(ConfigError::Overflow {
                name: "max_attestations",
                reason: format!(
                    "{} * {} slots per epoch does not fit in usize",
                    self.max_attestations, self.slots_per_epoch
                ),
            });
        }
        Ok(())
    }
}
