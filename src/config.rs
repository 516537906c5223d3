//! Runtime settings for the host boundary
//!
//! The codec itself is configuration-free; these knobs only affect how the
//! host dispatcher builds and accepts values.

use serde::{Deserialize, Serialize};

/// Maximum container nesting accepted by the inspector, decoder and rewriters
pub const MAX_NESTING_DEPTH: usize = 64;

/// Settings applied by [`crate::host::dispatch`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Attach a computed cached bbox to values built by constructors
    pub autocache_bbox: bool,
    /// Largest decoded buffer accepted in a single request
    pub max_request_bytes: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            autocache_bbox: true,
            max_request_bytes: 64 * 1024 * 1024,
        }
    }
}

impl CoreConfig {
    /// Load overrides from a JSON object; missing keys keep their defaults
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: CoreConfig = serde_json::from_str(text)
            .map_err(|e| anyhow::anyhow!("invalid core config: {}", e))?;
        anyhow::ensure!(config.max_request_bytes > 0, "max_request_bytes must be positive");
        Ok(config)
    }
}
