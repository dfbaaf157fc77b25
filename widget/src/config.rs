//! Policy and endpoint configuration for the intake widget.
//!
//! The limits are policy, not protocol: the server enforces its own copies,
//! so loosening them here only moves the failure from a local status line to
//! a server reject.

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_MAX_PHOTOS: usize = 10;
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 25 * 1024 * 1024;
pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_millis(350);

/// Tunable widget policy: selection limits and the settle window that
/// coalesces rapid edits before analysis fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub max_photos: usize,
    pub max_total_bytes: u64,
    pub settle_window: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_photos: DEFAULT_MAX_PHOTOS,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            settle_window: DEFAULT_SETTLE_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base URL `{0}` cannot carry endpoint path segments")]
    BaseUrlNotABase(Url),
}

/// Address of the analysis endpoint for one pickup/pallet context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base_url: Url,
    pickup_number: u64,
    cod_assets: u64,
}

impl EndpointConfig {
    pub fn new(base_url: Url, pickup_number: u64, cod_assets: u64) -> Result<Self, ConfigError> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::BaseUrlNotABase(base_url));
        }
        Ok(Self {
            base_url,
            pickup_number,
            cod_assets,
        })
    }

    pub fn pickup_number(&self) -> u64 {
        self.pickup_number
    }

    pub fn cod_assets(&self) -> u64 {
        self.cod_assets
    }

    /// Full URL of the analysis endpoint for this context.
    pub fn analyze_url(&self) -> Url {
        let mut url = self.base_url.clone();
        let pickup = self.pickup_number.to_string();
        let pallet = self.cod_assets.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "pickups",
                pickup.as_str(),
                "pallets",
                pallet.as_str(),
                "products",
                "analyze",
            ]);
        }
        url
    }
}
