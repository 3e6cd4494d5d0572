use std::time::Duration;

use crate::error::HubError;

/// Default interval between liveness sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(20);

/// Configuration for the hub core.
///
/// ```rust
/// use std::time::Duration;
/// use parley_hub::HubConfig;
///
/// let config = HubConfig::new().sweep_interval(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Period of the liveness sweep; the first sweep runs one period after start.
    pub sweep_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Set the sweep period (default: 20 s).
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), HubError> {
        if self.sweep_interval.is_zero() {
            return Err(HubError::InvalidConfig(
                "sweep interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
