//! Training hyperparameters.

use shared_utils::config::ForecastCfg;

/// Hyperparameters of the forecaster.
///
/// Defaults: two LSTM layers of 50 units, 10 epochs, mini-batches of 32,
/// Adam with learning rate 0.001. Without a seed every run draws fresh
/// initial weights and shuffles, so results differ slightly between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub hidden_units: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            hidden_units: 50,
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: None,
        }
    }
}

impl ForecastConfig {
    pub fn with_hidden_units(mut self, units: usize) -> Self {
        self.hidden_units = units;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl From<&ForecastCfg> for ForecastConfig {
    fn from(cfg: &ForecastCfg) -> Self {
        let defaults = Self::default();
        Self {
            hidden_units: cfg.hidden_units.unwrap_or(defaults.hidden_units),
            epochs: cfg.epochs.unwrap_or(defaults.epochs),
            batch_size: cfg.batch_size.unwrap_or(defaults.batch_size),
            learning_rate: cfg.learning_rate.unwrap_or(defaults.learning_rate),
            seed: cfg.seed,
        }
    }
}
