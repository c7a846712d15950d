//! Defines helpers for logging

use std::{error::Error, fmt::Display};
pub use tracing_subscriber::{filter::LevelFilter, fmt::format::Format};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::err_str;

/// The service name attached to every log line emitted by the stats agent
pub const STATS_AGENT_SERVICE_NAME: &str = "container_stats_agent";

/// Possible errors that occur when setting up telemetry for the agent
#[derive(Debug)]
pub enum TelemetrySetupError {
    /// A global subscriber was already installed
    AlreadyInitialized(String),
}

impl Error for TelemetrySetupError {}
impl Display for TelemetrySetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Initialize a logger at the given log level
pub fn setup_system_logger(level: LevelFilter) {
    tracing_subscriber::fmt().event_format(Format::default().pretty()).with_max_level(level).init();
}

/// A builder for configuring telemetry for the agent
pub struct TelemetryBuilder {
    /// The subscriber layers to add to the telemetry stack
    layers: Vec<Box<dyn Layer<Registry> + Send + Sync + 'static>>,
    /// The level used when `RUST_LOG` does not specify one
    default_level: LevelFilter,
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self { layers: Vec::new(), default_level: LevelFilter::INFO }
    }
}

impl TelemetryBuilder {
    /// Add a subscriber layer to the telemetry builder
    fn with_layer<L: Layer<Registry> + Send + Sync + 'static>(mut self, layer: L) -> Self {
        self.layers.push(layer.boxed());
        self
    }

    /// Configure logging for the agent
    ///
    /// JSON output is intended for log shippers, the pretty format for local
    /// development
    pub fn with_logging(self, json_logs: bool) -> Self {
        if json_logs {
            self.with_layer(fmt::layer().json().with_current_span(true))
        } else {
            self.with_layer(fmt::layer().pretty())
        }
    }

    /// Set the level used when no `RUST_LOG` directive is present
    pub fn with_default_level(mut self, level: LevelFilter) -> Self {
        self.default_level = level;
        self
    }

    /// Initialize the global subscriber with the configured telemetry layers
    pub fn build(self) -> Result<(), TelemetrySetupError> {
        let layers = self.layers.with_filter(
            EnvFilter::builder().with_default_directive(self.default_level.into()).from_env_lossy(),
        );

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .map_err(err_str!(TelemetrySetupError::AlreadyInitialized))
    }
}

/// Configures logging for the agent
pub fn configure_telemetry(json_logs: bool, level: LevelFilter) -> Result<(), TelemetrySetupError> {
    TelemetryBuilder::default().with_logging(json_logs).with_default_level(level).build()?;
    tracing::info!(service = STATS_AGENT_SERVICE_NAME, "telemetry configured");

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{LevelFilter, TelemetryBuilder, configure_telemetry};

    /// Tests that only the first global subscriber installation succeeds
    #[test]
    fn test_double_init_is_an_error() {
        // Another test in this binary may have raced us to the global
        // subscriber, so only the second install is asserted on
        let _ = configure_telemetry(false /* json_logs */, LevelFilter::DEBUG);

        let res = TelemetryBuilder::default().with_logging(true /* json_logs */).build();
        assert!(res.is_err());
    }
}
