//! The stats agent CLI and config definitions

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Serialize};
use util::telemetry::LevelFilter;

// -------------
// | Constants |
// -------------

/// The default interval between stats samples, in milliseconds
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 500;
/// The default number of samples retained per container
///
/// Two samples per second, for two minutes
pub const DEFAULT_BUFFER_CAPACITY: usize = 240;
/// The default docker graph directory
pub const DEFAULT_DOCKER_GRAPH_PATH: &str = "/var/lib/docker";

// -------
// | CLI |
// -------

/// Defines the stats agent command line interface
#[derive(Debug, Parser, Serialize, Deserialize)]
#[clap(author, about, long_about = None, args_override_self = true)]
#[rustfmt::skip]
pub struct Cli {
    // ---------------
    // | Config File |
    // ---------------
    /// A config file to read from
    #[clap(long, value_parser)]
    pub config_file: Option<String>,

    // -------------------
    // | Sampler Configs |
    // -------------------

    /// The interval between stats samples for a single container, in milliseconds
    #[clap(long, value_parser, default_value_t = DEFAULT_SAMPLE_INTERVAL_MS, env = "STATS_SAMPLE_INTERVAL_MS")]
    pub sample_interval_ms: u64,
    /// The number of samples retained in memory per container
    /// 
    /// Once full, each new sample evicts the oldest
    #[clap(long, value_parser, default_value_t = DEFAULT_BUFFER_CAPACITY, env = "STATS_BUFFER_CAPACITY")]
    pub buffer_capacity: usize,

    // -----------------------
    // | Environment Configs |
    // -----------------------

    /// The docker graph directory, beneath which container state is resolved
    #[clap(long, value_parser, default_value = DEFAULT_DOCKER_GRAPH_PATH, env = "DOCKER_GRAPH_PATH")]
    pub docker_graph_path: String,

    // -------------
    // | Telemetry |
    // -------------

    /// The default log level, used when `RUST_LOG` is unset
    #[clap(long, value_parser, default_value = "info", env = "STATS_LOG_LEVEL")]
    pub log_level: String,
    /// Whether to emit logs as JSON
    #[clap(long, value_parser, default_value = "false")]
    pub json_logs: bool,
}

// ----------
// | Config |
// ----------

/// The pacing and retention parameters of a stats sampler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerConfig {
    /// The interval between samples
    pub sample_interval: Duration,
    /// The number of samples retained per container
    pub buffer_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl SamplerConfig {
    /// Constructor
    pub fn new(sample_interval: Duration, buffer_capacity: usize) -> Self {
        Self { sample_interval, buffer_capacity }
    }
}

/// The stats agent's config, parsed from the CLI and config file
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// The sampler configuration applied to every tracked container
    pub sampler: SamplerConfig,
    /// The docker graph directory
    pub docker_graph_path: PathBuf,
    /// The default log level
    pub log_level: LevelFilter,
    /// Whether to emit logs as JSON
    pub json_logs: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            docker_graph_path: PathBuf::from(DEFAULT_DOCKER_GRAPH_PATH),
            log_level: LevelFilter::INFO,
            json_logs: false,
        }
    }
}
