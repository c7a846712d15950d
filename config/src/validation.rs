//! Config validation

use std::path::Path;

use crate::{AgentConfig, SamplerConfig};

/// Validate a parsed config
pub fn validate_config(config: &AgentConfig) -> Result<(), String> {
    validate_sampler_config(&config.sampler)?;

    // The graph path is joined with container IDs to locate their state, a
    // relative path would resolve against the agent's working directory
    if !Path::new(&config.docker_graph_path).is_absolute() {
        return Err("`docker-graph-path` must be an absolute path".to_string());
    }

    Ok(())
}

/// Validate the pacing and retention parameters of a sampler
pub fn validate_sampler_config(config: &SamplerConfig) -> Result<(), String> {
    if config.sample_interval.is_zero() {
        return Err("`sample-interval-ms` must be positive".to_string());
    }

    if config.buffer_capacity == 0 {
        return Err("`buffer-capacity` must be positive".to_string());
    }

    Ok(())
}
