//! Parsing logic for the config

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use util::telemetry::LevelFilter;

use crate::{
    AgentConfig, Cli, SamplerConfig, parsing::config_file::config_file_args,
    validation::validate_config,
};

mod config_file;
pub use config_file::parse_config_from_file;

/// Parses command line args into the agent config
///
/// We allow for configurations to come from both a config file and overrides
/// on the command line directly. To support this, we first read configuration
/// options from the config file, prepend them to the cli args string, and parse
/// so that cli args (which come after config file args) take precedence.
pub fn parse_command_line_args() -> Result<AgentConfig, String> {
    let command_line_args: Vec<String> = env::args().collect();
    parse_config_from_cli_args(command_line_args)
}

/// Parse the config from a full argument vector, including the program name
///
/// Separating out this functionality allows us to easily inject custom args
/// apart from what is specified on the command line
pub fn parse_config_from_cli_args(mut command_line_args: Vec<String>) -> Result<AgentConfig, String> {
    if command_line_args.is_empty() {
        return Err("missing program name in command line args".to_string());
    }

    // The config file args go *before* the command line args so that clap
    // gives precedence to the command line. The first argument is the
    // executable name, so place it before all args
    let config_file_args = config_file_args(&command_line_args)?;
    let mut full_args = vec![command_line_args.remove(0)];
    full_args.extend(config_file_args);
    full_args.extend(command_line_args);

    let cli = Cli::try_parse_from(full_args).map_err(|e| e.to_string())?;
    let config = parse_config_from_args(cli)?;
    validate_config(&config)?;

    Ok(config)
}

/// Parse the config from a parsed set of command line arguments
pub(crate) fn parse_config_from_args(cli_args: Cli) -> Result<AgentConfig, String> {
    let log_level = LevelFilter::from_str(&cli_args.log_level)
        .map_err(|e| format!("invalid `log-level` {}: {e}", cli_args.log_level))?;

    Ok(AgentConfig {
        sampler: SamplerConfig::new(
            Duration::from_millis(cli_args.sample_interval_ms),
            cli_args.buffer_capacity,
        ),
        docker_graph_path: PathBuf::from(cli_args.docker_graph_path),
        log_level,
        json_logs: cli_args.json_logs,
    })
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use util::telemetry::LevelFilter;

    use super::parse_config_from_cli_args;

    /// Build an args vector with a dummy program name
    fn args(args: &[&str]) -> Vec<String> {
        std::iter::once("stats-agent").chain(args.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn test_parse_overrides() {
        let config = parse_config_from_cli_args(args(&[
            "--sample-interval-ms",
            "250",
            "--buffer-capacity",
            "16",
            "--docker-graph-path",
            "/data/docker",
            "--log-level",
            "debug",
            "--json-logs",
        ]))
        .unwrap();

        assert_eq!(config.sampler.sample_interval, Duration::from_millis(250));
        assert_eq!(config.sampler.buffer_capacity, 16);
        assert_eq!(config.docker_graph_path.to_str(), Some("/data/docker"));
        assert_eq!(config.log_level, LevelFilter::DEBUG);
        assert!(config.json_logs);
    }

    #[test]
    fn test_invalid_log_level() {
        let res = parse_config_from_cli_args(args(&["--log-level", "loud"]));
        assert!(res.is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let res = parse_config_from_cli_args(args(&["--buffer-capacity", "0"]));
        assert!(res.is_err());
    }

    #[test]
    fn test_empty_args_rejected() {
        assert!(parse_config_from_cli_args(vec![]).is_err());
    }
}
