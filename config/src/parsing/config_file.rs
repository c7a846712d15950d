//! Parsing logic for a separate agent config file

use std::fs;

use clap::Parser;
use toml::{Value, map::Map};

use crate::{AgentConfig, Cli, parsing::parse_config_from_args, validation::validate_config};

/// The CLI argument name for the config file
const CONFIG_FILE_ARG: &str = "--config-file";
/// The program name placed before args read purely from a file
const DUMMY_PROGRAM_NAME: &str = "stats-agent";

/// Parse args from a config file, if one is given on the command line
pub(crate) fn config_file_args(cli_args: &[String]) -> Result<Vec<String>, String> {
    let Some(index) = cli_args.iter().position(|arg| arg == CONFIG_FILE_ARG) else {
        return Ok(vec![]);
    };

    // The next argument is the file to read from
    let path = cli_args
        .get(index + 1)
        .ok_or_else(|| format!("`{CONFIG_FILE_ARG}` requires a path"))?;
    read_config_file(path)
}

/// Parse a config entirely from a file
pub fn parse_config_from_file(path: &str) -> Result<AgentConfig, String> {
    let mut file_args = read_config_file(path)?;
    file_args.insert(0, DUMMY_PROGRAM_NAME.to_string());
    let cli = Cli::try_parse_from(file_args).map_err(|e| e.to_string())?;
    let config = parse_config_from_args(cli)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a config file
fn read_config_file(path: &str) -> Result<Vec<String>, String> {
    let file_contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let config_kv_pairs: Map<_, _> =
        toml::from_str(&file_contents).map_err(|err| err.to_string())?;

    let mut config_file_args: Vec<String> = Vec::with_capacity(config_kv_pairs.len());
    for (toml_key, value) in config_kv_pairs.iter() {
        // Format the TOML key into --key
        let cli_arg = format!("--{}", toml_key);
        let cli_values = parse_toml_value(cli_arg, value)?;
        config_file_args.extend(cli_values);
    }

    Ok(config_file_args)
}

// ----------------
// | TOML Parsing |
// ----------------

/// Parse a toml value into a list of strings to append to the CLI args
fn parse_toml_value(cli_arg: String, val: &Value) -> Result<Vec<String>, String> {
    let values: Vec<String> = match val {
        Value::Boolean(b) => toml_boolean_to_args(cli_arg, *b),
        x => toml_value_to_args(cli_arg, x)?,
    };

    Ok(values)
}

/// Parse a toml boolean into a string that is CLI compatible
///
/// This will be "--key" if the boolean is true, otherwise it will be empty
fn toml_boolean_to_args(cli_arg: String, b: bool) -> Vec<String> {
    if b { vec![cli_arg] } else { vec![] }
}

/// Parse a toml value into a string that is CLI compatible
fn toml_value_to_args(cli_arg: String, val: &Value) -> Result<Vec<String>, String> {
    let value_str = toml_value_to_string(val)?;
    Ok(vec![cli_arg, value_str])
}

/// Helper method to convert a toml value to a string
fn toml_value_to_string(val: &Value) -> Result<String, String> {
    Ok(match val {
        Value::String(val) => val.clone(),
        Value::Integer(val) => format!("{:?}", val),
        Value::Float(val) => format!("{:?}", val),
        _ => {
            return Err("unsupported value".to_string());
        },
    })
}

#[cfg(test)]
mod test {
    use std::{io::Write, time::Duration};

    use tempfile::NamedTempFile;

    use super::parse_config_from_file;
    use crate::parsing::parse_config_from_cli_args;

    /// Write the given TOML to a temporary file
    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_from_file() {
        let file = write_config(
            r#"
            sample-interval-ms = 1000
            buffer-capacity = 120
            docker-graph-path = "/srv/docker"
            json-logs = true
            "#,
        );

        let config = parse_config_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.sampler.sample_interval, Duration::from_secs(1));
        assert_eq!(config.sampler.buffer_capacity, 120);
        assert_eq!(config.docker_graph_path.to_str(), Some("/srv/docker"));
        assert!(config.json_logs);
    }

    /// Tests that command line args take precedence over the config file
    #[test]
    fn test_cli_overrides_file() {
        let file = write_config("buffer-capacity = 120\nsample-interval-ms = 1000\n");
        let path = file.path().to_str().unwrap().to_string();

        let args = ["stats-agent", "--config-file", &path, "--buffer-capacity", "8"]
            .into_iter()
            .map(String::from)
            .collect();
        let config = parse_config_from_cli_args(args).unwrap();

        assert_eq!(config.sampler.buffer_capacity, 8);
        assert_eq!(config.sampler.sample_interval, Duration::from_secs(1));
    }

    /// Tests that a flag set in both the config file and on the command line
    /// is accepted
    #[test]
    fn test_flag_in_file_and_cli() {
        let file = write_config("json-logs = true\nbuffer-capacity = 120\n");
        let path = file.path().to_str().unwrap().to_string();

        let args = ["stats-agent", "--config-file", &path, "--json-logs"]
            .into_iter()
            .map(String::from)
            .collect();
        let config = parse_config_from_cli_args(args).unwrap();

        assert!(config.json_logs);
        assert_eq!(config.sampler.buffer_capacity, 120);
    }

    #[test]
    fn test_unsupported_value() {
        let file = write_config("buffer-capacity = [1, 2]\n");
        assert!(parse_config_from_file(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_config_path() {
        let args = vec!["stats-agent".to_string(), "--config-file".to_string()];
        assert!(parse_config_from_cli_args(args).is_err());
    }
}
