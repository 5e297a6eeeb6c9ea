//! TOML parser with helpful error messages

use super::schema::ConfigFile;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse hoist.toml with detailed error messages
pub fn parse_hoist_toml(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_hoist_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse hoist.toml content from string
pub fn parse_hoist_toml_str(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Attach the offending lines to a TOML error when a position is known
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.message().to_string();

    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())]
                .matches('\n')
                .count()
                + 1;
            let context = get_line_context(content, line_num);
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                context,
                error_msg
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", error_msg),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Network;
    use crate::signer::SignerKind;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
network = "testnet"
compiler = "cargo run --bin sui"
gas_budget = 100000000

[signer]
kind = "hardware"
derivation_path = "44'/784'/1'/0'/0'"
device = "127.0.0.1:40000"
timeout_secs = 90
"#;

        let config = parse_hoist_toml_str(toml).unwrap();
        assert_eq!(config.network, Some(Network::Testnet));
        assert_eq!(config.gas_budget, Some(100_000_000));
        assert_eq!(config.signer.kind, Some(SignerKind::Hardware));
        assert_eq!(config.signer.timeout_secs, Some(90));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_hoist_toml_str("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_invalid_toml_points_at_line() {
        let toml = "network = \"devnet\"\n[signer\nkind = \"software\"\n";

        let err = parse_hoist_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("line 2"), "got: {err}");
        assert!(err.contains(">>>"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse_hoist_toml_str("netwrok = \"devnet\"").is_err());
        assert!(parse_hoist_toml_str("network = \"localnet\"").is_err());
    }

    #[test]
    fn test_validation_runs_after_parse() {
        assert!(parse_hoist_toml_str("gas_budget = 0").is_err());
    }
}
