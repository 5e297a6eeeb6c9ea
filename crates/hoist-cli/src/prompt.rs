//! Interactive confirmation for deployments.
//!
//! Shows what is about to be submitted and asks before touching a
//! production network. Also asks whether to retry after a device failure.
//! Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use hoist_core::ledger::Network;
use hoist_core::signer::SignerKind;
use hoist_core::transaction::UpgradePolicy;
use hoist_core::{Error, RetrySafety};

/// What the user is asked to approve.
#[derive(Debug, Clone)]
pub struct DeploymentSummary {
    pub action: &'static str,
    pub network: Network,
    pub signer: SignerKind,
    pub path: Option<PathBuf>,
    pub package: Option<String>,
    pub policy: Option<UpgradePolicy>,
}

pub struct ConfirmFlow<W: Write = io::Stdout> {
    /// Skip all confirmations
    yes: bool,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl ConfirmFlow<io::Stdout> {
    pub fn new(yes: bool) -> Self {
        Self {
            yes,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> ConfirmFlow<W> {
    #[cfg(test)]
    pub fn with_writer(yes: bool, writer: W) -> Self {
        Self {
            yes,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Print the summary; on a production network ask before proceeding.
    pub fn confirm_deployment(&mut self, summary: &DeploymentSummary) -> Result<bool> {
        if !summary.network.is_production() {
            return Ok(true);
        }

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style(format!("  {}", summary.action)).bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(
            self.writer,
            "  Network:  {}",
            style(summary.network).red().bold()
        )?;
        writeln!(self.writer, "  Signer:   {}", style(summary.signer).green())?;
        if let Some(package) = &summary.package {
            writeln!(self.writer, "  Package:  {}", style(package).green())?;
        }
        if let Some(policy) = summary.policy {
            writeln!(self.writer, "  Policy:   {}", style(policy).green())?;
        }
        if let Some(path) = &summary.path {
            writeln!(self.writer, "  Source:   {}", style(path.display()).green())?;
        }
        writeln!(self.writer)?;

        if self.yes {
            return Ok(true);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Submit to {}?", summary.network))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }

    /// Offer another attempt after a device failure that left the ledger untouched.
    pub fn confirm_retry(&mut self, err: &Error) -> Result<bool> {
        if !err.is_device_failure() || err.retry_safety() != RetrySafety::Safe {
            return Ok(false);
        }
        writeln!(self.writer, "  {} {}", style("⚠").yellow(), err)?;
        if self.yes {
            return Ok(false);
        }

        let retry = Confirm::with_theme(&self.theme)
            .with_prompt("Check the device and retry?")
            .default(true)
            .interact()?;
        Ok(retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn summary(network: Network) -> DeploymentSummary {
        DeploymentSummary {
            action: "Upgrade",
            network,
            signer: SignerKind::Hardware,
            path: Some(PathBuf::from("./move/arca")),
            package: Some("0xabc".to_string()),
            policy: Some(UpgradePolicy::Additive),
        }
    }

    #[test]
    fn test_networks_proceed_without_summary() {
        let mut output: Vec<u8> = Vec::new();
        let mut flow = ConfirmFlow::with_writer(false, &mut output);
        assert!(flow.confirm_deployment(&summary(Network::Testnet)).unwrap());
        drop(flow);
        assert!(output.is_empty());
    }

    #[test]
    fn mainnet_summary_is_printed_before_confirming() {
        let mut output: Vec<u8> = Vec::new();
        let mut flow = ConfirmFlow::with_writer(true, &mut output);
        assert!(flow.confirm_deployment(&summary(Network::Mainnet)).unwrap());
        drop(flow);

        let text = console::strip_ansi_codes(&String::from_utf8(output).unwrap()).to_string();
        assert!(text.contains("Network:  mainnet"));
        assert!(text.contains("Package:  0xabc"));
        assert!(text.contains("Policy:   additive"));
    }

    #[test]
    fn non_device_failures_are_not_retried() {
        let mut output: Vec<u8> = Vec::new();
        let mut flow = ConfirmFlow::with_writer(false, &mut output);
        let err = Error::TransactionFailed {
            status: "failure".to_string(),
            detail: "InsufficientGas".to_string(),
        };
        assert!(!flow.confirm_retry(&err).unwrap());
        drop(flow);
        assert!(output.is_empty());
    }

    #[test]
    fn device_failures_are_not_retried_unattended() {
        let mut output: Vec<u8> = Vec::new();
        let mut flow = ConfirmFlow::with_writer(true, &mut output);
        assert!(
            !flow
                .confirm_retry(&Error::Timeout(Duration::from_secs(60)))
                .unwrap()
        );
        drop(flow);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("timed out"));
    }
}
