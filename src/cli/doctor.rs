//
//  enterprise-cli
//  cli/doctor.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Connection diagnostics

use anyhow::{anyhow, Result};
use clap::Args;
use tracing::debug;

use crate::api::adapter::adapter_for;
use crate::api::common::{ApiError, Service};
use crate::auth::CredentialResolver;
use crate::config::Config;
use crate::output::OutputWriter;

use super::GlobalOptions;

/// Test the connection to every configured service
#[derive(Args, Debug)]
pub struct DoctorCommand {
    /// Only check this service
    #[arg(long, value_enum)]
    pub service: Option<Service>,
}

/// Result of checking one service.
#[derive(Debug)]
pub enum CheckStatus {
    /// The identity call succeeded; holds the account name
    Ok(String),
    /// The identity call failed
    Failed(ApiError),
    /// No complete credential source; holds the resolver's error
    NotConfigured(ApiError),
}

impl DoctorCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;
        let resolver = CredentialResolver::from_environment();
        let writer = OutputWriter::new(global.format);

        let services = match self.service {
            Some(service) => vec![service],
            None => Service::ALL.to_vec(),
        };

        let mut results = Vec::with_capacity(services.len());
        for service in services {
            let status = check_service(service, &config, &resolver).await;
            report(&writer, service, &status);
            results.push(status);
        }

        verdict(results)
    }
}

/// Runs the identity call for one service.
pub async fn check_service(service: Service, config: &Config, resolver: &CredentialResolver) -> CheckStatus {
    let credential = match resolver.resolve(service) {
        Ok(credential) => credential,
        Err(e @ ApiError::CredentialMissing { .. }) => return CheckStatus::NotConfigured(e),
        Err(e) => return CheckStatus::Failed(e),
    };

    let adapter = match adapter_for(&credential, config) {
        Ok(adapter) => adapter,
        Err(e) => return CheckStatus::Failed(e),
    };

    match adapter.check().await {
        Ok(identity) => {
            debug!(service = service.name(), "Connection check passed");
            let name = identity.text("name");
            CheckStatus::Ok(if name.is_empty() { identity.text("id") } else { name })
        }
        Err(e) => CheckStatus::Failed(e),
    }
}

fn report(writer: &OutputWriter, service: Service, status: &CheckStatus) {
    let label = service.display_name();
    match status {
        CheckStatus::Ok(account) if account.is_empty() => writer.write_success(&format!("{}: ok", label)),
        CheckStatus::Ok(account) => writer.write_success(&format!("{}: ok ({})", label, account)),
        CheckStatus::Failed(e) => writer.write_error(&format!("{}: failed: {}", label, e)),
        CheckStatus::NotConfigured(_) => writer.write_info(&format!("{}: not configured", label)),
    }
}

/// Folds per-service results into the command's outcome.
///
/// Succeeds when every configured service passed and at least one is
/// configured. Otherwise returns the first failure, or the first
/// credential error when nothing is configured.
fn verdict(results: Vec<CheckStatus>) -> Result<()> {
    let mut configured = 0;
    let mut unconfigured = None;
    for status in results {
        match status {
            CheckStatus::Ok(_) => configured += 1,
            CheckStatus::Failed(e) => return Err(anyhow!(e).context("connection check failed")),
            CheckStatus::NotConfigured(e) => {
                unconfigured.get_or_insert(e);
            }
        }
    }

    match unconfigured {
        Some(e) if configured == 0 => Err(anyhow!(e).context("no service is configured")),
        _ => Ok(()),
    }
}
