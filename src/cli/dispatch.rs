//
//  enterprise-cli
//  cli/dispatch.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Command dispatch
//!
//! Every service command ends here: the operation is validated, the
//! credential resolved, the adapter invoked and the records rendered.
//! Validation and credential failures happen before any request is sent.

use anyhow::Result;
use tracing::debug;

use crate::api::adapter::adapter_for;
use crate::api::common::{ApiError, Record};
use crate::api::operation::{EntityKind, Operation};
use crate::auth::CredentialResolver;
use crate::config::Config;
use crate::output::OutputWriter;

use super::GlobalOptions;

/// Runs an operation with the process environment and prints the result.
///
/// # Errors
///
/// An [`ApiError`] for any classified failure, or an I/O error when
/// stdout cannot be written.
pub async fn run(op: Operation, global: &GlobalOptions) -> Result<()> {
    let config = Config::load()?;
    let resolver = CredentialResolver::from_environment();

    let (kind, records) = fetch(&op, &config, &resolver).await?;
    OutputWriter::new(global.format).write_records(&records, kind)
}

/// Validates, performs and drains an operation.
///
/// # Parameters
///
/// * `op` - The operation to perform
/// * `config` - HTTP and pagination settings
/// * `resolver` - Where the service's credential comes from
///
/// # Errors
///
/// - [`ApiError::Validation`] for malformed input, before any request
/// - [`ApiError::CredentialMissing`] when the service is not configured
/// - any adapter or pagination failure
pub async fn fetch(
    op: &Operation,
    config: &Config,
    resolver: &CredentialResolver,
) -> Result<(EntityKind, Vec<Record>), ApiError> {
    op.validate()?;
    let credential = resolver.resolve(op.service)?;
    debug!(
        service = op.service.name(),
        source = %credential.source,
        "Dispatching {}",
        op.describe()
    );

    let adapter = adapter_for(&credential, config)?;
    let outcome = adapter.perform(op).await?;
    let kind = outcome.kind();
    let records = outcome.into_records().await?;

    debug!(count = records.len(), "Operation complete");
    Ok((kind, records))
}
