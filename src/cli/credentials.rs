//
//  enterprise-cli
//  cli/credentials.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Credential source inspection

use anyhow::Result;
use clap::Args;

use crate::api::common::{ApiError, Service};
use crate::auth::CredentialResolver;
use crate::output::OutputWriter;

use super::GlobalOptions;

/// Show where each service's credentials come from
#[derive(Args, Debug)]
pub struct CredentialsCommand {
    /// Only show this service
    #[arg(long, value_enum)]
    pub service: Option<Service>,
}

impl CredentialsCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let resolver = CredentialResolver::from_environment();
        let writer = OutputWriter::new(global.format);

        match resolver.file_path() {
            Some(path) => writer.write_info(&format!("Credential file: {}", path.display())),
            None => writer.write_warning("No home directory; only environment credentials are used"),
        }

        let services = match self.service {
            Some(service) => vec![service],
            None => Service::ALL.to_vec(),
        };
        for service in services {
            println!("{}", describe(&resolver, service)?);
        }
        Ok(())
    }
}

/// One line describing a service's credential, secrets masked.
///
/// # Errors
///
/// Returns the resolver's error when a source is complete but invalid
/// (e.g. a malformed base URL).
pub fn describe(resolver: &CredentialResolver, service: Service) -> Result<String, ApiError> {
    match resolver.resolve(service) {
        Ok(credential) => Ok(format!(
            "{}: {} ({}) from {}",
            service.display_name(),
            credential.base_url,
            credential.auth.masked(),
            credential.source
        )),
        Err(ApiError::CredentialMissing { missing, .. }) => Ok(format!(
            "{}: not configured (missing {})",
            service.display_name(),
            missing.join(", ")
        )),
        Err(e) => Err(e),
    }
}
