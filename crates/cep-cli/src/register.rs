//! Gateway registration: POST the capability document once

use anyhow::{Context, Result};
use cep_core::CapabilityDocument;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::info;

/// Path appended to the gateway base URL
pub const REGISTER_PATH: &str = "/devices/register";

/// Registration endpoint for a gateway base URL
pub fn register_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), REGISTER_PATH)
}

/// Send the document; 200 and 201 count as accepted. No retry.
pub async fn register(base_url: &str, document: &CapabilityDocument) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    let url = register_url(base_url);
    info!(url = %url, device = %document.device.id, "Registering device");

    let response = client
        .post(&url)
        .json(document)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    if is_accepted(status) {
        info!(status = %status, "Device registered");
        Ok(())
    } else {
        anyhow::bail!("Registration rejected by {}: {}", url, status)
    }
}

fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}
