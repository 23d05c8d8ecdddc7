//! CRM contact API: contact creation for inbound call events and the contact
//! listing behind the dashboard.
//!
//! `CrmGateway` is decided once from configuration. Without both an API key
//! and a location id it is `Unconfigured`, and every operation degrades to a
//! no-op without touching the network.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::CrmConfig;
use crate::error::RelayError;
use crate::models::contact::ContactRecord;
use crate::normalize::{display_value, is_present, normalize_call_event};

/// HTTP client for the CRM's contacts endpoints.
#[derive(Debug, Clone)]
pub struct CrmClient {
    client: Client,
    api_key: String,
    location_id: String,
    base_url: String,
    api_version: String,
    page_limit: u32,
}

impl CrmClient {
    pub fn new(config: &CrmConfig, api_key: &str, location_id: &str) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            location_id: location_id.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            page_limit: config.contact_page_limit,
        })
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    /// Create a contact and return the CRM's id for it, if the reply carries one.
    ///
    /// The reply status is not inspected: any JSON body is accepted and
    /// `contact.id` is read from it. A body that is not JSON is an error.
    pub async fn create_contact(&self, contact: &ContactRecord) -> Result<Option<String>, RelayError> {
        let url = format!("{}/contacts/", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .json(contact)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "CRM contact creation returned non-success status");
        }

        let body: Value = response.json().await?;
        let contact_id = body
            .get("contact")
            .and_then(|c| c.get("id"))
            .filter(|id| is_present(id))
            .map(display_value);

        tracing::info!(
            contact_id = contact_id.as_deref().unwrap_or("unknown"),
            "CRM contact created"
        );

        Ok(contact_id)
    }

    /// Fetch the first page of contacts for the configured location.
    ///
    /// Returns the upstream `contacts` value untouched, or `[]` if absent.
    pub async fn list_contacts(&self) -> Result<Value, RelayError> {
        let url = format!("{}/contacts/", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .query(&[
                ("locationId", self.location_id.clone()),
                ("limit", self.page_limit.to_string()),
            ])
            .send()
            .await?;

        let body: Value = response.json().await?;
        Ok(body
            .get("contacts")
            .filter(|c| is_present(c))
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }
}

/// What happened to an inbound call event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEventOutcome {
    /// CRM not configured; the payload was only logged.
    Logged,
    /// A contact-creation request was sent.
    Forwarded { contact_id: Option<String> },
}

/// The CRM integration, configured or degraded.
#[derive(Debug, Clone)]
pub enum CrmGateway {
    Configured(CrmClient),
    Unconfigured,
}

impl CrmGateway {
    pub fn from_config(config: &CrmConfig) -> Result<Self, RelayError> {
        match config.credentials() {
            Some((api_key, location_id)) => {
                Ok(Self::Configured(CrmClient::new(config, api_key, location_id)?))
            }
            None => {
                tracing::warn!("CRM credentials missing; call events will be logged only");
                Ok(Self::Unconfigured)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Normalize a call event and forward it as a new CRM contact.
    ///
    /// Unconfigured: the raw payload is logged and nothing is normalized or sent.
    pub async fn forward_call_event(&self, payload: &Value) -> Result<CallEventOutcome, RelayError> {
        let client = match self {
            Self::Configured(client) => client,
            Self::Unconfigured => {
                let pretty = serde_json::to_string_pretty(payload)?;
                tracing::info!("CRM not configured - logging call data only");
                tracing::info!(payload = %pretty, "Call event payload");
                return Ok(CallEventOutcome::Logged);
            }
        };

        let contact = normalize_call_event(payload, client.location_id());
        let contact_id = client.create_contact(&contact).await?;
        Ok(CallEventOutcome::Forwarded { contact_id })
    }

    /// Contacts for the dashboard, or `None` when the CRM is not configured.
    pub async fn list_contacts(&self) -> Result<Option<Value>, RelayError> {
        match self {
            Self::Configured(client) => client.list_contacts().await.map(Some),
            Self::Unconfigured => Ok(None),
        }
    }
}
