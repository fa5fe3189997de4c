use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use crate::domain::{
    error::SyncError,
    models::{Address, CustomerId, CustomerProfile},
    ports::CustomerFetcher,
};

const SERVICE: &str = "Shopify";

#[derive(Debug, Deserialize)]
struct CustomerEnvelope {
    customer: ShopifyCustomer,
}

#[derive(Debug, Deserialize)]
struct ShopifyCustomer {
    id: Option<serde_json::Value>,
    company: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    default_address: Option<ShopifyAddress>,
}

#[derive(Debug, Deserialize)]
struct ShopifyAddress {
    address1: Option<String>,
    city: Option<String>,
    province: Option<String>,
    zip: Option<String>,
    country: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ShopifyCustomer {
    fn into_profile(self, requested: &CustomerId) -> CustomerProfile {
        let id = match self.id {
            Some(serde_json::Value::String(s)) => CustomerId(s),
            Some(serde_json::Value::Number(n)) => CustomerId(n.to_string()),
            _ => requested.clone(),
        };
        let address = self.default_address.map(|a| Address {
            street: non_blank(a.address1),
            city: non_blank(a.city),
            region: non_blank(a.province),
            postal_code: non_blank(a.zip),
            country: non_blank(a.country),
        }).unwrap_or_default();

        CustomerProfile {
            id,
            company: non_blank(self.company),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            address,
            phone: non_blank(self.phone),
            email: non_blank(self.email),
        }
    }
}

/// Fetches customers from the Shopify Admin REST API.
pub struct ShopifyCustomerFetcher {
    client: Client,
    base_url: String,
    access_token: String,
}

impl ShopifyCustomerFetcher {
    pub fn new(store_domain: &str, api_version: &str, access_token: String, timeout: Duration) -> Result<Self, SyncError> {
        let base_url = format!("https://{}/admin/api/{}", store_domain, api_version);
        Self::with_base_url(base_url, access_token, timeout)
    }

    /// `base_url` is everything before `/customers/{id}.json`.
    pub fn with_base_url(base_url: String, access_token: String, timeout: Duration) -> Result<Self, SyncError> {
        debug!("Initializing Shopify customer fetcher for {}", base_url);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }
}

#[async_trait]
impl CustomerFetcher for ShopifyCustomerFetcher {
    async fn fetch_customer(&self, customer_id: &CustomerId) -> Result<CustomerProfile, SyncError> {
        let url = format!("{}/customers/{}.json", self.base_url, customer_id);
        debug!("Fetching customer {} from {}", customer_id, url);

        let response = self.client
            .get(&url)
            .header("X-Shopify-Access-Token", &self.access_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Shopify request for customer {} failed: {}", customer_id, e);
                SyncError::UpstreamUnavailable { service: SERVICE, message: e.to_string() }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("Shopify has no customer {}", customer_id);
            return Err(SyncError::CustomerNotFound(customer_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            error!(status = status.as_u16(), "💥 Shopify fetch failed: {}", body);
            return Err(SyncError::UpstreamUnavailable {
                service: SERVICE,
                message: format!("customer lookup returned HTTP {}", status.as_u16()),
            });
        }

        let envelope: CustomerEnvelope = response.json().await.map_err(|e| {
            error!("Failed to decode Shopify customer {}: {}", customer_id, e);
            SyncError::UpstreamUnavailable { service: SERVICE, message: format!("invalid customer payload: {}", e) }
        })?;

        let profile = envelope.customer.into_profile(customer_id);
        info!("Fetched customer {} ({})", profile.id, profile.full_name());
        Ok(profile)
    }
}
