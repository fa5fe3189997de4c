use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    application::sync_service::{SyncService, SyncSettings},
    config::AppConfig,
    domain::{
        error::SyncError,
        models::{CustomerId, SyncOutcome},
    },
    infrastructure::{github::file_store::GithubFileStore, shopify::customer_fetcher::ShopifyCustomerFetcher},
};

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Add,
    Remove,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
        }
    }
}

/// HTTP front end: receives the add/remove webhooks and drives the sync service.
pub struct WebhookService {
    sync: Arc<SyncService>,
    listen_addr: String,
}

impl WebhookService {
    pub fn new(sync: Arc<SyncService>, listen_addr: String) -> Self {
        Self { sync, listen_addr }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SyncError> {
        debug!("Initializing webhook service");
        let timeout = config.http_timeout();

        let customer_fetcher = Arc::new(ShopifyCustomerFetcher::new(
            &config.shopify.store_domain,
            &config.shopify.api_version,
            config.shopify.access_token.clone(),
            timeout,
        )?);
        info!("Using Shopify store: {}", config.shopify.store_domain);

        let (owner, repo) = config.github.owner_and_repo()?;
        info!("Using CSV {}/{}:{} on branch {}", owner, repo, config.github.path, config.github.branch);
        let file_store = Arc::new(GithubFileStore::new(
            &config.github.api_url,
            owner,
            repo,
            config.github.token.clone(),
            timeout,
        )?);

        let settings = SyncSettings {
            path: config.github.path.clone(),
            branch: config.github.branch.clone(),
            default_country: config.default_country.clone(),
        };
        let sync = Arc::new(SyncService::new(customer_fetcher, file_store, settings));

        debug!("Webhook service initialization complete");
        Ok(Self::new(sync, config.listen_addr.clone()))
    }

    pub fn router(&self) -> Router {
        router(self.sync.clone())
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.listen_addr).await
            .map_err(|e| {
                error!("Failed to bind {}: {}", self.listen_addr, e);
                e
            })?;
        info!("Listening for webhooks on {}", self.listen_addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Webhook service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub fn router(sync: Arc<SyncService>) -> Router {
    Router::new()
        .route("/api/add", post(add_handler).fallback(method_not_allowed))
        .route("/api/remove", post(remove_handler).fallback(method_not_allowed))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(AppState { sync })
}

async fn add_handler(State(state): State<AppState>, body: Bytes) -> Response {
    handle(state, Operation::Add, body).await
}

async fn remove_handler(State(state): State<AppState>, body: Bytes) -> Response {
    handle(state, Operation::Remove, body).await
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Only POST supported").into_response()
}

async fn handle(state: AppState, operation: Operation, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();

    let customer_id = match parse_customer_id(&body) {
        Ok(id) => id,
        Err(e) => {
            warn!(%request_id, operation = operation.as_str(), "🚨 Rejected webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Missing customer ID").into_response();
        }
    };

    let span = info_span!(
        "webhook",
        %request_id,
        operation = operation.as_str(),
        customer_id = %customer_id
    );

    async move {
        info!("Received {} webhook", operation.as_str());
        let sync = state.sync.clone();
        // Run on its own task so a panic becomes a 500 instead of a dropped connection.
        let task = tokio::spawn(
            async move {
                match operation {
                    Operation::Add => sync.add_customer(&customer_id).await,
                    Operation::Remove => sync.remove_customer(&customer_id).await,
                }
            }
            .in_current_span(),
        );

        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(SyncError::Internal(join_error.to_string())),
        };
        respond(operation, result)
    }
    .instrument(span)
    .await
}

/// Pulls `customer.id` out of the webhook body. Accepts a non-negative
/// integer or a string of ASCII letters, digits, `-` and `_`.
pub fn parse_customer_id(body: &[u8]) -> Result<CustomerId, SyncError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| SyncError::InvalidRequest(format!("body is not valid JSON: {}", e)))?;

    match payload.get("customer").and_then(|c| c.get("id")) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|id| CustomerId(id.to_string()))
            .ok_or_else(|| SyncError::InvalidRequest(format!("customer.id {} is not a valid id", n))),
        Some(Value::String(s)) => {
            let id = s.trim();
            let valid = !id.is_empty()
                && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if valid {
                Ok(CustomerId(id.to_string()))
            } else {
                Err(SyncError::InvalidRequest(format!("customer.id '{}' is not a valid id", s)))
            }
        }
        Some(other) => Err(SyncError::InvalidRequest(format!("customer.id has unsupported type: {}", other))),
        None => Err(SyncError::InvalidRequest("missing customer.id".to_string())),
    }
}

fn respond(operation: Operation, result: Result<SyncOutcome, SyncError>) -> Response {
    match result {
        Ok(SyncOutcome::Added) => (StatusCode::OK, "Customer added to CSV").into_response(),
        Ok(SyncOutcome::AlreadyExists) => (StatusCode::OK, "Customer already exists").into_response(),
        Ok(SyncOutcome::Removed { .. }) => (StatusCode::OK, "Customer removed from CSV").into_response(),
        Ok(SyncOutcome::Conflict) => {
            (StatusCode::CONFLICT, "CSV changed concurrently, retry delivery").into_response()
        }
        Err(e) => {
            error!(error_kind = e.kind(), "💥 {} webhook failed: {}", operation.as_str(), e);
            let (status, message) = match e {
                SyncError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "Customer not found"),
                SyncError::UpstreamUnavailable { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Upstream service failed")
                }
                SyncError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Missing customer ID"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            };
            (status, message).into_response()
        }
    }
}
