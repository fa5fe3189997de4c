//! Integration tests for stockist_sync
//!
//! The sync service runs against in-memory fakes of both ports; the Shopify
//! and GitHub adapters run against wiremock servers; the router is driven
//! through `tower::ServiceExt::oneshot`.


mod test_webhook;
