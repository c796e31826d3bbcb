//! Provider-facing STACKIT client for a machine-controller-manager driver.
//!
//! Wraps the IaaS API behind [`StackitClient`]: servers (create, get, delete,
//! list by label) and NIC allowed addresses. Backend errors are returned
//! unmodified; callers decide what a missing resource means by asking
//! [`is_not_found`].

pub mod config;
pub mod convert;
pub mod mock;
pub mod sdk;
pub mod types;

use std::error::Error as StdError;

use async_trait::async_trait;
use stackit_iaas::StatusCode;
use types::{CreateServerRequest, Labels, Nic, Server};

pub use config::ClientConfig;
pub use mock::MockStackitClient;
pub use sdk::{SdkStackitClient, new_stackit_client};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create STACKIT SDK client: {0}")]
    ClientCreation(#[source] stackit_iaas::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Api(#[from] stackit_iaas::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Server and NIC operations against one STACKIT project scope.
///
/// Every call is a single round trip. Errors from the backend come back
/// as [`Error::Api`] without reclassification.
#[async_trait]
pub trait StackitClient: Send + Sync + 'static {
    /// Create a server. The returned status is whatever the backend reports
    /// right away, usually `CREATING`.
    async fn create_server(
        &self,
        project_id: &str,
        region: &str,
        req: &CreateServerRequest,
    ) -> Result<Server>;

    async fn get_server(&self, project_id: &str, region: &str, server_id: &str) -> Result<Server>;

    /// Delete a server. Deleting one that is already gone is an error;
    /// use [`is_not_found`] to tolerate it.
    async fn delete_server(&self, project_id: &str, region: &str, server_id: &str) -> Result<()>;

    /// List servers matching every label in `selector`. `None` or an empty
    /// selector lists all servers. Order is backend-defined. A selector
    /// label with an empty key, or with `,` or `=` in its key or value,
    /// fails with [`Error::InvalidRequest`] before any request is sent.
    async fn list_servers(
        &self,
        project_id: &str,
        region: &str,
        selector: Option<&Labels>,
    ) -> Result<Vec<Server>>;

    async fn get_nics_for_server(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<Vec<Nic>>;

    /// Replace a NIC's allowed addresses. An empty slice clears them.
    async fn update_nic(
        &self,
        project_id: &str,
        region: &str,
        network_id: &str,
        nic_id: &str,
        allowed_addresses: &[String],
    ) -> Result<Nic>;
}

/// Whether `err` or anything in its `source()` chain is a STACKIT API error
/// with status 404.
///
/// The first API error found decides: a 500 wrapping a 404 is not a 404.
pub fn is_not_found(err: Option<&(dyn StdError + 'static)>) -> bool {
    std::iter::successors(err, |&e| e.source())
        .find_map(api_status)
        .is_some_and(|status| status == StatusCode::NOT_FOUND)
}

fn api_status(err: &(dyn StdError + 'static)) -> Option<StatusCode> {
    let api = match err.downcast_ref::<Error>() {
        Some(Error::Api(inner)) => inner,
        _ => err.downcast_ref::<stackit_iaas::Error>()?,
    };
    api.status()
}
