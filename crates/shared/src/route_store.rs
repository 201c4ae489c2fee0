use thiserror::Error;

use crate::models::{RouteMutation, Stop, StopId};

#[derive(Debug, Clone, Error)]
pub enum RouteStoreError {
    #[error("route service timed out")]
    Timeout,
    #[error("cannot connect to route service: {0}")]
    Connect(String),
    #[error("route service rejected the request: {0}")]
    Rejected(String),
    #[error("malformed route service response: {0}")]
    Decode(String),
}

impl RouteStoreError {
    /// Message shown to the user in a blocking notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            RouteStoreError::Timeout => "The server took too long to respond. Please try again.",
            RouteStoreError::Connect(_) => "Cannot connect to the server. Please check your connection.",
            RouteStoreError::Rejected(_) | RouteStoreError::Decode(_) => "Error updating route.",
        }
    }
}

/// The remote, authoritative list of stops of the active tour.
///
/// Callers treat any local copy as stale after a mutation and fetch again.
#[allow(async_fn_in_trait)]
pub trait RouteStore {
    async fn fetch_route(&self) -> Result<Vec<Stop>, RouteStoreError>;
    async fn add_stop(&self, id: StopId) -> Result<RouteMutation, RouteStoreError>;
    async fn remove_stop(&self, id: StopId) -> Result<RouteMutation, RouteStoreError>;
    async fn clear(&self) -> Result<RouteMutation, RouteStoreError>;
    async fn contains(&self, id: StopId) -> Result<bool, RouteStoreError>;
}
