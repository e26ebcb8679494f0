//! Authorization seam for subscription requests.

use std::fmt;

use async_trait::async_trait;

use beacon_core::result::AppResult;
use beacon_realtime::message::types::EntityType;

/// Decides whether a subscription may proceed.
///
/// The surrounding application implements this against its own datastore
/// and access-control rules. Returning an error with kind `AccessDenied`
/// or `NotFound` surfaces the matching wire error to the client; any other
/// error is logged in full and surfaced as a generic `SERVER_ERROR`.
#[async_trait]
pub trait AccessValidator: fmt::Debug + Send + Sync {
    /// Authorize a `subscribe`/`subscribeOnly` request for a channel tied
    /// to the given entity kind.
    async fn authorize_subscribe(&self, channel: &str, entity: EntityType) -> AppResult<()>;
}

/// Permissive validator for deployments without protected entities.
#[derive(Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl AccessValidator for AllowAll {
    async fn authorize_subscribe(&self, _channel: &str, _entity: EntityType) -> AppResult<()> {
        Ok(())
    }
}
