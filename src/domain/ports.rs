use crate::domain::model::ServerReply;
use crate::utils::error::Result;
use async_trait::async_trait;

/// POSTs a JSON body to a storefront endpoint.
///
/// A 2xx response yields the decoded reply. A non-2xx response becomes
/// `CartError::Rejected` carrying the server's human readable message.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<ServerReply>;
}

/// Blocking notification shown to the shopper.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

