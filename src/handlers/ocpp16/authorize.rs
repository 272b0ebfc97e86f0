//! Authorize handler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};
use crate::store::TokenStore;

pub struct AuthorizeHandler {
    pub token_store: Arc<dyn TokenStore>,
}

#[async_trait]
impl CallHandler for AuthorizeHandler {
    type Request = v16::AuthorizeRequest;
    type Response = v16::AuthorizeResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let token = self.token_store.lookup_token(&request.id_tag).await?;
        let status = if token.map(|t| t.valid).unwrap_or(false) {
            v16::AuthorizationStatus::Accepted
        } else {
            v16::AuthorizationStatus::Invalid
        };

        info!(
            charge_station_id,
            id_tag = request.id_tag.as_str(),
            status = ?status,
            "authorize"
        );

        Ok(v16::AuthorizeResponse {
            id_tag_info: v16::IdTagInfo::with_status(status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryEngine;
    use crate::testutil;

    async fn authorize(handler: &AuthorizeHandler, id_tag: &str) -> v16::AuthorizationStatus {
        handler
            .handle_call(
                "cs001",
                v16::AuthorizeRequest {
                    id_tag: id_tag.into(),
                },
            )
            .await
            .unwrap()
            .id_tag_info
            .status
    }

    #[tokio::test]
    async fn known_valid_token_is_accepted() {
        let engine = Arc::new(InMemoryEngine::new());
        engine
            .set_token(testutil::token("MYRFIDTAG", true))
            .await
            .unwrap();
        let handler = AuthorizeHandler {
            token_store: engine,
        };

        assert_eq!(
            authorize(&handler, "MYRFIDTAG").await,
            v16::AuthorizationStatus::Accepted
        );
    }

    #[tokio::test]
    async fn invalidated_and_unknown_tokens_are_invalid() {
        let engine = Arc::new(InMemoryEngine::new());
        engine
            .set_token(testutil::token("REVOKED", false))
            .await
            .unwrap();
        let handler = AuthorizeHandler {
            token_store: engine,
        };

        assert_eq!(
            authorize(&handler, "REVOKED").await,
            v16::AuthorizationStatus::Invalid
        );
        assert_eq!(
            authorize(&handler, "NOBODY").await,
            v16::AuthorizationStatus::Invalid
        );
    }
}
