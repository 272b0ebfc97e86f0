//! has2be Authorize handler

use async_trait::async_trait;

use crate::handlers::ocpp201;
use crate::ocpp::{has2be, v201};
use crate::router::{CallHandler, HandlerError};

pub struct AuthorizeHandler {
    pub handler201: ocpp201::AuthorizeHandler,
}

#[async_trait]
impl CallHandler for AuthorizeHandler {
    type Request = has2be::AuthorizeRequest;
    type Response = has2be::AuthorizeResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let request201 = v201::AuthorizeRequest {
            certificate: None,
            id_token: v201::IdToken {
                id_token: request.id_token.id_token,
                kind: request.id_token.kind,
            },
            iso15118_certificate_hash_data: request.certificate_hash_data,
        };

        let response201 = self
            .handler201
            .handle_call(charge_station_id, request201)
            .await?;

        // has2be has no certificateStatus field; only the token verdict
        // survives the conversion.
        Ok(has2be::AuthorizeResponse {
            id_token_info: response201.id_token_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CertificateValidationService, ServiceError, TokenAuthService};
    use crate::store::memory::InMemoryEngine;
    use crate::store::TokenStore;
    use crate::testutil;
    use std::sync::Arc;

    struct AcceptAll;

    #[async_trait]
    impl CertificateValidationService for AcceptAll {
        async fn validate_pem_chain(
            &self,
            _pem_chain: &str,
        ) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }

        async fn validate_hashed_chain(
            &self,
            _ocsp_data: &[v201::OcspRequestData],
        ) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn delegates_to_the_201_handler() {
        let engine = Arc::new(InMemoryEngine::new());
        engine
            .set_token(testutil::token("GBTWK012345678V", true))
            .await
            .unwrap();

        let handler = AuthorizeHandler {
            handler201: ocpp201::AuthorizeHandler {
                token_auth: Arc::new(TokenAuthService {
                    token_store: engine,
                }),
                certificate_validation: Arc::new(AcceptAll),
            },
        };

        let response = handler
            .handle_call(
                "cs001",
                has2be::AuthorizeRequest {
                    id_token: has2be::IdToken {
                        id_token: "GBTWK012345678V".into(),
                        kind: "eMAID".into(),
                    },
                    certificate_hash_data: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            response.id_token_info.status,
            v201::AuthorizationStatus::Accepted
        );
    }
}
