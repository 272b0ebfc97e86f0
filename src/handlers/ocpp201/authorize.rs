//! OCPP 2.0.1 Authorize handler (plug-and-charge)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::ocpp::v201;
use crate::router::{CallHandler, HandlerError};
use crate::services::{CertificateValidationService, TokenAuthService};

pub struct AuthorizeHandler {
    pub token_auth: Arc<TokenAuthService>,
    pub certificate_validation: Arc<dyn CertificateValidationService>,
}

#[async_trait]
impl CallHandler for AuthorizeHandler {
    type Request = v201::AuthorizeRequest;
    type Response = v201::AuthorizeResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let id_token_info = self.token_auth.authorize(&request.id_token).await;

        // The contract certificate is checked independently of the token;
        // an invalid chain does not turn a valid token away.
        let certificate_status = if let Some(chain) = &request.certificate {
            Some(match self.certificate_validation.validate_pem_chain(chain).await {
                Ok(_) => v201::AuthorizeCertificateStatus::Accepted,
                Err(e) => {
                    warn!(charge_station_id, error = %e, "certificate chain rejected");
                    v201::AuthorizeCertificateStatus::CertChainError
                }
            })
        } else if let Some(hash_data) = &request.iso15118_certificate_hash_data {
            Some(
                match self
                    .certificate_validation
                    .validate_hashed_chain(hash_data)
                    .await
                {
                    Ok(_) => v201::AuthorizeCertificateStatus::Accepted,
                    Err(e) => {
                        warn!(charge_station_id, error = %e, "certificate hash data rejected");
                        v201::AuthorizeCertificateStatus::CertChainError
                    }
                },
            )
        } else {
            None
        };

        info!(
            charge_station_id,
            "authorize.token" = request.id_token.id_token.as_str(),
            "authorize.status" = id_token_info.status.as_str(),
            "authorize.certificate_status" = ?certificate_status,
            "plug-and-charge authorize"
        );

        Ok(v201::AuthorizeResponse {
            id_token_info,
            certificate_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use crate::store::memory::InMemoryEngine;
    use crate::store::TokenStore;
    use crate::testutil;

    struct FixedValidation(Result<(), String>);

    #[async_trait]
    impl CertificateValidationService for FixedValidation {
        async fn validate_pem_chain(
            &self,
            _pem_chain: &str,
        ) -> Result<Option<String>, ServiceError> {
            self.0
                .clone()
                .map(|_| None)
                .map_err(ServiceError::Validation)
        }

        async fn validate_hashed_chain(
            &self,
            _ocsp_data: &[v201::OcspRequestData],
        ) -> Result<Option<String>, ServiceError> {
            self.0
                .clone()
                .map(|_| None)
                .map_err(ServiceError::Validation)
        }
    }

    async fn handler(valid_chain: bool) -> AuthorizeHandler {
        let engine = Arc::new(InMemoryEngine::new());
        engine
            .set_token(testutil::token("GBTWK012345678V", true))
            .await
            .unwrap();
        AuthorizeHandler {
            token_auth: Arc::new(TokenAuthService {
                token_store: engine,
            }),
            certificate_validation: Arc::new(FixedValidation(if valid_chain {
                Ok(())
            } else {
                Err("expired".into())
            })),
        }
    }

    fn request(certificate: Option<&str>) -> v201::AuthorizeRequest {
        v201::AuthorizeRequest {
            certificate: certificate.map(Into::into),
            id_token: v201::IdToken {
                id_token: "GBTWK012345678V".into(),
                kind: "eMAID".into(),
            },
            iso15118_certificate_hash_data: None,
        }
    }

    #[tokio::test]
    async fn valid_token_with_valid_chain() {
        let response = handler(true)
            .await
            .handle_call("cs001", request(Some("-----BEGIN CERTIFICATE-----")))
            .await
            .unwrap();
        assert_eq!(
            response.id_token_info.status,
            v201::AuthorizationStatus::Accepted
        );
        assert_eq!(
            response.certificate_status,
            Some(v201::AuthorizeCertificateStatus::Accepted)
        );
    }

    #[tokio::test]
    async fn invalid_chain_does_not_reject_the_token() {
        let response = handler(false)
            .await
            .handle_call("cs001", request(Some("-----BEGIN CERTIFICATE-----")))
            .await
            .unwrap();
        assert_eq!(
            response.id_token_info.status,
            v201::AuthorizationStatus::Accepted
        );
        assert_eq!(
            response.certificate_status,
            Some(v201::AuthorizeCertificateStatus::CertChainError)
        );
    }

    #[tokio::test]
    async fn no_certificate_means_no_certificate_status() {
        let response = handler(true)
            .await
            .handle_call("cs001", request(None))
            .await
            .unwrap();
        assert!(response.certificate_status.is_none());
    }
}
