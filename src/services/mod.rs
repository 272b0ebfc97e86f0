//! External service ports for ISO 15118 plug-and-charge
//!
//! The PKI machinery (OCSP validation, certificate signing, contract
//! certificate provisioning) lives outside this crate; the tunnelled
//! handlers consume it through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::ocpp::v201;
use crate::store::TokenStore;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("certificate validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    Other(String),
}

/// Validates ISO 15118 certificate chains and answers with OCSP data.
#[async_trait]
pub trait CertificateValidationService: Send + Sync {
    /// Validate a PEM-encoded chain; returns the OCSP result when one is
    /// produced.
    async fn validate_pem_chain(&self, pem_chain: &str) -> Result<Option<String>, ServiceError>;

    /// Validate a chain presented as OCSP hash data.
    async fn validate_hashed_chain(
        &self,
        ocsp_data: &[v201::OcspRequestData],
    ) -> Result<Option<String>, ServiceError>;
}

/// Issues charge-station certificates from a CSR.
#[async_trait]
pub trait ChargeStationCertificateProvider: Send + Sync {
    /// Returns the signed PEM certificate chain.
    async fn provide_certificate(&self, csr: &str) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractCertificates {
    pub status: v201::Iso15118EvCertificateStatus,
    pub exi_response: String,
}

/// Provisions EV contract certificates for plug-and-charge.
#[async_trait]
pub trait ContractCertificateProvider: Send + Sync {
    async fn provide_contract_certificates(
        &self,
        request: &v201::Get15118EvCertificateRequest,
    ) -> Result<ContractCertificates, ServiceError>;
}

/// Placeholder PKI backend for deployments without ISO 15118 support.
/// Every operation is declined, which the handlers surface as
/// Rejected/Failed statuses rather than errors.
pub struct UnconfiguredPki;

#[async_trait]
impl CertificateValidationService for UnconfiguredPki {
    async fn validate_pem_chain(&self, _pem_chain: &str) -> Result<Option<String>, ServiceError> {
        Err(ServiceError::Other("no PKI backend configured".into()))
    }

    async fn validate_hashed_chain(
        &self,
        _ocsp_data: &[v201::OcspRequestData],
    ) -> Result<Option<String>, ServiceError> {
        Err(ServiceError::Other("no PKI backend configured".into()))
    }
}

#[async_trait]
impl ChargeStationCertificateProvider for UnconfiguredPki {
    async fn provide_certificate(&self, _csr: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Other("no PKI backend configured".into()))
    }
}

#[async_trait]
impl ContractCertificateProvider for UnconfiguredPki {
    async fn provide_contract_certificates(
        &self,
        _request: &v201::Get15118EvCertificateRequest,
    ) -> Result<ContractCertificates, ServiceError> {
        Err(ServiceError::Other("no PKI backend configured".into()))
    }
}

/// Token authorization against the token store, shared by the OCPP 2.0.1
/// and has2be Authorize paths.
pub struct TokenAuthService {
    pub token_store: Arc<dyn TokenStore>,
}

impl TokenAuthService {
    pub async fn authorize(&self, id_token: &v201::IdToken) -> v201::IdTokenInfo {
        match self.token_store.lookup_token(&id_token.id_token).await {
            Ok(Some(token)) if token.valid => {
                v201::IdTokenInfo::with_status(v201::AuthorizationStatus::Accepted)
            }
            Ok(Some(_)) => v201::IdTokenInfo::with_status(v201::AuthorizationStatus::Invalid),
            Ok(None) => v201::IdTokenInfo::with_status(v201::AuthorizationStatus::Unknown),
            Err(e) => {
                tracing::warn!(
                    id_token = id_token.id_token.as_str(),
                    error = %e,
                    "token lookup failed"
                );
                v201::IdTokenInfo::with_status(v201::AuthorizationStatus::Unknown)
            }
        }
    }
}
