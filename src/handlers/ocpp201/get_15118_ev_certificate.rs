//! Get15118EVCertificate handler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::ocpp::v201;
use crate::router::{CallHandler, HandlerError};
use crate::services::ContractCertificateProvider;

pub struct Get15118EvCertificateHandler {
    pub contract_certificate_provider: Arc<dyn ContractCertificateProvider>,
}

#[async_trait]
impl CallHandler for Get15118EvCertificateHandler {
    type Request = v201::Get15118EvCertificateRequest;
    type Response = v201::Get15118EvCertificateResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        match self
            .contract_certificate_provider
            .provide_contract_certificates(&request)
            .await
        {
            Ok(certificates) => Ok(v201::Get15118EvCertificateResponse {
                status: certificates.status,
                exi_response: certificates.exi_response,
            }),
            Err(e) => {
                warn!(charge_station_id, error = %e, "contract certificate provisioning failed");
                Ok(v201::Get15118EvCertificateResponse {
                    status: v201::Iso15118EvCertificateStatus::Failed,
                    exi_response: String::new(),
                })
            }
        }
    }
}
