//! GetCertificateStatus handler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::ocpp::v201;
use crate::router::{CallHandler, HandlerError};
use crate::services::CertificateValidationService;

pub struct GetCertificateStatusHandler {
    pub certificate_validation: Arc<dyn CertificateValidationService>,
}

#[async_trait]
impl CallHandler for GetCertificateStatusHandler {
    type Request = v201::GetCertificateStatusRequest;
    type Response = v201::GetCertificateStatusResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        match self
            .certificate_validation
            .validate_hashed_chain(std::slice::from_ref(&request.ocsp_request_data))
            .await
        {
            Ok(ocsp_result) => Ok(v201::GetCertificateStatusResponse {
                status: v201::GetCertificateStatusKind::Accepted,
                ocsp_result,
            }),
            Err(e) => {
                // A failed OCSP check is an answer for the station, not an
                // internal error.
                warn!(charge_station_id, error = %e, "certificate status check failed");
                Ok(v201::GetCertificateStatusResponse {
                    status: v201::GetCertificateStatusKind::Failed,
                    ocsp_result: None,
                })
            }
        }
    }
}
