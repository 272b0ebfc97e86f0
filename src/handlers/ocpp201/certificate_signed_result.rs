//! CertificateSigned result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v201;
use crate::router::{CallResultHandler, HandlerError};

pub struct CertificateSignedResultHandler;

#[async_trait]
impl CallResultHandler for CertificateSignedResultHandler {
    type Request = v201::CertificateSignedRequest;
    type Response = v201::CertificateSignedResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "certificate_signed.certificate_type" = ?request.certificate_type,
            "certificate_signed.status" = response.status.as_str(),
            "certificate install answered"
        );
        Ok(())
    }
}
