//! InstallCertificate result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v201;
use crate::router::{CallResultHandler, HandlerError};

pub struct InstallCertificateResultHandler;

#[async_trait]
impl CallResultHandler for InstallCertificateResultHandler {
    type Request = v201::InstallCertificateRequest;
    type Response = v201::InstallCertificateResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "install_certificate.certificate_type" = ?request.certificate_type,
            "install_certificate.status" = ?response.status,
            "root certificate install answered"
        );
        Ok(())
    }
}
