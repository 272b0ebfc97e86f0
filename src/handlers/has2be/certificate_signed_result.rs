//! has2be CertificateSigned result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::has2be;
use crate::router::{CallResultHandler, HandlerError};

pub struct CertificateSignedResultHandler;

#[async_trait]
impl CallResultHandler for CertificateSignedResultHandler {
    type Request = has2be::CertificateSignedRequest;
    type Response = has2be::CertificateSignedResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        _request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "certificate_signed.status" = response.status.as_str(),
            "has2be certificate install answered"
        );
        Ok(())
    }
}
