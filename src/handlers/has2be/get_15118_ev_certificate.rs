//! has2be Get15118EVCertificate handler

use async_trait::async_trait;

use crate::handlers::ocpp201;
use crate::ocpp::{has2be, v201};
use crate::router::{CallHandler, HandlerError};

pub struct Get15118EvCertificateHandler {
    pub handler201: ocpp201::Get15118EvCertificateHandler,
}

#[async_trait]
impl CallHandler for Get15118EvCertificateHandler {
    type Request = has2be::Get15118EvCertificateRequest;
    type Response = has2be::Get15118EvCertificateResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        // has2be predates the Install/Update distinction; treat every
        // request as an install.
        let response201 = self
            .handler201
            .handle_call(
                charge_station_id,
                v201::Get15118EvCertificateRequest {
                    iso15118_schema_version: request.schema_version,
                    action: v201::CertificateAction::Install,
                    exi_request: request.exi_request,
                },
            )
            .await?;

        Ok(has2be::Get15118EvCertificateResponse {
            status: response201.status,
            exi_response: response201.exi_response,
        })
    }
}
