//! has2be SignCertificate handler

use async_trait::async_trait;

use crate::handlers::ocpp201;
use crate::ocpp::{has2be, v201};
use crate::router::{CallHandler, HandlerError};

pub struct SignCertificateHandler {
    pub handler201: ocpp201::SignCertificateHandler,
}

#[async_trait]
impl CallHandler for SignCertificateHandler {
    type Request = has2be::SignCertificateRequest;
    type Response = has2be::SignCertificateResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let response201 = self
            .handler201
            .handle_call(
                charge_station_id,
                v201::SignCertificateRequest {
                    csr: request.csr,
                    certificate_type: Some(v201::CertificateSigningUse::V2gCertificate),
                },
            )
            .await?;

        Ok(has2be::SignCertificateResponse {
            status: response201.status,
        })
    }
}
