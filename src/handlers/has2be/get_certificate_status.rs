//! has2be GetCertificateStatus handler

use async_trait::async_trait;

use crate::handlers::ocpp201;
use crate::ocpp::{has2be, v201};
use crate::router::{CallHandler, HandlerError};

pub struct GetCertificateStatusHandler {
    pub handler201: ocpp201::GetCertificateStatusHandler,
}

#[async_trait]
impl CallHandler for GetCertificateStatusHandler {
    type Request = has2be::GetCertificateStatusRequest;
    type Response = has2be::GetCertificateStatusResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let response201 = self
            .handler201
            .handle_call(
                charge_station_id,
                v201::GetCertificateStatusRequest {
                    ocsp_request_data: request.ocsp_request_data,
                },
            )
            .await?;

        Ok(has2be::GetCertificateStatusResponse {
            status: response201.status,
            ocsp_result: response201.ocsp_result,
        })
    }
}
