//! SignCertificate handler
//!
//! Accepts the CSR, asks the certificate provider to sign it, and delivers
//! the signed chain back through a tunnelled CertificateSigned call.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::ocpp::v201;
use crate::router::call_maker::DataTransferCallMaker;
use crate::router::{CallHandler, HandlerError};
use crate::services::ChargeStationCertificateProvider;

pub struct SignCertificateHandler {
    pub certificate_provider: Arc<dyn ChargeStationCertificateProvider>,
    pub call_maker: Arc<DataTransferCallMaker>,
}

#[async_trait]
impl CallHandler for SignCertificateHandler {
    type Request = v201::SignCertificateRequest;
    type Response = v201::SignCertificateResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let chain = match self.certificate_provider.provide_certificate(&request.csr).await {
            Ok(chain) => chain,
            Err(e) => {
                warn!(charge_station_id, error = %e, "certificate signing rejected");
                return Ok(v201::SignCertificateResponse {
                    status: v201::GenericStatus::Rejected,
                });
            }
        };

        self.call_maker
            .send(
                charge_station_id,
                v201::CertificateSignedRequest {
                    certificate_chain: chain,
                    certificate_type: request.certificate_type,
                },
            )
            .await?;

        Ok(v201::SignCertificateResponse {
            status: v201::GenericStatus::Accepted,
        })
    }
}
