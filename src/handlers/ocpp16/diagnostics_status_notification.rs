//! DiagnosticsStatusNotification handler

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};

pub struct DiagnosticsStatusNotificationHandler;

#[async_trait]
impl CallHandler for DiagnosticsStatusNotificationHandler {
    type Request = v16::DiagnosticsStatusNotificationRequest;
    type Response = v16::DiagnosticsStatusNotificationResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        info!(
            charge_station_id,
            "diagnostics_status.status" = request.status.as_str(),
            "diagnostics status reported"
        );
        Ok(v16::DiagnosticsStatusNotificationResponse {})
    }
}
