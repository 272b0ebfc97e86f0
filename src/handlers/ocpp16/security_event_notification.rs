//! SecurityEventNotification handler

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};

pub struct SecurityEventNotificationHandler;

#[async_trait]
impl CallHandler for SecurityEventNotificationHandler {
    type Request = v16::SecurityEventNotificationRequest;
    type Response = v16::SecurityEventNotificationResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        info!(
            charge_station_id,
            "security_event.type" = request.kind.as_str(),
            "security_event.timestamp" = request.timestamp.as_str(),
            "security event reported"
        );
        Ok(v16::SecurityEventNotificationResponse {})
    }
}
