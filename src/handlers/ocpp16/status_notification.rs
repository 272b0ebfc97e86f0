//! StatusNotification handler
//!
//! Connector 0 is the station itself. The transition is recorded in
//! telemetry; downstream reactions (e.g. withdrawing a reservation) are
//! driven elsewhere.

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};

pub struct StatusNotificationHandler;

#[async_trait]
impl CallHandler for StatusNotificationHandler {
    type Request = v16::StatusNotificationRequest;
    type Response = v16::StatusNotificationResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        info!(
            charge_station_id,
            "status_notification.connector_id" = request.connector_id,
            "status_notification.status" = request.status.as_str(),
            "status_notification.error_code" = ?request.error_code,
            "connector status changed"
        );
        Ok(v16::StatusNotificationResponse {})
    }
}
