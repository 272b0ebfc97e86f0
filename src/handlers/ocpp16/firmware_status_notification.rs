//! FirmwareStatusNotification handler

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};

pub struct FirmwareStatusNotificationHandler;

#[async_trait]
impl CallHandler for FirmwareStatusNotificationHandler {
    type Request = v16::FirmwareStatusNotificationRequest;
    type Response = v16::FirmwareStatusNotificationResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        info!(
            charge_station_id,
            "firmware_status.status" = request.status.as_str(),
            "firmware status reported"
        );
        Ok(v16::FirmwareStatusNotificationResponse {})
    }
}
