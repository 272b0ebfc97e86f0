//! Reset result handler
//!
//! An accepted reset ends with the station rebooting and sending a fresh
//! BootNotification; nothing to do here beyond telemetry.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct ResetResultHandler;

#[async_trait]
impl CallResultHandler for ResetResultHandler {
    type Request = v16::ResetRequest;
    type Response = v16::ResetResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "reset.type" = request.kind.as_str(),
            "reset.status" = ?response.status,
            "reset answered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejected_reset_is_not_an_error() {
        let handler = ResetResultHandler;
        handler
            .handle_call_result(
                "cs001",
                v16::ResetRequest {
                    kind: v16::ResetType::Hard,
                },
                v16::ResetResponse {
                    status: v16::ResetStatus::Rejected,
                },
                None,
            )
            .await
            .unwrap();
    }
}
