//! TriggerMessage (2.0.1) result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v201;
use crate::router::{CallResultHandler, HandlerError};

pub struct TriggerMessageResultHandler;

#[async_trait]
impl CallResultHandler for TriggerMessageResultHandler {
    type Request = v201::TriggerMessageRequest;
    type Response = v201::TriggerMessageResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "trigger_message.requested" = ?request.requested_message,
            "trigger_message.status" = ?response.status,
            "tunnelled trigger answered"
        );
        Ok(())
    }
}
