//! ChangeAvailability result handler
//!
//! The availability change itself is confirmed by a later
//! StatusNotification from the station.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct ChangeAvailabilityResultHandler;

#[async_trait]
impl CallResultHandler for ChangeAvailabilityResultHandler {
    type Request = v16::ChangeAvailabilityRequest;
    type Response = v16::ChangeAvailabilityResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "change_availability.connector_id" = request.connector_id,
            "change_availability.type" = request.kind.as_str(),
            "change_availability.status" = ?response.status,
            "availability change answered"
        );
        Ok(())
    }
}
