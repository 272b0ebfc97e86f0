//! ReserveNow result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct ReserveNowResultHandler;

#[async_trait]
impl CallResultHandler for ReserveNowResultHandler {
    type Request = v16::ReserveNowRequest;
    type Response = v16::ReserveNowResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "reserve_now.reservation_id" = request.reservation_id,
            "reserve_now.connector_id" = request.connector_id,
            "reserve_now.status" = ?response.status,
            "reservation answered"
        );
        Ok(())
    }
}
