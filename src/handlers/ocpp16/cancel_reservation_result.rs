//! CancelReservation result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct CancelReservationResultHandler;

#[async_trait]
impl CallResultHandler for CancelReservationResultHandler {
    type Request = v16::CancelReservationRequest;
    type Response = v16::CancelReservationResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "cancel_reservation.reservation_id" = request.reservation_id,
            "cancel_reservation.status" = ?response.status,
            "reservation cancel answered"
        );
        Ok(())
    }
}
