//! RemoteStopTransaction result handler
//!
//! Observation only: the station sends StopTransaction when it has actually
//! stopped.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct RemoteStopTransactionResultHandler;

#[async_trait]
impl CallResultHandler for RemoteStopTransactionResultHandler {
    type Request = v16::RemoteStopTransactionRequest;
    type Response = v16::RemoteStopTransactionResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "remote_stop.transaction_id" = request.transaction_id,
            "remote_stop.status" = response.status.as_str(),
            "remote stop answered"
        );
        Ok(())
    }
}
