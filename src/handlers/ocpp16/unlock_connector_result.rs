//! UnlockConnector result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct UnlockConnectorResultHandler;

#[async_trait]
impl CallResultHandler for UnlockConnectorResultHandler {
    type Request = v16::UnlockConnectorRequest;
    type Response = v16::UnlockConnectorResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "unlock_connector.connector_id" = request.connector_id,
            "unlock_connector.status" = ?response.status,
            "unlock answered"
        );
        Ok(())
    }
}
