//! RemoteStartTransaction result handler
//!
//! Observation only: an accepted remote start is followed by the station's
//! own StartTransaction, which drives the real state change.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct RemoteStartTransactionResultHandler;

#[async_trait]
impl CallResultHandler for RemoteStartTransactionResultHandler {
    type Request = v16::RemoteStartTransactionRequest;
    type Response = v16::RemoteStartTransactionResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "remote_start.id_tag" = request.id_tag.as_str(),
            "remote_start.connector_id" = request.connector_id,
            "remote_start.status" = response.status.as_str(),
            "remote start answered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn result_is_observation_only() {
        let handler = RemoteStartTransactionResultHandler;
        handler
            .handle_call_result(
                "cs001",
                v16::RemoteStartTransactionRequest {
                    connector_id: Some(1),
                    id_tag: "MYRFIDTAG".into(),
                },
                v16::RemoteStartTransactionResponse {
                    status: v16::RemoteStartStopStatus::Accepted,
                },
                None,
            )
            .await
            .unwrap();
    }
}
