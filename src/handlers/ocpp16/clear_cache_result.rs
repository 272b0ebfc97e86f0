//! ClearCache result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct ClearCacheResultHandler;

#[async_trait]
impl CallResultHandler for ClearCacheResultHandler {
    type Request = v16::ClearCacheRequest;
    type Response = v16::ClearCacheResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        _request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "clear_cache.status" = ?response.status,
            "cache clear answered"
        );
        Ok(())
    }
}
