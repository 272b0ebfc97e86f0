//! Heartbeat handler

use std::sync::Arc;

use async_trait::async_trait;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};
use crate::support::Clock;

pub struct HeartbeatHandler {
    pub clock: Arc<dyn Clock>,
}

#[async_trait]
impl CallHandler for HeartbeatHandler {
    type Request = v16::HeartbeatRequest;
    type Response = v16::HeartbeatResponse;

    async fn handle_call(
        &self,
        _charge_station_id: &str,
        _request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        Ok(v16::HeartbeatResponse {
            current_time: self.clock.now_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn responds_with_current_time_and_is_idempotent() {
        let handler = HeartbeatHandler {
            clock: testutil::fixed_clock(),
        };

        let first = handler
            .handle_call("cs001", v16::HeartbeatRequest {})
            .await
            .unwrap();
        let second = handler
            .handle_call("cs001", v16::HeartbeatRequest {})
            .await
            .unwrap();

        assert_eq!(first.current_time, "2023-06-15T14:06:00Z");
        assert_eq!(first, second);
    }
}
