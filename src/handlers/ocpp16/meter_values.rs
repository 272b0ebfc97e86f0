//! MeterValues handler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};
use crate::store::TransactionStore;

use super::meter::convert_meter_values;
use super::start_transaction::convert_to_uuid;

pub struct MeterValuesHandler {
    pub transaction_store: Arc<dyn TransactionStore>,
}

#[async_trait]
impl CallHandler for MeterValuesHandler {
    type Request = v16::MeterValuesRequest;
    type Response = v16::MeterValuesResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        match request.transaction_id {
            Some(transaction_id) => {
                let transaction_uuid = convert_to_uuid(transaction_id);
                let meter_values = convert_meter_values(&request.meter_value)?;
                self.transaction_store
                    .update_transaction(charge_station_id, &transaction_uuid, meter_values)
                    .await?;
            }
            None => {
                // Samples outside a transaction (clock-aligned readings)
                // have nowhere to go yet.
                debug!(
                    charge_station_id,
                    connector_id = request.connector_id,
                    "meter values without transaction id ignored"
                );
            }
        }
        Ok(v16::MeterValuesResponse {})
    }
}
