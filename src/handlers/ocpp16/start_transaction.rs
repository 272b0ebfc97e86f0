//! StartTransaction handler

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};
use crate::store::{self, TokenStore, TransactionStore};
use crate::support::Clock;

pub struct StartTransactionHandler {
    pub clock: Arc<dyn Clock>,
    pub token_store: Arc<dyn TokenStore>,
    pub transaction_store: Arc<dyn TransactionStore>,
}

#[async_trait]
impl CallHandler for StartTransactionHandler {
    type Request = v16::StartTransactionRequest;
    type Response = v16::StartTransactionResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        info!(
            charge_station_id,
            connector_id = request.connector_id,
            id_tag = request.id_tag.as_str(),
            meter_start = request.meter_start,
            "starting transaction"
        );

        let token = self.token_store.lookup_token(&request.id_tag).await?;
        let accepted = token.map(|t| t.valid).unwrap_or(false);

        if !accepted {
            return Ok(v16::StartTransactionResponse {
                id_tag_info: v16::IdTagInfo::with_status(v16::AuthorizationStatus::Invalid),
                transaction_id: None,
            });
        }

        // The transaction id does not need a secure random source.
        let transaction_id: i32 = rand::thread_rng().gen_range(0..i32::MAX);
        let transaction_uuid = convert_to_uuid(transaction_id);

        self.transaction_store
            .create_transaction(
                charge_station_id,
                &transaction_uuid,
                &request.id_tag,
                "ISO14443",
                vec![store::MeterValue {
                    timestamp: self.clock.now_rfc3339(),
                    sampled_values: vec![store::SampledValue {
                        context: Some("Transaction.Begin".to_string()),
                        location: Some("Outlet".to_string()),
                        measurand: Some("MeterValue".to_string()),
                        phase: None,
                        unit_of_measure: Some(store::UnitOfMeasure {
                            unit: "Wh".to_string(),
                            multiplier: 0,
                        }),
                        value: f64::from(request.meter_start),
                    }],
                }],
                0,
                false,
            )
            .await?;

        Ok(v16::StartTransactionResponse {
            id_tag_info: v16::IdTagInfo::with_status(v16::AuthorizationStatus::Accepted),
            transaction_id: Some(transaction_id),
        })
    }
}

/// Deterministic UUID for an OCPP numeric transaction id: twelve zero bytes
/// followed by the id in big-endian.
pub fn convert_to_uuid(transaction_id: i32) -> String {
    let mut bytes = [0u8; 16];
    bytes[12..].copy_from_slice(&transaction_id.to_be_bytes());
    Uuid::from_bytes(bytes).to_string()
}
