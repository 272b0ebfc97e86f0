//! StopTransaction handler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallHandler, HandlerError};
use crate::store::{self, TokenStore, TransactionStore};
use crate::support::Clock;

use super::meter::convert_meter_values;
use super::start_transaction::convert_to_uuid;

pub struct StopTransactionHandler {
    pub clock: Arc<dyn Clock>,
    pub token_store: Arc<dyn TokenStore>,
    pub transaction_store: Arc<dyn TransactionStore>,
}

#[async_trait]
impl CallHandler for StopTransactionHandler {
    type Request = v16::StopTransactionRequest;
    type Response = v16::StopTransactionResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let transaction_id = convert_to_uuid(request.transaction_id);
        info!(
            charge_station_id,
            transaction_id = transaction_id.as_str(),
            reason = request
                .reason
                .map(|r| format!("{r:?}"))
                .as_deref()
                .unwrap_or("*unknown*"),
            "stopping transaction"
        );

        let id_tag_info = match &request.id_tag {
            Some(id_tag) => {
                let token = self.token_store.lookup_token(id_tag).await?;
                let status = if token.map(|t| t.valid).unwrap_or(false) {
                    v16::AuthorizationStatus::Accepted
                } else {
                    v16::AuthorizationStatus::Invalid
                };
                Some(v16::IdTagInfo::with_status(status))
            }
            None => None,
        };

        let transaction = self
            .transaction_store
            .find_transaction(charge_station_id, &transaction_id)
            .await?;
        let seq_no = transaction
            .as_ref()
            .map(|t| t.start_seq_no + t.updated_seq_no_count + 1)
            .unwrap_or(-1);

        let (id_token, token_type) = match &request.id_tag {
            Some(id_tag) => (id_tag.as_str(), "ISO14443"),
            None => ("", ""),
        };

        let mut meter_values =
            convert_meter_values(request.transaction_data.as_deref().unwrap_or_default())?;
        let previous_values = transaction
            .as_ref()
            .map(|t| t.meter_values.as_slice())
            .unwrap_or_default();
        append_transaction_end_energy(
            self.clock.as_ref(),
            &mut meter_values,
            previous_values,
            request.meter_stop,
        );

        self.transaction_store
            .end_transaction(
                charge_station_id,
                &transaction_id,
                id_token,
                token_type,
                meter_values,
                seq_no,
            )
            .await?;

        Ok(v16::StopTransactionResponse { id_tag_info })
    }
}

/// Ensure the stored transaction ends with a `Transaction.End` outlet energy
/// sample. When the charge point reported none but the transaction has a
/// `Transaction.Begin` meter reading, the consumed energy is
/// `meterStop - meterStart`.
fn append_transaction_end_energy(
    clock: &dyn Clock,
    transaction_values: &mut Vec<store::MeterValue>,
    previous_values: &[store::MeterValue],
    meter_stop: i32,
) {
    if has_outlet_energy_reading(transaction_values) {
        return;
    }

    let Some(meter_start) = find_transaction_begin_value(previous_values) else {
        return;
    };

    let energy_used = f64::from(meter_stop) - meter_start;
    transaction_values.push(store::MeterValue {
        timestamp: clock.now_rfc3339(),
        sampled_values: vec![store::SampledValue {
            context: Some("Transaction.End".to_string()),
            location: Some("Outlet".to_string()),
            measurand: Some("Energy.Active.Import.Register".to_string()),
            phase: None,
            unit_of_measure: None,
            value: energy_used,
        }],
    });
}

fn has_outlet_energy_reading(values: &[store::MeterValue]) -> bool {
    values.iter().flat_map(|mv| &mv.sampled_values).any(|sv| {
        sv.context.as_deref() == Some("Transaction.End")
            && sv.measurand.as_deref() == Some("Energy.Active.Import.Register")
            && sv.location.as_deref() == Some("Outlet")
    })
}

fn find_transaction_begin_value(values: &[store::MeterValue]) -> Option<f64> {
    values
        .iter()
        .flat_map(|mv| &mv.sampled_values)
        .find(|sv| {
            sv.context.as_deref() == Some("Transaction.Begin")
                && sv.measurand.as_deref() == Some("MeterValue")
                && sv.location.as_deref() == Some("Outlet")
        })
        .map(|sv| sv.value)
}
