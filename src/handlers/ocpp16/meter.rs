//! Wire-to-store conversion of meter readings
//!
//! Shared by the StopTransaction and MeterValues handlers. Raw values decode
//! with `parseFloat`. SignedData would require cryptographic verification of
//! the signed data block, which is deliberately not implemented; the
//! conversion fails rather than fabricating a number.

use crate::ocpp::v16;
use crate::router::HandlerError;
use crate::store;

pub(crate) fn convert_meter_values(
    meter_values: &[v16::MeterValue],
) -> Result<Vec<store::MeterValue>, HandlerError> {
    meter_values.iter().map(convert_meter_value).collect()
}

fn convert_meter_value(meter_value: &v16::MeterValue) -> Result<store::MeterValue, HandlerError> {
    Ok(store::MeterValue {
        timestamp: meter_value.timestamp.clone(),
        sampled_values: meter_value
            .sampled_value
            .iter()
            .map(convert_sampled_value)
            .collect::<Result<_, _>>()?,
    })
}

fn convert_sampled_value(sampled: &v16::SampledValue) -> Result<store::SampledValue, HandlerError> {
    Ok(store::SampledValue {
        context: sampled.context.map(|c| c.as_str().to_string()),
        location: sampled.location.map(|l| l.as_str().to_string()),
        measurand: sampled.measurand.map(|m| m.as_str().to_string()),
        phase: sampled.phase.map(|p| p.as_str().to_string()),
        unit_of_measure: sampled.unit.map(|u| store::UnitOfMeasure {
            unit: u.as_str().to_string(),
            multiplier: 0,
        }),
        value: convert_value(sampled.format, &sampled.value)?,
    })
}

pub(crate) fn convert_value(
    format: Option<v16::ValueFormat>,
    value: &str,
) -> Result<f64, HandlerError> {
    match format.unwrap_or_default() {
        v16::ValueFormat::Raw => value
            .parse::<f64>()
            .map_err(|e| HandlerError::msg(format!("parsing meter value {value:?}: {e}"))),
        v16::ValueFormat::SignedData => {
            Err(HandlerError::msg("conversion from signed data not implemented"))
        }
    }
}
