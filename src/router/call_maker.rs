//! CS-originated Calls
//!
//! [`OcppCallMaker`] binds a typed request to its action name at compile
//! time, records a pending entry and emits the frame. The pending entry is
//! inserted before the emit and rolled back if the emit fails, so a
//! delivered frame always has exactly one pending entry.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::ocpp::{v16, v201, OcppVersion};
use crate::support::OcppFrame;

use super::pending::PendingCallRegistry;
use super::{EmitError, Emitter};

/// A request type the central system may originate, with its action name.
pub trait ChargePointRequest: Serialize + Send + Sync {
    const ACTION: &'static str;
}

macro_rules! charge_point_request {
    ($($ty:ty => $action:literal,)*) => {
        $(impl ChargePointRequest for $ty {
            const ACTION: &'static str = $action;
        })*
    };
}

charge_point_request! {
    v16::ChangeConfigurationRequest => "ChangeConfiguration",
    v16::TriggerMessageRequest => "TriggerMessage",
    v16::RemoteStartTransactionRequest => "RemoteStartTransaction",
    v16::RemoteStopTransactionRequest => "RemoteStopTransaction",
    v16::ReserveNowRequest => "ReserveNow",
    v16::CancelReservationRequest => "CancelReservation",
    v16::ChangeAvailabilityRequest => "ChangeAvailability",
    v16::ClearCacheRequest => "ClearCache",
    v16::GetConfigurationRequest => "GetConfiguration",
    v16::ResetRequest => "Reset",
    v16::UnlockConnectorRequest => "UnlockConnector",
}

#[derive(Debug, Error)]
pub enum CallMakerError {
    #[error("encoding request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

pub struct OcppCallMaker {
    emitter: Arc<dyn Emitter>,
    pending: Arc<PendingCallRegistry>,
    ocpp_version: OcppVersion,
}

impl OcppCallMaker {
    pub fn new(
        emitter: Arc<dyn Emitter>,
        pending: Arc<PendingCallRegistry>,
        ocpp_version: OcppVersion,
    ) -> Self {
        Self {
            emitter,
            pending,
            ocpp_version,
        }
    }

    pub async fn send<R: ChargePointRequest>(
        &self,
        charge_station_id: &str,
        request: R,
    ) -> Result<(), CallMakerError> {
        self.send_with_state(charge_station_id, request, None).await
    }

    /// Send a Call carrying handler-selected state through to the result
    /// handler.
    pub async fn send_with_state<R: ChargePointRequest>(
        &self,
        charge_station_id: &str,
        request: R,
        state: Option<Value>,
    ) -> Result<(), CallMakerError> {
        let payload = serde_json::to_value(&request)?;
        self.send_raw(charge_station_id, R::ACTION, payload, state)
            .await
    }

    async fn send_raw(
        &self,
        charge_station_id: &str,
        action: &str,
        payload: Value,
        state: Option<Value>,
    ) -> Result<(), CallMakerError> {
        let message_id = Uuid::new_v4().to_string();
        self.pending
            .insert(charge_station_id, &message_id, action, payload.clone(), state);

        debug!(charge_station_id, action, message_id = message_id.as_str(), "sending call");

        let frame = OcppFrame::Call {
            message_id: message_id.clone(),
            action: action.to_string(),
            payload,
        };
        if let Err(e) = self
            .emitter
            .emit(self.ocpp_version, charge_station_id, &frame)
            .await
        {
            self.pending.remove(charge_station_id, &message_id);
            return Err(e.into());
        }
        Ok(())
    }
}

/// A request carried inside a DataTransfer envelope, with its nested
/// namespace coordinates.
pub trait DataTransferRequest: Serialize + Send + Sync {
    const VENDOR_ID: &'static str;
    const MESSAGE_ID: &'static str;
}

macro_rules! data_transfer_request {
    ($($ty:ty => ($vendor:literal, $message:literal),)*) => {
        $(impl DataTransferRequest for $ty {
            const VENDOR_ID: &'static str = $vendor;
            const MESSAGE_ID: &'static str = $message;
        })*
    };
}

data_transfer_request! {
    v201::CertificateSignedRequest => ("org.openchargealliance.iso15118pnc", "CertificateSigned"),
    v201::InstallCertificateRequest => ("org.openchargealliance.iso15118pnc", "InstallCertificate"),
    v201::TriggerMessageRequest => ("org.openchargealliance.iso15118pnc", "TriggerMessage"),
    crate::ocpp::has2be::CertificateSignedRequest => ("iso15118", "CertificateSigned"),
}

/// Sends nested actions wrapped in an OCPP 1.6 DataTransfer Call. The
/// pending entry records the DataTransfer envelope, so the result side can
/// recover `(vendorId, messageId)` and re-enter the nested routing table.
pub struct DataTransferCallMaker {
    inner: OcppCallMaker,
}

impl DataTransferCallMaker {
    pub fn new(emitter: Arc<dyn Emitter>, pending: Arc<PendingCallRegistry>) -> Self {
        Self {
            inner: OcppCallMaker::new(emitter, pending, OcppVersion::V16),
        }
    }

    pub async fn send<R: DataTransferRequest>(
        &self,
        charge_station_id: &str,
        request: R,
    ) -> Result<(), CallMakerError> {
        let data = serde_json::to_string(&request)?;
        let envelope = v16::DataTransferRequest {
            vendor_id: R::VENDOR_ID.to_string(),
            message_id: Some(R::MESSAGE_ID.to_string()),
            data: Some(data),
        };
        let payload = serde_json::to_value(&envelope)?;
        self.inner
            .send_raw(charge_station_id, "DataTransfer", payload, None)
            .await
    }
}
