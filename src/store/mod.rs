//! Persistence ports
//!
//! The core never talks to a concrete backend; it consumes these narrow
//! store traits. [`memory::InMemoryEngine`] implements all of them for tests
//! and development; production backends sit behind the same ports.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ── Data model ─────────────────────────────────────────────────

/// Authorization credential. Populated externally; read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub country_code: String,
    pub party_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uid: String,
    pub contract_id: String,
    pub issuer: String,
    pub valid: bool,
    pub cache_mode: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub unit: String,
    pub multiplier: i32,
}

/// A reading with its value already decoded to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledValue {
    pub context: Option<String>,
    pub location: Option<String>,
    pub measurand: Option<String>,
    pub phase: Option<String>,
    pub unit_of_measure: Option<UnitOfMeasure>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterValue {
    /// RFC3339.
    pub timestamp: String,
    pub sampled_values: Vec<SampledValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub charge_station_id: String,
    /// Deterministic UUID derived from the 32-bit OCPP transaction id.
    pub transaction_id: String,
    pub id_token: String,
    pub token_type: String,
    pub meter_values: Vec<MeterValue>,
    pub start_seq_no: i32,
    pub ended_seq_no: i32,
    pub updated_seq_no_count: i32,
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingStatus {
    Accepted,
    Rejected,
    NotSupported,
    RebootRequired,
    Pending,
}

impl SettingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::NotSupported => "NotSupported",
            Self::RebootRequired => "RebootRequired",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeStationSetting {
    pub value: String,
    pub status: SettingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeStationSettings {
    pub charge_station_id: String,
    pub settings: HashMap<String, ChargeStationSetting>,
}

/// Details reported by the station at boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeStationRuntimeDetails {
    pub ocpp_version: String,
    /// RFC3339.
    pub booted_at: String,
    pub vendor: String,
    pub model: String,
    pub firmware_version: Option<String>,
}

/// Credentials checked at the WebSocket upgrade. The digest is
/// `base64(sha256(secret))`; the secret itself is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeStationAuth {
    pub password_digest: String,
}

// ── Ports ──────────────────────────────────────────────────────

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn set_token(&self, token: Token) -> StoreResult<()>;
    async fn lookup_token(&self, uid: &str) -> StoreResult<Option<Token>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn create_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        id_token: &str,
        token_type: &str,
        meter_values: Vec<MeterValue>,
        start_seq_no: i32,
        offline: bool,
    ) -> StoreResult<()>;

    async fn find_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>>;

    /// Append meter values to an in-flight transaction.
    async fn update_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        meter_values: Vec<MeterValue>,
    ) -> StoreResult<()>;

    #[allow(clippy::too_many_arguments)]
    async fn end_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        id_token: &str,
        token_type: &str,
        meter_values: Vec<MeterValue>,
        seq_no: i32,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait ChargeStationSettingsStore: Send + Sync {
    /// Merge the given settings into the station's stored set.
    async fn update_settings(
        &self,
        charge_station_id: &str,
        settings: ChargeStationSettings,
    ) -> StoreResult<()>;

    async fn lookup_settings(
        &self,
        charge_station_id: &str,
    ) -> StoreResult<Option<ChargeStationSettings>>;
}

#[async_trait]
pub trait ChargeStationRuntimeDetailsStore: Send + Sync {
    async fn set_runtime_details(
        &self,
        charge_station_id: &str,
        details: ChargeStationRuntimeDetails,
    ) -> StoreResult<()>;

    async fn lookup_runtime_details(
        &self,
        charge_station_id: &str,
    ) -> StoreResult<Option<ChargeStationRuntimeDetails>>;
}

#[async_trait]
pub trait ChargeStationAuthStore: Send + Sync {
    async fn set_auth(&self, charge_station_id: &str, auth: ChargeStationAuth) -> StoreResult<()>;
    async fn lookup_auth(&self, charge_station_id: &str) -> StoreResult<Option<ChargeStationAuth>>;
}

/// The full set of ports a backend provides.
pub trait Engine:
    TokenStore
    + TransactionStore
    + ChargeStationSettingsStore
    + ChargeStationRuntimeDetailsStore
    + ChargeStationAuthStore
{
}

impl<T> Engine for T where
    T: TokenStore
        + TransactionStore
        + ChargeStationSettingsStore
        + ChargeStationRuntimeDetailsStore
        + ChargeStationAuthStore
{
}
