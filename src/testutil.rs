//! Shared test fixtures

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ocpp::OcppVersion;
use crate::router::{EmitError, Emitter};
use crate::schema::{DirSchemaSource, SchemaRegistry};
use crate::store::Token;
use crate::support::{FixedClock, OcppFrame};

/// Emitter that captures frames instead of writing to a socket.
pub struct RecordingEmitter {
    frames: Mutex<Vec<(String, OcppFrame)>>,
    fail: bool,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// An emitter whose writes always fail, as if the socket closed.
    pub fn failing() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn frames(&self) -> Vec<(String, OcppFrame)> {
        self.frames.lock().unwrap().clone()
    }
}

impl Default for RecordingEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Emitter for RecordingEmitter {
    async fn emit(
        &self,
        _ocpp_version: OcppVersion,
        charge_station_id: &str,
        frame: &OcppFrame,
    ) -> Result<(), EmitError> {
        if self.fail {
            return Err(EmitError {
                charge_station_id: charge_station_id.to_string(),
                reason: "connection closed".into(),
            });
        }
        self.frames
            .lock()
            .unwrap()
            .push((charge_station_id.to_string(), frame.clone()));
        Ok(())
    }
}

/// Registry backed by the repository's schemas/ directory.
pub fn schema_registry() -> Arc<SchemaRegistry> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas");
    Arc::new(SchemaRegistry::new(DirSchemaSource::new(root)))
}

pub fn fixed_time() -> DateTime<Utc> {
    "2023-06-15T15:06:00+01:00".parse().unwrap()
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(fixed_time()))
}

pub fn token(uid: &str, valid: bool) -> Token {
    Token {
        country_code: "GB".into(),
        party_id: "TWK".into(),
        kind: "RFID".into(),
        uid: uid.into(),
        contract_id: "GBTWK012345678V".into(),
        issuer: "Thoughtworks".into(),
        valid,
        cache_mode: "NEVER".into(),
        last_updated: "2023-06-15T14:06:00Z".into(),
    }
}
