//! Session manager
//!
//! Tracks the active WebSocket connection per charge station and implements
//! the router's [`Emitter`] port by serialising frames onto the connection's
//! writer queue.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;

use crate::ocpp::OcppVersion;
use crate::router::{EmitError, Emitter};
use crate::support::OcppFrame;

use super::Connection;

pub struct SessionManager {
    /// Active connections indexed by charge station id.
    connections: DashMap<String, Connection>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection. A reconnect displaces the previous
    /// connection for the same station.
    pub fn register(
        &self,
        charge_station_id: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
    ) -> bool {
        let id = charge_station_id.into();
        let replaced = self
            .connections
            .insert(id.clone(), Connection::new(id.clone(), sender))
            .is_some();
        info!(charge_station_id = id.as_str(), replaced, "session registered");
        replaced
    }

    pub fn unregister(&self, charge_station_id: &str) {
        if self.connections.remove(charge_station_id).is_some() {
            info!(charge_station_id, "session unregistered");
        }
    }

    pub fn send_to(&self, charge_station_id: &str, message: String) -> Result<(), String> {
        match self.connections.get(charge_station_id) {
            Some(connection) => connection.send(message),
            None => Err(format!("charge station not connected: {charge_station_id}")),
        }
    }

    pub fn touch(&self, charge_station_id: &str) {
        if let Some(mut connection) = self.connections.get_mut(charge_station_id) {
            connection.touch();
        }
    }

    pub fn is_connected(&self, charge_station_id: &str) -> bool {
        self.connections.contains_key(charge_station_id)
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.connections.iter().map(|e| e.key().clone()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Emitter for SessionManager {
    async fn emit(
        &self,
        _ocpp_version: OcppVersion,
        charge_station_id: &str,
        frame: &OcppFrame,
    ) -> Result<(), EmitError> {
        self.send_to(charge_station_id, frame.serialize())
            .map_err(|reason| EmitError {
                charge_station_id: charge_station_id.to_string(),
                reason,
            })
    }
}

pub type SharedSessionManager = Arc<SessionManager>;
