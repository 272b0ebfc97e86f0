//! A single charge station connection

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Write half of one WebSocket connection, as seen by the rest of the
/// system: an unbounded queue drained by the connection's writer task.
pub struct Connection {
    charge_station_id: String,
    sender: mpsc::UnboundedSender<String>,
    connected_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Connection {
    pub fn new(charge_station_id: impl Into<String>, sender: mpsc::UnboundedSender<String>) -> Self {
        let now = Utc::now();
        Self {
            charge_station_id: charge_station_id.into(),
            sender,
            connected_at: now,
            last_activity: now,
        }
    }

    pub fn charge_station_id(&self) -> &str {
        &self.charge_station_id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Queue a text frame for the writer task.
    pub fn send(&self, message: String) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| format!("connection to {} is closed", self.charge_station_id))
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
