//! OCPP WebSocket endpoint
//!
//! One long-lived connection per charge station at
//! `ws://host:port/ocpp/{chargeStationId}`, subprotocol `ocpp1.6`. Each
//! connection runs one reader task and one writer task; frames are handled
//! serially on the reader task, which preserves per-station ordering.
//!
//! HTTP Basic Auth at the upgrade: the username is the charge station id and
//! `base64(sha256(password))` must match the stored digest.

use std::net::SocketAddr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::{SinkExt, StreamExt};
use sha2::{Digest, Sha256};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::config::WsAuthMode;
use crate::router::Router;
use crate::session::SharedSessionManager;
use crate::store::ChargeStationAuthStore;

use super::shutdown::ShutdownSignal;

const OCPP16_SUBPROTOCOL: &str = "ocpp1.6";

pub struct OcppServer {
    address: String,
    auth_mode: WsAuthMode,
    sessions: SharedSessionManager,
    router: Arc<Router>,
    auth_store: Arc<dyn ChargeStationAuthStore>,
    shutdown: Option<ShutdownSignal>,
}

impl OcppServer {
    pub fn new(
        address: impl Into<String>,
        auth_mode: WsAuthMode,
        sessions: SharedSessionManager,
        router: Arc<Router>,
        auth_store: Arc<dyn ChargeStationAuthStore>,
    ) -> Self {
        Self {
            address: address.into(),
            auth_mode,
            sessions,
            router,
            auth_store,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.address).await?;
        info!(address = self.address.as_str(), "OCPP endpoint listening");

        loop {
            let accepted = match &self.shutdown {
                Some(signal) => {
                    let mut signal = signal.clone();
                    tokio::select! {
                        accepted = listener.accept() => accepted,
                        _ = signal.wait() => {
                            info!("shutting down OCPP endpoint");
                            for charge_station_id in self.sessions.connected_ids() {
                                self.sessions.unregister(&charge_station_id);
                            }
                            return Ok(());
                        }
                    }
                }
                None => listener.accept().await,
            };

            match accepted {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) => error!(error = %e, "accept failed"),
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let sessions = self.sessions.clone();
        let router = self.router.clone();
        let auth_store = self.auth_store.clone();
        let auth_mode = self.auth_mode;
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) =
                handle_connection(stream, peer, auth_mode, sessions, router, auth_store, shutdown)
                    .await
            {
                warn!(peer = %peer, error = %e, "connection ended with error");
            }
        });
    }
}

struct Handshake {
    charge_station_id: Option<String>,
    authorization: Option<String>,
    subprotocol_ok: bool,
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    auth_mode: WsAuthMode,
    sessions: SharedSessionManager,
    router: Arc<Router>,
    auth_store: Arc<dyn ChargeStationAuthStore>,
    shutdown: Option<ShutdownSignal>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut handshake = Handshake {
        charge_station_id: None,
        authorization: None,
        subprotocol_ok: false,
    };

    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, mut response: Response| {
        handshake.charge_station_id = extract_charge_station_id(req.uri().path());
        handshake.authorization = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let requested = req
            .headers()
            .get("Sec-WebSocket-Protocol")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        handshake.subprotocol_ok = requested
            .split(',')
            .map(str::trim)
            .any(|p| p == OCPP16_SUBPROTOCOL);
        if handshake.subprotocol_ok {
            response.headers_mut().insert(
                "Sec-WebSocket-Protocol",
                OCPP16_SUBPROTOCOL.parse().expect("static header value"),
            );
        }

        Ok(response)
    })
    .await?;

    let mut ws_stream = ws_stream;

    let Some(charge_station_id) = handshake.charge_station_id else {
        warn!(peer = %peer, "no charge station id in path, closing");
        close(&mut ws_stream, "charge station id required").await;
        return Ok(());
    };

    if !handshake.subprotocol_ok {
        warn!(
            charge_station_id = charge_station_id.as_str(),
            "client did not offer the ocpp1.6 subprotocol"
        );
    }

    if auth_mode == WsAuthMode::Basic {
        let authorized = verify_basic_auth(
            auth_store.as_ref(),
            &charge_station_id,
            handshake.authorization.as_deref(),
        )
        .await;
        if !authorized {
            warn!(
                charge_station_id = charge_station_id.as_str(),
                peer = %peer,
                "basic auth failed, closing"
            );
            close(&mut ws_stream, "unauthorized").await;
            return Ok(());
        }
    }

    info!(charge_station_id = charge_station_id.as_str(), peer = %peer, "charge station connected");

    let (mut ws_writer, mut ws_reader) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // A reconnect displaces the previous connection; its outstanding calls
    // can never be answered on the new socket.
    if sessions.register(charge_station_id.clone(), tx) {
        router.pending().remove_for_station(&charge_station_id);
    }

    let writer_id = charge_station_id.clone();
    let writer_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_writer.send(Message::Text(message)).await {
                error!(charge_station_id = writer_id.as_str(), error = %e, "write failed");
                break;
            }
        }
    });

    let reader_id = charge_station_id.clone();
    let reader_sessions = sessions.clone();
    let reader_router = router.clone();
    let reader_task = tokio::spawn(async move {
        while let Some(message) = ws_reader.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    reader_sessions.touch(&reader_id);
                    // Serial handling: the next frame is not read until this
                    // one's side effects are complete.
                    reader_router.handle(&reader_id, &text).await;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(data)) => {
                    warn!(
                        charge_station_id = reader_id.as_str(),
                        bytes = data.len(),
                        "ignoring binary frame"
                    );
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    warn!(charge_station_id = reader_id.as_str(), error = %e, "read failed");
                    break;
                }
            }
        }
    });

    match shutdown {
        Some(mut signal) => {
            tokio::select! {
                _ = writer_task => {}
                _ = reader_task => {}
                _ = signal.wait() => {
                    info!(charge_station_id = charge_station_id.as_str(), "closing for shutdown");
                }
            }
        }
        None => {
            tokio::select! {
                _ = writer_task => {}
                _ = reader_task => {}
            }
        }
    }

    sessions.unregister(&charge_station_id);
    router.pending().remove_for_station(&charge_station_id);
    info!(charge_station_id = charge_station_id.as_str(), "charge station disconnected");

    Ok(())
}

async fn close<S>(ws_stream: &mut tokio_tungstenite::WebSocketStream<S>, reason: &'static str)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let _ = ws_stream
        .close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: reason.into(),
        }))
        .await;
}

/// `/ocpp/{id}` or bare `/{id}`.
fn extract_charge_station_id(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    if let Some(id) = path.strip_prefix("ocpp/") {
        let id = id.trim_start_matches('/');
        if !id.is_empty() && !id.contains('/') {
            return Some(id.to_string());
        }
        return None;
    }
    if !path.is_empty() && !path.contains('/') {
        return Some(path.to_string());
    }
    None
}

async fn verify_basic_auth(
    auth_store: &dyn ChargeStationAuthStore,
    charge_station_id: &str,
    authorization: Option<&str>,
) -> bool {
    let Some((username, password)) = authorization.and_then(parse_basic_credentials) else {
        return false;
    };
    if username != charge_station_id {
        return false;
    }

    let stored = match auth_store.lookup_auth(charge_station_id).await {
        Ok(Some(auth)) => auth,
        Ok(None) => return false,
        Err(e) => {
            error!(charge_station_id, error = %e, "auth lookup failed");
            return false;
        }
    };

    password_digest(&password) == stored.password_digest
}

fn parse_basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// The stored credential form: `base64(sha256(secret))`.
pub fn password_digest(password: &str) -> String {
    BASE64.encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryEngine;
    use crate::store::ChargeStationAuth;

    #[test]
    fn charge_station_id_comes_from_the_path() {
        assert_eq!(extract_charge_station_id("/ocpp/cs001").as_deref(), Some("cs001"));
        assert_eq!(extract_charge_station_id("/cs001").as_deref(), Some("cs001"));
        assert_eq!(extract_charge_station_id("/ocpp/"), None);
        assert_eq!(extract_charge_station_id("/"), None);
        assert_eq!(extract_charge_station_id("/ocpp/a/b"), None);
    }

    #[test]
    fn digest_is_base64_of_sha256() {
        // printf password | sha256sum | xxd -r -p | base64
        assert_eq!(
            password_digest("password"),
            "XohImNooBHFR0OVvjcYpJ3NgPQ1qq73WKhHvch0VQtg="
        );
    }

    #[test]
    fn basic_credentials_parse() {
        let header = format!("Basic {}", BASE64.encode("cs001:password"));
        assert_eq!(
            parse_basic_credentials(&header),
            Some(("cs001".to_string(), "password".to_string()))
        );
        assert_eq!(parse_basic_credentials("Bearer token"), None);
        assert_eq!(parse_basic_credentials("Basic !!!"), None);
    }

    #[tokio::test]
    async fn auth_accepts_matching_digest_only() {
        let engine = InMemoryEngine::new();
        engine
            .set_auth(
                "cs001",
                ChargeStationAuth {
                    password_digest: password_digest("password"),
                },
            )
            .await
            .unwrap();

        let header = format!("Basic {}", BASE64.encode("cs001:password"));
        assert!(verify_basic_auth(&engine, "cs001", Some(&header)).await);

        let wrong = format!("Basic {}", BASE64.encode("cs001:nope"));
        assert!(!verify_basic_auth(&engine, "cs001", Some(&wrong)).await);

        // Username must match the station in the path.
        let mismatched = format!("Basic {}", BASE64.encode("cs002:password"));
        assert!(!verify_basic_auth(&engine, "cs001", Some(&mismatched)).await);

        assert!(!verify_basic_auth(&engine, "cs001", None).await);
        assert!(!verify_basic_auth(&engine, "cs404", Some(&header)).await);
    }
}
