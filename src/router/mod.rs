//! Central message router
//!
//! Dispatches decoded frames: inbound Calls go through schema validation to
//! a typed [`CallHandler`] and the response is validated and emitted;
//! inbound CallResults/CallErrors are correlated against the pending-call
//! registry and delivered to the matching [`CallResultHandler`].
//!
//! Handler errors and panics surface to the far side as CallErrors; the
//! connection is never torn down by the router.

pub mod call_maker;
pub mod pending;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::ocpp::{ErrorCode, OcppVersion};
use crate::schema::{SchemaRegistry, ValidateError};
use crate::store::StoreError;
use crate::support::OcppFrame;

pub use pending::{PendingCall, PendingCallRegistry};

// ── Ports ──────────────────────────────────────────────────────

/// Outbound transport port: writes one frame to one charge station.
#[async_trait]
pub trait Emitter: Send + Sync {
    async fn emit(
        &self,
        ocpp_version: OcppVersion,
        charge_station_id: &str,
        frame: &OcppFrame,
    ) -> Result<(), EmitError>;
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("emit to {charge_station_id} failed: {reason}")]
pub struct EmitError {
    pub charge_station_id: String,
    pub reason: String,
}

/// Error returned from protocol handlers. The router maps every variant to
/// an `InternalError` CallError; the distinction only matters for logs.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("{0}")]
    Message(String),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<call_maker::CallMakerError> for HandlerError {
    fn from(e: call_maker::CallMakerError) -> Self {
        match e {
            call_maker::CallMakerError::Emit(e) => Self::Emit(e),
            other => Self::Message(other.to_string()),
        }
    }
}

/// Domain logic for one inbound action.
#[async_trait]
pub trait CallHandler: Send + Sync {
    type Request: DeserializeOwned + Send + 'static;
    type Response: Serialize + Send + 'static;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError>;
}

/// Domain logic for the response to one CS-originated action.
#[async_trait]
pub trait CallResultHandler: Send + Sync {
    type Request: DeserializeOwned + Send + 'static;
    type Response: DeserializeOwned + Send + 'static;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        state: Option<Value>,
    ) -> Result<(), HandlerError>;
}

/// Invoked when an outbound call ends in a CallError (from the station or
/// synthesised on expiry).
#[async_trait]
pub trait CallErrorHandler: Send + Sync {
    async fn handle_call_error(
        &self,
        charge_station_id: &str,
        request: Value,
        error_code: &str,
        error_description: &str,
    );
}

// ── Type-erased route adapters ─────────────────────────────────

#[async_trait]
trait ErasedCallHandler: Send + Sync {
    async fn handle(&self, charge_station_id: &str, payload: &Value)
        -> Result<Value, HandlerError>;
}

struct ErasedCall<H>(H);

#[async_trait]
impl<H: CallHandler> ErasedCallHandler for ErasedCall<H> {
    async fn handle(
        &self,
        charge_station_id: &str,
        payload: &Value,
    ) -> Result<Value, HandlerError> {
        let request: H::Request = serde_json::from_value(payload.clone())
            .map_err(|e| HandlerError::Message(format!("decoding request: {e}")))?;
        let response = self.0.handle_call(charge_station_id, request).await?;
        serde_json::to_value(response)
            .map_err(|e| HandlerError::Message(format!("encoding response: {e}")))
    }
}

#[async_trait]
trait ErasedCallResultHandler: Send + Sync {
    async fn handle(
        &self,
        charge_station_id: &str,
        request: &Value,
        response: &Value,
        state: Option<Value>,
    ) -> Result<(), HandlerError>;
}

struct ErasedCallResult<H>(H);

#[async_trait]
impl<H: CallResultHandler> ErasedCallResultHandler for ErasedCallResult<H> {
    async fn handle(
        &self,
        charge_station_id: &str,
        request: &Value,
        response: &Value,
        state: Option<Value>,
    ) -> Result<(), HandlerError> {
        let request: H::Request = serde_json::from_value(request.clone())
            .map_err(|e| HandlerError::Message(format!("decoding original request: {e}")))?;
        let response: H::Response = serde_json::from_value(response.clone())
            .map_err(|e| HandlerError::Message(format!("decoding response: {e}")))?;
        self.0
            .handle_call_result(charge_station_id, request, response, state)
            .await
    }
}

// ── Routes ─────────────────────────────────────────────────────

/// Binding of an inbound action to schemas and its handler.
pub struct CallRoute {
    request_schema: String,
    response_schema: String,
    handler: Arc<dyn ErasedCallHandler>,
}

impl CallRoute {
    pub fn new<H>(request_schema: &str, response_schema: &str, handler: H) -> Self
    where
        H: CallHandler + 'static,
    {
        Self {
            request_schema: request_schema.to_string(),
            response_schema: response_schema.to_string(),
            handler: Arc::new(ErasedCall(handler)),
        }
    }

    pub fn request_schema(&self) -> &str {
        &self.request_schema
    }

    pub fn response_schema(&self) -> &str {
        &self.response_schema
    }

    /// Decode, dispatch and re-encode one payload. Used by the router and by
    /// the DataTransfer sub-router, which re-enters the same pipeline for
    /// nested actions.
    pub async fn invoke(
        &self,
        charge_station_id: &str,
        payload: &Value,
    ) -> Result<Value, HandlerError> {
        self.handler.handle(charge_station_id, payload).await
    }
}

/// Binding of a CS-originated action to schemas and its result handler.
pub struct CallResultRoute {
    request_schema: String,
    response_schema: String,
    handler: Arc<dyn ErasedCallResultHandler>,
    error_handler: Option<Arc<dyn CallErrorHandler>>,
}

impl CallResultRoute {
    pub fn new<H>(request_schema: &str, response_schema: &str, handler: H) -> Self
    where
        H: CallResultHandler + 'static,
    {
        Self {
            request_schema: request_schema.to_string(),
            response_schema: response_schema.to_string(),
            handler: Arc::new(ErasedCallResult(handler)),
            error_handler: None,
        }
    }

    pub fn with_error_handler(mut self, handler: impl CallErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn request_schema(&self) -> &str {
        &self.request_schema
    }

    pub fn response_schema(&self) -> &str {
        &self.response_schema
    }

    pub async fn invoke(
        &self,
        charge_station_id: &str,
        request: &Value,
        response: &Value,
        state: Option<Value>,
    ) -> Result<(), HandlerError> {
        self.handler
            .handle(charge_station_id, request, response, state)
            .await
    }
}

// ── Router ─────────────────────────────────────────────────────

pub struct Router {
    ocpp_version: OcppVersion,
    emitter: Arc<dyn Emitter>,
    schemas: Arc<SchemaRegistry>,
    pending: Arc<PendingCallRegistry>,
    call_routes: HashMap<String, CallRoute>,
    call_result_routes: HashMap<String, CallResultRoute>,
}

impl Router {
    pub fn new(
        ocpp_version: OcppVersion,
        emitter: Arc<dyn Emitter>,
        schemas: Arc<SchemaRegistry>,
        pending: Arc<PendingCallRegistry>,
        call_routes: HashMap<String, CallRoute>,
        call_result_routes: HashMap<String, CallResultRoute>,
    ) -> Self {
        Self {
            ocpp_version,
            emitter,
            schemas,
            pending,
            call_routes,
            call_result_routes,
        }
    }

    pub fn pending(&self) -> &Arc<PendingCallRegistry> {
        &self.pending
    }

    /// Entry point for one raw frame from a charge station. Per-station
    /// callers must await completion before feeding the next frame so that
    /// handler side effects are ordered.
    pub async fn handle(&self, charge_station_id: &str, raw: &str) {
        let frame = match OcppFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(charge_station_id, error = %e, "malformed frame");
                let message_id = best_effort_message_id(raw).unwrap_or_else(|| "-1".to_string());
                self.emit_call_error(
                    charge_station_id,
                    &message_id,
                    ErrorCode::ProtocolError,
                    &e.to_string(),
                    json!({}),
                )
                .await;
                return;
            }
        };

        match frame {
            OcppFrame::Call {
                message_id,
                action,
                payload,
            } => {
                self.handle_call(charge_station_id, &message_id, &action, payload)
                    .await
            }
            OcppFrame::CallResult {
                message_id,
                payload,
            } => {
                self.handle_call_result(charge_station_id, &message_id, payload)
                    .await
            }
            OcppFrame::CallError {
                message_id,
                error_code,
                error_description,
                ..
            } => {
                self.handle_call_error(charge_station_id, &message_id, &error_code, &error_description)
                    .await
            }
        }
    }

    async fn handle_call(
        &self,
        charge_station_id: &str,
        message_id: &str,
        action: &str,
        payload: Value,
    ) {
        let Some(route) = self.call_routes.get(action) else {
            warn!(charge_station_id, action, "call for unknown action");
            self.emit_call_error(
                charge_station_id,
                message_id,
                ErrorCode::NotImplemented,
                &format!("action {action} is not implemented"),
                json!({}),
            )
            .await;
            return;
        };

        if let Err(e) = self.schemas.validate(&route.request_schema, &payload) {
            match e {
                ValidateError::Violation(v) => {
                    warn!(charge_station_id, action, violation = %v, "request failed schema validation");
                    self.emit_call_error(
                        charge_station_id,
                        message_id,
                        ErrorCode::FormatViolation,
                        &format!("{action} request is not valid"),
                        json!({"schemaPath": v.location, "reason": v.message}),
                    )
                    .await;
                }
                ValidateError::Schema(e) => {
                    error!(charge_station_id, action, error = %e, "request schema unavailable");
                    self.emit_call_error(
                        charge_station_id,
                        message_id,
                        ErrorCode::InternalError,
                        "schema registry failure",
                        json!({"cause": e.to_string()}),
                    )
                    .await;
                }
            }
            return;
        }

        let outcome = AssertUnwindSafe(route.handler.handle(charge_station_id, &payload))
            .catch_unwind()
            .await;

        let response = match outcome {
            Err(panic) => {
                error!(
                    charge_station_id,
                    action,
                    panic = panic_message(&panic),
                    "handler panicked"
                );
                self.emit_call_error(
                    charge_station_id,
                    message_id,
                    ErrorCode::InternalError,
                    "handler panicked",
                    json!({}),
                )
                .await;
                return;
            }
            Ok(Err(e)) => {
                error!(charge_station_id, action, error = %e, "handler failed");
                self.emit_call_error(
                    charge_station_id,
                    message_id,
                    ErrorCode::InternalError,
                    &e.to_string(),
                    json!({"cause": e.to_string()}),
                )
                .await;
                return;
            }
            Ok(Ok(response)) => response,
        };

        // An invalid response is a bug in this process, not the station's.
        if let Err(e) = self.schemas.validate(&route.response_schema, &response) {
            error!(charge_station_id, action, error = %e, "response failed egress validation");
            self.emit_call_error(
                charge_station_id,
                message_id,
                ErrorCode::InternalError,
                &format!("{action} response failed validation"),
                json!({"cause": e.to_string()}),
            )
            .await;
            return;
        }

        self.emit(
            charge_station_id,
            &OcppFrame::CallResult {
                message_id: message_id.to_string(),
                payload: response,
            },
        )
        .await;
    }

    async fn handle_call_result(&self, charge_station_id: &str, message_id: &str, payload: Value) {
        let Some(pending) = self.pending.remove(charge_station_id, message_id) else {
            warn!(charge_station_id, message_id, "call result matches no pending call");
            return;
        };

        let Some(route) = self.call_result_routes.get(&pending.action) else {
            warn!(
                charge_station_id,
                action = pending.action.as_str(),
                "no result route for pending action"
            );
            return;
        };

        if let Err(e) = self.schemas.validate(&route.response_schema, &payload) {
            error!(
                charge_station_id,
                action = pending.action.as_str(),
                error = %e,
                "call result failed schema validation"
            );
            return;
        }

        let outcome = AssertUnwindSafe(route.handler.handle(
            charge_station_id,
            &pending.request,
            &payload,
            pending.state.clone(),
        ))
        .catch_unwind()
        .await;

        match outcome {
            Err(panic) => error!(
                charge_station_id,
                action = pending.action.as_str(),
                panic = panic_message(&panic),
                "result handler panicked"
            ),
            Ok(Err(e)) => error!(
                charge_station_id,
                action = pending.action.as_str(),
                error = %e,
                "result handler failed"
            ),
            Ok(Ok(())) => {}
        }
    }

    async fn handle_call_error(
        &self,
        charge_station_id: &str,
        message_id: &str,
        error_code: &str,
        error_description: &str,
    ) {
        let Some(pending) = self.pending.remove(charge_station_id, message_id) else {
            warn!(charge_station_id, message_id, error_code, "call error matches no pending call");
            return;
        };
        self.dispatch_call_error(&pending, error_code, error_description)
            .await;
    }

    async fn dispatch_call_error(
        &self,
        pending: &PendingCall,
        error_code: &str,
        error_description: &str,
    ) {
        let handler = self
            .call_result_routes
            .get(&pending.action)
            .and_then(|route| route.error_handler.clone());

        match handler {
            Some(handler) => {
                handler
                    .handle_call_error(
                        &pending.charge_station_id,
                        pending.request.clone(),
                        error_code,
                        error_description,
                    )
                    .await
            }
            None => warn!(
                charge_station_id = pending.charge_station_id.as_str(),
                action = pending.action.as_str(),
                error_code,
                error_description,
                "outbound call failed"
            ),
        }
    }

    /// Periodically evict expired pending calls, delivering a synthetic
    /// `Timeout` CallError to each call's error path. Runs until aborted.
    pub fn start_expiry_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let router = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                router.sweep_expired().await;
            }
        })
    }

    /// Single expiry pass; exposed for tests.
    pub async fn sweep_expired(&self) {
        for pending in self.pending.take_expired() {
            warn!(
                charge_station_id = pending.charge_station_id.as_str(),
                action = pending.action.as_str(),
                message_id = pending.message_id.as_str(),
                "pending call expired"
            );
            self.dispatch_call_error(
                &pending,
                ErrorCode::Timeout.as_str(),
                "no response before the call deadline",
            )
            .await;
        }
    }

    async fn emit_call_error(
        &self,
        charge_station_id: &str,
        message_id: &str,
        code: ErrorCode,
        description: &str,
        details: Value,
    ) {
        self.emit(
            charge_station_id,
            &OcppFrame::CallError {
                message_id: message_id.to_string(),
                error_code: code.as_str().to_string(),
                error_description: description.to_string(),
                error_details: details,
            },
        )
        .await;
    }

    async fn emit(&self, charge_station_id: &str, frame: &OcppFrame) {
        if let Err(e) = self
            .emitter
            .emit(self.ocpp_version, charge_station_id, frame)
            .await
        {
            error!(charge_station_id, error = %e, "failed to emit frame");
        }
    }
}

fn best_effort_message_id(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    value.get(1)?.as_str().map(str::to_string)
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
