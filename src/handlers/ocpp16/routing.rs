//! OCPP 1.6 routing tables
//!
//! Binds every implemented action to its schemas and handler, including the
//! nested DataTransfer namespaces for ISO 15118 plug-and-charge
//! (`org.openchargealliance.iso15118pnc`) and the has2be precursor
//! (`iso15118`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::handlers::{has2be as handlers_has2be, ocpp201 as handlers201};
use crate::ocpp::OcppVersion;
use crate::router::call_maker::{DataTransferCallMaker, OcppCallMaker};
use crate::router::pending::PendingCallRegistry;
use crate::router::{CallResultRoute, CallRoute, Emitter, Router};
use crate::schema::SchemaRegistry;
use crate::services::{
    CertificateValidationService, ChargeStationCertificateProvider, ContractCertificateProvider,
    TokenAuthService,
};
use crate::store::Engine;
use crate::support::Clock;

use super::data_transfer::{DataTransferCallRoutes, DataTransferResultRoutes};
use super::*;

const PNC_VENDOR: &str = "org.openchargealliance.iso15118pnc";
const HAS2BE_VENDOR: &str = "iso15118";

/// The CallMaker for plain (non-tunnelled) CS-originated 1.6 actions.
pub fn new_call_maker(
    emitter: Arc<dyn Emitter>,
    pending: Arc<PendingCallRegistry>,
) -> OcppCallMaker {
    OcppCallMaker::new(emitter, pending, OcppVersion::V16)
}

/// Build the OCPP 1.6 router with the full action table.
#[allow(clippy::too_many_arguments)]
pub fn new_router<E: Engine + 'static>(
    emitter: Arc<dyn Emitter>,
    clock: Arc<dyn Clock>,
    engine: Arc<E>,
    certificate_validation: Arc<dyn CertificateValidationService>,
    charge_station_certificate_provider: Arc<dyn ChargeStationCertificateProvider>,
    contract_certificate_provider: Arc<dyn ContractCertificateProvider>,
    heartbeat_interval: Duration,
    schemas: Arc<SchemaRegistry>,
    pending: Arc<PendingCallRegistry>,
) -> Router {
    let standard_call_maker = Arc::new(new_call_maker(emitter.clone(), pending.clone()));
    let data_transfer_call_maker = Arc::new(DataTransferCallMaker::new(
        emitter.clone(),
        pending.clone(),
    ));
    let token_auth = Arc::new(TokenAuthService {
        token_store: engine.clone(),
    });

    let authorize201 = || handlers201::AuthorizeHandler {
        token_auth: token_auth.clone(),
        certificate_validation: certificate_validation.clone(),
    };
    let certificate_status201 = || handlers201::GetCertificateStatusHandler {
        certificate_validation: certificate_validation.clone(),
    };
    let sign_certificate201 = || handlers201::SignCertificateHandler {
        certificate_provider: charge_station_certificate_provider.clone(),
        call_maker: data_transfer_call_maker.clone(),
    };
    let ev_certificate201 = || handlers201::Get15118EvCertificateHandler {
        contract_certificate_provider: contract_certificate_provider.clone(),
    };

    let mut pnc_routes = HashMap::new();
    pnc_routes.insert(
        "Authorize".to_string(),
        CallRoute::new(
            "ocpp201/AuthorizeRequest.json",
            "ocpp201/AuthorizeResponse.json",
            authorize201(),
        ),
    );
    pnc_routes.insert(
        "GetCertificateStatus".to_string(),
        CallRoute::new(
            "ocpp201/GetCertificateStatusRequest.json",
            "ocpp201/GetCertificateStatusResponse.json",
            certificate_status201(),
        ),
    );
    pnc_routes.insert(
        "SignCertificate".to_string(),
        CallRoute::new(
            "ocpp201/SignCertificateRequest.json",
            "ocpp201/SignCertificateResponse.json",
            sign_certificate201(),
        ),
    );
    pnc_routes.insert(
        "Get15118EVCertificate".to_string(),
        CallRoute::new(
            "ocpp201/Get15118EVCertificateRequest.json",
            "ocpp201/Get15118EVCertificateResponse.json",
            ev_certificate201(),
        ),
    );

    let mut has2be_routes = HashMap::new();
    has2be_routes.insert(
        "Authorize".to_string(),
        CallRoute::new(
            "has2be/AuthorizeRequest.json",
            "has2be/AuthorizeResponse.json",
            handlers_has2be::AuthorizeHandler {
                handler201: authorize201(),
            },
        ),
    );
    has2be_routes.insert(
        "GetCertificateStatus".to_string(),
        CallRoute::new(
            "has2be/GetCertificateStatusRequest.json",
            "has2be/GetCertificateStatusResponse.json",
            handlers_has2be::GetCertificateStatusHandler {
                handler201: certificate_status201(),
            },
        ),
    );
    has2be_routes.insert(
        "SignCertificate".to_string(),
        CallRoute::new(
            "has2be/SignCertificateRequest.json",
            "has2be/SignCertificateResponse.json",
            handlers_has2be::SignCertificateHandler {
                handler201: sign_certificate201(),
            },
        ),
    );
    has2be_routes.insert(
        "Get15118EVCertificate".to_string(),
        CallRoute::new(
            "has2be/Get15118EVCertificateRequest.json",
            "has2be/Get15118EVCertificateResponse.json",
            handlers_has2be::Get15118EvCertificateHandler {
                handler201: ev_certificate201(),
            },
        ),
    );

    let mut data_transfer_call_routes: DataTransferCallRoutes = HashMap::new();
    data_transfer_call_routes.insert(PNC_VENDOR.to_string(), pnc_routes);
    data_transfer_call_routes.insert(HAS2BE_VENDOR.to_string(), has2be_routes);

    let mut pnc_result_routes = HashMap::new();
    pnc_result_routes.insert(
        "CertificateSigned".to_string(),
        CallResultRoute::new(
            "ocpp201/CertificateSignedRequest.json",
            "ocpp201/CertificateSignedResponse.json",
            handlers201::CertificateSignedResultHandler,
        ),
    );
    pnc_result_routes.insert(
        "InstallCertificate".to_string(),
        CallResultRoute::new(
            "ocpp201/InstallCertificateRequest.json",
            "ocpp201/InstallCertificateResponse.json",
            handlers201::InstallCertificateResultHandler,
        ),
    );
    pnc_result_routes.insert(
        "TriggerMessage".to_string(),
        CallResultRoute::new(
            "ocpp201/TriggerMessageRequest.json",
            "ocpp201/TriggerMessageResponse.json",
            handlers201::TriggerMessageResultHandler,
        ),
    );

    let mut has2be_result_routes = HashMap::new();
    has2be_result_routes.insert(
        "CertificateSigned".to_string(),
        CallResultRoute::new(
            "has2be/CertificateSignedRequest.json",
            "has2be/CertificateSignedResponse.json",
            handlers_has2be::CertificateSignedResultHandler,
        ),
    );

    let mut data_transfer_result_routes: DataTransferResultRoutes = HashMap::new();
    data_transfer_result_routes.insert(PNC_VENDOR.to_string(), pnc_result_routes);
    data_transfer_result_routes.insert(HAS2BE_VENDOR.to_string(), has2be_result_routes);

    let mut call_routes = HashMap::new();
    call_routes.insert(
        "BootNotification".to_string(),
        CallRoute::new(
            "ocpp16/BootNotification.json",
            "ocpp16/BootNotificationResponse.json",
            BootNotificationHandler {
                clock: clock.clone(),
                runtime_details_store: engine.clone(),
                settings_store: engine.clone(),
                call_maker: standard_call_maker.clone(),
                heartbeat_interval,
            },
        ),
    );
    call_routes.insert(
        "Heartbeat".to_string(),
        CallRoute::new(
            "ocpp16/Heartbeat.json",
            "ocpp16/HeartbeatResponse.json",
            HeartbeatHandler {
                clock: clock.clone(),
            },
        ),
    );
    call_routes.insert(
        "StatusNotification".to_string(),
        CallRoute::new(
            "ocpp16/StatusNotification.json",
            "ocpp16/StatusNotificationResponse.json",
            StatusNotificationHandler,
        ),
    );
    call_routes.insert(
        "Authorize".to_string(),
        CallRoute::new(
            "ocpp16/Authorize.json",
            "ocpp16/AuthorizeResponse.json",
            AuthorizeHandler {
                token_store: engine.clone(),
            },
        ),
    );
    call_routes.insert(
        "StartTransaction".to_string(),
        CallRoute::new(
            "ocpp16/StartTransaction.json",
            "ocpp16/StartTransactionResponse.json",
            StartTransactionHandler {
                clock: clock.clone(),
                token_store: engine.clone(),
                transaction_store: engine.clone(),
            },
        ),
    );
    call_routes.insert(
        "StopTransaction".to_string(),
        CallRoute::new(
            "ocpp16/StopTransaction.json",
            "ocpp16/StopTransactionResponse.json",
            StopTransactionHandler {
                clock: clock.clone(),
                token_store: engine.clone(),
                transaction_store: engine.clone(),
            },
        ),
    );
    call_routes.insert(
        "MeterValues".to_string(),
        CallRoute::new(
            "ocpp16/MeterValues.json",
            "ocpp16/MeterValuesResponse.json",
            MeterValuesHandler {
                transaction_store: engine.clone(),
            },
        ),
    );
    call_routes.insert(
        "SecurityEventNotification".to_string(),
        CallRoute::new(
            "ocpp16/SecurityEventNotification.json",
            "ocpp16/SecurityEventNotificationResponse.json",
            SecurityEventNotificationHandler,
        ),
    );
    call_routes.insert(
        "FirmwareStatusNotification".to_string(),
        CallRoute::new(
            "ocpp16/FirmwareStatusNotification.json",
            "ocpp16/FirmwareStatusNotificationResponse.json",
            FirmwareStatusNotificationHandler,
        ),
    );
    call_routes.insert(
        "DiagnosticsStatusNotification".to_string(),
        CallRoute::new(
            "ocpp16/DiagnosticsStatusNotification.json",
            "ocpp16/DiagnosticsStatusNotificationResponse.json",
            DiagnosticsStatusNotificationHandler,
        ),
    );
    call_routes.insert(
        "DataTransfer".to_string(),
        CallRoute::new(
            "ocpp16/DataTransfer.json",
            "ocpp16/DataTransferResponse.json",
            DataTransferHandler {
                schemas: schemas.clone(),
                call_routes: data_transfer_call_routes,
            },
        ),
    );

    let mut call_result_routes = HashMap::new();
    call_result_routes.insert(
        "DataTransfer".to_string(),
        CallResultRoute::new(
            "ocpp16/DataTransfer.json",
            "ocpp16/DataTransferResponse.json",
            DataTransferResultHandler {
                schemas: schemas.clone(),
                call_result_routes: data_transfer_result_routes,
            },
        ),
    );
    call_result_routes.insert(
        "ChangeConfiguration".to_string(),
        CallResultRoute::new(
            "ocpp16/ChangeConfiguration.json",
            "ocpp16/ChangeConfigurationResponse.json",
            ChangeConfigurationResultHandler {
                settings_store: engine.clone(),
                call_maker: standard_call_maker.clone(),
            },
        ),
    );
    call_result_routes.insert(
        "TriggerMessage".to_string(),
        CallResultRoute::new(
            "ocpp16/TriggerMessage.json",
            "ocpp16/TriggerMessageResponse.json",
            TriggerMessageResultHandler,
        ),
    );
    call_result_routes.insert(
        "RemoteStartTransaction".to_string(),
        CallResultRoute::new(
            "ocpp16/RemoteStartTransaction.json",
            "ocpp16/RemoteStartTransactionResponse.json",
            RemoteStartTransactionResultHandler,
        ),
    );
    call_result_routes.insert(
        "ReserveNow".to_string(),
        CallResultRoute::new(
            "ocpp16/ReserveNow.json",
            "ocpp16/ReserveNowResponse.json",
            ReserveNowResultHandler,
        ),
    );
    call_result_routes.insert(
        "CancelReservation".to_string(),
        CallResultRoute::new(
            "ocpp16/CancelReservation.json",
            "ocpp16/CancelReservationResponse.json",
            CancelReservationResultHandler,
        ),
    );
    call_result_routes.insert(
        "ChangeAvailability".to_string(),
        CallResultRoute::new(
            "ocpp16/ChangeAvailability.json",
            "ocpp16/ChangeAvailabilityResponse.json",
            ChangeAvailabilityResultHandler,
        ),
    );
    call_result_routes.insert(
        "ClearCache".to_string(),
        CallResultRoute::new(
            "ocpp16/ClearCache.json",
            "ocpp16/ClearCacheResponse.json",
            ClearCacheResultHandler,
        ),
    );
    call_result_routes.insert(
        "GetConfiguration".to_string(),
        CallResultRoute::new(
            "ocpp16/GetConfiguration.json",
            "ocpp16/GetConfigurationResponse.json",
            GetConfigurationResultHandler {
                settings_store: engine.clone(),
            },
        ),
    );
    call_result_routes.insert(
        "RemoteStopTransaction".to_string(),
        CallResultRoute::new(
            "ocpp16/RemoteStopTransaction.json",
            "ocpp16/RemoteStopTransactionResponse.json",
            RemoteStopTransactionResultHandler,
        ),
    );
    call_result_routes.insert(
        "Reset".to_string(),
        CallResultRoute::new(
            "ocpp16/Reset.json",
            "ocpp16/ResetResponse.json",
            ResetResultHandler,
        ),
    );
    call_result_routes.insert(
        "UnlockConnector".to_string(),
        CallResultRoute::new(
            "ocpp16/UnlockConnector.json",
            "ocpp16/UnlockConnectorResponse.json",
            UnlockConnectorResultHandler,
        ),
    );

    Router::new(
        OcppVersion::V16,
        emitter,
        schemas,
        pending,
        call_routes,
        call_result_routes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocpp::v16;
    use crate::router::pending::PendingCallRegistry;
    use crate::services::{
        ContractCertificates, ServiceError, UnconfiguredPki,
    };
    use crate::store::memory::InMemoryEngine;
    use crate::store::{
        ChargeStationRuntimeDetailsStore, ChargeStationSettingsStore, SettingStatus, TokenStore,
        TransactionStore,
    };
    use crate::support::OcppFrame;
    use crate::testutil::{self, RecordingEmitter};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct AcceptAllPki;

    #[async_trait]
    impl crate::services::CertificateValidationService for AcceptAllPki {
        async fn validate_pem_chain(
            &self,
            _pem_chain: &str,
        ) -> Result<Option<String>, ServiceError> {
            Ok(Some("b2NzcA==".into()))
        }

        async fn validate_hashed_chain(
            &self,
            _ocsp_data: &[crate::ocpp::v201::OcspRequestData],
        ) -> Result<Option<String>, ServiceError> {
            Ok(Some("b2NzcA==".into()))
        }
    }

    #[async_trait]
    impl crate::services::ChargeStationCertificateProvider for AcceptAllPki {
        async fn provide_certificate(&self, _csr: &str) -> Result<String, ServiceError> {
            Ok("-----BEGIN CERTIFICATE-----".into())
        }
    }

    #[async_trait]
    impl crate::services::ContractCertificateProvider for AcceptAllPki {
        async fn provide_contract_certificates(
            &self,
            _request: &crate::ocpp::v201::Get15118EvCertificateRequest,
        ) -> Result<ContractCertificates, ServiceError> {
            Ok(ContractCertificates {
                status: crate::ocpp::v201::Iso15118EvCertificateStatus::Accepted,
                exi_response: "ZXhp".into(),
            })
        }
    }

    struct Fixture {
        engine: Arc<InMemoryEngine>,
        emitter: Arc<RecordingEmitter>,
        pending: Arc<PendingCallRegistry>,
        router: Router,
    }

    fn fixture() -> Fixture {
        fixture_with_timeout(std::time::Duration::from_secs(30))
    }

    fn fixture_with_timeout(timeout: std::time::Duration) -> Fixture {
        let engine = Arc::new(InMemoryEngine::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let pending = Arc::new(PendingCallRegistry::new(timeout));
        let pki = Arc::new(AcceptAllPki);
        let router = new_router(
            emitter.clone(),
            testutil::fixed_clock(),
            engine.clone(),
            pki.clone(),
            pki.clone(),
            pki,
            std::time::Duration::from_secs(300),
            testutil::schema_registry(),
            pending.clone(),
        );
        Fixture {
            engine,
            emitter,
            pending,
            router,
        }
    }

    fn call(id: &str, action: &str, payload: Value) -> String {
        OcppFrame::Call {
            message_id: id.into(),
            action: action.into(),
            payload,
        }
        .serialize()
    }

    fn only_frame(emitter: &RecordingEmitter) -> OcppFrame {
        let frames = emitter.frames();
        assert_eq!(frames.len(), 1, "expected exactly one frame, got {frames:?}");
        frames[0].1.clone()
    }

    fn expect_call_result(frame: &OcppFrame, id: &str) -> Value {
        match frame {
            OcppFrame::CallResult {
                message_id,
                payload,
            } => {
                assert_eq!(message_id, id);
                payload.clone()
            }
            other => panic!("expected CallResult, got {other:?}"),
        }
    }

    fn expect_call_error(frame: &OcppFrame, id: &str, code: &str) -> (String, Value) {
        match frame {
            OcppFrame::CallError {
                message_id,
                error_code,
                error_description,
                error_details,
            } => {
                assert_eq!(message_id, id);
                assert_eq!(error_code, code);
                (error_description.clone(), error_details.clone())
            }
            other => panic!("expected CallError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn boot_notification_round_trip() {
        let f = fixture();
        f.router
            .handle(
                "cs001",
                &call(
                    "1",
                    "BootNotification",
                    json!({"chargePointModel": "VCP-Test", "chargePointVendor": "Solidstudio"}),
                ),
            )
            .await;

        let payload = expect_call_result(&only_frame(&f.emitter), "1");
        assert_eq!(payload["status"], "Accepted");
        assert_eq!(payload["currentTime"], "2023-06-15T14:06:00Z");
        assert_eq!(payload["interval"], 300);

        let details = f
            .engine
            .lookup_runtime_details("cs001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.vendor, "Solidstudio");
        assert_eq!(details.model, "VCP-Test");
    }

    #[tokio::test]
    async fn authorize_round_trip() {
        let f = fixture();
        f.engine
            .set_token(testutil::token("MYRFIDTAG", true))
            .await
            .unwrap();

        f.router
            .handle("cs001", &call("2", "Authorize", json!({"idTag": "MYRFIDTAG"})))
            .await;

        let payload = expect_call_result(&only_frame(&f.emitter), "2");
        assert_eq!(payload, json!({"idTagInfo": {"status": "Accepted"}}));
    }

    #[tokio::test]
    async fn transaction_lifecycle_over_the_wire() {
        let f = fixture();
        f.engine
            .set_token(testutil::token("MYRFIDTAG", true))
            .await
            .unwrap();

        f.router
            .handle(
                "cs001",
                &call(
                    "3",
                    "StartTransaction",
                    json!({
                        "connectorId": 1,
                        "idTag": "MYRFIDTAG",
                        "meterStart": 0,
                        "timestamp": "2023-06-15T14:00:00Z"
                    }),
                ),
            )
            .await;

        let payload = expect_call_result(&f.emitter.frames()[0].1, "3");
        assert_eq!(payload["idTagInfo"]["status"], "Accepted");
        let transaction_id = payload["transactionId"].as_i64().unwrap() as i32;

        let transaction = f
            .engine
            .find_transaction("cs001", &convert_to_uuid(transaction_id))
            .await
            .unwrap()
            .unwrap();
        let begin = &transaction.meter_values[0].sampled_values[0];
        assert_eq!(begin.context.as_deref(), Some("Transaction.Begin"));
        assert_eq!(begin.value, 0.0);

        f.router
            .handle(
                "cs001",
                &call(
                    "4",
                    "StopTransaction",
                    json!({
                        "idTag": "MYRFIDTAG",
                        "meterStop": 1000,
                        "timestamp": "2023-06-15T15:00:00Z",
                        "transactionId": transaction_id
                    }),
                ),
            )
            .await;

        let payload = expect_call_result(&f.emitter.frames()[1].1, "4");
        assert_eq!(payload, json!({"idTagInfo": {"status": "Accepted"}}));

        let transaction = f
            .engine
            .find_transaction("cs001", &convert_to_uuid(transaction_id))
            .await
            .unwrap()
            .unwrap();
        let end: Vec<_> = transaction
            .meter_values
            .iter()
            .flat_map(|mv| &mv.sampled_values)
            .filter(|sv| sv.context.as_deref() == Some("Transaction.End"))
            .collect();
        assert_eq!(end.len(), 1);
        assert_eq!(end[0].value, 1000.0);
        assert_eq!(
            end[0].measurand.as_deref(),
            Some("Energy.Active.Import.Register")
        );
    }

    #[tokio::test]
    async fn signed_meter_data_surfaces_as_internal_error() {
        let f = fixture();
        f.engine
            .set_token(testutil::token("MYRFIDTAG", true))
            .await
            .unwrap();

        f.router
            .handle(
                "cs001",
                &call(
                    "5",
                    "StopTransaction",
                    json!({
                        "idTag": "MYRFIDTAG",
                        "meterStop": 1000,
                        "timestamp": "2023-06-15T15:00:00Z",
                        "transactionId": 77,
                        "transactionData": [{
                            "timestamp": "2023-06-15T15:00:00Z",
                            "sampledValue": [{"value": "DEADBEEF", "format": "SignedData"}]
                        }]
                    }),
                ),
            )
            .await;

        let (description, details) =
            expect_call_error(&only_frame(&f.emitter), "5", "InternalError");
        assert!(description.contains("conversion from signed data not implemented"));
        assert!(details["cause"]
            .as_str()
            .unwrap()
            .contains("conversion from signed data not implemented"));
    }

    #[tokio::test]
    async fn change_configuration_result_triggers_boot_notification() {
        let f = fixture();
        let call_maker = new_call_maker(f.emitter.clone(), f.pending.clone());

        call_maker
            .send(
                "cs001",
                v16::ChangeConfigurationRequest {
                    key: "MeterValueSampleInterval".into(),
                    value: "60".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(f.pending.len(), 1);

        let message_id = match &f.emitter.frames()[0].1 {
            OcppFrame::Call { message_id, .. } => message_id.clone(),
            other => panic!("expected Call, got {other:?}"),
        };

        let result = OcppFrame::CallResult {
            message_id: message_id.clone(),
            payload: json!({"status": "RebootRequired"}),
        };
        f.router.handle("cs001", &result.serialize()).await;

        // The ChangeConfiguration entry was consumed; the one remaining
        // entry belongs to the TriggerMessage just issued.
        assert_eq!(f.pending.len(), 1);
        assert!(f.pending.remove("cs001", &message_id).is_none());

        let settings = f.engine.lookup_settings("cs001").await.unwrap().unwrap();
        assert_eq!(
            settings.settings["MeterValueSampleInterval"].status,
            SettingStatus::RebootRequired
        );

        let triggers: Vec<_> = f
            .emitter
            .frames()
            .iter()
            .filter_map(|(_, frame)| match frame {
                OcppFrame::Call {
                    action, payload, ..
                } if action == "TriggerMessage" => Some(payload.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0]["requestedMessage"], "BootNotification");
    }

    #[tokio::test]
    async fn unknown_action_yields_not_implemented() {
        let f = fixture();
        f.router
            .handle("cs001", &call("9", "NoSuchAction", json!({})))
            .await;
        let (description, _) =
            expect_call_error(&only_frame(&f.emitter), "9", "NotImplemented");
        assert!(description.contains("NoSuchAction"));
    }

    #[tokio::test]
    async fn schema_violation_yields_format_violation_with_details() {
        let f = fixture();
        f.router
            .handle("cs001", &call("10", "Authorize", json!({"idTag": 42})))
            .await;

        let (_, details) =
            expect_call_error(&only_frame(&f.emitter), "10", "FormatViolation");
        assert_eq!(details["schemaPath"], "/idTag");
        assert!(details["reason"].as_str().is_some());
    }

    #[tokio::test]
    async fn malformed_frame_yields_protocol_error() {
        let f = fixture();
        f.router.handle("cs001", r#"{"not": "an array"}"#).await;
        expect_call_error(&only_frame(&f.emitter), "-1", "ProtocolError");

        // Bad discriminant but recoverable id.
        f.router.handle("cs001", r#"[7,"77","Heartbeat",{}]"#).await;
        expect_call_error(&f.emitter.frames()[1].1, "77", "ProtocolError");
    }

    #[tokio::test]
    async fn unmatched_call_result_is_dropped() {
        let f = fixture();
        f.router
            .handle(
                "cs001",
                &OcppFrame::CallResult {
                    message_id: "never-sent".into(),
                    payload: json!({"status": "Accepted"}),
                }
                .serialize(),
            )
            .await;
        assert!(f.emitter.frames().is_empty());
    }

    #[tokio::test]
    async fn call_error_consumes_pending_entry() {
        let f = fixture();
        let call_maker = new_call_maker(f.emitter.clone(), f.pending.clone());
        call_maker
            .send(
                "cs001",
                v16::ResetRequest {
                    kind: v16::ResetType::Soft,
                },
            )
            .await
            .unwrap();

        let message_id = match &f.emitter.frames()[0].1 {
            OcppFrame::Call { message_id, .. } => message_id.clone(),
            other => panic!("expected Call, got {other:?}"),
        };

        f.router
            .handle(
                "cs001",
                &OcppFrame::CallError {
                    message_id,
                    error_code: "NotSupported".into(),
                    error_description: "cannot reset".into(),
                    error_details: json!({}),
                }
                .serialize(),
            )
            .await;
        assert!(f.pending.is_empty());
    }

    #[tokio::test]
    async fn expired_pending_calls_are_swept() {
        let f = fixture_with_timeout(std::time::Duration::from_secs(0));
        let call_maker = new_call_maker(f.emitter.clone(), f.pending.clone());
        call_maker
            .send("cs001", v16::ClearCacheRequest {})
            .await
            .unwrap();
        assert_eq!(f.pending.len(), 1);

        f.router.sweep_expired().await;
        assert!(f.pending.is_empty());
    }

    #[tokio::test]
    async fn tunnelled_authorize_round_trip() {
        let f = fixture();
        f.engine
            .set_token(testutil::token("GBTWK012345678V", true))
            .await
            .unwrap();

        let inner = json!({"idToken": {"idToken": "GBTWK012345678V", "type": "eMAID"}});
        f.router
            .handle(
                "cs001",
                &call(
                    "20",
                    "DataTransfer",
                    json!({
                        "vendorId": "org.openchargealliance.iso15118pnc",
                        "messageId": "Authorize",
                        "data": inner.to_string()
                    }),
                ),
            )
            .await;

        let payload = expect_call_result(&only_frame(&f.emitter), "20");
        assert_eq!(payload["status"], "Accepted");
        let nested: Value = serde_json::from_str(payload["data"].as_str().unwrap()).unwrap();
        assert_eq!(nested["idTokenInfo"]["status"], "Accepted");
    }

    #[tokio::test]
    async fn tunnelled_has2be_authorize_round_trip() {
        let f = fixture();
        f.engine
            .set_token(testutil::token("GBTWK012345678V", true))
            .await
            .unwrap();

        let inner = json!({"idToken": {"idToken": "GBTWK012345678V", "type": "eMAID"}});
        f.router
            .handle(
                "cs001",
                &call(
                    "21",
                    "DataTransfer",
                    json!({
                        "vendorId": "iso15118",
                        "messageId": "Authorize",
                        "data": inner.to_string()
                    }),
                ),
            )
            .await;

        let payload = expect_call_result(&only_frame(&f.emitter), "21");
        assert_eq!(payload["status"], "Accepted");
    }

    #[tokio::test]
    async fn tunnelled_unknown_vendor_is_reported_in_band() {
        let f = fixture();
        f.router
            .handle(
                "cs001",
                &call(
                    "22",
                    "DataTransfer",
                    json!({"vendorId": "com.example.unknown", "messageId": "Anything"}),
                ),
            )
            .await;

        let payload = expect_call_result(&only_frame(&f.emitter), "22");
        assert_eq!(payload["status"], "UnknownVendorId");
    }

    #[tokio::test]
    async fn tunnelled_certificate_signed_result_correlates() {
        let f = fixture();
        let data_transfer_maker =
            DataTransferCallMaker::new(f.emitter.clone(), f.pending.clone());
        data_transfer_maker
            .send(
                "cs001",
                crate::ocpp::v201::CertificateSignedRequest {
                    certificate_chain: "-----BEGIN CERTIFICATE-----".into(),
                    certificate_type: None,
                },
            )
            .await
            .unwrap();

        let message_id = match &f.emitter.frames()[0].1 {
            OcppFrame::Call { message_id, .. } => message_id.clone(),
            other => panic!("expected Call, got {other:?}"),
        };

        f.router
            .handle(
                "cs001",
                &OcppFrame::CallResult {
                    message_id,
                    payload: json!({
                        "status": "Accepted",
                        "data": json!({"status": "Accepted"}).to_string()
                    }),
                }
                .serialize(),
            )
            .await;

        assert!(f.pending.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_pki_rejects_sign_certificate_in_band() {
        let engine = Arc::new(InMemoryEngine::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let pending = Arc::new(PendingCallRegistry::default());
        let pki = Arc::new(UnconfiguredPki);
        let router = new_router(
            emitter.clone(),
            testutil::fixed_clock(),
            engine,
            pki.clone(),
            pki.clone(),
            pki,
            std::time::Duration::from_secs(300),
            testutil::schema_registry(),
            pending,
        );

        let inner = json!({"csr": "-----BEGIN CERTIFICATE REQUEST-----"});
        router
            .handle(
                "cs001",
                &call(
                    "23",
                    "DataTransfer",
                    json!({
                        "vendorId": "org.openchargealliance.iso15118pnc",
                        "messageId": "SignCertificate",
                        "data": inner.to_string()
                    }),
                ),
            )
            .await;

        let payload = expect_call_result(&only_frame(&emitter), "23");
        assert_eq!(payload["status"], "Accepted");
        let nested: Value = serde_json::from_str(payload["data"].as_str().unwrap()).unwrap();
        assert_eq!(nested["status"], "Rejected");
    }
}
