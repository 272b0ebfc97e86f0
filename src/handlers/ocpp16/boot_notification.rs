//! BootNotification handler

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::ocpp::v16;
use crate::router::call_maker::OcppCallMaker;
use crate::router::{CallHandler, HandlerError};
use crate::store::{
    ChargeStationRuntimeDetails, ChargeStationRuntimeDetailsStore, ChargeStationSettingsStore,
    SettingStatus,
};
use crate::support::Clock;

pub struct BootNotificationHandler {
    pub clock: Arc<dyn Clock>,
    pub runtime_details_store: Arc<dyn ChargeStationRuntimeDetailsStore>,
    pub settings_store: Arc<dyn ChargeStationSettingsStore>,
    pub call_maker: Arc<OcppCallMaker>,
    pub heartbeat_interval: Duration,
}

#[async_trait]
impl CallHandler for BootNotificationHandler {
    type Request = v16::BootNotificationRequest;
    type Response = v16::BootNotificationResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        info!(
            charge_station_id,
            vendor = request.charge_point_vendor.as_str(),
            model = request.charge_point_model.as_str(),
            "charge station booted"
        );

        self.runtime_details_store
            .set_runtime_details(
                charge_station_id,
                ChargeStationRuntimeDetails {
                    ocpp_version: "1.6".to_string(),
                    booted_at: self.clock.now_rfc3339(),
                    vendor: request.charge_point_vendor.clone(),
                    model: request.charge_point_model.clone(),
                    firmware_version: request.firmware_version.clone(),
                },
            )
            .await?;

        // A reboot is the station picking up configuration it could not
        // apply live; push every still-pending setting now.
        if let Some(settings) = self
            .settings_store
            .lookup_settings(charge_station_id)
            .await?
        {
            for (key, setting) in &settings.settings {
                if setting.status == SettingStatus::Pending {
                    self.call_maker
                        .send(
                            charge_station_id,
                            v16::ChangeConfigurationRequest {
                                key: key.clone(),
                                value: setting.value.clone(),
                            },
                        )
                        .await?;
                }
            }
        }

        Ok(v16::BootNotificationResponse {
            status: v16::RegistrationStatus::Accepted,
            current_time: self.clock.now_rfc3339(),
            interval: self.heartbeat_interval.as_secs() as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocpp::OcppVersion;
    use crate::router::pending::PendingCallRegistry;
    use crate::store::memory::InMemoryEngine;
    use crate::store::{ChargeStationSetting, ChargeStationSettings};
    use crate::support::OcppFrame;
    use crate::testutil::{self, RecordingEmitter};

    fn boot_request() -> v16::BootNotificationRequest {
        v16::BootNotificationRequest {
            charge_point_vendor: "Solidstudio".into(),
            charge_point_model: "VCP-Test".into(),
            charge_point_serial_number: None,
            charge_box_serial_number: None,
            firmware_version: Some("1.2.3".into()),
            iccid: None,
            imsi: None,
            meter_type: None,
            meter_serial_number: None,
        }
    }

    fn handler(
        engine: &Arc<InMemoryEngine>,
        emitter: &Arc<RecordingEmitter>,
    ) -> BootNotificationHandler {
        let pending = Arc::new(PendingCallRegistry::default());
        BootNotificationHandler {
            clock: testutil::fixed_clock(),
            runtime_details_store: engine.clone(),
            settings_store: engine.clone(),
            call_maker: Arc::new(OcppCallMaker::new(
                emitter.clone(),
                pending,
                OcppVersion::V16,
            )),
            heartbeat_interval: Duration::from_secs(300),
        }
    }

    #[tokio::test]
    async fn boot_is_accepted_and_runtime_details_persisted() {
        let engine = Arc::new(InMemoryEngine::new());
        let emitter = Arc::new(RecordingEmitter::new());

        let response = handler(&engine, &emitter)
            .handle_call("cs001", boot_request())
            .await
            .unwrap();

        assert_eq!(response.status, v16::RegistrationStatus::Accepted);
        assert_eq!(response.current_time, "2023-06-15T14:06:00Z");
        assert_eq!(response.interval, 300);

        let details = engine
            .lookup_runtime_details("cs001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.ocpp_version, "1.6");
        assert_eq!(details.vendor, "Solidstudio");
        assert_eq!(details.model, "VCP-Test");
        assert_eq!(details.firmware_version.as_deref(), Some("1.2.3"));
        assert_eq!(details.booted_at, "2023-06-15T14:06:00Z");
    }

    #[tokio::test]
    async fn pending_settings_are_pushed_at_boot() {
        let engine = Arc::new(InMemoryEngine::new());
        let emitter = Arc::new(RecordingEmitter::new());

        let mut settings = ChargeStationSettings {
            charge_station_id: "cs001".into(),
            settings: Default::default(),
        };
        settings.settings.insert(
            "MeterValueSampleInterval".into(),
            ChargeStationSetting {
                value: "60".into(),
                status: SettingStatus::Pending,
            },
        );
        settings.settings.insert(
            "HeartbeatInterval".into(),
            ChargeStationSetting {
                value: "300".into(),
                status: SettingStatus::Accepted,
            },
        );
        engine.update_settings("cs001", settings).await.unwrap();

        handler(&engine, &emitter)
            .handle_call("cs001", boot_request())
            .await
            .unwrap();

        let frames = emitter.frames();
        assert_eq!(frames.len(), 1);
        match &frames[0].1 {
            OcppFrame::Call {
                action, payload, ..
            } => {
                assert_eq!(action, "ChangeConfiguration");
                assert_eq!(payload["key"], "MeterValueSampleInterval");
                assert_eq!(payload["value"], "60");
            }
            other => panic!("expected Call frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn boot_without_settings_sends_nothing() {
        let engine = Arc::new(InMemoryEngine::new());
        let emitter = Arc::new(RecordingEmitter::new());

        handler(&engine, &emitter)
            .handle_call("cs001", boot_request())
            .await
            .unwrap();

        assert!(emitter.frames().is_empty());
    }
}
