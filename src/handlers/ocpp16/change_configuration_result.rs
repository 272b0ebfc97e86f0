//! ChangeConfiguration result handler
//!
//! Records the station's verdict for the setting. A `RebootRequired` verdict
//! triggers a BootNotification request, but only once every other setting has
//! left the `Pending` state; the reboot will re-apply pending settings anyway
//! (see the BootNotification handler), so triggering earlier would reboot the
//! station more than once.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::call_maker::OcppCallMaker;
use crate::router::{CallResultHandler, HandlerError};
use crate::store::{
    ChargeStationSetting, ChargeStationSettings, ChargeStationSettingsStore, SettingStatus,
};

pub struct ChangeConfigurationResultHandler {
    pub settings_store: Arc<dyn ChargeStationSettingsStore>,
    pub call_maker: Arc<OcppCallMaker>,
}

#[async_trait]
impl CallResultHandler for ChangeConfigurationResultHandler {
    type Request = v16::ChangeConfigurationRequest;
    type Response = v16::ChangeConfigurationResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "setting.key" = request.key.as_str(),
            "setting.value" = request.value.as_str(),
            "setting.status" = response.status.as_str(),
            "configuration change answered"
        );

        let status = match response.status {
            v16::ConfigurationStatus::Accepted => SettingStatus::Accepted,
            v16::ConfigurationStatus::Rejected => SettingStatus::Rejected,
            v16::ConfigurationStatus::RebootRequired => SettingStatus::RebootRequired,
            v16::ConfigurationStatus::NotSupported => SettingStatus::NotSupported,
        };

        let mut settings = ChargeStationSettings {
            charge_station_id: charge_station_id.to_string(),
            settings: Default::default(),
        };
        settings.settings.insert(
            request.key.clone(),
            ChargeStationSetting {
                value: request.value.clone(),
                status,
            },
        );
        self.settings_store
            .update_settings(charge_station_id, settings)
            .await?;

        if status == SettingStatus::RebootRequired {
            let others_pending = self
                .settings_store
                .lookup_settings(charge_station_id)
                .await?
                .map(|settings| {
                    settings
                        .settings
                        .iter()
                        .any(|(key, s)| key != &request.key && s.status == SettingStatus::Pending)
                })
                .unwrap_or(false);

            if !others_pending {
                self.call_maker
                    .send(
                        charge_station_id,
                        v16::TriggerMessageRequest {
                            requested_message: v16::MessageTrigger::BootNotification,
                            connector_id: None,
                        },
                    )
                    .await?;
            }
        }

        Ok(())
    }
}
