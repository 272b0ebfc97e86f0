//! GetConfiguration result handler

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};
use crate::store::{
    ChargeStationSetting, ChargeStationSettings, ChargeStationSettingsStore, SettingStatus,
};

pub struct GetConfigurationResultHandler {
    pub settings_store: Arc<dyn ChargeStationSettingsStore>,
}

#[async_trait]
impl CallResultHandler for GetConfigurationResultHandler {
    type Request = v16::GetConfigurationRequest;
    type Response = v16::GetConfigurationResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        let configuration_keys = response.configuration_key.unwrap_or_default();
        info!(
            charge_station_id,
            "get_configuration.keys_requested" =
                request.key.as_ref().map(Vec::len).unwrap_or(0),
            "get_configuration.keys_returned" = configuration_keys.len(),
            "get_configuration.unknown_keys" =
                response.unknown_key.as_ref().map(Vec::len).unwrap_or(0),
            "configuration read"
        );

        if configuration_keys.is_empty() {
            return Ok(());
        }

        // What the station reports as current configuration is what it
        // accepted, whatever we previously recorded.
        let mut settings = ChargeStationSettings {
            charge_station_id: charge_station_id.to_string(),
            settings: Default::default(),
        };
        for key_value in configuration_keys {
            settings.settings.insert(
                key_value.key,
                ChargeStationSetting {
                    value: key_value.value.unwrap_or_default(),
                    status: SettingStatus::Accepted,
                },
            );
        }
        self.settings_store
            .update_settings(charge_station_id, settings)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryEngine;

    #[tokio::test]
    async fn returned_keys_merge_into_settings_as_accepted() {
        let engine = Arc::new(InMemoryEngine::new());
        let handler = GetConfigurationResultHandler {
            settings_store: engine.clone(),
        };

        handler
            .handle_call_result(
                "cs001",
                v16::GetConfigurationRequest { key: None },
                v16::GetConfigurationResponse {
                    configuration_key: Some(vec![
                        v16::KeyValue {
                            key: "HeartbeatInterval".into(),
                            readonly: false,
                            value: Some("300".into()),
                        },
                        v16::KeyValue {
                            key: "NumberOfConnectors".into(),
                            readonly: true,
                            value: None,
                        },
                    ]),
                    unknown_key: Some(vec!["NoSuchKey".into()]),
                },
                None,
            )
            .await
            .unwrap();

        let settings = engine.lookup_settings("cs001").await.unwrap().unwrap();
        assert_eq!(settings.settings["HeartbeatInterval"].value, "300");
        assert_eq!(
            settings.settings["HeartbeatInterval"].status,
            SettingStatus::Accepted
        );
        assert_eq!(settings.settings["NumberOfConnectors"].value, "");
    }

    #[tokio::test]
    async fn empty_response_stores_nothing() {
        let engine = Arc::new(InMemoryEngine::new());
        let handler = GetConfigurationResultHandler {
            settings_store: engine.clone(),
        };

        handler
            .handle_call_result(
                "cs001",
                v16::GetConfigurationRequest { key: None },
                v16::GetConfigurationResponse::default(),
                None,
            )
            .await
            .unwrap();

        assert!(engine.lookup_settings("cs001").await.unwrap().is_none());
    }
}
