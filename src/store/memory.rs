//! In-memory engine for tests and development

use async_trait::async_trait;
use dashmap::DashMap;

use super::{
    ChargeStationAuth, ChargeStationAuthStore, ChargeStationRuntimeDetails,
    ChargeStationRuntimeDetailsStore, ChargeStationSettings, ChargeStationSettingsStore,
    MeterValue, StoreResult, Token, TokenStore, Transaction, TransactionStore,
};

/// Implements every store port with concurrent maps. Settings merges take the
/// station's map entry lock, so per-station updates are serialised.
#[derive(Default)]
pub struct InMemoryEngine {
    tokens: DashMap<String, Token>,
    transactions: DashMap<(String, String), Transaction>,
    settings: DashMap<String, ChargeStationSettings>,
    runtime_details: DashMap<String, ChargeStationRuntimeDetails>,
    auth: DashMap<String, ChargeStationAuth>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryEngine {
    async fn set_token(&self, token: Token) -> StoreResult<()> {
        self.tokens.insert(token.uid.clone(), token);
        Ok(())
    }

    async fn lookup_token(&self, uid: &str) -> StoreResult<Option<Token>> {
        Ok(self.tokens.get(uid).map(|t| t.clone()))
    }
}

#[async_trait]
impl TransactionStore for InMemoryEngine {
    async fn create_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        id_token: &str,
        token_type: &str,
        meter_values: Vec<MeterValue>,
        start_seq_no: i32,
        offline: bool,
    ) -> StoreResult<()> {
        self.transactions.insert(
            (charge_station_id.to_string(), transaction_id.to_string()),
            Transaction {
                charge_station_id: charge_station_id.to_string(),
                transaction_id: transaction_id.to_string(),
                id_token: id_token.to_string(),
                token_type: token_type.to_string(),
                meter_values,
                start_seq_no,
                ended_seq_no: 0,
                updated_seq_no_count: 0,
                offline,
            },
        );
        Ok(())
    }

    async fn find_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        Ok(self
            .transactions
            .get(&(charge_station_id.to_string(), transaction_id.to_string()))
            .map(|t| t.clone()))
    }

    async fn update_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        meter_values: Vec<MeterValue>,
    ) -> StoreResult<()> {
        let key = (charge_station_id.to_string(), transaction_id.to_string());
        let mut entry = self.transactions.entry(key).or_insert_with(|| Transaction {
            charge_station_id: charge_station_id.to_string(),
            transaction_id: transaction_id.to_string(),
            id_token: String::new(),
            token_type: String::new(),
            meter_values: Vec::new(),
            start_seq_no: 0,
            ended_seq_no: 0,
            updated_seq_no_count: 0,
            offline: false,
        });
        entry.meter_values.extend(meter_values);
        entry.updated_seq_no_count += 1;
        Ok(())
    }

    async fn end_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        id_token: &str,
        token_type: &str,
        meter_values: Vec<MeterValue>,
        seq_no: i32,
    ) -> StoreResult<()> {
        let key = (charge_station_id.to_string(), transaction_id.to_string());
        let mut entry = self.transactions.entry(key).or_insert_with(|| Transaction {
            charge_station_id: charge_station_id.to_string(),
            transaction_id: transaction_id.to_string(),
            id_token: id_token.to_string(),
            token_type: token_type.to_string(),
            meter_values: Vec::new(),
            start_seq_no: 0,
            ended_seq_no: 0,
            updated_seq_no_count: 0,
            offline: false,
        });
        if entry.id_token.is_empty() {
            entry.id_token = id_token.to_string();
            entry.token_type = token_type.to_string();
        }
        entry.meter_values.extend(meter_values);
        entry.ended_seq_no = seq_no;
        Ok(())
    }
}

#[async_trait]
impl ChargeStationSettingsStore for InMemoryEngine {
    async fn update_settings(
        &self,
        charge_station_id: &str,
        settings: ChargeStationSettings,
    ) -> StoreResult<()> {
        let mut entry = self
            .settings
            .entry(charge_station_id.to_string())
            .or_insert_with(|| ChargeStationSettings {
                charge_station_id: charge_station_id.to_string(),
                settings: Default::default(),
            });
        entry.settings.extend(settings.settings);
        Ok(())
    }

    async fn lookup_settings(
        &self,
        charge_station_id: &str,
    ) -> StoreResult<Option<ChargeStationSettings>> {
        Ok(self.settings.get(charge_station_id).map(|s| s.clone()))
    }
}

#[async_trait]
impl ChargeStationRuntimeDetailsStore for InMemoryEngine {
    async fn set_runtime_details(
        &self,
        charge_station_id: &str,
        details: ChargeStationRuntimeDetails,
    ) -> StoreResult<()> {
        self.runtime_details
            .insert(charge_station_id.to_string(), details);
        Ok(())
    }

    async fn lookup_runtime_details(
        &self,
        charge_station_id: &str,
    ) -> StoreResult<Option<ChargeStationRuntimeDetails>> {
        Ok(self
            .runtime_details
            .get(charge_station_id)
            .map(|d| d.clone()))
    }
}

#[async_trait]
impl ChargeStationAuthStore for InMemoryEngine {
    async fn set_auth(&self, charge_station_id: &str, auth: ChargeStationAuth) -> StoreResult<()> {
        self.auth.insert(charge_station_id.to_string(), auth);
        Ok(())
    }

    async fn lookup_auth(&self, charge_station_id: &str) -> StoreResult<Option<ChargeStationAuth>> {
        Ok(self.auth.get(charge_station_id).map(|a| a.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChargeStationSetting, SettingStatus};

    fn token(uid: &str, valid: bool) -> Token {
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

    #[tokio::test]
    async fn token_lookup_by_uid() {
        let engine = InMemoryEngine::new();
        engine.set_token(token("MYRFIDTAG", true)).await.unwrap();

        let found = engine.lookup_token("MYRFIDTAG").await.unwrap().unwrap();
        assert!(found.valid);
        assert!(engine.lookup_token("OTHER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transactions_are_scoped_per_station() {
        let engine = InMemoryEngine::new();
        engine
            .create_transaction("cs001", "txn-1", "MYRFIDTAG", "ISO14443", vec![], 0, false)
            .await
            .unwrap();

        assert!(engine
            .find_transaction("cs001", "txn-1")
            .await
            .unwrap()
            .is_some());
        assert!(engine
            .find_transaction("cs002", "txn-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_transaction_appends_and_counts() {
        let engine = InMemoryEngine::new();
        engine
            .create_transaction("cs001", "txn-1", "MYRFIDTAG", "ISO14443", vec![], 0, false)
            .await
            .unwrap();

        let mv = MeterValue {
            timestamp: "2023-06-15T14:06:00Z".into(),
            sampled_values: vec![],
        };
        engine
            .update_transaction("cs001", "txn-1", vec![mv.clone()])
            .await
            .unwrap();
        engine
            .update_transaction("cs001", "txn-1", vec![mv])
            .await
            .unwrap();

        let txn = engine
            .find_transaction("cs001", "txn-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(txn.meter_values.len(), 2);
        assert_eq!(txn.updated_seq_no_count, 2);
    }

    #[tokio::test]
    async fn end_transaction_for_unknown_id_persists_end_state() {
        let engine = InMemoryEngine::new();
        engine
            .end_transaction("cs001", "txn-missing", "MYRFIDTAG", "ISO14443", vec![], -1)
            .await
            .unwrap();

        let txn = engine
            .find_transaction("cs001", "txn-missing")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(txn.ended_seq_no, -1);
        assert_eq!(txn.id_token, "MYRFIDTAG");
    }

    #[tokio::test]
    async fn settings_updates_merge_per_station() {
        let engine = InMemoryEngine::new();
        let mut first = ChargeStationSettings {
            charge_station_id: "cs001".into(),
            settings: Default::default(),
        };
        first.settings.insert(
            "HeartbeatInterval".into(),
            ChargeStationSetting {
                value: "300".into(),
                status: SettingStatus::Accepted,
            },
        );
        engine.update_settings("cs001", first).await.unwrap();

        let mut second = ChargeStationSettings {
            charge_station_id: "cs001".into(),
            settings: Default::default(),
        };
        second.settings.insert(
            "MeterValueSampleInterval".into(),
            ChargeStationSetting {
                value: "60".into(),
                status: SettingStatus::Pending,
            },
        );
        engine.update_settings("cs001", second).await.unwrap();

        let merged = engine.lookup_settings("cs001").await.unwrap().unwrap();
        assert_eq!(merged.settings.len(), 2);
        assert_eq!(
            merged.settings["MeterValueSampleInterval"].status,
            SettingStatus::Pending
        );
    }
}
