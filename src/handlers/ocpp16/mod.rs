//! OCPP 1.6 handlers and routing tables

mod authorize;
mod boot_notification;
mod cancel_reservation_result;
mod change_availability_result;
mod change_configuration_result;
mod clear_cache_result;
mod data_transfer;
mod diagnostics_status_notification;
mod firmware_status_notification;
mod get_configuration_result;
mod heartbeat;
mod meter;
mod meter_values;
mod remote_start_transaction_result;
mod remote_stop_transaction_result;
mod reserve_now_result;
mod reset_result;
pub mod routing;
mod security_event_notification;
mod start_transaction;
mod status_notification;
mod stop_transaction;
mod trigger_message_result;
mod unlock_connector_result;

pub use authorize::AuthorizeHandler;
pub use boot_notification::BootNotificationHandler;
pub use cancel_reservation_result::CancelReservationResultHandler;
pub use change_availability_result::ChangeAvailabilityResultHandler;
pub use change_configuration_result::ChangeConfigurationResultHandler;
pub use clear_cache_result::ClearCacheResultHandler;
pub use data_transfer::{
    DataTransferCallRoutes, DataTransferHandler, DataTransferResultHandler,
    DataTransferResultRoutes,
};
pub use diagnostics_status_notification::DiagnosticsStatusNotificationHandler;
pub use firmware_status_notification::FirmwareStatusNotificationHandler;
pub use get_configuration_result::GetConfigurationResultHandler;
pub use heartbeat::HeartbeatHandler;
pub use meter_values::MeterValuesHandler;
pub use remote_start_transaction_result::RemoteStartTransactionResultHandler;
pub use remote_stop_transaction_result::RemoteStopTransactionResultHandler;
pub use reserve_now_result::ReserveNowResultHandler;
pub use reset_result::ResetResultHandler;
pub use routing::{new_call_maker, new_router};
pub use security_event_notification::SecurityEventNotificationHandler;
pub use start_transaction::{convert_to_uuid, StartTransactionHandler};
pub use status_notification::StatusNotificationHandler;
pub use stop_transaction::StopTransactionHandler;
pub use trigger_message_result::TriggerMessageResultHandler;
pub use unlock_connector_result::UnlockConnectorResultHandler;
