//! OCPP 2.0.1 handlers for the ISO 15118 actions tunnelled via DataTransfer

mod authorize;
mod certificate_signed_result;
mod get_15118_ev_certificate;
mod get_certificate_status;
mod install_certificate_result;
mod sign_certificate;
mod trigger_message_result;

pub use authorize::AuthorizeHandler;
pub use certificate_signed_result::CertificateSignedResultHandler;
pub use get_15118_ev_certificate::Get15118EvCertificateHandler;
pub use get_certificate_status::GetCertificateStatusHandler;
pub use install_certificate_result::InstallCertificateResultHandler;
pub use sign_certificate::SignCertificateHandler;
pub use trigger_message_result::TriggerMessageResultHandler;
