//! has2be handlers
//!
//! Thin adapters over the OCPP 2.0.1 handlers: convert the pre-standard
//! shapes, delegate, convert back.

mod authorize;
mod certificate_signed_result;
mod get_15118_ev_certificate;
mod get_certificate_status;
mod sign_certificate;

pub use authorize::AuthorizeHandler;
pub use certificate_signed_result::CertificateSignedResultHandler;
pub use get_15118_ev_certificate::Get15118EvCertificateHandler;
pub use get_certificate_status::GetCertificateStatusHandler;
pub use sign_certificate::SignCertificateHandler;
