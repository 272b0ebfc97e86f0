//! has2be ISO 15118 extension messages
//!
//! Pre-standard variant of the plug-and-charge actions, tunnelled through
//! DataTransfer under the `iso15118` vendor namespace. The shapes are close
//! to OCPP 2.0.1 but not identical; the handlers convert to the 2.0.1 types
//! and delegate.

use serde::{Deserialize, Serialize};

use crate::ocpp::v201;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdToken {
    pub id_token: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub id_token: IdToken,
    #[serde(rename = "15118CertificateHashData", skip_serializing_if = "Option::is_none")]
    pub certificate_hash_data: Option<Vec<v201::OcspRequestData>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub id_token_info: v201::IdTokenInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCertificateStatusRequest {
    pub ocsp_request_data: v201::OcspRequestData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCertificateStatusResponse {
    pub status: v201::GetCertificateStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocsp_result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Get15118EvCertificateRequest {
    #[serde(rename = "15118SchemaVersion")]
    pub schema_version: String,
    pub exi_request: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Get15118EvCertificateResponse {
    pub status: v201::Iso15118EvCertificateStatus,
    pub exi_response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignCertificateRequest {
    pub csr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignCertificateResponse {
    pub status: v201::GenericStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSignedRequest {
    pub certificate_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateSignedResponse {
    pub status: v201::GenericStatus,
}
