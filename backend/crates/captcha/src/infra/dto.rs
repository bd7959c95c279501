//! Wire DTOs (Data Transfer Objects) for the grant server endpoints

use serde::{Deserialize, Serialize};

/// Body for POST {attestation_base}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttestationRequest<'a> {
    pub payment_id: &'a str,
}

/// Response for POST {attestation_base}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttestationResponse {
    #[serde(default)]
    pub unique_value: Option<String>,
}

/// Body for PUT {attestation_base}/{paymentId}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAttestationRequest<'a> {
    pub integrity_token: &'a str,
    pub unique_value: &'a str,
    pub package_name: &'a str,
}

/// Body for POST {captcha_base}/{paymentId}/{captchaId}
#[derive(Debug, Clone, Serialize)]
pub struct SolveCaptchaRequest<'a> {
    pub solution: &'a str,
}
