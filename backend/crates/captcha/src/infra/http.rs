//! HTTP Gateway Implementation
//!
//! The three grant server endpoints over JSON/HTTPS. Stateless: nothing
//! local is touched here, caching and counting belong to the use cases.

use crate::application::config::AttestationConfig;
use crate::domain::gateway::{
    AttestationEndpoint, CaptchaSolveEndpoint, PaymentAttestationEndpoint,
    PaymentAttestationRequest,
};
use crate::error::{AttestationError, AttestationResult};
use crate::infra::dto::{
    SolveCaptchaRequest, StartAttestationRequest, StartAttestationResponse,
    VerifyAttestationRequest,
};
use kernel::{CaptchaId, PaymentId};
use platform::http::JsonHttpClient;
use reqwest::{Method, StatusCode, Url};

/// Grant server gateway
#[derive(Debug, Clone)]
pub struct HttpAttestationGateway {
    client: JsonHttpClient,
    attestation_base: Url,
    captcha_base: Url,
}

impl HttpAttestationGateway {
    pub fn new(config: &AttestationConfig) -> AttestationResult<Self> {
        config.validate()?;
        let parse = |name: &str, raw: &str| {
            Url::parse(raw).map_err(|e| AttestationError::Config(format!("{name}: {e}")))
        };

        Ok(Self {
            client: JsonHttpClient::new(config.request_timeout)?,
            attestation_base: parse("attestation_base_url", &config.attestation_base_url)?,
            captcha_base: parse("captcha_base_url", &config.captcha_base_url)?,
        })
    }

    pub fn start_url(&self) -> Url {
        self.attestation_base.clone()
    }

    pub fn verify_url(&self, payment_id: &PaymentId) -> AttestationResult<Url> {
        with_segments(&self.attestation_base, &[payment_id.as_str()])
    }

    pub fn solve_url(&self, payment_id: &PaymentId, captcha_id: &CaptchaId) -> AttestationResult<Url> {
        with_segments(
            &self.captcha_base,
            &[payment_id.as_str(), captcha_id.as_str()],
        )
    }
}

/// Append escaped path segments to `base`
fn with_segments(base: &Url, segments: &[&str]) -> AttestationResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            AttestationError::Config(format!("{base} cannot take path segments"))
        })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

impl AttestationEndpoint for HttpAttestationGateway {
    async fn start(&self, payment_id: &PaymentId) -> AttestationResult<Option<String>> {
        let response = self
            .client
            .send(
                Method::POST,
                self.start_url(),
                &StartAttestationRequest {
                    payment_id: payment_id.as_str(),
                },
            )
            .await?
            .require(|status| status.is_success())?;

        let body: StartAttestationResponse = response.json()?;
        Ok(body.unique_value)
    }
}

impl PaymentAttestationEndpoint for HttpAttestationGateway {
    async fn verify(&self, request: &PaymentAttestationRequest) -> AttestationResult<()> {
        self.client
            .send(
                Method::PUT,
                self.verify_url(&request.payment_id)?,
                &VerifyAttestationRequest {
                    integrity_token: request.integrity_token.as_str(),
                    unique_value: request.unique_value.as_str(),
                    package_name: &request.package_name,
                },
            )
            .await?
            .require(|status| status == StatusCode::OK)?;
        Ok(())
    }
}

impl CaptchaSolveEndpoint for HttpAttestationGateway {
    async fn solve(
        &self,
        payment_id: &PaymentId,
        captcha_id: &CaptchaId,
        solution: &str,
    ) -> AttestationResult<()> {
        self.client
            .send(
                Method::POST,
                self.solve_url(payment_id, captcha_id)?,
                &SolveCaptchaRequest { solution },
            )
            .await?
            .require(|status| status == StatusCode::OK)?;
        Ok(())
    }
}
