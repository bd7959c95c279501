//! Test doubles shared by the unit tests
//!
//! - In-process fakes for every gateway trait, recording calls in order
//! - A stub grant server on 127.0.0.1 for exercising the real HTTP gateway

use crate::domain::gateway::{
    AttestationEndpoint, CaptchaSolveEndpoint, IntegrityTokenClient, NonceProvider,
    PaymentAttestationEndpoint, PaymentAttestationRequest,
};
use crate::domain::value_objects::{IntegrityToken, Nonce};
use crate::error::{AttestationError, AttestationResult};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};
use kernel::{CaptchaId, PaymentId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// Token whose payload is `{"ctsProfileMatch":true,"basicIntegrity":true}`
pub const PASSING_TOKEN: &str =
    "h.eyJjdHNQcm9maWxlTWF0Y2giOnRydWUsImJhc2ljSW50ZWdyaXR5Ijp0cnVlfQ.s";

/// Token whose payload is `{"ctsProfileMatch":false,"basicIntegrity":true}`
pub const FAILING_TOKEN: &str =
    "h.eyJjdHNQcm9maWxlTWF0Y2giOmZhbHNlLCJiYXNpY0ludGVncml0eSI6dHJ1ZX0.s";

/// Ordered record of collaborator calls, shared between fakes
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// How a faked remote step behaves
#[derive(Debug, Clone)]
pub enum StepBehavior {
    Succeed,
    Status(u16),
    Transport,
    /// Never completes
    Hang,
    /// Completes after a delay
    Delay(Duration),
}

impl StepBehavior {
    async fn play(&self) -> AttestationResult<()> {
        match self {
            StepBehavior::Succeed => Ok(()),
            StepBehavior::Status(code) => Err(AttestationError::HttpStatus {
                code: *code,
                message: String::new(),
            }),
            StepBehavior::Transport => {
                Err(AttestationError::Transport("connection refused".to_string()))
            }
            StepBehavior::Hang => std::future::pending().await,
            StepBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }
}

/// Scripted grant server gateway
pub struct FakeGateway {
    pub calls: CallLog,
    pub start: StepBehavior,
    pub unique_value: Option<String>,
    pub verify: StepBehavior,
    pub solve: StepBehavior,
    pub verify_requests: Mutex<Vec<PaymentAttestationRequest>>,
    pub solve_requests: Mutex<Vec<(PaymentId, CaptchaId, String)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            start: StepBehavior::Succeed,
            unique_value: Some("abc".to_string()),
            verify: StepBehavior::Succeed,
            solve: StepBehavior::Succeed,
            verify_requests: Mutex::new(Vec::new()),
            solve_requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl AttestationEndpoint for FakeGateway {
    async fn start(&self, _payment_id: &PaymentId) -> AttestationResult<Option<String>> {
        self.calls.lock().push("start");
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.start.play().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map(|()| self.unique_value.clone())
    }
}

impl PaymentAttestationEndpoint for FakeGateway {
    async fn verify(&self, request: &PaymentAttestationRequest) -> AttestationResult<()> {
        self.calls.lock().push("verify");
        self.verify_requests.lock().push(request.clone());
        self.verify.play().await
    }
}

impl CaptchaSolveEndpoint for FakeGateway {
    async fn solve(
        &self,
        payment_id: &PaymentId,
        captcha_id: &CaptchaId,
        solution: &str,
    ) -> AttestationResult<()> {
        self.calls.lock().push("solve");
        self.solve_requests.lock().push((
            payment_id.clone(),
            captcha_id.clone(),
            solution.to_string(),
        ));
        self.solve.play().await
    }
}

/// Scripted integrity service
pub struct FakeIntegrity {
    pub calls: CallLog,
    pub behavior: StepBehavior,
    pub token: String,
    pub nonces: Mutex<Vec<String>>,
}

impl FakeIntegrity {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            behavior: StepBehavior::Succeed,
            token: PASSING_TOKEN.to_string(),
            nonces: Mutex::new(Vec::new()),
        }
    }
}

impl IntegrityTokenClient for FakeIntegrity {
    async fn request(&self, nonce: &str) -> AttestationResult<IntegrityToken> {
        self.calls.lock().push("integrity");
        self.nonces.lock().push(nonce.to_string());
        self.behavior
            .play()
            .await
            .map_err(|e| AttestationError::IntegrityService(e.to_string()))?;
        Ok(IntegrityToken::new(self.token.clone()))
    }
}

/// Always hands out the same nonce
pub struct FixedNonceProvider(pub Vec<u8>);

impl NonceProvider for FixedNonceProvider {
    fn generate(&self) -> Nonce {
        Nonce::from_bytes(self.0.clone())
    }
}

/// Request seen by the stub grant server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: serde_json::Value,
}

/// Status codes and bodies the stub grant server answers with
#[derive(Debug, Clone)]
pub struct StubBehavior {
    pub start_status: u16,
    pub start_body: serde_json::Value,
    pub verify_status: u16,
    pub solve_status: u16,
}

impl Default for StubBehavior {
    fn default() -> Self {
        Self {
            start_status: 201,
            start_body: serde_json::json!({ "uniqueValue": "abc" }),
            verify_status: 200,
            solve_status: 200,
        }
    }
}

#[derive(Clone)]
struct StubState {
    behavior: StubBehavior,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Grant server stand-in listening on an ephemeral local port
pub struct StubGrantServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubGrantServer {
    pub async fn spawn(behavior: StubBehavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            behavior,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/v1/attestations/android", post(stub_start))
            .route("/v1/attestations/android/{payment_id}", put(stub_verify))
            .route(
                "/v3/captcha/solution/{payment_id}/{captcha_id}",
                post(stub_solve),
            )
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn stub_start(
    State(state): State<StubState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.requests.lock().push(RecordedRequest {
        method: "POST",
        path: "/v1/attestations/android".to_string(),
        body,
    });
    (
        status(state.behavior.start_status),
        Json(state.behavior.start_body.clone()),
    )
}

async fn stub_verify(
    State(state): State<StubState>,
    Path(payment_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    state.requests.lock().push(RecordedRequest {
        method: "PUT",
        path: format!("/v1/attestations/android/{payment_id}"),
        body,
    });
    status(state.behavior.verify_status)
}

async fn stub_solve(
    State(state): State<StubState>,
    Path((payment_id, captcha_id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    state.requests.lock().push(RecordedRequest {
        method: "POST",
        path: format!("/v3/captcha/solution/{payment_id}/{captcha_id}"),
        body,
    });
    status(state.behavior.solve_status)
}
