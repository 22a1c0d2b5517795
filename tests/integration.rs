use imagenerator::{
    config::{Config, Profile},
    dispatch::{self, Dispatcher},
    inference::{HfInferenceClient, InferenceService, MockInferenceClient},
    models::GenerationRequest,
    server::{self, AppState},
    Error,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/models/black-forest-labs/FLUX.1-schnell";

fn config_from(vars: &[(&str, &str)], profile: Option<Profile>) -> imagenerator::Result<Config> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| map.get(key).cloned(), profile)
}

fn dispatcher_for(config: &Config) -> Dispatcher {
    let client = HfInferenceClient::new(config.hf_token.clone(), Duration::from_secs(5))
        .unwrap()
        .with_base_url(config.inference_url.clone().unwrap());
    Dispatcher::new(Arc::new(client), config.dispatch.clone())
}

async fn spawn_app(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, state));
    format!("http://{}", addr)
}

#[test]
fn test_missing_token_refuses_to_start() {
    let err = config_from(&[("PORT", "8080")], None).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_enhanced_dispatch_against_inference_endpoint() {
    let hf = MockServer::start().await;
    let image = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Bearer hf_integration"))
        .and(body_partial_json(serde_json::json!({
            "inputs": "a beautiful sunset, anatomical excellence, perfectly rendered hands, \
                       five fingers, accurate joints, photorealistic, cinematic lighting, \
                       8k resolution, sharp focus",
            "parameters": { "num_inference_steps": 8, "guidance_scale": 0.0 }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(image.clone()),
        )
        .expect(1)
        .mount(&hf)
        .await;

    let uri = hf.uri();
    let config = config_from(
        &[("HF_TOKEN", "hf_integration"), ("HF_INFERENCE_URL", uri.as_str())],
        Some(Profile::Enhanced),
    )
    .unwrap();

    let artifact = dispatcher_for(&config)
        .dispatch("  a beautiful sunset ")
        .await
        .unwrap();
    assert_eq!(artifact.bytes, image);
    assert_eq!(artifact.mime_type, "image/png");
}

#[tokio::test]
async fn test_remote_rejection_surfaces_as_upstream_error() {
    let hf = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Input validation error"
        })))
        .mount(&hf)
        .await;

    let uri = hf.uri();
    let config = config_from(
        &[("HF_TOKEN", "hf_x"), ("HF_INFERENCE_URL", uri.as_str())],
        Some(Profile::Standard),
    )
    .unwrap();

    let err = dispatcher_for(&config)
        .dispatch("a valid prompt")
        .await
        .unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(
        err.to_string(),
        "API Error: status 400 Bad Request: Input validation error"
    );
}

#[tokio::test]
async fn test_short_prompt_never_reaches_endpoint() {
    let hf = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4E, 0x47]))
        .expect(0)
        .mount(&hf)
        .await;

    let uri = hf.uri();
    let config = config_from(
        &[("HF_TOKEN", "hf_x"), ("HF_INFERENCE_URL", uri.as_str())],
        Some(Profile::Standard),
    )
    .unwrap();

    let err = dispatcher_for(&config).dispatch("  hi ").await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_http_round_trip_through_server() {
    let hf = MockServer::start().await;
    let image = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(image.clone()),
        )
        .mount(&hf)
        .await;

    let uri = hf.uri();
    let config = config_from(
        &[("HF_TOKEN", "hf_x"), ("HF_INFERENCE_URL", uri.as_str())],
        None,
    )
    .unwrap();
    let base = spawn_app(AppState::new(dispatcher_for(&config))).await;
    let http = reqwest::Client::new();

    let ok = http
        .post(format!("{}/api/generate", base))
        .json(&serde_json::json!({ "prompt": "harbor at dawn" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let state: serde_json::Value = ok.json().await.unwrap();
    assert_eq!(state["prompt"], "harbor at dawn");
    let data_url = state["image"].as_str().unwrap();
    let encoded = data_url.strip_prefix("data:image/jpeg;base64,").unwrap();
    use base64::Engine as _;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(decoded, image);

    let malformed = http
        .post(format!("{}/api/generate", base))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);
    let body: serde_json::Value = malformed.json().await.unwrap();
    assert!(body["error"].is_string());

    let rejected = http
        .post(format!("{}/api/generate", base))
        .json(&serde_json::json!({ "prompt": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 422);
    let body: serde_json::Value = rejected.json().await.unwrap();
    assert_eq!(body["error"], "Prompt is too short.");

    let health = http.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_dispatch_calls_are_independent() {
    let mock = MockInferenceClient::new();
    let dispatcher = Dispatcher::new(Arc::new(mock.clone()), Profile::Standard.settings());

    let (a, b, c) = tokio::join!(
        dispatcher.dispatch("first prompt"),
        dispatcher.dispatch("x"),
        dispatcher.dispatch("third prompt"),
    );

    assert!(a.is_ok());
    assert!(b.unwrap_err().is_validation());
    assert!(c.is_ok());
    assert_eq!(mock.get_call_count(), 2);

    let mut prompts: Vec<String> = mock.requests().into_iter().map(|r| r.prompt).collect();
    prompts.sort();
    assert_eq!(prompts, vec!["first prompt", "third prompt"]);
}

#[tokio::test]
async fn test_mock_usable_directly_as_service() {
    let service: Arc<dyn InferenceService> = Arc::new(MockInferenceClient::new());
    let artifact = service
        .text_to_image(&GenerationRequest::flux_schnell("cat".to_string(), 4))
        .await
        .unwrap();
    assert_eq!(artifact.mime_type, "image/png");
}

#[test]
fn test_reset_clears_everything() {
    let state = dispatch::reset();
    assert!(state.image.is_none());
    assert!(state.prompt.is_empty());
}
