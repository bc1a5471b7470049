//! Registration against a fake directory service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use said_identity::config::IdentityConfig;
use said_identity::identity::registration::{
    Delay, RegistrationClient, RegistrationMetadata, RegistrationOutcome, RetryPolicy,
};
use said_identity::{AgentMetadata, IdentityManager, RegistrationError, WalletStore};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records requested sleeps instead of waiting.
#[derive(Default)]
struct RecordingDelay {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn client(server: &MockServer, delay: Arc<RecordingDelay>) -> RegistrationClient {
    RegistrationClient::new(
        server.uri(),
        RetryPolicy::default(),
        Duration::from_millis(300),
    )
    .unwrap()
    .with_delay(delay)
}

fn metadata() -> RegistrationMetadata {
    RegistrationMetadata {
        name: "Eliza".to_string(),
        description: "Helpful agent".to_string(),
        capabilities: vec![
            "conversation".to_string(),
            "autonomous-tasks".to_string(),
            "elizaos".to_string(),
        ],
    }
}

fn manager(server: &MockServer, dir: &std::path::Path, delay: Arc<RecordingDelay>) -> IdentityManager {
    let config = IdentityConfig {
        base_dir: dir.to_path_buf(),
        api_url: server.uri(),
        profile_base_url: "https://saidprotocol.com".to_string(),
        ..IdentityConfig::default()
    };
    IdentityManager::new(&config, WalletStore::new(dir), client(server, delay))
}

#[tokio::test]
async fn always_failing_directory_gets_exactly_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let delay = Arc::new(RecordingDelay::default());
    let outcome = client(&server, delay.clone())
        .register("Wallet111", &metadata())
        .await;

    match outcome {
        RegistrationOutcome::Failed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(last_error, RegistrationError::Status(500)));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(
        delay.recorded(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
}

#[tokio::test]
async fn verified_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"wallet": "Wallet111", "isVerified": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let delay = Arc::new(RecordingDelay::default());
    let outcome = client(&server, delay.clone())
        .register("Wallet111", &metadata())
        .await;

    assert!(outcome.is_verified());
    assert!(delay.recorded().is_empty());
}

#[tokio::test]
async fn success_without_flag_is_registered_unverified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"wallet": "Wallet111"})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server, Arc::default())
        .register("Wallet111", &metadata())
        .await;
    assert!(matches!(outcome, RegistrationOutcome::RegisteredUnverified));
}

#[tokio::test]
async fn malformed_body_counts_as_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let outcome = client(&server, Arc::default())
        .register("Wallet111", &metadata())
        .await;
    match outcome {
        RegistrationOutcome::Failed { last_error, .. } => {
            assert!(matches!(last_error, RegistrationError::InvalidResponse(_)));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn recovers_on_second_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isVerified": true})))
        .expect(1)
        .mount(&server)
        .await;

    let delay = Arc::new(RecordingDelay::default());
    let outcome = client(&server, delay.clone())
        .register("Wallet111", &metadata())
        .await;

    assert!(outcome.is_verified());
    assert_eq!(delay.recorded(), vec![Duration::from_millis(1000)]);
}

#[tokio::test]
async fn request_body_matches_directory_contract() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager(&server, dir.path(), Arc::default());
    let meta = AgentMetadata::new("agent-42")
        .with_name("Eliza")
        .with_bio("Helpful agent");
    let wallet = manager.initialize(&meta, None).await.unwrap().wallet.clone();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(
        body,
        json!({
            "wallet": wallet,
            "name": "Eliza",
            "description": "Helpful agent",
            "capabilities": ["conversation", "autonomous-tasks", "elizaos"],
            "source": "elizaos-plugin",
        })
    );
}

#[tokio::test]
async fn verified_registration_yields_verified_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isVerified": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager(&server, dir.path(), Arc::default());
    let mut knowledge = Vec::new();
    let identity = manager
        .initialize(&AgentMetadata::new("agent-1"), Some(&mut knowledge))
        .await
        .unwrap();

    assert!(identity.verified);
    assert_eq!(
        identity.profile_url,
        format!("https://saidprotocol.com/agents/{}", identity.wallet)
    );
    assert_eq!(knowledge.len(), 1);
}

#[tokio::test]
async fn every_network_failure_still_yields_an_identity() {
    let failures = [
        ResponseTemplate::new(500),
        ResponseTemplate::new(200).set_body_string("not json"),
        ResponseTemplate::new(200)
            .set_body_json(json!({"isVerified": true}))
            .set_delay(Duration::from_secs(2)),
    ];

    for response in failures {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register/pending"))
            .respond_with(response)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let delay = Arc::new(RecordingDelay::default());
        let mut manager = manager(&server, dir.path(), delay.clone());
        assert!(manager.identity().is_none());

        let identity = manager
            .initialize(&AgentMetadata::new("agent-1"), None)
            .await
            .unwrap();
        assert!(!identity.verified);
        assert!(manager.identity().is_some());
        assert_eq!(delay.recorded().len(), 2);
    }
}
