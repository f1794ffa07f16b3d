mod common;

use common::{TestHome, sample_messages};
use daily_start::sources::{
    BackendClient, BundledSource, HybridMessageManager, MessageQuery, SourceChain, StaticSource,
};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> BackendClient {
    let mut config = daily_start::config::BackendConfig::default();
    config.enabled = true;
    config.base_url = server.uri();
    config.backoff_base_ms = 1;
    BackendClient::new(&config)
}

#[tokio::test]
async fn test_chain_backend_down_bundled_serves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let home = TestHome::new(sample_messages());
    let bundled_path = home.path().join("messages.json");
    let chain = SourceChain::new(vec![
        Arc::new(backend(&server)),
        Arc::new(BundledSource::new(
            Client::new(),
            bundled_path.to_string_lossy(),
        )),
        Arc::new(StaticSource::default()),
    ]);

    let outcome = chain.load(&MessageQuery::default()).await;
    assert_eq!(outcome.served_by.as_deref(), Some("bundled"));
    assert_eq!(outcome.messages.unwrap().len(), 5);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].source_name, "backend");
}

#[tokio::test]
async fn test_hybrid_latches_to_local_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let home = TestHome::new(sample_messages());
    let manager = HybridMessageManager::new(
        Some(backend(&server)),
        BundledSource::new(
            Client::new(),
            home.path().join("messages.json").to_string_lossy(),
        ),
    );

    let categories = manager.categories().await;
    assert_eq!(categories.len(), 5);
    assert!(!manager.is_using_backend());

    // second call stays local
    manager.categories().await;
}
