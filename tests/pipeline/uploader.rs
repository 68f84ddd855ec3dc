use std::sync::Arc;
use std::time::Duration;

use crate::support::{
    helpers::{fast_config, init_tracing, sample_image, sample_request},
    mock_gateway::{GatewayBehavior, MockGatewayServer},
    mock_ledger::{MockLedger, TxKind},
};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use token_forge::{
    AuthorityRevocation, HttpUploader, MintSession, StorageUploader, SubmissionSequencer,
};

const GATEWAY: &str = "https://gateway.test/";

fn uploader(server: &MockGatewayServer) -> HttpUploader {
    HttpUploader::new(server.upload_url(), GATEWAY, Duration::from_secs(5))
        .expect("uploader should build")
}

#[tokio::test]
async fn image_upload_posts_raw_bytes_and_returns_gateway_uri() {
    init_tracing();
    let server = MockGatewayServer::start(GatewayBehavior::Accept)
        .await
        .unwrap();
    let image = sample_image();

    let uri = uploader(&server).upload(&image).await.unwrap();

    assert_eq!(uri, "https://gateway.test/content-1");
    let stored = server.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].body, image.bytes);
    assert_eq!(stored[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(stored[0].file_name.as_deref(), Some("logo.png"));

    server.shutdown().await;
}

#[tokio::test]
async fn json_upload_is_sent_as_application_json() {
    init_tracing();
    let server = MockGatewayServer::start(GatewayBehavior::Accept)
        .await
        .unwrap();
    let document = json!({ "name": "Forge", "symbol": "FRG" });

    let uri = uploader(&server).upload_json(&document).await.unwrap();

    assert_eq!(uri, "https://gateway.test/content-1");
    let stored = server.stored();
    assert_eq!(stored[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(stored[0].file_name, None);
    let echoed: serde_json::Value = serde_json::from_slice(&stored[0].body).unwrap();
    assert_eq!(echoed, document);

    server.shutdown().await;
}

#[tokio::test]
async fn rejected_upload_reports_status() {
    init_tracing();
    let server = MockGatewayServer::start(GatewayBehavior::RejectFirst(usize::MAX))
        .await
        .unwrap();

    let err = uploader(&server).upload(&sample_image()).await.unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("503"), "unexpected error: {message}");
    assert!(message.contains("node is syncing"));
    assert!(server.stored().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn empty_content_id_is_an_error() {
    init_tracing();
    let server = MockGatewayServer::start(GatewayBehavior::EmptyReceipt)
        .await
        .unwrap();

    let err = uploader(&server)
        .upload_json(&json!({}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("empty content id"));
    server.shutdown().await;
}

#[tokio::test]
async fn sequencer_retries_through_a_flaky_storage_node() {
    init_tracing();
    let server = MockGatewayServer::start(GatewayBehavior::RejectFirst(1))
        .await
        .unwrap();
    let ledger = Arc::new(MockLedger::default());
    let session = MintSession::new(ledger.clone(), Arc::new(uploader(&server)))
        .with_wallet(Arc::new(Keypair::new()));
    let sequencer = SubmissionSequencer::new(session, fast_config(Pubkey::new_unique()));

    let token = sequencer
        .submit(&sample_request(42, 3, AuthorityRevocation::none()))
        .await
        .unwrap();

    assert_eq!(server.request_count(), 3);
    assert_eq!(token.image_uri, "https://gateway.test/content-1");
    assert_eq!(token.metadata_uri, "https://gateway.test/content-2");
    assert_eq!(
        ledger.confirmed_kinds(),
        vec![TxKind::FeeTransfer, TxKind::CreateMint, TxKind::CreateMetadata]
    );
    assert_eq!(sequencer.telemetry().step_retries, 1);

    server.shutdown().await;
}
