use std::sync::Arc;

use queuewatch::api::{build_router, AppState};
use queuewatch::client::{ClientError, HttpBackend, QueueClient};
use queuewatch::drill::{Drill, DrillConfig};
use queuewatch::storage::QueueStore;
use tokio::net::TcpListener;

/// Serve a fresh store on an ephemeral port and return its base URL
async fn spawn_server() -> (String, Arc<QueueStore>) {
    let store = Arc::new(QueueStore::new());
    let state = Arc::new(AppState {
        store: Arc::clone(&store),
    });
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), store)
}

#[tokio::test]
async fn drill_passes_over_http() {
    let (url, store) = spawn_server().await;
    assert!(HttpBackend::new(url.clone()).health_check().await.unwrap());

    let config = DrillConfig {
        prefix: "http-".to_string(),
        ..DrillConfig::default()
    };
    let mut drill = Drill::new(QueueClient::http(url), config);
    let report = drill.run_all().await.unwrap();

    assert_eq!(report.scenarios, 6);
    // Every scenario cleans up after itself
    assert!(store.list_queues().is_empty());
}

#[tokio::test]
async fn http_handle_conventions() {
    let (url, _store) = spawn_server().await;
    let client = QueueClient::http(url);
    let queue = client.queue("jobs");

    assert_eq!(queue.size().await.unwrap(), 0);
    assert!(queue.list_alerts().await.unwrap().is_empty());
    queue.delete().await.unwrap();

    let rule = queue
        .add_alert("progressive", 3, "both", "jobs-alerts")
        .await
        .unwrap();
    assert_eq!(queue.list_alerts().await.unwrap(), vec![rule]);

    queue.post_n(7, "message").await.unwrap();
    assert_eq!(client.queue("jobs-alerts").size().await.unwrap(), 2);

    let taken = queue.get(5).await.unwrap();
    assert_eq!(taken.len(), 5);
    assert_eq!(queue.size().await.unwrap(), 2);
    // 7 -> 2 reaches 6 and 3 from above
    assert_eq!(client.queue("jobs-alerts").size().await.unwrap(), 4);

    queue.delete().await.unwrap();
    assert_eq!(queue.size().await.unwrap(), 0);
    assert!(queue.list_alerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn http_remote_rejection() {
    let (url, _store) = spawn_server().await;
    let backend = HttpBackend::new(url);

    let err = backend.queue_stats("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}
