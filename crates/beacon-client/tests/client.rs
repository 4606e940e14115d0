//! Client tests against a live daemon on an ephemeral port

use beacon_client::{BroadcastStatus, ClientError, DiscoveryClient, Heartbeat};
use beacon_daemon::{DaemonConfig, Server};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestDaemon {
    url: String,
    stop: Option<oneshot::Sender<()>>,
}

impl TestDaemon {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = Server::new(DaemonConfig::default());
        tokio::spawn(server.serve(listener, async {
            let _ = stop_rx.await;
        }));

        Self {
            url,
            stop: Some(stop_tx),
        }
    }

    fn client(&self) -> DiscoveryClient {
        DiscoveryClient::new(&self.url).unwrap()
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

#[tokio::test]
async fn register_list_find_deregister() {
    let daemon = TestDaemon::start().await;
    let client = daemon.client();

    let info = client
        .register("user123", "rtsp://127.0.0.1:5051/user123")
        .await
        .unwrap();
    assert_eq!(info.broadcaster_id, "user123");
    assert_eq!(info.status, BroadcastStatus::Active);

    let all = client.list().await.unwrap();
    assert_eq!(all, vec![info.clone()]);

    let found = client.find("user123").await.unwrap().unwrap();
    assert_eq!(found.stream_url, "rtsp://127.0.0.1:5051/user123");
    assert!(client.find("nobody").await.unwrap().is_none());

    client.deregister("user123").await.unwrap();
    let err = client.deregister("user123").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Broadcast not found");
}

#[tokio::test]
async fn validation_errors_surface_as_api_errors() {
    let daemon = TestDaemon::start().await;
    let client = daemon.client();

    match client.register("user123", "").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Missing stream_url");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn heartbeat_keeps_created_at_and_deregisters_on_stop() {
    let daemon = TestDaemon::start().await;
    let client = daemon.client();

    let mut heartbeat = Heartbeat::spawn(
        client.clone(),
        "live_from_toronto",
        "rtsp://10.0.0.5:5051/live_from_toronto",
        Duration::from_millis(20),
    );
    let first = tokio::time::timeout(Duration::from_secs(5), heartbeat.registered())
        .await
        .expect("never registered")
        .unwrap();
    assert_eq!(heartbeat.broadcaster_id(), "live_from_toronto");

    tokio::time::sleep(Duration::from_millis(100)).await;
    let latest = heartbeat.last_registration().unwrap();
    assert_eq!(latest.created_at, first.created_at);
    assert_eq!(client.list().await.unwrap().len(), 1);

    heartbeat.stop().await.unwrap();
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn stopping_heartbeat_after_external_deregister_is_ok() {
    let daemon = TestDaemon::start().await;
    let client = daemon.client();

    let mut heartbeat = Heartbeat::spawn(
        client.clone(),
        "cam",
        "rtsp://10.0.0.6:5051/cam",
        Duration::from_secs(60),
    );
    tokio::time::timeout(Duration::from_secs(5), heartbeat.registered())
        .await
        .expect("never registered");

    client.deregister("cam").await.unwrap();
    heartbeat.stop().await.unwrap();
}

#[tokio::test]
async fn unreachable_daemon_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = DiscoveryClient::with_timeout(&url, Duration::from_secs(2)).unwrap();
    assert!(matches!(client.list().await, Err(ClientError::Http(_))));
}
