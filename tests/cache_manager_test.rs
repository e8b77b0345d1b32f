//! Cache manager tests against a scripted in-memory server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeCacheServer;
use storefront_harness::config::CacheConfig;
use redis::Value;
use storefront_harness::infra::cache::{
    CacheError, CacheEvent, CacheManager, CacheService, ConnectionStatus,
};
use storefront_harness::infra::RecordingListener;

fn manager(server: &FakeCacheServer) -> CacheManager {
    manager_with(server, CacheConfig::default())
}

fn manager_with(server: &FakeCacheServer, config: CacheConfig) -> CacheManager {
    CacheManager::new(config, Arc::new(server.clone()))
}

fn incr(key: &str) -> redis::Cmd {
    let mut cmd = redis::cmd("INCR");
    cmd.arg(key);
    cmd
}

fn recorded_manager(
    server: &FakeCacheServer,
) -> (CacheManager, Arc<RecordingListener<CacheEvent>>) {
    let recorder = Arc::new(RecordingListener::new());
    let mut manager = manager(server);
    manager.subscribe(recorder.clone());
    (manager, recorder)
}

#[tokio::test(start_paused = true)]
async fn test_is_connected_only_once_ready() {
    let server = FakeCacheServer::reachable();
    let manager = manager(&server);

    assert!(!manager.is_connected());

    assert!(manager.ping().await);
    assert!(manager.is_connected());

    manager.close_connection().await;
    assert!(!manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_ping_reports_false_when_unreachable() {
    let server = FakeCacheServer::unreachable();
    let manager = manager(&server);

    assert!(!manager.ping().await);
    assert!(!manager.is_connected());

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_ping_recovers_after_outage() {
    let server = FakeCacheServer::reachable();
    let manager = manager(&server);
    assert!(manager.ping().await);

    server.set_reachable(false);
    assert!(!manager.ping().await);
    assert!(!manager.is_connected());

    server.set_reachable(true);
    assert!(manager.ping().await);
    assert!(manager.is_connected());
    assert_eq!(manager.get_client().await.retry_count(), 0);

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_then_get_client_builds_a_new_client() {
    let server = FakeCacheServer::reachable();
    let manager = manager(&server);

    let first = manager.get_client().await;
    assert!(first.ping().await.is_ok());

    manager.close_connection().await;
    assert_eq!(first.status(), ConnectionStatus::Closed);

    let second = manager.get_client().await;
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.id(), second.id());
    assert!(second.ping().await.is_ok());
    assert_eq!(server.connects(), 2);

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_without_client_is_a_no_op() {
    let server = FakeCacheServer::reachable();
    let manager = manager(&server);

    manager.close_connection().await;

    assert_eq!(manager.status(), ConnectionStatus::Uninitialized);
    assert_eq!(server.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_first_access_creates_one_client() {
    let server = FakeCacheServer::reachable();
    let manager = manager(&server);

    let clients = futures::future::join_all((0..8).map(|_| manager.get_client())).await;

    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    assert!(clients[0].ping().await.is_ok());
    assert_eq!(server.connects(), 1);

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_offline_queue_replays_in_submission_order() {
    let server = FakeCacheServer::unreachable();
    let manager = manager(&server);
    let client = manager.get_client().await;

    let (first, second, read, _) = tokio::join!(
        client.set_json("a", &1u32, 60),
        client.set_json("b", &2u32, 60),
        client.get_json::<u32>("a"),
        async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            server.set_reachable(true);
        }
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(read.unwrap(), Some(1));
    assert_eq!(
        server.executed(),
        vec!["SET a 1 EX 60", "SET b 2 EX 60", "GET a"]
    );

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_offline_queue_rejects_commands_past_capacity() {
    let server = FakeCacheServer::unreachable();
    let config = CacheConfig {
        offline_queue_capacity: 2,
        ..CacheConfig::default()
    };
    let manager = manager_with(&server, config);
    let client = manager.get_client().await;

    let (first, second, third, _) = tokio::join!(
        client.set_json("a", &1u32, 60),
        client.set_json("b", &2u32, 60),
        client.set_json("c", &3u32, 60),
        async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            server.set_reachable(true);
        }
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(matches!(third, Err(CacheError::QueueFull(2))));
    assert_eq!(server.executed(), vec!["SET a 1 EX 60", "SET b 2 EX 60"]);

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_queue_capacity_does_not_limit_a_ready_client() {
    let server = FakeCacheServer::reachable();
    let config = CacheConfig {
        offline_queue_capacity: 1,
        ..CacheConfig::default()
    };
    let manager = manager_with(&server, config);
    assert!(manager.ping().await);
    let client = manager.get_client().await;

    let replies = futures::future::join_all((0..3).map(|_| client.ping())).await;

    assert!(replies.iter().all(|r| r.is_ok()));
    assert!(manager.is_connected());

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_command_timeout_keeps_connection() {
    let server = FakeCacheServer::reachable();
    let manager = manager(&server);
    let client = manager.get_client().await;
    assert!(client.ping().await.is_ok());

    server.stall_next_reply(Duration::from_secs(6));
    let slow = client.query(incr("counter")).await;
    assert!(matches!(slow, Err(CacheError::Timeout)));

    let next = client.query(incr("counter")).await.unwrap();
    assert_eq!(next, Value::Int(2));
    assert_eq!(server.connects(), 1);
    assert_eq!(client.status(), ConnectionStatus::Ready);
    assert_eq!(server.executed(), vec!["INCR counter", "INCR counter"]);

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropped_connection_reconnects_and_retries_command() {
    let server = FakeCacheServer::reachable();
    let (manager, recorder) = recorded_manager(&server);
    let client = manager.get_client().await;
    assert!(client.ping().await.is_ok());

    server.drop_next_command();
    client.set_json("k", &"v", 60).await.unwrap();

    assert_eq!(client.get_json::<String>("k").await.unwrap(), Some("v".to_string()));
    assert!(client.delete("k").await.unwrap());
    assert_eq!(server.connects(), 2);
    assert_eq!(client.retry_count(), 0);

    let events = recorder.events();
    let lost = events
        .iter()
        .position(|e| matches!(e, CacheEvent::Error { .. }))
        .expect("error event");
    assert_eq!(events[lost + 1], CacheEvent::Close);
    assert_eq!(
        events[lost + 2],
        CacheEvent::Reconnecting {
            attempt: 1,
            delay: Duration::from_millis(50)
        }
    );
    assert_eq!(events[lost + 3..lost + 5], [CacheEvent::Connect, CacheEvent::Ready]);

    manager.close_connection().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_delays_grow_linearly_up_to_ceiling() {
    let server = FakeCacheServer::unreachable();
    let (manager, recorder) = recorded_manager(&server);
    let _client = manager.get_client().await;

    tokio::time::sleep(Duration::from_secs(120)).await;

    let delays: Vec<Duration> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            CacheEvent::Reconnecting { delay, .. } => Some(delay),
            _ => None,
        })
        .collect();

    assert!(delays.len() > 40);
    assert_eq!(delays[0], Duration::from_millis(50));
    assert_eq!(delays[9], Duration::from_millis(500));
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(delays.last(), Some(&Duration::from_millis(2000)));

    manager.close_connection().await;
}

#[test]
fn test_is_enabled_follows_configuration() {
    let server = FakeCacheServer::reachable();
    let disabled = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };

    assert!(manager(&server).is_enabled());
    assert!(!CacheManager::new(disabled, Arc::new(server.clone())).is_enabled());
}
