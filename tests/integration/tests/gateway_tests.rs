//! Gateway integration tests
//!
//! Drive the sharded manager against a scripted gateway over in-memory sockets. The clock is
//! paused, so reconnect backoffs and heartbeat intervals elapse instantly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chat_common::{LinearRetry, RateLimiter};
use chat_core::Snowflake;
use chat_gateway::protocol::RequestGuildMembersPayload;
use chat_gateway::{
    ConnectionStatus, GatewayCommand, GatewayConfig, GatewayError, GatewayMessage,
    MemoryConnector, OpCode, ShardEvent, ShardedGatewayManager,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use integration_tests::{ShardPeer, TestGateway, TEST_GATEWAY_URL, TEST_TOKEN};
use serde_json::json;

fn manager(total: u32) -> (ShardedGatewayManager, TestGateway) {
    let (connector, server) = MemoryConnector::pair();
    let mut config = GatewayConfig::new(TEST_TOKEN)
        .with_url(TEST_GATEWAY_URL)
        .with_shard_total(total)
        .with_retry(Arc::new(LinearRetry::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
            5,
        )));
    config.identify_concurrency = total;
    let manager = ShardedGatewayManager::new(config, Arc::new(connector), RateLimiter::new());
    (manager, TestGateway::new(server))
}

/// Next dispatch of `event_type`, skipping everything else
async fn next_dispatch(events: &mut BoxStream<'static, ShardEvent>, event_type: &str) -> ShardEvent {
    loop {
        let event = events.next().await.expect("event stream ended");
        if let ShardEvent::Dispatch { event_type: t, .. } = &event {
            if t == event_type {
                return event;
            }
        }
    }
}

async fn typing(shard: &mut ShardPeer, count: usize) {
    for _ in 0..count {
        shard
            .dispatch("TYPING_START", json!({"channel_id": "7", "user_id": "2", "timestamp": 0}))
            .await
            .unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_dropped_connection_resumes_from_last_sequence() {
    let (manager, mut gateway) = manager(1);
    manager.start();
    let mut events = manager.events().unwrap();

    let mut shard = gateway.identify().await.unwrap();
    typing(&mut shard, 3).await;
    let last = shard.seq();
    shard.disconnect(None).await;

    let (_shard, resume) = gateway.resume().await.unwrap();
    assert_eq!(resume.session_id, "session-0");
    assert_eq!(resume.seq, last);
    assert_eq!(resume.token, TEST_TOKEN);

    next_dispatch(&mut events, "RESUMED").await;
    manager.wait_for(0, ConnectionStatus::Connected).await.unwrap();
    manager.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_resumable_invalid_session_resumes() {
    let (manager, mut gateway) = manager(1);
    manager.start();

    let mut shard = gateway.identify().await.unwrap();
    typing(&mut shard, 2).await;
    let last = shard.seq();
    shard.peer.send(GatewayMessage::invalid_session(true)).await;

    let (_shard, resume) = gateway.resume().await.unwrap();
    assert_eq!(resume.session_id, "session-0");
    assert_eq!(resume.seq, last);
    manager.wait_for(0, ConnectionStatus::Connected).await.unwrap();
    manager.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_non_resumable_invalid_session_identifies_again() {
    let (manager, mut gateway) = manager(1);
    manager.start();
    let mut events = manager.events().unwrap();

    let mut shard = gateway.identify().await.unwrap();
    next_dispatch(&mut events, "READY").await;
    typing(&mut shard, 2).await;
    shard.peer.send(GatewayMessage::invalid_session(false)).await;

    let _shard = gateway.identify().await.unwrap();
    next_dispatch(&mut events, "READY").await;
    manager.wait_for(0, ConnectionStatus::Connected).await.unwrap();
    manager.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_request_resumes_immediately() {
    let (manager, mut gateway) = manager(1);
    manager.start();

    let mut shard = gateway.identify().await.unwrap();
    typing(&mut shard, 1).await;
    let last = shard.seq();
    shard.peer.send(GatewayMessage::reconnect()).await;

    let (_shard, resume) = gateway.resume().await.unwrap();
    assert_eq!(resume.seq, last);
    manager.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_heartbeat_triggers_resume() {
    let (manager, mut gateway) = manager(1);
    manager.start();

    // Never read from this socket, so no heartbeat is acknowledged
    let _silent = gateway.identify().await.unwrap();

    let (_shard, resume) = gateway.resume().await.unwrap();
    assert_eq!(resume.session_id, "session-0");
    manager.wait_for(0, ConnectionStatus::Connected).await.unwrap();
    manager.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_fatal_close_stops_only_that_shard() {
    let (manager, mut gateway) = manager(2);
    manager.start();
    let mut events = manager.events().unwrap();

    let mut shards: HashMap<u32, ShardPeer> = HashMap::new();
    for _ in 0..2 {
        let shard = gateway.identify().await.unwrap();
        shards.insert(shard.shard, shard);
    }
    manager.wait_for(0, ConnectionStatus::Connected).await.unwrap();
    manager.wait_for(1, ConnectionStatus::Connected).await.unwrap();

    shards.remove(&1).unwrap().disconnect(Some(4004)).await;

    let fatal = loop {
        if let ShardEvent::Fatal { shard, reason } = events.next().await.unwrap() {
            break (shard, reason);
        }
    };
    assert_eq!(fatal.0, 1);
    assert!(fatal.1.contains("Authentication failed"), "{}", fatal.1);

    manager.wait_for(1, ConnectionStatus::Closed).await.unwrap();
    assert_eq!(manager.status(1), Some(ConnectionStatus::Closed));
    assert_eq!(manager.status(0), Some(ConnectionStatus::Connected));

    // Odd ids live on shard 1
    let odd = Snowflake::new(3);
    let result = manager
        .send(odd, GatewayCommand::RequestGuildMembers(RequestGuildMembersPayload::all(odd)))
        .await;
    assert!(matches!(result, Err(GatewayError::ShardNotConnected { shard: 1 })));

    let even = Snowflake::new(4);
    manager
        .send(even, GatewayCommand::RequestGuildMembers(RequestGuildMembersPayload::all(even)))
        .await
        .unwrap();
    let frame = shards.get_mut(&0).unwrap().next_command().await.unwrap();
    assert_eq!(frame.op, OpCode::RequestGuildMembers);

    manager.close().await;
}
