//! Event bus integration tests
//!
//! The interceptor feeding the bus from a shard event stream, with one subscriber that keeps
//! up and one that does not.

use std::sync::Arc;

use chat_cache::DataCache;
use chat_client::{EventBus, EventInterceptor};
use chat_core::DomainEvent;
use chat_gateway::ShardEvent;
use futures::stream::{self, StreamExt};
use integration_tests::{guild_create, member_update};
use serde_json::Value;
use tokio::sync::mpsc;

fn dispatch(event_type: &str, sequence: u64, data: Value) -> ShardEvent {
    ShardEvent::Dispatch {
        shard: 0,
        event_type: event_type.to_string(),
        sequence: Some(sequence),
        data,
    }
}

fn nick(event: &DomainEvent) -> Option<String> {
    match event {
        DomainEvent::MemberUpdate(update) => update.member.nick.clone(),
        _ => None,
    }
}

#[tokio::test]
async fn test_fast_subscriber_sees_all_and_slow_sees_latest() {
    let bus = Arc::new(EventBus::new());
    let mut slow = bus.subscribe();
    let fast = bus.subscribe();

    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel();
    let consumer = tokio::spawn(async move {
        let mut fast = fast;
        let mut nicks = Vec::new();
        while let Some(event) = fast.recv().await {
            nicks.extend(nick(&event));
            let _ = ack_tx.send(());
        }
        nicks
    });

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let events = stream::unfold(event_rx, |mut receiver| async move {
        receiver.recv().await.map(|event| (event, receiver))
    })
    .boxed();
    let interceptor = EventInterceptor::new(DataCache::default(), Arc::clone(&bus));
    let task = tokio::spawn(interceptor.run(events));

    event_tx
        .send(dispatch("GUILD_CREATE", 1, guild_create(7, &[100])))
        .unwrap();
    ack_rx.recv().await.unwrap();
    for n in 1..=10u64 {
        let data = member_update(7, 100, &format!("nick-{n}"));
        event_tx
            .send(dispatch("GUILD_MEMBER_UPDATE", n + 1, data))
            .unwrap();
        ack_rx.recv().await.unwrap();
    }

    drop(event_tx);
    task.await.unwrap();
    bus.close();

    let expected: Vec<String> = (1..=10).map(|n| format!("nick-{n}")).collect();
    assert_eq!(consumer.await.unwrap(), expected);

    let latest = slow.recv().await.unwrap();
    assert_eq!(nick(&latest).as_deref(), Some("nick-10"));
    assert!(slow.recv().await.is_none());
}
