//! Client integration tests
//!
//! A full client against a scripted REST transport and a scripted gateway: discovery,
//! sharded routing, the cache roster and the event stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chat_cache::CacheKey;
use chat_client::{ChatClient, ClientError};
use chat_core::{DomainEvent, Snowflake, UserData};
use chat_gateway::protocol::RequestGuildMembersPayload;
use chat_gateway::{GatewayCommand, MemoryConnector, OpCode};
use integration_tests::{
    current_user, eventually, gateway_bot, guild_create, json_response, member_update,
    rest_handler, test_client_config, MockHttp, ShardPeer, TestGateway, TEST_GATEWAY_URL,
};

const SHARDS: u32 = 3;
const GUILDS: [u64; 6] = [30, 31, 32, 33, 34, 35];
const USERS: [u64; 3] = [100, 101, 102];

async fn build_client(shards: u32) -> (ChatClient, TestGateway, Arc<MockHttp>) {
    let http = MockHttp::new();
    http.respond("/gateway/bot", json_response(200, &gateway_bot(shards)));
    http.respond("/users/@me", json_response(200, &current_user()));

    let (connector, server) = MemoryConnector::pair();
    let client = ChatClient::builder(test_client_config())
        .connector(Arc::new(connector))
        .request_handler(rest_handler(http.clone()))
        .build()
        .await
        .unwrap();
    (client, TestGateway::new(server), http)
}

async fn identify_all(gateway: &mut TestGateway, shards: u32) -> HashMap<u32, ShardPeer> {
    let mut peers = HashMap::new();
    for _ in 0..shards {
        let peer = gateway.identify().await.unwrap();
        peers.insert(peer.shard, peer);
    }
    peers
}

fn shard_of(guild_id: u64) -> u32 {
    Snowflake::new(i64::try_from(guild_id).unwrap()).shard_index(SHARDS)
}

async fn roster_matches(client: &ChatClient, round: u32) -> bool {
    for guild_id in GUILDS {
        let guild = Snowflake::new(i64::try_from(guild_id).unwrap());
        let Ok(members) = client.cache().members(guild).await else {
            return false;
        };
        if members.len() != USERS.len() {
            return false;
        }
        for member in members {
            let expected = format!("round-{round}-{}", member.user_id);
            if member.nick.as_deref() != Some(expected.as_str()) {
                return false;
            }
        }
    }
    true
}

#[tokio::test(start_paused = true)]
async fn test_build_discovers_gateway_and_caches_current_user() {
    let (client, _gateway, http) = build_client(SHARDS).await;

    assert_eq!(client.user().id, Snowflake::new(1));
    assert_eq!(client.gateway().shard_total(), SHARDS);
    assert_eq!(client.gateway().shard_ids(), &[0, 1, 2]);
    assert_eq!(http.calls("/gateway/bot").len(), 1);

    let cached: Option<UserData> = client
        .cache()
        .get_as(&CacheKey::user(Snowflake::new(1)))
        .await
        .unwrap();
    assert_eq!(cached.unwrap().username, "test-bot");
}

#[tokio::test(start_paused = true)]
async fn test_sharded_roster_follows_member_updates() {
    let (client, mut gateway, _http) = build_client(SHARDS).await;

    let subscription = client.subscribe();
    let collector = tokio::spawn(async move {
        let mut subscription = subscription;
        let mut seen = Vec::new();
        while let Some(event) = subscription.recv().await {
            seen.push(event);
        }
        seen
    });

    client.connect().unwrap();
    assert!(matches!(client.connect(), Err(ClientError::AlreadyConnected)));
    let mut shards = identify_all(&mut gateway, SHARDS).await;
    for shard in shards.values() {
        assert!(shard.peer.url.starts_with(TEST_GATEWAY_URL), "{}", shard.peer.url);
    }

    for guild_id in GUILDS {
        let shard = shards.get_mut(&shard_of(guild_id)).unwrap();
        shard
            .dispatch("GUILD_CREATE", guild_create(guild_id, &USERS))
            .await
            .unwrap();
    }
    for round in 1..=2 {
        for guild_id in GUILDS {
            let shard = shards.get_mut(&shard_of(guild_id)).unwrap();
            for user_id in USERS {
                let nick = format!("round-{round}-{user_id}");
                shard
                    .dispatch("GUILD_MEMBER_UPDATE", member_update(guild_id, user_id, &nick))
                    .await
                    .unwrap();
            }
        }
    }

    let client_ref = &client;
    assert!(
        eventually(Duration::from_secs(5), || async move {
            roster_matches(client_ref, 2).await
        })
        .await
    );

    // Commands for guild 31 go out on shard 1
    let guild = Snowflake::new(31);
    client
        .send(guild, GatewayCommand::RequestGuildMembers(RequestGuildMembersPayload::all(guild)))
        .await
        .unwrap();
    let frame = shards.get_mut(&1).unwrap().next_command().await.unwrap();
    assert_eq!(frame.op, OpCode::RequestGuildMembers);
    assert_eq!(frame.d.unwrap()["guild_id"], "31");

    client.close().await;
    let seen = collector.await.unwrap();
    assert!(!seen.is_empty());
    for event in &seen {
        if let Some(guild_id) = event.guild_id() {
            assert_eq!(guild_id.shard_index(SHARDS), event.shard(), "{event:?}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_fatal_close_publishes_shard_down() {
    let (client, mut gateway, _http) = build_client(1).await;
    let mut subscription = client.subscribe();

    client.connect().unwrap();
    let shard = gateway.identify().await.unwrap();
    shard.disconnect(Some(4004)).await;

    let down = loop {
        match subscription.recv().await {
            Some(DomainEvent::ShardDown(down)) => break down,
            Some(_) => {}
            None => panic!("bus closed before ShardDown"),
        }
    };
    assert_eq!(down.shard, 0);
    client.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_connect_after_close_fails() {
    let (client, mut gateway, _http) = build_client(1).await;

    client.connect().unwrap();
    let _shard = gateway.identify().await.unwrap();
    client.close().await;

    assert!(matches!(client.connect(), Err(ClientError::Closed)));
    let mut late = client.subscribe();
    assert!(late.recv().await.is_none());
}
