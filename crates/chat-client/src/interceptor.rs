//! Event interceptor
//!
//! Consumes the merged shard stream one frame at a time. For every dispatch it applies the
//! implied mutation to the [`DataCache`], capturing what was cached before, builds the
//! [`DomainEvent`] carrying both snapshots and only then publishes it. A subscriber that
//! queries the cache on receipt therefore sees state at least as new as the event.

use std::sync::Arc;

use chat_cache::{CacheKey, DataCache};
use chat_core::{
    ChannelData, ChannelDeleteEvent, ChannelEvent, ChannelUpdateEvent, DomainEvent,
    GuildCreateEvent, GuildData, GuildDeleteEvent, GuildUpdateEvent, MemberAddEvent, MemberData,
    MemberRemoveEvent, MemberUpdateEvent, MessageCreateEvent, MessageData, MessageDeleteEvent,
    MessageUpdateEvent, PresenceData, PresenceUpdateEvent, ReactionEvent, ReadyEvent,
    ResumedEvent, RoleData, RoleDeleteEvent, RoleEvent, RoleUpdateEvent, ShardDownEvent,
    Snowflake, TypingStartEvent, UnknownEvent, UserData, UserUpdateEvent,
};
use chat_gateway::events::{
    GuildDeletePayload, GuildMemberRemovePayload, GuildMembersChunkPayload,
    GuildRoleDeletePayload, GuildRolePayload, MessageDeletePayload, MessageReactionPayload,
    TypingStartPayload,
};
use chat_gateway::protocol::ReadyPayload;
use chat_gateway::{GatewayEventType, ShardEvent};
use futures::stream::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::bus::EventBus;
use crate::error::ClientResult;

/// Arrays of GUILD_CREATE that are cached as entities of their own
const GUILD_COLLECTIONS: [&str; 4] = ["members", "channels", "roles", "presences"];

/// Single writer of the cache during normal operation
#[derive(Debug, Clone)]
pub struct EventInterceptor {
    cache: DataCache,
    bus: Arc<EventBus>,
}

impl EventInterceptor {
    pub fn new(cache: DataCache, bus: Arc<EventBus>) -> Self {
        Self { cache, bus }
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    /// Handle every event of `events` in order, until the stream ends
    pub async fn run<S>(self, mut events: S)
    where
        S: Stream<Item = ShardEvent> + Send + Unpin,
    {
        let mut handled: u64 = 0;
        while let Some(event) = events.next().await {
            self.handle(event).await;
            handled += 1;
        }
        tracing::info!(handled, "Event interceptor stopped");
    }

    /// Apply one shard event to the cache, then publish the resulting domain event.
    ///
    /// A dispatch that cannot be applied is logged and published as
    /// [`DomainEvent::Unknown`] with its raw data.
    pub async fn handle(&self, event: ShardEvent) -> DomainEvent {
        let event = match event {
            ShardEvent::Fatal { shard, reason } => {
                tracing::error!(shard, reason = %reason, "Shard is down");
                DomainEvent::ShardDown(ShardDownEvent { shard, reason })
            }
            ShardEvent::Dispatch {
                shard,
                event_type,
                sequence,
                data,
            } => match self.intercept(shard, &event_type, data.clone()).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(
                        shard,
                        seq = ?sequence,
                        event_type = %event_type,
                        error = %e,
                        "Failed to apply dispatch"
                    );
                    DomainEvent::Unknown(UnknownEvent {
                        shard,
                        event_type,
                        data,
                    })
                }
            },
        };

        self.bus.publish(event.clone());
        event
    }

    async fn intercept(
        &self,
        shard: u32,
        event_type: &str,
        data: Value,
    ) -> ClientResult<DomainEvent> {
        let Some(kind) = GatewayEventType::from_str(event_type) else {
            return Ok(DomainEvent::Unknown(UnknownEvent {
                shard,
                event_type: event_type.to_string(),
                data,
            }));
        };

        match kind {
            GatewayEventType::Ready => self.on_ready(shard, data).await,
            GatewayEventType::Resumed => Ok(DomainEvent::Resumed(ResumedEvent { shard })),
            GatewayEventType::GuildCreate => self.on_guild_create(shard, data).await,
            GatewayEventType::GuildUpdate => self.on_guild_update(shard, data).await,
            GatewayEventType::GuildDelete => self.on_guild_delete(shard, data).await,
            GatewayEventType::GuildMembersChunk => self.on_members_chunk(shard, data).await,
            GatewayEventType::ChannelCreate => {
                let key = CacheKey::channel(id_field(&data, "id")?);
                let channel: ChannelData = parse(&data)?;
                self.cache.put(key, data).await?;
                Ok(DomainEvent::ChannelCreate(ChannelEvent { shard, channel }))
            }
            GatewayEventType::ChannelUpdate => {
                let key = CacheKey::channel(id_field(&data, "id")?);
                let (old, merged) = self.cache.merge(key, data).await?;
                Ok(DomainEvent::ChannelUpdate(ChannelUpdateEvent {
                    shard,
                    channel: serde_json::from_value(merged)?,
                    old: decode(old)?,
                }))
            }
            GatewayEventType::ChannelDelete => {
                let key = CacheKey::channel(id_field(&data, "id")?);
                let channel: ChannelData = parse(&data)?;
                let old = self.cache.remove(&key).await?;
                Ok(DomainEvent::ChannelDelete(ChannelDeleteEvent {
                    shard,
                    channel,
                    old: decode(old)?,
                }))
            }
            GatewayEventType::GuildRoleCreate => {
                let key = CacheKey::role(id_field(nested(&data, "role"), "id")?);
                let GuildRolePayload { guild_id, mut role } = serde_json::from_value(data)?;
                role.guild_id = Some(guild_id);
                self.cache.put(key, serde_json::to_value(&role)?).await?;
                Ok(DomainEvent::RoleCreate(RoleEvent { shard, role }))
            }
            GatewayEventType::GuildRoleUpdate => self.on_role_update(shard, data).await,
            GatewayEventType::GuildRoleDelete => {
                let payload: GuildRoleDeletePayload = serde_json::from_value(data)?;
                let old = self.cache.remove(&CacheKey::role(payload.role_id)).await?;
                Ok(DomainEvent::RoleDelete(RoleDeleteEvent {
                    shard,
                    guild_id: payload.guild_id,
                    role_id: payload.role_id,
                    old: decode(old)?,
                }))
            }
            GatewayEventType::GuildMemberAdd => {
                let guild_id = id_field(&data, "guild_id")?;
                let member = prepare_member(guild_id, data)?;
                let (member, user) = self.store_member(member).await?;
                Ok(DomainEvent::MemberAdd(MemberAddEvent {
                    shard,
                    member,
                    user,
                }))
            }
            GatewayEventType::GuildMemberUpdate => self.on_member_update(shard, data).await,
            GatewayEventType::GuildMemberRemove => {
                let GuildMemberRemovePayload { guild_id, user } = serde_json::from_value(data)?;
                let old = self.cache.remove(&CacheKey::member(guild_id, user.id)).await?;
                self.cache
                    .remove(&CacheKey::presence(guild_id, user.id))
                    .await?;
                Ok(DomainEvent::MemberRemove(MemberRemoveEvent {
                    shard,
                    guild_id,
                    user,
                    old: decode(old)?,
                }))
            }
            GatewayEventType::MessageCreate => {
                let key = CacheKey::message(id_field(&data, "id")?);
                let message: MessageData = parse(&data)?;
                self.cache.put(key, data).await?;
                Ok(DomainEvent::MessageCreate(MessageCreateEvent { shard, message }))
            }
            GatewayEventType::MessageUpdate => {
                let key = CacheKey::message(id_field(&data, "id")?);
                let (old, merged) = self.cache.merge(key, data).await?;
                Ok(DomainEvent::MessageUpdate(MessageUpdateEvent {
                    shard,
                    message: serde_json::from_value(merged)?,
                    old: decode(old)?,
                }))
            }
            GatewayEventType::MessageDelete => {
                let payload: MessageDeletePayload = serde_json::from_value(data)?;
                let old = self.cache.remove(&CacheKey::message(payload.id)).await?;
                Ok(DomainEvent::MessageDelete(MessageDeleteEvent {
                    shard,
                    message_id: payload.id,
                    channel_id: payload.channel_id,
                    guild_id: payload.guild_id,
                    old: decode(old)?,
                }))
            }
            GatewayEventType::MessageReactionAdd => {
                Ok(DomainEvent::ReactionAdd(reaction(shard, data)?))
            }
            GatewayEventType::MessageReactionRemove => {
                Ok(DomainEvent::ReactionRemove(reaction(shard, data)?))
            }
            GatewayEventType::PresenceUpdate => self.on_presence_update(shard, data).await,
            GatewayEventType::TypingStart => {
                let payload: TypingStartPayload = serde_json::from_value(data)?;
                Ok(DomainEvent::TypingStart(TypingStartEvent {
                    shard,
                    channel_id: payload.channel_id,
                    guild_id: payload.guild_id,
                    user_id: payload.user_id,
                    timestamp: payload.timestamp,
                }))
            }
            GatewayEventType::UserUpdate => {
                let key = CacheKey::user(id_field(&data, "id")?);
                let (old, merged) = self.cache.merge(key, data).await?;
                Ok(DomainEvent::UserUpdate(UserUpdateEvent {
                    shard,
                    user: serde_json::from_value(merged)?,
                    old: decode(old)?,
                }))
            }
        }
    }

    async fn on_ready(&self, shard: u32, data: Value) -> ClientResult<DomainEvent> {
        let ready: ReadyPayload = serde_json::from_value(data)?;
        self.cache
            .put(CacheKey::user(ready.user.id), serde_json::to_value(&ready.user)?)
            .await?;

        Ok(DomainEvent::Ready(ReadyEvent {
            shard,
            session_id: ready.session_id,
            user: ready.user,
            guild_ids: ready.guilds.iter().map(|guild| guild.id).collect(),
        }))
    }

    /// A full guild snapshot. Its members, channels, roles and presences become entries of
    /// their own; the guild entry keeps the remaining fields.
    ///
    /// Every entry is decoded before the first write, so a malformed snapshot leaves the
    /// cache untouched.
    async fn on_guild_create(&self, shard: u32, mut data: Value) -> ClientResult<DomainEvent> {
        let guild_id = id_field(&data, "id")?;
        let [members, channels, roles, presences] =
            GUILD_COLLECTIONS.map(|field| take_array(&mut data, field));

        let mut entries = Vec::with_capacity(channels.len() + roles.len() + presences.len());
        for mut channel in channels {
            set_id(&mut channel, "guild_id", guild_id);
            parse::<ChannelData>(&channel)?;
            entries.push((CacheKey::channel(id_field(&channel, "id")?), channel));
        }
        for mut role in roles {
            set_id(&mut role, "guild_id", guild_id);
            parse::<RoleData>(&role)?;
            entries.push((CacheKey::role(id_field(&role, "id")?), role));
        }
        for presence in presences {
            let (presence, _) = split_user(presence, guild_id);
            parse::<PresenceData>(&presence)?;
            let key = CacheKey::presence(guild_id, id_field(&presence, "user_id")?);
            entries.push((key, presence));
        }
        let members = members
            .into_iter()
            .map(|member| prepare_member(guild_id, member))
            .collect::<ClientResult<Vec<_>>>()?;
        let guild: GuildData = parse(&data)?;

        let member_count = members.len();
        for (key, entry) in entries {
            self.cache.put(key, entry).await?;
        }
        for member in members {
            self.store_member(member).await?;
        }
        let old = self.cache.put(CacheKey::guild(guild_id), data).await?;
        tracing::debug!(shard, guild_id = %guild_id, members = member_count, "Guild cached");

        Ok(DomainEvent::GuildCreate(GuildCreateEvent {
            shard,
            guild,
            old: decode(old)?,
        }))
    }

    async fn on_guild_update(&self, shard: u32, mut data: Value) -> ClientResult<DomainEvent> {
        let guild_id = id_field(&data, "id")?;
        for field in GUILD_COLLECTIONS {
            take_array(&mut data, field);
        }
        let (old, merged) = self.cache.merge(CacheKey::guild(guild_id), data).await?;

        Ok(DomainEvent::GuildUpdate(GuildUpdateEvent {
            shard,
            guild: serde_json::from_value(merged)?,
            old: decode(old)?,
        }))
    }

    /// An outage keeps the cached entries and marks the guild unavailable; leaving the guild
    /// evicts it together with everything it owns.
    async fn on_guild_delete(&self, shard: u32, data: Value) -> ClientResult<DomainEvent> {
        let payload: GuildDeletePayload = serde_json::from_value(data)?;
        let key = CacheKey::guild(payload.id);

        let old = if payload.unavailable {
            let outage = json!({ "id": payload.id, "unavailable": true });
            self.cache.merge(key, outage).await?.0
        } else {
            let removed = self.cache.remove_guild_entries(payload.id).await?;
            tracing::debug!(shard, guild_id = %payload.id, removed, "Guild entries evicted");
            self.cache.remove(&key).await?
        };

        Ok(DomainEvent::GuildDelete(GuildDeleteEvent {
            shard,
            guild_id: payload.id,
            unavailable: payload.unavailable,
            old: decode(old)?,
        }))
    }

    /// Members answering a Request Guild Members command. They are cached and the chunk is
    /// passed through as is.
    async fn on_members_chunk(&self, shard: u32, data: Value) -> ClientResult<DomainEvent> {
        let chunk = GuildMembersChunkPayload::deserialize(&data)?;
        let members = chunk
            .members
            .into_iter()
            .map(|member| prepare_member(chunk.guild_id, member))
            .collect::<ClientResult<Vec<_>>>()?;
        for member in members {
            self.store_member(member).await?;
        }
        tracing::debug!(
            shard,
            guild_id = %chunk.guild_id,
            chunk = chunk.chunk_index,
            of = chunk.chunk_count,
            "Member chunk cached"
        );

        Ok(DomainEvent::Unknown(UnknownEvent {
            shard,
            event_type: GatewayEventType::GuildMembersChunk.as_str().to_string(),
            data,
        }))
    }

    async fn on_role_update(&self, shard: u32, mut data: Value) -> ClientResult<DomainEvent> {
        let guild_id = id_field(&data, "guild_id")?;
        let mut role = data
            .as_object_mut()
            .and_then(|fields| fields.remove("role"))
            .unwrap_or(Value::Null);
        set_id(&mut role, "guild_id", guild_id);

        let key = CacheKey::role(id_field(&role, "id")?);
        let (old, merged) = self.cache.merge(key, role).await?;
        Ok(DomainEvent::RoleUpdate(RoleUpdateEvent {
            shard,
            role: serde_json::from_value::<RoleData>(merged)?,
            old: decode(old)?,
        }))
    }

    async fn on_member_update(&self, shard: u32, data: Value) -> ClientResult<DomainEvent> {
        let guild_id = id_field(&data, "guild_id")?;
        let (member, user) = split_user(data, guild_id);
        let key = CacheKey::member(guild_id, id_field(&member, "user_id")?);
        parse::<MemberData>(&member)?;
        let user = user.map(user_entry).transpose()?;

        if let Some((user_key, user)) = user {
            self.cache.merge(user_key, user).await?;
        }
        let (old, merged) = self.cache.merge(key, member).await?;
        Ok(DomainEvent::MemberUpdate(MemberUpdateEvent {
            shard,
            member: serde_json::from_value(merged)?,
            old: decode(old)?,
        }))
    }

    async fn on_presence_update(&self, shard: u32, data: Value) -> ClientResult<DomainEvent> {
        let guild_id = id_field(&data, "guild_id")?;
        let (presence, user) = split_user(data, guild_id);
        let key = CacheKey::presence(guild_id, id_field(&presence, "user_id")?);
        let parsed: PresenceData = parse(&presence)?;
        // Presence users are partial; only merge when more than the id came along
        let user = user
            .filter(|u| u.as_object().is_some_and(|f| f.len() > 1))
            .map(user_entry)
            .transpose()?;

        if let Some((user_key, user)) = user {
            self.cache.merge(user_key, user).await?;
        }
        let old = self.cache.put(key, presence).await?;
        Ok(DomainEvent::PresenceUpdate(PresenceUpdateEvent {
            shard,
            presence: parsed,
            old: decode(old)?,
        }))
    }

    /// Cache a decoded member and the user nested in it
    async fn store_member(
        &self,
        member: PreparedMember,
    ) -> ClientResult<(MemberData, Option<UserData>)> {
        let user = match member.user {
            Some((key, user)) => {
                let (_, merged) = self.cache.merge(key, user).await?;
                Some(serde_json::from_value(merged)?)
            }
            None => None,
        };

        self.cache.put(member.key, member.value).await?;
        Ok((member.data, user))
    }
}

/// A gateway member object, decoded and keyed but not yet written
struct PreparedMember {
    key: CacheKey,
    value: Value,
    data: MemberData,
    user: Option<(CacheKey, Value)>,
}

fn prepare_member(guild_id: Snowflake, member: Value) -> ClientResult<PreparedMember> {
    let (value, user) = split_user(member, guild_id);
    let key = CacheKey::member(guild_id, id_field(&value, "user_id")?);
    let data: MemberData = parse(&value)?;
    Ok(PreparedMember {
        key,
        value,
        data,
        user: user.map(user_entry).transpose()?,
    })
}

fn user_entry(user: Value) -> ClientResult<(CacheKey, Value)> {
    let key = CacheKey::user(id_field(&user, "id")?);
    parse::<UserData>(&user)?;
    Ok((key, user))
}

fn reaction(shard: u32, data: Value) -> ClientResult<ReactionEvent> {
    let payload: MessageReactionPayload = serde_json::from_value(data)?;
    Ok(ReactionEvent {
        shard,
        user_id: payload.user_id,
        channel_id: payload.channel_id,
        message_id: payload.message_id,
        guild_id: payload.guild_id,
        emoji: payload.emoji,
    })
}

fn parse<T: DeserializeOwned>(value: &Value) -> ClientResult<T> {
    Ok(T::deserialize(value)?)
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> ClientResult<Option<T>> {
    Ok(value.map(serde_json::from_value).transpose()?)
}

fn id_field(value: &Value, field: &str) -> ClientResult<Snowflake> {
    Ok(Snowflake::deserialize(nested(value, field))?)
}

fn nested<'a>(value: &'a Value, field: &str) -> &'a Value {
    value.get(field).unwrap_or(&Value::Null)
}

fn set_id(value: &mut Value, field: &str, id: Snowflake) {
    if let Some(fields) = value.as_object_mut() {
        fields.insert(field.to_string(), Value::String(id.to_string()));
    }
}

fn take_array(value: &mut Value, field: &str) -> Vec<Value> {
    match value.as_object_mut().and_then(|fields| fields.remove(field)) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Move the `user` nested in a guild-scoped object out, leaving its id as `user_id`
fn split_user(mut value: Value, guild_id: Snowflake) -> (Value, Option<Value>) {
    let user = value.as_object_mut().and_then(|fields| fields.remove("user"));
    if let (Some(fields), Some(user_id)) = (
        value.as_object_mut(),
        user.as_ref().and_then(|u| u.get("id")).cloned(),
    ) {
        fields.insert("user_id".to_string(), user_id);
    }
    set_id(&mut value, "guild_id", guild_id);
    (value, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_cache::{CacheConfig, EntityKind};

    fn interceptor() -> (EventInterceptor, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        let cache = DataCache::from_config(&CacheConfig::default()).unwrap();
        (EventInterceptor::new(cache, Arc::clone(&bus)), bus)
    }

    fn dispatch(event_type: &str, data: Value) -> ShardEvent {
        ShardEvent::Dispatch {
            shard: 0,
            event_type: event_type.to_string(),
            sequence: None,
            data,
        }
    }

    fn guild_create() -> ShardEvent {
        dispatch(
            "GUILD_CREATE",
            json!({
                "id": "10",
                "name": "guild",
                "owner_id": "1",
                "channels": [{"id": "20", "type": 0, "name": "general"}],
                "roles": [{"id": "10", "name": "@everyone"}],
                "members": [
                    {"user": {"id": "1", "username": "owner"}, "roles": []},
                    {"user": {"id": "2", "username": "mod"}, "nick": "m", "roles": ["30"]}
                ],
                "presences": [{"user": {"id": "2"}, "status": "online"}]
            }),
        )
    }

    #[tokio::test]
    async fn test_guild_create_splits_collections() {
        let (interceptor, _bus) = interceptor();
        let event = interceptor.handle(guild_create()).await;

        let DomainEvent::GuildCreate(event) = event else {
            panic!("expected GuildCreate, got {event:?}");
        };
        assert_eq!(event.guild.name, "guild");
        assert!(event.old.is_none());

        let cache = interceptor.cache();
        let guild = cache.get(&CacheKey::guild(Snowflake::new(10))).await.unwrap().unwrap();
        assert!(guild.get("members").is_none());

        let channel: ChannelData = cache
            .get_as(&CacheKey::channel(Snowflake::new(20)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(channel.guild_id, Some(Snowflake::new(10)));

        let role: RoleData = cache
            .get_as(&CacheKey::role(Snowflake::new(10)))
            .await
            .unwrap()
            .unwrap();
        assert!(role.is_everyone());

        let members = cache.members(Snowflake::new(10)).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].nick.as_deref(), Some("m"));
        assert!(members[1].has_role(Snowflake::new(30)));

        let user: UserData = cache
            .get_as(&CacheKey::user(Snowflake::new(2)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "mod");

        let presence: PresenceData = cache
            .get_as(&CacheKey::presence(Snowflake::new(10), Snowflake::new(2)))
            .await
            .unwrap()
            .unwrap();
        assert!(presence.is_online());
    }

    #[tokio::test]
    async fn test_member_update_merges_and_carries_old() {
        let (interceptor, _bus) = interceptor();
        interceptor.handle(guild_create()).await;

        let event = interceptor
            .handle(dispatch(
                "GUILD_MEMBER_UPDATE",
                json!({"guild_id": "10", "user": {"id": "2", "username": "mod2"}, "nick": "new"}),
            ))
            .await;

        let DomainEvent::MemberUpdate(event) = event else {
            panic!("expected MemberUpdate, got {event:?}");
        };
        assert_eq!(event.member.nick.as_deref(), Some("new"));
        // Roles were absent from the update and survive the merge
        assert!(event.member.has_role(Snowflake::new(30)));
        assert_eq!(event.old.unwrap().nick.as_deref(), Some("m"));

        let user: UserData = interceptor
            .cache()
            .get_as(&CacheKey::user(Snowflake::new(2)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "mod2");
    }

    #[tokio::test]
    async fn test_member_remove_evicts() {
        let (interceptor, _bus) = interceptor();
        interceptor.handle(guild_create()).await;

        let event = interceptor
            .handle(dispatch(
                "GUILD_MEMBER_REMOVE",
                json!({"guild_id": "10", "user": {"id": "2", "username": "mod"}}),
            ))
            .await;
        let DomainEvent::MemberRemove(event) = event else {
            panic!("expected MemberRemove, got {event:?}");
        };
        assert_eq!(event.old.unwrap().user_id, Snowflake::new(2));

        let cache = interceptor.cache();
        assert_eq!(cache.members(Snowflake::new(10)).await.unwrap().len(), 1);
        assert!(cache
            .get(&CacheKey::presence(Snowflake::new(10), Snowflake::new(2)))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_guild_delete_outage_keeps_entries() {
        let (interceptor, _bus) = interceptor();
        interceptor.handle(guild_create()).await;

        let event = interceptor
            .handle(dispatch("GUILD_DELETE", json!({"id": "10", "unavailable": true})))
            .await;
        let DomainEvent::GuildDelete(event) = event else {
            panic!("expected GuildDelete, got {event:?}");
        };
        assert!(event.unavailable);
        assert!(event.old.is_some());

        let cache = interceptor.cache();
        let guild: GuildData = cache
            .get_as(&CacheKey::guild(Snowflake::new(10)))
            .await
            .unwrap()
            .unwrap();
        assert!(guild.unavailable);
        assert_eq!(guild.name, "guild");
        assert_eq!(cache.members(Snowflake::new(10)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_guild_delete_evicts_everything_owned() {
        let (interceptor, _bus) = interceptor();
        interceptor.handle(guild_create()).await;

        interceptor
            .handle(dispatch("GUILD_DELETE", json!({"id": "10"})))
            .await;

        let cache = interceptor.cache();
        assert!(cache.get(&CacheKey::guild(Snowflake::new(10))).await.unwrap().is_none());
        assert!(cache.get(&CacheKey::channel(Snowflake::new(20))).await.unwrap().is_none());
        assert!(cache.get(&CacheKey::role(Snowflake::new(10))).await.unwrap().is_none());
        assert!(cache.members(Snowflake::new(10)).await.unwrap().is_empty());
        // Users are global and outlive the guild
        assert!(cache.get(&CacheKey::user(Snowflake::new(2))).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_uncached_messages_report_no_old_state() {
        let (interceptor, _bus) = interceptor();
        assert!(!interceptor.cache().is_cached(EntityKind::Message));

        interceptor
            .handle(dispatch(
                "MESSAGE_CREATE",
                json!({"id": "5", "channel_id": "20", "content": "hi"}),
            ))
            .await;
        let event = interceptor
            .handle(dispatch(
                "MESSAGE_UPDATE",
                json!({"id": "5", "channel_id": "20", "content": "edited"}),
            ))
            .await;

        let DomainEvent::MessageUpdate(event) = event else {
            panic!("expected MessageUpdate, got {event:?}");
        };
        assert!(event.old.is_none());
        assert_eq!(event.message.content, "edited");
    }

    #[tokio::test]
    async fn test_role_lifecycle() {
        let (interceptor, _bus) = interceptor();
        interceptor
            .handle(dispatch(
                "GUILD_ROLE_CREATE",
                json!({"guild_id": "10", "role": {"id": "30", "name": "mod", "color": 1}}),
            ))
            .await;
        let event = interceptor
            .handle(dispatch(
                "GUILD_ROLE_UPDATE",
                json!({"guild_id": "10", "role": {"id": "30", "name": "moderator"}}),
            ))
            .await;
        let DomainEvent::RoleUpdate(event) = event else {
            panic!("expected RoleUpdate, got {event:?}");
        };
        assert_eq!(event.role.name, "moderator");
        assert_eq!(event.role.color, 1);
        assert_eq!(event.role.guild_id, Some(Snowflake::new(10)));
        assert_eq!(event.old.unwrap().name, "mod");

        let event = interceptor
            .handle(dispatch(
                "GUILD_ROLE_DELETE",
                json!({"guild_id": "10", "role_id": "30"}),
            ))
            .await;
        let DomainEvent::RoleDelete(event) = event else {
            panic!("expected RoleDelete, got {event:?}");
        };
        assert_eq!(event.old.unwrap().name, "moderator");
    }

    #[tokio::test]
    async fn test_members_chunk_is_cached_and_passed_through() {
        let (interceptor, _bus) = interceptor();
        let event = interceptor
            .handle(dispatch(
                "GUILD_MEMBERS_CHUNK",
                json!({
                    "guild_id": "10",
                    "members": [{"user": {"id": "7"}}, {"user": {"id": "8"}}],
                    "chunk_index": 0,
                    "chunk_count": 1
                }),
            ))
            .await;

        assert_eq!(event.event_type(), "GUILD_MEMBERS_CHUNK");
        let members = interceptor.cache().members(Snowflake::new(10)).await.unwrap();
        let ids: Vec<_> = members.iter().map(|m| m.user_id).collect();
        assert_eq!(ids, vec![Snowflake::new(7), Snowflake::new(8)]);
    }

    #[tokio::test]
    async fn test_cache_is_updated_before_publish() {
        let (interceptor, bus) = interceptor();
        let mut subscription = bus.subscribe();

        interceptor.handle(guild_create()).await;
        let event = subscription.recv().await.unwrap();

        let guild_id = event.guild_id().unwrap();
        assert!(interceptor
            .cache()
            .get(&CacheKey::guild(guild_id))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_fatal_and_malformed_events() {
        let (interceptor, _bus) = interceptor();

        let event = interceptor
            .handle(ShardEvent::Fatal {
                shard: 3,
                reason: "retries exhausted".to_string(),
            })
            .await;
        assert!(matches!(event, DomainEvent::ShardDown(ShardDownEvent { shard: 3, .. })));

        let event = interceptor
            .handle(dispatch("CHANNEL_UPDATE", json!({"name": "no id"})))
            .await;
        assert!(matches!(event, DomainEvent::Unknown(ref e) if e.event_type == "CHANNEL_UPDATE"));

        let event = interceptor
            .handle(dispatch("VOICE_STATE_UPDATE", json!({"channel_id": null})))
            .await;
        assert_eq!(event.event_type(), "VOICE_STATE_UPDATE");
    }

    #[tokio::test]
    async fn test_run_drains_stream_in_order() {
        let (interceptor, _bus) = interceptor();
        let frames = vec![
            dispatch("CHANNEL_CREATE", json!({"id": "1", "name": "a"})),
            dispatch("CHANNEL_UPDATE", json!({"id": "1", "name": "b"})),
            dispatch("CHANNEL_UPDATE", json!({"id": "1", "topic": "t"})),
        ];
        let cache = interceptor.cache().clone();

        interceptor.run(futures::stream::iter(frames)).await;

        let channel: ChannelData = cache
            .get_as(&CacheKey::channel(Snowflake::new(1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(channel.name.as_deref(), Some("b"));
        assert_eq!(channel.topic.as_deref(), Some("t"));
    }

    async fn cached(interceptor: &EventInterceptor, key: CacheKey) -> bool {
        interceptor.cache().get(&key).await.unwrap().is_some()
    }

    #[tokio::test]
    async fn test_rejected_guild_create_writes_nothing() {
        let (interceptor, _bus) = interceptor();
        let event = interceptor
            .handle(dispatch(
                "GUILD_CREATE",
                json!({
                    "id": "10",
                    "name": "guild",
                    "channels": [{"id": "20", "name": "general"}, {"name": "no id"}],
                    "roles": [{"id": "10", "name": "@everyone"}],
                    "members": [{"user": {"id": "1", "username": "owner"}}]
                }),
            ))
            .await;

        assert!(matches!(event, DomainEvent::Unknown(ref e) if e.event_type == "GUILD_CREATE"));
        assert!(!cached(&interceptor, CacheKey::channel(Snowflake::new(20))).await);
        assert!(!cached(&interceptor, CacheKey::role(Snowflake::new(10))).await);
        assert!(!cached(&interceptor, CacheKey::user(Snowflake::new(1))).await);
        assert!(!cached(&interceptor, CacheKey::guild(Snowflake::new(10))).await);
    }

    #[tokio::test]
    async fn test_rejected_member_chunk_writes_nothing() {
        let (interceptor, _bus) = interceptor();
        interceptor
            .handle(dispatch(
                "GUILD_MEMBERS_CHUNK",
                json!({
                    "guild_id": "10",
                    "members": [{"user": {"id": "7"}}, {"nick": "no user"}],
                    "chunk_index": 0,
                    "chunk_count": 1
                }),
            ))
            .await;

        assert!(interceptor.cache().members(Snowflake::new(10)).await.unwrap().is_empty());
        assert!(!cached(&interceptor, CacheKey::user(Snowflake::new(7))).await);
    }

    #[tokio::test]
    async fn test_rejected_updates_leave_user_alone() {
        let (interceptor, _bus) = interceptor();
        interceptor.handle(guild_create()).await;

        // Member roles must be a list; the user must not be merged either
        let event = interceptor
            .handle(dispatch(
                "GUILD_MEMBER_UPDATE",
                json!({"guild_id": "10", "user": {"id": "2", "username": "renamed"}, "roles": 5}),
            ))
            .await;
        assert!(matches!(event, DomainEvent::Unknown(_)));

        let event = interceptor
            .handle(dispatch(
                "PRESENCE_UPDATE",
                json!({"guild_id": "10", "user": {"id": "2", "username": "renamed"}, "status": 3}),
            ))
            .await;
        assert!(matches!(event, DomainEvent::Unknown(_)));

        let user: UserData = interceptor
            .cache()
            .get_as(&CacheKey::user(Snowflake::new(2)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "mod");
    }

    #[tokio::test]
    async fn test_entities_without_id_are_not_cached() {
        let (interceptor, _bus) = interceptor();
        let cache_all = DataCache::from_config(
            &CacheConfig::default().with_backing(EntityKind::Message, chat_cache::BackingKind::Map),
        )
        .unwrap();
        let interceptor_all = EventInterceptor::new(cache_all, Arc::new(EventBus::new()));

        let event = interceptor
            .handle(dispatch("CHANNEL_CREATE", json!({"name": "no id"})))
            .await;
        assert!(matches!(event, DomainEvent::Unknown(_)));
        assert!(!cached(&interceptor, CacheKey::channel(Snowflake::new(0))).await);

        let event = interceptor_all
            .handle(dispatch("MESSAGE_CREATE", json!({"channel_id": "1", "content": "hi"})))
            .await;
        assert!(matches!(event, DomainEvent::Unknown(_)));
        assert!(!cached(&interceptor_all, CacheKey::message(Snowflake::new(0))).await);

        let event = interceptor
            .handle(dispatch("GUILD_MEMBER_ADD", json!({"guild_id": "10", "nick": "ghost"})))
            .await;
        assert!(matches!(event, DomainEvent::Unknown(_)));
        assert!(interceptor.cache().members(Snowflake::new(10)).await.unwrap().is_empty());
    }
}
