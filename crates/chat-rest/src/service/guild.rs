//! Guild endpoints: the guild itself, channels, members, bans and roles
//!
//! Mutating calls take an optional audit-log reason.

use std::sync::Arc;

use chat_core::{ChannelData, GuildData, MemberData, RoleData, Snowflake};

use super::{call, call_empty};
use crate::error::RestResult;
use crate::handler::RequestHandler;
use crate::json::{
    BanAddRequest, BanResponse, ChannelCreateRequest, GuildCreateRequest, GuildModifyRequest,
    MemberModifyRequest, MemberResponse, PositionModifyRequest, RoleCreateRequest,
    RoleModifyRequest,
};
use crate::request::Request;
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct GuildService {
    handler: Arc<dyn RequestHandler>,
}

impl GuildService {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }

    fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }

    pub async fn create_guild(&self, guild: &GuildCreateRequest) -> RestResult<GuildData> {
        let request = Request::new(Route::GUILDS_POST).json(guild)?;
        call(self.handler(), request).await
    }

    pub async fn get_guild(&self, guild_id: Snowflake) -> RestResult<GuildData> {
        let request = Request::new(Route::GUILD_GET).param("guild_id", guild_id);
        call(self.handler(), request).await
    }

    pub async fn modify_guild(
        &self,
        guild_id: Snowflake,
        guild: &GuildModifyRequest,
        reason: Option<&str>,
    ) -> RestResult<GuildData> {
        let request = Request::new(Route::GUILD_PATCH)
            .param("guild_id", guild_id)
            .json(guild)?
            .reason(reason);
        call(self.handler(), request).await
    }

    /// Delete a guild the current user owns
    pub async fn delete_guild(&self, guild_id: Snowflake) -> RestResult<()> {
        let request = Request::new(Route::GUILD_DELETE).param("guild_id", guild_id);
        call_empty(self.handler(), request).await
    }

    // === Channels ===

    pub async fn get_guild_channels(&self, guild_id: Snowflake) -> RestResult<Vec<ChannelData>> {
        let request = Request::new(Route::GUILD_CHANNELS_GET).param("guild_id", guild_id);
        call(self.handler(), request).await
    }

    pub async fn create_guild_channel(
        &self,
        guild_id: Snowflake,
        channel: &ChannelCreateRequest,
        reason: Option<&str>,
    ) -> RestResult<ChannelData> {
        let request = Request::new(Route::GUILD_CHANNELS_POST)
            .param("guild_id", guild_id)
            .json(channel)?
            .reason(reason);
        call(self.handler(), request).await
    }

    pub async fn modify_guild_channel_positions(
        &self,
        guild_id: Snowflake,
        positions: &[PositionModifyRequest],
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_CHANNELS_PATCH)
            .param("guild_id", guild_id)
            .json(&positions)?
            .reason(reason);
        call_empty(self.handler(), request).await
    }

    // === Members ===

    /// One page of members, ordered by user id, starting after `after`
    pub async fn get_guild_members(
        &self,
        guild_id: Snowflake,
        after: Option<Snowflake>,
        limit: u32,
    ) -> RestResult<Vec<MemberResponse>> {
        let mut request = Request::new(Route::GUILD_MEMBERS_GET)
            .param("guild_id", guild_id)
            .query("limit", limit.clamp(1, 1000));
        if let Some(after) = after {
            request = request.query("after", after);
        }
        call(self.handler(), request).await
    }

    pub async fn get_guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RestResult<MemberData> {
        let request = Request::new(Route::GUILD_MEMBER_GET)
            .param("guild_id", guild_id)
            .param("user_id", user_id);
        let response: MemberResponse = call(self.handler(), request).await?;
        Ok(response.into_parts(guild_id).0)
    }

    pub async fn modify_guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        member: &MemberModifyRequest,
        reason: Option<&str>,
    ) -> RestResult<MemberData> {
        let request = Request::new(Route::GUILD_MEMBER_PATCH)
            .param("guild_id", guild_id)
            .param("user_id", user_id)
            .json(member)?
            .reason(reason);
        let response: MemberResponse = call(self.handler(), request).await?;
        Ok(response.into_parts(guild_id).0)
    }

    /// Kick a member
    pub async fn delete_guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_MEMBER_DELETE)
            .param("guild_id", guild_id)
            .param("user_id", user_id)
            .reason(reason);
        call_empty(self.handler(), request).await
    }

    pub async fn add_role_to_guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_MEMBER_ROLE_PUT)
            .param("guild_id", guild_id)
            .param("user_id", user_id)
            .param("role_id", role_id)
            .reason(reason);
        call_empty(self.handler(), request).await
    }

    pub async fn delete_role_from_guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_MEMBER_ROLE_DELETE)
            .param("guild_id", guild_id)
            .param("user_id", user_id)
            .param("role_id", role_id)
            .reason(reason);
        call_empty(self.handler(), request).await
    }

    // === Bans ===

    pub async fn get_guild_bans(&self, guild_id: Snowflake) -> RestResult<Vec<BanResponse>> {
        let request = Request::new(Route::GUILD_BANS_GET).param("guild_id", guild_id);
        call(self.handler(), request).await
    }

    pub async fn get_guild_ban(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RestResult<BanResponse> {
        let request = Request::new(Route::GUILD_BAN_GET)
            .param("guild_id", guild_id)
            .param("user_id", user_id);
        call(self.handler(), request).await
    }

    pub async fn add_guild_ban(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        ban: &BanAddRequest,
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_BAN_PUT)
            .param("guild_id", guild_id)
            .param("user_id", user_id)
            .json(ban)?
            .reason(reason);
        call_empty(self.handler(), request).await
    }

    pub async fn delete_guild_ban(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_BAN_DELETE)
            .param("guild_id", guild_id)
            .param("user_id", user_id)
            .reason(reason);
        call_empty(self.handler(), request).await
    }

    // === Roles ===

    pub async fn get_guild_roles(&self, guild_id: Snowflake) -> RestResult<Vec<RoleData>> {
        let request = Request::new(Route::GUILD_ROLES_GET).param("guild_id", guild_id);
        let mut roles: Vec<RoleData> = call(self.handler(), request).await?;
        for role in &mut roles {
            role.guild_id = Some(guild_id);
        }
        Ok(roles)
    }

    pub async fn create_guild_role(
        &self,
        guild_id: Snowflake,
        role: &RoleCreateRequest,
        reason: Option<&str>,
    ) -> RestResult<RoleData> {
        let request = Request::new(Route::GUILD_ROLES_POST)
            .param("guild_id", guild_id)
            .json(role)?
            .reason(reason);
        let mut role: RoleData = call(self.handler(), request).await?;
        role.guild_id = Some(guild_id);
        Ok(role)
    }

    /// Reorder roles; answers with every role of the guild
    pub async fn modify_guild_role_positions(
        &self,
        guild_id: Snowflake,
        positions: &[PositionModifyRequest],
        reason: Option<&str>,
    ) -> RestResult<Vec<RoleData>> {
        let request = Request::new(Route::GUILD_ROLES_PATCH)
            .param("guild_id", guild_id)
            .json(&positions)?
            .reason(reason);
        let mut roles: Vec<RoleData> = call(self.handler(), request).await?;
        for role in &mut roles {
            role.guild_id = Some(guild_id);
        }
        Ok(roles)
    }

    pub async fn modify_guild_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        role: &RoleModifyRequest,
        reason: Option<&str>,
    ) -> RestResult<RoleData> {
        let request = Request::new(Route::GUILD_ROLE_PATCH)
            .param("guild_id", guild_id)
            .param("role_id", role_id)
            .json(role)?
            .reason(reason);
        let mut role: RoleData = call(self.handler(), request).await?;
        role.guild_id = Some(guild_id);
        Ok(role)
    }

    pub async fn delete_guild_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> RestResult<()> {
        let request = Request::new(Route::GUILD_ROLE_DELETE)
            .param("guild_id", guild_id)
            .param("role_id", role_id)
            .reason(reason);
        call_empty(self.handler(), request).await
    }
}
