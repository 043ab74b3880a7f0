//! REST routes
//!
//! A route is a method plus a path template such as `/guilds/{guild_id}/members/{user_id}`.
//! Its rate-limit bucket is the method and the template with only the major parameters
//! (`guild_id`, `channel_id`, `webhook_id`) filled in, so two members of the same guild
//! share a bucket while two guilds do not.

use reqwest::Method;

use crate::error::{RestError, RestResult};

/// Path parameters that partition rate-limit buckets
pub const MAJOR_PARAMETERS: [&str; 3] = ["guild_id", "channel_id", "webhook_id"];

/// One endpoint of the REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub template: &'static str,
}

impl Route {
    pub const fn new(method: Method, template: &'static str) -> Self {
        Self { method, template }
    }

    // === Gateway ===
    pub const GATEWAY_BOT_GET: Route = Route::new(Method::GET, "/gateway/bot");

    // === Users ===
    pub const CURRENT_USER_GET: Route = Route::new(Method::GET, "/users/@me");
    pub const USER_GET: Route = Route::new(Method::GET, "/users/{user_id}");

    // === Guilds ===
    pub const GUILDS_POST: Route = Route::new(Method::POST, "/guilds");
    pub const GUILD_GET: Route = Route::new(Method::GET, "/guilds/{guild_id}");
    pub const GUILD_PATCH: Route = Route::new(Method::PATCH, "/guilds/{guild_id}");
    pub const GUILD_DELETE: Route = Route::new(Method::DELETE, "/guilds/{guild_id}");
    pub const GUILD_CHANNELS_GET: Route = Route::new(Method::GET, "/guilds/{guild_id}/channels");
    pub const GUILD_CHANNELS_POST: Route = Route::new(Method::POST, "/guilds/{guild_id}/channels");
    pub const GUILD_CHANNELS_PATCH: Route =
        Route::new(Method::PATCH, "/guilds/{guild_id}/channels");

    // === Members ===
    pub const GUILD_MEMBERS_GET: Route = Route::new(Method::GET, "/guilds/{guild_id}/members");
    pub const GUILD_MEMBER_GET: Route =
        Route::new(Method::GET, "/guilds/{guild_id}/members/{user_id}");
    pub const GUILD_MEMBER_PATCH: Route =
        Route::new(Method::PATCH, "/guilds/{guild_id}/members/{user_id}");
    pub const GUILD_MEMBER_DELETE: Route =
        Route::new(Method::DELETE, "/guilds/{guild_id}/members/{user_id}");
    pub const GUILD_MEMBER_ROLE_PUT: Route =
        Route::new(Method::PUT, "/guilds/{guild_id}/members/{user_id}/roles/{role_id}");
    pub const GUILD_MEMBER_ROLE_DELETE: Route =
        Route::new(Method::DELETE, "/guilds/{guild_id}/members/{user_id}/roles/{role_id}");

    // === Bans ===
    pub const GUILD_BANS_GET: Route = Route::new(Method::GET, "/guilds/{guild_id}/bans");
    pub const GUILD_BAN_GET: Route = Route::new(Method::GET, "/guilds/{guild_id}/bans/{user_id}");
    pub const GUILD_BAN_PUT: Route = Route::new(Method::PUT, "/guilds/{guild_id}/bans/{user_id}");
    pub const GUILD_BAN_DELETE: Route =
        Route::new(Method::DELETE, "/guilds/{guild_id}/bans/{user_id}");

    // === Roles ===
    pub const GUILD_ROLES_GET: Route = Route::new(Method::GET, "/guilds/{guild_id}/roles");
    pub const GUILD_ROLES_POST: Route = Route::new(Method::POST, "/guilds/{guild_id}/roles");
    pub const GUILD_ROLES_PATCH: Route = Route::new(Method::PATCH, "/guilds/{guild_id}/roles");
    pub const GUILD_ROLE_PATCH: Route =
        Route::new(Method::PATCH, "/guilds/{guild_id}/roles/{role_id}");
    pub const GUILD_ROLE_DELETE: Route =
        Route::new(Method::DELETE, "/guilds/{guild_id}/roles/{role_id}");

    /// Render the template with every parameter from `params`
    pub fn path(&self, params: &[(&'static str, String)]) -> RestResult<String> {
        render(self.template, |name| {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        })
    }

    /// Rate-limit bucket key: method plus template with only major parameters filled in
    pub fn bucket_key(&self, params: &[(&'static str, String)]) -> String {
        let rendered = render(self.template, |name| {
            let value = MAJOR_PARAMETERS
                .iter()
                .any(|major| *major == name)
                .then(|| params.iter().find(|(key, _)| *key == name))
                .flatten()
                .map(|(_, value)| value.clone());
            Some(value.unwrap_or_else(|| format!("{{{name}}}")))
        });
        // The lookup never fails, so rendering cannot either
        let path = rendered.unwrap_or_else(|_| self.template.to_string());
        format!("{} {path}", self.method)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

fn render<F>(template: &'static str, lookup: F) -> RestResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let name = &after[..close];
        let value = lookup(name).ok_or_else(|| RestError::MissingParameter(param_name(name)))?;
        out.push_str(&value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Static name of a template parameter, for error reporting
fn param_name(name: &str) -> &'static str {
    const KNOWN: [&str; 5] = ["guild_id", "channel_id", "webhook_id", "user_id", "role_id"];
    KNOWN.into_iter().find(|known| *known == name).unwrap_or("unknown")
}
