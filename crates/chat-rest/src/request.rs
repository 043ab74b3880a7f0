//! Logical REST requests

use serde::Serialize;
use serde_json::Value;

use crate::error::RestResult;
use crate::route::Route;

/// Header carrying the audit-log reason of a mutating call
pub const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// A call to one route, before it is turned into an HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub route: Route,
    pub params: Vec<(&'static str, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub reason: Option<String>,
}

impl Request {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            params: Vec::new(),
            query: Vec::new(),
            body: None,
            reason: None,
        }
    }

    /// Fill a path parameter
    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize>(mut self, body: &T) -> RestResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an optional audit-log reason
    pub fn reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(str::to_string);
        self
    }

    /// Rendered path, without the query string
    pub fn path(&self) -> RestResult<String> {
        self.route.path(&self.params)
    }

    pub fn bucket_key(&self) -> String {
        self.route.bucket_key(&self.params)
    }
}
