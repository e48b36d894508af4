//! Tool implementations grouped by platform area.
//!
//! Each tool is an async function taking a [`CallContext`] and its request.
//! Tools run their local validation first and only then resolve the caller's
//! credentials, so rejected arguments never reach the platform.

pub(crate) mod datasets;
pub(crate) mod flow;
pub(crate) mod instance;
pub(crate) mod projects;
pub(crate) mod recipes;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use axum::http::HeaderMap;
use dssmcp_api::{DssClient, DssConnector};
use rmcp::model::ErrorData;
use serde::Serialize;
use serde_json::Value;

use crate::server::errors::{api_error, decode};

/// Everything a tool needs to act on behalf of one caller.
#[derive(Debug, Clone)]
pub struct CallContext {
    connector: Arc<DssConnector>,
    headers: Option<HeaderMap>,
}

impl CallContext {
    pub fn new(connector: Arc<DssConnector>, headers: Option<HeaderMap>) -> Self {
        Self { connector, headers }
    }

    /// Client scoped to the caller's API key.
    pub fn client(&self, operation: &str) -> Result<DssClient, ErrorData> {
        self.connector
            .connect(self.headers.as_ref())
            .map_err(|error| api_error(operation, &error))
    }
}

pub(crate) fn to_structured<T: Serialize>(operation: &'static str, value: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(value).map_err(decode(operation))
}
