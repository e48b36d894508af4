//! Instance-wide listings and administration endpoints.

use serde_json::Value;
use tracing::debug;

use crate::client::{DssClient, flag};
use crate::error::ApiError;

/// Read-only instance resources that are fetched without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceResource {
    RunningNotebooks,
    Plugins,
    Groups,
    CodeEnvs,
    CodeEnvUsages,
    Clusters,
    Meanings,
    Workspaces,
    DataCollections,
    LicensingStatus,
    SanityCheckCodes,
    DataQualityStatus,
}

impl InstanceResource {
    fn segments(self) -> &'static [&'static str] {
        match self {
            Self::RunningNotebooks => &["admin", "notebooks", ""],
            Self::Plugins => &["plugins", ""],
            Self::Groups => &["admin", "groups", ""],
            Self::CodeEnvs => &["admin", "code-envs", ""],
            Self::CodeEnvUsages => &["admin", "code-envs", "usages"],
            Self::Clusters => &["admin", "clusters", ""],
            Self::Meanings => &["meanings", ""],
            Self::Workspaces => &["workspaces", ""],
            Self::DataCollections => &["data-collections", ""],
            Self::LicensingStatus => &["admin", "licensing", "status"],
            Self::SanityCheckCodes => &["admin", "sanity-check", "codes"],
            Self::DataQualityStatus => &["data-quality", "status"],
        }
    }
}

impl DssClient {
    pub async fn instance_resource(&self, resource: InstanceResource) -> Result<Value, ApiError> {
        self.get_json(resource.segments(), &[]).await
    }

    pub async fn list_users(&self, include_settings: bool) -> Result<Value, ApiError> {
        self.get_json(&["admin", "users", ""], &[("includeSettings", flag(include_settings))])
            .await
    }

    pub async fn list_connections(&self) -> Result<Value, ApiError> {
        self.get_json(&["admin", "connections", ""], &[]).await
    }

    /// Connection names, optionally restricted to one connection type (`all` for every type).
    pub async fn connection_names(&self, connection_type: &str) -> Result<Value, ApiError> {
        self.get_json(&["connections", "get-names"], &[("type", connection_type.to_string())])
            .await
    }

    /// Whether the key holder has administrator rights.
    ///
    /// Probed by listing connections, which only administrators may do. Any
    /// rejection by the platform means "not an administrator"; failures to
    /// reach the platform are still reported as errors.
    pub async fn is_admin(&self) -> Result<bool, ApiError> {
        match self.list_connections().await {
            Ok(_) => Ok(true),
            Err(error) if error.is_http_rejection() => {
                debug!(%error, "connection listing rejected; caller is not an administrator");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    pub async fn general_settings(&self) -> Result<serde_json::Map<String, Value>, ApiError> {
        self.get_json(&["admin", "general-settings"], &[]).await
    }

    pub async fn save_general_settings(&self, settings: &serde_json::Map<String, Value>) -> Result<(), ApiError> {
        self.put_json(&["admin", "general-settings"], settings).await?;
        Ok(())
    }
}
