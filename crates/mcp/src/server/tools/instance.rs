//! Instance-wide tools: background tasks, users, connections, code
//! environments and general settings.

use dssmcp_api::InstanceResource;
use dssmcp_types::{ALLOWED_GENERAL_SETTINGS_KEYS, CodeEnvSummary, check_settings_keys};
use rmcp::model::ErrorData;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::server::errors::{decode, error_result, remote};
use crate::server::schemas::{AllUsersRequest, ConnectionNamesRequest, GetGeneralSettingsRequest, ListUsersRequest, SetGeneralSettingsRequest};
use crate::server::tools::{CallContext, to_structured};

pub(crate) async fn list_futures(context: CallContext, request: AllUsersRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_futures";
    let client = context.client(OPERATION)?;
    let futures = client.list_futures(request.all_users, false).await.map_err(remote(OPERATION))?;
    Ok(Value::Array(futures))
}

pub(crate) async fn list_running_scenarios(context: CallContext, request: AllUsersRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_running_scenarios";
    let client = context.client(OPERATION)?;
    let futures = client.list_futures(request.all_users, true).await.map_err(remote(OPERATION))?;
    Ok(Value::Array(futures))
}

pub(crate) async fn list_users(context: CallContext, request: ListUsersRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_users";
    let client = context.client(OPERATION)?;
    client.list_users(request.include_settings).await.map_err(remote(OPERATION))
}

/// Auth info of the key holder, plus whether they administer the instance.
pub(crate) async fn get_auth_info(context: CallContext) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_auth_info";
    let client = context.client(OPERATION)?;
    let mut auth_info = client.auth_info().await.map_err(remote(OPERATION))?;
    let is_admin = client.is_admin().await.map_err(remote(OPERATION))?;
    match auth_info.as_object_mut() {
        Some(fields) => {
            fields.insert("isAdmin".to_string(), Value::Bool(is_admin));
            Ok(auth_info)
        }
        None => Ok(json!({"authInfo": auth_info, "isAdmin": is_admin})),
    }
}

pub(crate) async fn list_connections_names(context: CallContext, request: ConnectionNamesRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_connections_names";
    let client = context.client(OPERATION)?;
    client
        .connection_names(&request.connection_type)
        .await
        .map_err(remote(OPERATION))
}

pub(crate) async fn list_code_envs(context: CallContext) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_code_envs";
    let client = context.client(OPERATION)?;
    let raw = client
        .instance_resource(InstanceResource::CodeEnvs)
        .await
        .map_err(remote(OPERATION))?;
    let environments: Vec<CodeEnvSummary> = serde_json::from_value(raw).map_err(decode(OPERATION))?;
    to_structured(OPERATION, &environments)
}

/// Fetch an instance resource that is forwarded untouched.
pub(crate) async fn instance_resource(context: CallContext, operation: &'static str, resource: InstanceResource) -> Result<Value, ErrorData> {
    let client = context.client(operation)?;
    client.instance_resource(resource).await.map_err(remote(operation))
}

/// Read a subset of the general settings.
///
/// Without `settings_keys`, every allowed key present on the instance is returned.
pub(crate) async fn get_general_settings(context: CallContext, request: GetGeneralSettingsRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_general_settings";
    let keys: Vec<String> = request
        .settings_keys
        .unwrap_or_else(|| ALLOWED_GENERAL_SETTINGS_KEYS.iter().map(|key| key.to_string()).collect());
    if let Err(error) = check_settings_keys(keys.iter().map(String::as_str)) {
        return Ok(error_result(error));
    }

    let client = context.client(OPERATION)?;
    let mut settings = client.general_settings().await.map_err(remote(OPERATION))?;
    let selected: Map<String, Value> = keys
        .into_iter()
        .filter_map(|key| settings.remove(&key).map(|value| (key, value)))
        .collect();
    Ok(Value::Object(selected))
}

/// Merge the provided keys into the current general settings and save them.
///
/// Keys are checked before anything is fetched, so a request with any
/// disallowed key never reaches the save call.
pub(crate) async fn set_general_settings(context: CallContext, request: SetGeneralSettingsRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "set_general_settings";
    if let Err(error) = check_settings_keys(request.settings.keys().map(String::as_str)) {
        return Ok(error_result(error));
    }

    let client = context.client(OPERATION)?;
    let mut settings = client.general_settings().await.map_err(remote(OPERATION))?;
    let updated_keys: Vec<String> = request.settings.keys().cloned().collect();
    settings.extend(request.settings);
    client.save_general_settings(&settings).await.map_err(remote(OPERATION))?;
    info!(keys = ?updated_keys, "updated general settings");
    Ok(json!({
        "message": "General settings updated successfully",
        "updatedKeys": updated_keys,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::*;
    use crate::server::tools::mock::MockDss;

    fn auth_info() -> Value {
        json!({"authIdentifier": "alice", "groups": ["analysts"]})
    }

    #[tokio::test]
    async fn forbidden_connection_listing_means_not_admin() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "auth/info", StatusCode::OK, auth_info()).respond(
            Method::GET,
            "admin/connections/",
            StatusCode::FORBIDDEN,
            json!({"errorType": "com.dataiku.dip.exceptions.UnauthorizedException", "message": "admin only"}),
        );
        let info = get_auth_info(mock.context()).await.expect("auth info");
        assert_eq!(info["authIdentifier"], "alice");
        assert_eq!(info["isAdmin"], false);
    }

    #[tokio::test]
    async fn successful_connection_listing_means_admin() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "auth/info", StatusCode::OK, auth_info())
            .respond(Method::GET, "admin/connections/", StatusCode::OK, json!({"filesystem_managed": {}}));
        let info = get_auth_info(mock.context()).await.expect("auth info");
        assert_eq!(info["isAdmin"], true);
    }

    #[tokio::test]
    async fn invalid_settings_key_never_saves() {
        let mock = MockDss::start().await;
        let mut settings = Map::new();
        settings.insert("maxRunningActivities".into(), json!(8));
        settings.insert("ldapSettings".into(), json!({}));
        let result = set_general_settings(mock.context(), SetGeneralSettingsRequest { settings })
            .await
            .expect("result");
        let message = result["error"].as_str().expect("message");
        assert!(message.starts_with("Invalid settings keys: [\"ldapSettings\"]"), "{message}");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn settings_update_merges_provided_keys() {
        let mock = MockDss::start().await;
        mock.respond(
            Method::GET,
            "admin/general-settings",
            StatusCode::OK,
            json!({"maxRunningActivities": 5, "security": {"ldap": false}, "udr": []}),
        );
        let mut settings = Map::new();
        settings.insert("maxRunningActivities".into(), json!(8));
        let result = set_general_settings(mock.context(), SetGeneralSettingsRequest { settings })
            .await
            .expect("updated");
        assert_eq!(result["updatedKeys"], json!(["maxRunningActivities"]));

        let saved = mock.requests_to(Method::PUT, "admin/general-settings");
        let body = saved[0].body.as_ref().expect("body");
        assert_eq!(body["maxRunningActivities"], 8);
        assert_eq!(body["security"], json!({"ldap": false}));
        assert_eq!(body["udr"], json!([]));

        let read = get_general_settings(
            mock.context(),
            GetGeneralSettingsRequest {
                settings_keys: Some(vec!["maxRunningActivities".into(), "sparkSettings".into()]),
            },
        )
        .await
        .expect("read back");
        assert_eq!(read, json!({"maxRunningActivities": 8}));
    }

    #[tokio::test]
    async fn code_envs_are_projected() {
        let mock = MockDss::start().await;
        mock.respond(
            Method::GET,
            "admin/code-envs/",
            StatusCode::OK,
            json!([{"envName": "py311", "envLang": "PYTHON", "owner": "admin", "pythonInterpreter": "PYTHON311", "deploymentMode": "DESIGN_MANAGED"}]),
        );
        let envs = list_code_envs(mock.context()).await.expect("envs");
        assert_eq!(
            envs,
            json!([{"envName": "py311", "envLang": "PYTHON", "owner": "admin", "pythonInterpreter": "PYTHON311"}])
        );
    }

    #[tokio::test]
    async fn running_scenarios_filter_futures() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "futures/", StatusCode::OK, json!([]));
        list_running_scenarios(mock.context(), AllUsersRequest { all_users: true })
            .await
            .expect("futures");
        let query = mock.requests()[0].query.clone().expect("query");
        assert_eq!(query, "withScenarios=true&withNotScenarios=false&allUsers=true");
    }
}
