//! Recipe tools.

use std::collections::HashSet;

use dssmcp_api::{DssClient, JobTarget, RecipeDefinition, job_state};
use dssmcp_types::{JobType, OutputSpec, RecipeType, first_successor_computable, validate_recipe_request};
use rmcp::model::ErrorData;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::server::errors::{decode, error_result, not_found_error, remote};
use crate::server::schemas::{CreateRecipeRequest, RecipeRequest, RunRecipeRequest, SetCodeRecipeCodeRequest, SetVisualRecipePayloadRequest};
use crate::server::tools::CallContext;

/// Create a recipe after checking its shape locally and its datasets remotely.
///
/// Shape violations and missing datasets come back as `{"error": ...}`
/// results; only the dataset listing precedes the creation call.
pub(crate) async fn create_recipe(context: CallContext, request: CreateRecipeRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "create_recipe";
    let outputs: Vec<OutputSpec> = request.outputs.iter().map(OutputSpec::from).collect();
    let recipe = match validate_recipe_request(&request.recipe_type, &request.inputs, &outputs, request.code.as_deref()) {
        Ok(recipe) => recipe,
        Err(error) => return Ok(error_result(error)),
    };

    let client = context.client(OPERATION)?;
    let catalog: HashSet<String> = client
        .dataset_names(&request.project_key)
        .await
        .map_err(remote(OPERATION))?
        .into_iter()
        .collect();
    if let Err(error) = recipe.check_catalog(&request.project_key, &catalog) {
        return Ok(error_result(error));
    }

    let requested_name = request
        .recipe_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| recipe.default_name());
    let recipe_name = client
        .create_recipe(&request.project_key, &requested_name, &recipe)
        .await
        .map_err(remote(OPERATION))?;
    info!(project_key = %request.project_key, recipe_name, recipe_type = %recipe.recipe_type, "created recipe");
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "recipe_name": recipe_name,
        "recipe_type": recipe.recipe_type.as_str(),
        "inputs": recipe.inputs,
        "outputs": recipe.output_names(),
        "message": format!("Recipe '{recipe_name}' created successfully"),
    }))
}

pub(crate) async fn get_recipe_settings(context: CallContext, request: RecipeRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_recipe_settings";
    let client = context.client(OPERATION)?;
    let definition = client
        .recipe_definition(&request.project_key, &request.recipe_name)
        .await
        .map_err(remote(OPERATION))?;
    let recipe_type = definition.recipe_type().to_string();

    let mut result = json!({
        "recipe_name": request.recipe_name,
        "type": recipe_type,
        "inputs": definition.field("inputs"),
        "outputs": definition.field("outputs"),
        "params": definition.field("params"),
    });
    if RecipeType::is_code_identifier(&recipe_type) {
        result["code"] = json!(definition.payload);
    } else {
        result["payload"] = definition.json_payload().map_err(decode(OPERATION))?;
    }
    Ok(result)
}

pub(crate) async fn set_code_recipe_code(context: CallContext, request: SetCodeRecipeCodeRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "set_code_recipe_code";
    let client = context.client(OPERATION)?;
    let mut definition = client
        .recipe_definition(&request.project_key, &request.recipe_name)
        .await
        .map_err(remote(OPERATION))?;
    let recipe_type = definition.recipe_type().to_string();
    if !RecipeType::is_code_identifier(&recipe_type) {
        return Ok(error_result(format!(
            "Recipe '{}' is type '{recipe_type}', not a code recipe. Use set_visual_recipe_payload for visual recipes.",
            request.recipe_name
        )));
    }

    definition.payload = Some(request.code);
    client
        .save_recipe_definition(&request.project_key, &request.recipe_name, &definition)
        .await
        .map_err(remote(OPERATION))?;
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "recipe_name": request.recipe_name,
        "recipe_type": recipe_type,
        "message": format!("Code updated on recipe '{}'", request.recipe_name),
    }))
}

/// Save a visual recipe payload, then apply any output schema changes it implies.
///
/// The schema step is best effort: once the payload is saved, a failure there
/// is reported as `schema_update_warning` instead of failing the call.
pub(crate) async fn set_visual_recipe_payload(context: CallContext, request: SetVisualRecipePayloadRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "set_visual_recipe_payload";
    let client = context.client(OPERATION)?;
    let mut definition: RecipeDefinition = client
        .recipe_definition(&request.project_key, &request.recipe_name)
        .await
        .map_err(remote(OPERATION))?;
    let recipe_type = definition.recipe_type().to_string();
    if RecipeType::is_code_identifier(&recipe_type) {
        return Ok(error_result(format!(
            "Recipe '{}' is a code recipe (type '{recipe_type}'). Use set_code_recipe_code instead.",
            request.recipe_name
        )));
    }

    definition.set_json_payload(&request.payload).map_err(decode(OPERATION))?;
    client
        .save_recipe_definition(&request.project_key, &request.recipe_name, &definition)
        .await
        .map_err(remote(OPERATION))?;

    let mut result = json!({
        "success": true,
        "project_key": request.project_key,
        "recipe_name": request.recipe_name,
        "recipe_type": recipe_type,
        "message": format!("Payload updated on recipe '{}'", request.recipe_name),
    });
    match apply_required_schema_updates(&client, &request.project_key, &request.recipe_name).await {
        Ok(true) => result["schema_updates_applied"] = Value::Bool(true),
        Ok(false) => {}
        Err(error) => {
            warn!(project_key = %request.project_key, recipe_name = %request.recipe_name, %error, "schema update failed after payload save");
            result["schema_update_warning"] = Value::String(error.to_string());
        }
    }
    Ok(result)
}

async fn apply_required_schema_updates(client: &DssClient, project_key: &str, recipe_name: &str) -> Result<bool, dssmcp_api::ApiError> {
    let updates = client.compute_schema_updates(project_key, recipe_name).await?;
    if !updates.any_action_required() {
        return Ok(false);
    }
    client.apply_schema_updates(project_key, recipe_name, &updates).await?;
    Ok(true)
}

/// Build the first computable output of a recipe.
pub(crate) async fn run_recipe(context: CallContext, request: RunRecipeRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "run_recipe";
    let job_type: JobType = match request.job_type.parse() {
        Ok(job_type) => job_type,
        Err(error) => return Ok(error_result(error)),
    };
    let client = context.client(OPERATION)?;

    let graph = client.flow_graph(&request.project_key).await.map_err(remote(OPERATION))?;
    let target = first_successor_computable(&graph.nodes, &request.recipe_name)
        .and_then(|node| node.job_output_type().map(|object_type| (node.reference.clone(), object_type)));
    let Some((target_id, object_type)) = target else {
        return Err(not_found_error(
            "DSS_RECIPE_HAS_NO_OUTPUT",
            format!(
                "recipe '{}' has no buildable output in the flow of project '{}'",
                request.recipe_name, request.project_key
            ),
            json!({"operation": OPERATION, "project_key": request.project_key, "recipe_name": request.recipe_name}),
            "Check the recipe name with list_project_recipes and its outputs with get_flow_graph.",
        ));
    };

    let targets = [JobTarget {
        id: target_id,
        object_type: object_type.to_string(),
    }];
    let job_id = client
        .start_job(&request.project_key, job_type, &targets)
        .await
        .map_err(remote(OPERATION))?;
    info!(project_key = %request.project_key, recipe_name = %request.recipe_name, job_id, %job_type, "started job");

    let status = if request.wait {
        client.wait_for_job(&request.project_key, &job_id).await
    } else {
        client.job_status(&request.project_key, &job_id).await
    }
    .map_err(remote(OPERATION))?;
    Ok(json!({
        "job_id": job_id,
        "project_key": request.project_key,
        "recipe_name": request.recipe_name,
        "status": job_state(&status),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::server::schemas::RecipeOutputParam;
    use crate::server::tools::mock::MockDss;

    fn create_request(recipe_type: &str, inputs: &[&str], outputs: &[&str], code: Option<&str>) -> CreateRecipeRequest {
        CreateRecipeRequest {
            project_key: "SALES".into(),
            recipe_type: recipe_type.into(),
            inputs: inputs.iter().map(|name| name.to_string()).collect(),
            outputs: outputs
                .iter()
                .map(|name| RecipeOutputParam {
                    name: name.to_string(),
                    append: false,
                })
                .collect(),
            recipe_name: None,
            code: code.map(str::to_string),
        }
    }

    fn datasets(names: &[&str]) -> Value {
        Value::Array(names.iter().map(|name| json!({"name": name, "type": "Filesystem", "managed": true})).collect())
    }

    #[tokio::test]
    async fn shape_errors_make_no_remote_calls() {
        let mock = MockDss::start().await;
        let cases = [
            create_request("nope", &["a"], &["b"], None),
            create_request("sync", &["a", "b"], &["c"], None),
            create_request("split", &["a"], &[], None),
            create_request("join", &["a", "b"], &["c"], Some("print(1)")),
        ];
        for request in cases {
            let result = create_recipe(mock.anonymous_context(), request).await.expect("result");
            assert!(result["error"].is_string(), "{result}");
        }
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_type_lists_valid_types() {
        let mock = MockDss::start().await;
        let result = create_recipe(mock.context(), create_request("nope", &["a"], &["b"], None))
            .await
            .expect("result");
        let message = result["error"].as_str().expect("message");
        assert!(message.starts_with("Invalid recipe_type 'nope'"));
        assert!(message.contains("'join'"));
    }

    #[tokio::test]
    async fn missing_input_is_reported_before_creation() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "projects/SALES/datasets/", StatusCode::OK, datasets(&["A", "C", "OUT"]));
        let result = create_recipe(mock.context(), create_request("join", &["A", "B", "C"], &["OUT"], None))
            .await
            .expect("result");
        let message = result["error"].as_str().expect("message");
        assert!(message.starts_with("Input dataset(s) not found in project 'SALES': ['B']"), "{message}");
        assert!(mock.requests_to(Method::POST, "projects/SALES/recipes/").is_empty());
    }

    #[tokio::test]
    async fn creates_code_recipe_with_default_name() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "projects/SALES/datasets/", StatusCode::OK, datasets(&["raw", "clean"]))
            .respond(Method::POST, "projects/SALES/recipes/", StatusCode::OK, json!({"name": "compute_clean"}));
        let result = create_recipe(mock.context(), create_request("python", &["raw"], &["clean"], Some("print(1)")))
            .await
            .expect("result");
        assert_eq!(result["success"], true);
        assert_eq!(result["recipe_name"], "compute_clean");
        assert_eq!(result["outputs"], json!(["clean"]));

        let posted = mock.requests_to(Method::POST, "projects/SALES/recipes/");
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].authorization.as_deref(), Some("Basic dGVzdC1rZXk6"));
        let body = posted[0].body.as_ref().expect("body");
        assert_eq!(body["recipePrototype"]["type"], "python");
        assert_eq!(body["creationSettings"]["script"], "print(1)");
    }

    #[tokio::test]
    async fn visual_payload_round_trips() {
        let mock = MockDss::start().await;
        mock.respond(
            Method::GET,
            "projects/SALES/recipes/compute_joined",
            StatusCode::OK,
            json!({"recipe": {"type": "join", "name": "compute_joined"}, "payload": "", "tags": ["keep"]}),
        )
        .respond(
            Method::GET,
            "projects/SALES/recipes/compute_joined/schema-update",
            StatusCode::OK,
            json!({"totalIncompatibilities": 0, "computables": []}),
        );
        let payload = json!({"joins": [{"table1": 0, "table2": 1, "type": "LEFT"}]});
        let result = set_visual_recipe_payload(
            mock.context(),
            SetVisualRecipePayloadRequest {
                project_key: "SALES".into(),
                recipe_name: "compute_joined".into(),
                payload: payload.clone(),
            },
        )
        .await
        .expect("saved");
        assert_eq!(result["success"], true);
        assert!(result.get("schema_updates_applied").is_none());

        let settings = get_recipe_settings(
            mock.context(),
            RecipeRequest {
                project_key: "SALES".into(),
                recipe_name: "compute_joined".into(),
            },
        )
        .await
        .expect("settings");
        assert_eq!(settings["type"], "join");
        assert_eq!(settings["payload"], payload);
        let saved = mock.requests_to(Method::PUT, "projects/SALES/recipes/compute_joined");
        assert_eq!(saved[0].body.as_ref().expect("body")["tags"], json!(["keep"]));
    }

    #[tokio::test]
    async fn schema_update_failure_is_a_warning() {
        let mock = MockDss::start().await;
        mock.respond(
            Method::GET,
            "projects/SALES/recipes/compute_joined",
            StatusCode::OK,
            json!({"recipe": {"type": "join"}, "payload": "{}"}),
        )
        .respond(
            Method::GET,
            "projects/SALES/recipes/compute_joined/schema-update",
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"errorType": "java.lang.IllegalStateException", "message": "boom"}),
        );
        let result = set_visual_recipe_payload(
            mock.context(),
            SetVisualRecipePayloadRequest {
                project_key: "SALES".into(),
                recipe_name: "compute_joined".into(),
                payload: json!({}),
            },
        )
        .await
        .expect("saved despite schema failure");
        assert_eq!(result["success"], true);
        assert!(result["schema_update_warning"].as_str().expect("warning").contains("boom"));
    }

    #[tokio::test]
    async fn code_setter_rejects_visual_recipes() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "projects/SALES/recipes/compute_joined", StatusCode::OK, json!({"recipe": {"type": "join"}}));
        let result = set_code_recipe_code(
            mock.context(),
            SetCodeRecipeCodeRequest {
                project_key: "SALES".into(),
                recipe_name: "compute_joined".into(),
                code: "print(1)".into(),
            },
        )
        .await
        .expect("result");
        assert_eq!(
            result["error"],
            "Recipe 'compute_joined' is type 'join', not a code recipe. Use set_visual_recipe_payload for visual recipes."
        );
        assert!(mock.requests_to(Method::PUT, "projects/SALES/recipes/compute_joined").is_empty());
    }

    fn flow_graph() -> Value {
        json!({"nodes": {
            "raw": {"ref": "raw", "type": "COMPUTABLE_DATASET", "predecessors": [], "successors": ["compute_clean"]},
            "compute_clean": {"ref": "compute_clean", "type": "RUNNABLE_RECIPE", "predecessors": ["raw"], "successors": ["clean"]},
            "clean": {"ref": "clean", "type": "COMPUTABLE_DATASET", "predecessors": ["compute_clean"], "successors": []},
        }})
    }

    fn run_request(wait: bool) -> RunRecipeRequest {
        RunRecipeRequest {
            project_key: "SALES".into(),
            recipe_name: "compute_clean".into(),
            job_type: "NON_RECURSIVE_FORCED_BUILD".into(),
            wait,
        }
    }

    #[tokio::test]
    async fn run_recipe_waits_for_terminal_state() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "projects/SALES/flow/graph/", StatusCode::OK, flow_graph())
            .respond(Method::POST, "projects/SALES/jobs/", StatusCode::OK, json!({"id": "job_1"}))
            .respond(Method::GET, "projects/SALES/jobs/job_1/", StatusCode::OK, json!({"baseStatus": {"state": "RUNNING"}}))
            .respond(Method::GET, "projects/SALES/jobs/job_1/", StatusCode::OK, json!({"baseStatus": {"state": "DONE"}}));
        let result = run_recipe(mock.context(), run_request(true)).await.expect("ran");
        assert_eq!(result["job_id"], "job_1");
        assert_eq!(result["status"], "DONE");
        assert_eq!(mock.requests_to(Method::GET, "projects/SALES/jobs/job_1/").len(), 2);

        let started = mock.requests_to(Method::POST, "projects/SALES/jobs/");
        let body = started[0].body.as_ref().expect("body");
        assert_eq!(body["type"], "NON_RECURSIVE_FORCED_BUILD");
        assert_eq!(body["outputs"][0], json!({"projectKey": "SALES", "id": "clean", "type": "DATASET"}));
    }

    #[tokio::test]
    async fn failed_job_is_reported_not_raised() {
        let mock = MockDss::start().await;
        mock.respond(Method::GET, "projects/SALES/flow/graph/", StatusCode::OK, flow_graph())
            .respond(Method::POST, "projects/SALES/jobs/", StatusCode::OK, json!({"id": "job_2"}))
            .respond(Method::GET, "projects/SALES/jobs/job_2/", StatusCode::OK, json!({"baseStatus": {"state": "FAILED"}}));
        let result = run_recipe(mock.context(), run_request(true)).await.expect("reported");
        assert_eq!(result["status"], "FAILED");
    }

    #[tokio::test]
    async fn invalid_job_type_makes_no_remote_calls() {
        let mock = MockDss::start().await;
        let mut request = run_request(false);
        request.job_type = "FULL_REBUILD".into();
        let result = run_recipe(mock.context(), request).await.expect("result");
        assert!(result["error"].as_str().expect("message").starts_with("Invalid job_type 'FULL_REBUILD'"));
        assert!(mock.requests().is_empty());
    }
}
