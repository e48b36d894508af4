//! Project, project folder and per-project listing tools.

use dssmcp_api::{DeleteProjectOptions, DuplicateProject, NewProject, ProjectCollection};
use dssmcp_types::{
    DatasetSummary, FolderDetail, ManagedFolderSummary, ProjectSummary, RecipeSummary, folder_path, generate_project_key, project_list,
};
use rmcp::model::ErrorData;
use serde_json::{Value, json};
use tracing::info;

use crate::server::errors::{decode, error_result, remote, upstream_error};
use crate::server::schemas::{
    CreateProjectRequest, DeleteProjectRequest, DuplicateProjectRequest, EmptyRequest, ListProjectAnalysesRequest, ListProjectDatasetsRequest,
    ListProjectJobsRequest, ListProjectMlTasksRequest, ListProjectsRequest, MoveProjectRequest, ProjectFolderRequest, ProjectKeyRequest,
    ProjectTimelineRequest, SetProjectMetadataRequest, SetProjectPermissionsRequest,
};
use crate::server::tools::{CallContext, to_structured};

pub(crate) const DUPLICATION_MODES: &[&str] = &["MINIMAL", "SHARING", "FULL", "NONE"];

pub(crate) async fn list_projects(context: CallContext, request: ListProjectsRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_projects";
    let client = context.client(OPERATION)?;
    let raw = client.list_projects(request.include_location).await.map_err(remote(OPERATION))?;
    let summaries: Vec<ProjectSummary> = project_list(raw).map_err(decode(OPERATION))?;
    let summaries: Vec<ProjectSummary> = summaries
        .into_iter()
        .map(|summary| summary.with_optional_fields(request.include_description, request.include_location))
        .collect();
    to_structured(OPERATION, &summaries)
}

pub(crate) async fn create_project(context: CallContext, request: CreateProjectRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "create_project";
    let client = context.client(OPERATION)?;
    let project_key = request
        .project_key
        .filter(|key| !key.trim().is_empty())
        .unwrap_or_else(|| generate_project_key(&request.project_name));

    let owner = match request.owner {
        Some(owner) => owner,
        None => {
            let auth_info = client.auth_info().await.map_err(remote(OPERATION))?;
            caller_identifier(&auth_info).ok_or_else(|| {
                upstream_error(
                    "DSS_UNEXPECTED_RESPONSE",
                    "auth info has no authIdentifier; pass an explicit owner",
                    json!({"operation": OPERATION}),
                    false,
                    "Retry with the owner parameter set.",
                )
            })?
        }
    };

    let project = NewProject {
        project_key: project_key.clone(),
        name: request.project_name.clone(),
        owner: owner.clone(),
        description: request.description,
    };
    client
        .create_project(&project, request.project_folder_id.as_deref())
        .await
        .map_err(remote(OPERATION))?;
    info!(project_key, "created project");
    Ok(json!({
        "projectKey": project_key,
        "name": request.project_name,
        "owner": owner,
        "message": format!("Project '{}' created successfully with key '{}'", request.project_name, project_key),
    }))
}

fn caller_identifier(auth_info: &Value) -> Option<String> {
    auth_info
        .get("authIdentifier")
        .and_then(Value::as_str)
        .filter(|identifier| !identifier.is_empty())
        .map(str::to_string)
}

pub(crate) async fn list_project_folders(context: CallContext, _request: EmptyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_project_folders";
    let client = context.client(OPERATION)?;
    let tree = client.project_folder_tree().await.map_err(remote(OPERATION))?;
    to_structured(OPERATION, &tree)
}

pub(crate) async fn get_project_folder(context: CallContext, request: ProjectFolderRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_project_folder";
    let client = context.client(OPERATION)?;
    let folder = client.project_folder(&request.folder_id).await.map_err(remote(OPERATION))?;
    let ancestry = client.folder_ancestry(folder.clone()).await.map_err(remote(OPERATION))?;
    let detail = FolderDetail {
        path: folder_path(&ancestry),
        id: folder.id,
        name: folder.name,
        project_keys: folder.project_keys,
        children_ids: folder.children_ids,
    };
    to_structured(OPERATION, &detail)
}

pub(crate) async fn move_project_to_folder(context: CallContext, request: MoveProjectRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "move_project_to_folder";
    let client = context.client(OPERATION)?;
    let destination = client
        .project_folder(&request.destination_folder_id)
        .await
        .map_err(remote(OPERATION))?;
    let current = client.project_folder_of(&request.project_key).await.map_err(remote(OPERATION))?;
    client
        .move_project_to_folder(&request.project_key, &current.id, &destination.id)
        .await
        .map_err(remote(OPERATION))?;
    let ancestry = client.folder_ancestry(destination).await.map_err(remote(OPERATION))?;
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "destination_folder_id": request.destination_folder_id,
        "destination_folder_path": folder_path(&ancestry),
    }))
}

pub(crate) async fn delete_project(context: CallContext, request: DeleteProjectRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "delete_project";
    let client = context.client(OPERATION)?;
    let options = DeleteProjectOptions {
        clear_managed_datasets: request.clear_managed_datasets,
        clear_output_managed_folders: request.clear_output_managed_folders,
        clear_job_and_scenario_logs: request.clear_job_and_scenario_logs,
    };
    let messages = client
        .delete_project(&request.project_key, options)
        .await
        .map_err(remote(OPERATION))?;
    info!(project_key = %request.project_key, "deleted project");
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "messages": messages,
    }))
}

pub(crate) async fn duplicate_project(context: CallContext, request: DuplicateProjectRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "duplicate_project";
    let duplication_mode = request.duplication_mode.trim().to_ascii_uppercase();
    if !DUPLICATION_MODES.contains(&duplication_mode.as_str()) {
        return Ok(error_result(format!(
            "Invalid duplication_mode '{}'. Must be one of: {}",
            request.duplication_mode,
            DUPLICATION_MODES.join(", ")
        )));
    }
    let client = context.client(OPERATION)?;
    let duplicate = DuplicateProject {
        target_project_key: request.target_project_key,
        target_project_name: request.target_project_name,
        duplication_mode,
        export_analysis_models: request.export_analysis_models,
        export_saved_models: request.export_saved_models,
        export_insights_data: request.export_insights_data,
        target_project_folder_id: request.target_project_folder_id,
    };
    client
        .duplicate_project(&request.project_key, &duplicate)
        .await
        .map_err(remote(OPERATION))
}

pub(crate) async fn get_project_summary(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_project_summary";
    let client = context.client(OPERATION)?;
    client.project_summary(&request.project_key).await.map_err(remote(OPERATION))
}

pub(crate) async fn get_project_metadata(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_project_metadata";
    let client = context.client(OPERATION)?;
    client.project_metadata(&request.project_key).await.map_err(remote(OPERATION))
}

pub(crate) async fn set_project_metadata(context: CallContext, request: SetProjectMetadataRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "set_project_metadata";
    let client = context.client(OPERATION)?;
    client
        .set_project_metadata(&request.project_key, &request.metadata)
        .await
        .map_err(remote(OPERATION))?;
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "message": "Project metadata updated successfully",
    }))
}

pub(crate) async fn get_project_permissions(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_project_permissions";
    let client = context.client(OPERATION)?;
    client.project_permissions(&request.project_key).await.map_err(remote(OPERATION))
}

pub(crate) async fn set_project_permissions(context: CallContext, request: SetProjectPermissionsRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "set_project_permissions";
    let client = context.client(OPERATION)?;
    client
        .set_project_permissions(&request.project_key, &request.permissions)
        .await
        .map_err(remote(OPERATION))?;
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "message": "Project permissions updated successfully",
    }))
}

pub(crate) async fn get_project_interest(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_project_interest";
    let client = context.client(OPERATION)?;
    client.project_interest(&request.project_key).await.map_err(remote(OPERATION))
}

pub(crate) async fn get_project_timeline(context: CallContext, request: ProjectTimelineRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_project_timeline";
    let client = context.client(OPERATION)?;
    client
        .project_timeline(&request.project_key, request.item_count)
        .await
        .map_err(remote(OPERATION))
}

pub(crate) async fn list_project_datasets(context: CallContext, request: ListProjectDatasetsRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_project_datasets";
    let client = context.client(OPERATION)?;
    let raw = client
        .list_datasets(&request.project_key, request.include_shared)
        .await
        .map_err(remote(OPERATION))?;
    let summaries: Vec<DatasetSummary> = project_list(raw).map_err(decode(OPERATION))?;
    to_structured(OPERATION, &summaries)
}

pub(crate) async fn list_project_recipes(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_project_recipes";
    let client = context.client(OPERATION)?;
    let raw = client.list_recipes(&request.project_key).await.map_err(remote(OPERATION))?;
    let summaries: Vec<RecipeSummary> = project_list(raw).map_err(decode(OPERATION))?;
    to_structured(OPERATION, &summaries)
}

pub(crate) async fn list_project_managed_folders(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "list_project_managed_folders";
    let client = context.client(OPERATION)?;
    let raw = client
        .list_project_items(&request.project_key, ProjectCollection::ManagedFolders)
        .await
        .map_err(remote(OPERATION))?;
    let summaries: Vec<ManagedFolderSummary> = project_list(raw).map_err(decode(OPERATION))?;
    to_structured(OPERATION, &summaries)
}

async fn list_items(
    context: &CallContext,
    operation: &'static str,
    project_key: &str,
    collection: ProjectCollection,
    limit: Option<usize>,
) -> Result<Value, ErrorData> {
    let client = context.client(operation)?;
    let mut items = client
        .list_project_items(project_key, collection)
        .await
        .map_err(remote(operation))?;
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    Ok(Value::Array(items))
}

pub(crate) async fn list_project_scenarios(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    list_items(&context, "list_project_scenarios", &request.project_key, ProjectCollection::Scenarios, None).await
}

pub(crate) async fn list_project_jobs(context: CallContext, request: ListProjectJobsRequest) -> Result<Value, ErrorData> {
    list_items(
        &context,
        "list_project_jobs",
        &request.project_key,
        ProjectCollection::Jobs,
        Some(request.num_jobs),
    )
    .await
}

pub(crate) async fn list_project_ml_tasks(context: CallContext, request: ListProjectMlTasksRequest) -> Result<Value, ErrorData> {
    list_items(
        &context,
        "list_project_ml_tasks",
        &request.project_key,
        ProjectCollection::MlTasks,
        Some(request.num_ml_tasks),
    )
    .await
}

pub(crate) async fn list_project_analyses(context: CallContext, request: ListProjectAnalysesRequest) -> Result<Value, ErrorData> {
    list_items(
        &context,
        "list_project_analyses",
        &request.project_key,
        ProjectCollection::Analyses,
        Some(request.num_analyses),
    )
    .await
}

pub(crate) async fn list_project_saved_models(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    list_items(&context, "list_project_saved_models", &request.project_key, ProjectCollection::SavedModels, None).await
}
