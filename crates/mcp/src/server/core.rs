use std::sync::Arc;

use axum::http::request::Parts;
use dssmcp_api::{DssConnector, InstanceResource};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ErrorData, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{RoleServer, ServerHandler, service::RequestContext, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::server::schemas::{
    AllUsersRequest, ConnectionNamesRequest, CreateManagedDatasetRequest, CreateProjectRequest, CreateRecipeRequest, DatasetRequest,
    DatasetSampleRequest, DeleteDatasetRequest, DeleteProjectRequest, DuplicateProjectRequest, EmptyRequest, GetGeneralSettingsRequest,
    ListProjectAnalysesRequest, ListProjectDatasetsRequest, ListProjectJobsRequest, ListProjectMlTasksRequest, ListProjectsRequest,
    ListUsersRequest, MoveProjectRequest, ProjectFolderRequest, ProjectKeyRequest, ProjectTimelineRequest, RecipeRequest,
    RenameDatasetRequest, RunRecipeRequest, SetCodeRecipeCodeRequest, SetGeneralSettingsRequest, SetProjectMetadataRequest,
    SetProjectPermissionsRequest, SetVisualRecipePayloadRequest,
};
use crate::server::tools::{CallContext, datasets, flow, instance, projects, recipes};

const INSTRUCTIONS: &str = "Tools for a Dataiku DSS instance. Every call acts as the API key holder.\n\
PROJECTS: list_projects, then get_project_summary or the list_project_* tools to explore a project.\n\
BUILDING A FLOW:\n\
1) create_managed_dataset for every output dataset.\n\
2) create_recipe with existing inputs and outputs; shape errors come back as an 'error' field.\n\
3) get_recipe_settings, then set_code_recipe_code (code recipes) or set_visual_recipe_payload (visual recipes).\n\
4) run_recipe to build the recipe output; get_flow_graph shows the flow left to right.\n\
DATA: get_dataset_schema and get_dataset_sample (at most 1000 rows).\n\
INSTANCE: get_auth_info reports isAdmin; admin tools fail for other users.\n\
Listing tools return their entries under 'items'.";

#[derive(Clone)]
pub struct DssMcpCore {
    tool_router: ToolRouter<Self>,
    connector: Arc<DssConnector>,
}

#[tool_router]
impl DssMcpCore {
    pub fn new(connector: Arc<DssConnector>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            connector,
        }
    }

    /// Tool context for one call. Headers are only present for calls that
    /// arrived over streamable HTTP.
    fn call_context(&self, context: &RequestContext<RoleServer>) -> CallContext {
        let headers = context.extensions.get::<Parts>().map(|parts| parts.headers.clone());
        CallContext::new(Arc::clone(&self.connector), headers)
    }

    // Projects and folders

    #[tool(
        annotations(read_only_hint = true),
        description = "List projects with key, name, owner and tags. Optionally include folder locations and descriptions."
    )]
    async fn list_projects(&self, Parameters(request): Parameters<ListProjectsRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_projects(self.call_context(&context), request).await;
        self.finish("list_projects", logged, outcome)
    }

    #[tool(description = "Create a project. The key is derived from the name and the owner defaults to the caller when omitted.")]
    async fn create_project(&self, Parameters(request): Parameters<CreateProjectRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::create_project(self.call_context(&context), request).await;
        self.finish("create_project", logged, outcome)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Project folder tree from the root, with each folder's id, name, path, project keys and children."
    )]
    async fn list_project_folders(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let outcome = projects::list_project_folders(self.call_context(&context), EmptyRequest::default()).await;
        self.finish("list_project_folders", None, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "One project folder by id ('ROOT' for the root) with its full path.")]
    async fn get_project_folder(&self, Parameters(request): Parameters<ProjectFolderRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::get_project_folder(self.call_context(&context), request).await;
        self.finish("get_project_folder", logged, outcome)
    }

    #[tool(description = "Move a project into another project folder.")]
    async fn move_project_to_folder(&self, Parameters(request): Parameters<MoveProjectRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::move_project_to_folder(self.call_context(&context), request).await;
        self.finish("move_project_to_folder", logged, outcome)
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Delete a project. Optionally clear managed datasets, output managed folders and job/scenario logs."
    )]
    async fn delete_project(&self, Parameters(request): Parameters<DeleteProjectRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::delete_project(self.call_context(&context), request).await;
        self.finish("delete_project", logged, outcome)
    }

    #[tool(description = "Duplicate a project under a new key and name. duplication_mode is MINIMAL, SHARING, FULL or NONE.")]
    async fn duplicate_project(&self, Parameters(request): Parameters<DuplicateProjectRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::duplicate_project(self.call_context(&context), request).await;
        self.finish("duplicate_project", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Summary of a project.")]
    async fn get_project_summary(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::get_project_summary(self.call_context(&context), request).await;
        self.finish("get_project_summary", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Metadata of a project: label, description, tags, checklists and custom fields.")]
    async fn get_project_metadata(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::get_project_metadata(self.call_context(&context), request).await;
        self.finish("get_project_metadata", logged, outcome)
    }

    #[tool(description = "Replace the metadata of a project. Start from get_project_metadata.")]
    async fn set_project_metadata(&self, Parameters(request): Parameters<SetProjectMetadataRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::set_project_metadata(self.call_context(&context), request).await;
        self.finish("set_project_metadata", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Owner and group permissions of a project.")]
    async fn get_project_permissions(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::get_project_permissions(self.call_context(&context), request).await;
        self.finish("get_project_permissions", logged, outcome)
    }

    #[tool(description = "Replace the permissions of a project. Start from get_project_permissions.")]
    async fn set_project_permissions(
        &self,
        Parameters(request): Parameters<SetProjectPermissionsRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::set_project_permissions(self.call_context(&context), request).await;
        self.finish("set_project_permissions", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Watchers and stars of a project.")]
    async fn get_project_interest(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::get_project_interest(self.call_context(&context), request).await;
        self.finish("get_project_interest", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Recent activity of a project, newest first.")]
    async fn get_project_timeline(&self, Parameters(request): Parameters<ProjectTimelineRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::get_project_timeline(self.call_context(&context), request).await;
        self.finish("get_project_timeline", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Datasets of a project with type, format, tags and schema.")]
    async fn list_project_datasets(&self, Parameters(request): Parameters<ListProjectDatasetsRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_datasets(self.call_context(&context), request).await;
        self.finish("list_project_datasets", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Recipes of a project with type, inputs and outputs.")]
    async fn list_project_recipes(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_recipes(self.call_context(&context), request).await;
        self.finish("list_project_recipes", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Managed folders of a project.")]
    async fn list_project_managed_folders(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_managed_folders(self.call_context(&context), request).await;
        self.finish("list_project_managed_folders", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Scenarios of a project.")]
    async fn list_project_scenarios(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_scenarios(self.call_context(&context), request).await;
        self.finish("list_project_scenarios", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Most recent jobs of a project (num_jobs, default 10).")]
    async fn list_project_jobs(&self, Parameters(request): Parameters<ListProjectJobsRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_jobs(self.call_context(&context), request).await;
        self.finish("list_project_jobs", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Machine learning tasks of a project (num_ml_tasks, default 10).")]
    async fn list_project_ml_tasks(&self, Parameters(request): Parameters<ListProjectMlTasksRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_ml_tasks(self.call_context(&context), request).await;
        self.finish("list_project_ml_tasks", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Visual analyses of a project (num_analyses, default 10).")]
    async fn list_project_analyses(&self, Parameters(request): Parameters<ListProjectAnalysesRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_analyses(self.call_context(&context), request).await;
        self.finish("list_project_analyses", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Saved models of a project.")]
    async fn list_project_saved_models(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = projects::list_project_saved_models(self.call_context(&context), request).await;
        self.finish("list_project_saved_models", logged, outcome)
    }

    // Datasets

    #[tool(
        description = "Create a managed dataset on a connection. Set overwrite to drop an existing dataset of the same name (and its data) first."
    )]
    async fn create_managed_dataset(
        &self,
        Parameters(request): Parameters<CreateManagedDatasetRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::create_managed_dataset(self.call_context(&context), request).await;
        self.finish("create_managed_dataset", logged, outcome)
    }

    #[tool(annotations(destructive_hint = true), description = "Delete a dataset, optionally dropping its data.")]
    async fn delete_dataset(&self, Parameters(request): Parameters<DeleteDatasetRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::delete_dataset(self.call_context(&context), request).await;
        self.finish("delete_dataset", logged, outcome)
    }

    #[tool(description = "Rename a dataset.")]
    async fn rename_dataset(&self, Parameters(request): Parameters<RenameDatasetRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::rename_dataset(self.call_context(&context), request).await;
        self.finish("rename_dataset", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Full settings of a dataset.")]
    async fn get_dataset_settings(&self, Parameters(request): Parameters<DatasetRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::get_dataset_settings(self.call_context(&context), request).await;
        self.finish("get_dataset_settings", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Column names and types of a dataset.")]
    async fn get_dataset_schema(&self, Parameters(request): Parameters<DatasetRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::get_dataset_schema(self.call_context(&context), request).await;
        self.finish("get_dataset_schema", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Metadata of a dataset: label, description, tags and custom fields.")]
    async fn get_dataset_metadata(&self, Parameters(request): Parameters<DatasetRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::get_dataset_metadata(self.call_context(&context), request).await;
        self.finish("get_dataset_metadata", logged, outcome)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "First rows of a dataset as objects keyed by column name. num_rows defaults to 50 and is limited to 1000; partitions is a comma-separated list."
    )]
    async fn get_dataset_sample(&self, Parameters(request): Parameters<DatasetSampleRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = datasets::get_dataset_sample(self.call_context(&context), request).await;
        self.finish("get_dataset_sample", logged, outcome)
    }

    // Recipes and flow

    #[tool(
        description = "Create a recipe between existing datasets. Inputs and outputs must exist; the recipe shape must match its type (see recipe_type). code is only accepted for code recipes."
    )]
    async fn create_recipe(&self, Parameters(request): Parameters<CreateRecipeRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = recipes::create_recipe(self.call_context(&context), request).await;
        self.finish("create_recipe", logged, outcome)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Type, inputs, outputs and params of a recipe, plus its code (code recipes) or JSON payload (visual recipes)."
    )]
    async fn get_recipe_settings(&self, Parameters(request): Parameters<RecipeRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = recipes::get_recipe_settings(self.call_context(&context), request).await;
        self.finish("get_recipe_settings", logged, outcome)
    }

    #[tool(description = "Replace the script of a code recipe.")]
    async fn set_code_recipe_code(&self, Parameters(request): Parameters<SetCodeRecipeCodeRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = recipes::set_code_recipe_code(self.call_context(&context), request).await;
        self.finish("set_code_recipe_code", logged, outcome)
    }

    #[tool(
        description = "Replace the JSON payload of a visual recipe, then update output schemas when the change requires it. A schema update failure is reported as schema_update_warning."
    )]
    async fn set_visual_recipe_payload(
        &self,
        Parameters(request): Parameters<SetVisualRecipePayloadRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = recipes::set_visual_recipe_payload(self.call_context(&context), request).await;
        self.finish("set_visual_recipe_payload", logged, outcome)
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Build the output of a recipe and, by default, wait for the job to finish. Returns the job id and its final state (DONE, FAILED or ABORTED)."
    )]
    async fn run_recipe(&self, Parameters(request): Parameters<RunRecipeRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = recipes::run_recipe(self.call_context(&context), request).await;
        self.finish("run_recipe", logged, outcome)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Flow of a project as nodes with predecessors and successors, ordered left to right."
    )]
    async fn get_flow_graph(&self, Parameters(request): Parameters<ProjectKeyRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = flow::get_flow_graph(self.call_context(&context), request).await;
        self.finish("get_flow_graph", logged, outcome)
    }

    // Instance

    #[tool(annotations(read_only_hint = true), description = "Running background tasks (futures), excluding scenarios.")]
    async fn list_futures(&self, Parameters(request): Parameters<AllUsersRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = instance::list_futures(self.call_context(&context), request).await;
        self.finish("list_futures", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Running scenarios.")]
    async fn list_running_scenarios(&self, Parameters(request): Parameters<AllUsersRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = instance::list_running_scenarios(self.call_context(&context), request).await;
        self.finish("list_running_scenarios", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Running Jupyter notebooks (admin).")]
    async fn list_running_notebooks(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_running_notebooks", InstanceResource::RunningNotebooks)
            .await
    }

    #[tool(annotations(read_only_hint = true), description = "Installed plugins.")]
    async fn list_plugins(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_plugins", InstanceResource::Plugins).await
    }

    #[tool(annotations(read_only_hint = true), description = "Users of the instance (admin).")]
    async fn list_users(&self, Parameters(request): Parameters<ListUsersRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = instance::list_users(self.call_context(&context), request).await;
        self.finish("list_users", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Groups of the instance (admin).")]
    async fn list_groups(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_groups", InstanceResource::Groups).await
    }

    #[tool(annotations(read_only_hint = true), description = "Identity, groups and permissions of the API key holder, plus isAdmin.")]
    async fn get_auth_info(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let outcome = instance::get_auth_info(self.call_context(&context)).await;
        self.finish("get_auth_info", None, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Connection names of one type, or of every type with 'all'.")]
    async fn list_connections_names(&self, Parameters(request): Parameters<ConnectionNamesRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = instance::list_connections_names(self.call_context(&context), request).await;
        self.finish("list_connections_names", logged, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Code environments with name, language, owner and interpreter.")]
    async fn list_code_envs(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let outcome = instance::list_code_envs(self.call_context(&context)).await;
        self.finish("list_code_envs", None, outcome)
    }

    #[tool(annotations(read_only_hint = true), description = "Where each code environment is used (admin).")]
    async fn list_code_env_usages(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_code_env_usages", InstanceResource::CodeEnvUsages)
            .await
    }

    #[tool(annotations(read_only_hint = true), description = "Compute clusters.")]
    async fn list_clusters(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_clusters", InstanceResource::Clusters).await
    }

    #[tool(annotations(read_only_hint = true), description = "User-defined meanings.")]
    async fn list_meanings(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_meanings", InstanceResource::Meanings).await
    }

    #[tool(annotations(read_only_hint = true), description = "Workspaces visible to the caller.")]
    async fn list_workspaces(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_workspaces", InstanceResource::Workspaces).await
    }

    #[tool(annotations(read_only_hint = true), description = "Data collections visible to the caller.")]
    async fn list_data_collections(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "list_data_collections", InstanceResource::DataCollections)
            .await
    }

    #[tool(annotations(read_only_hint = true), description = "Licensing status of the instance (admin).")]
    async fn get_licensing_status(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "get_licensing_status", InstanceResource::LicensingStatus)
            .await
    }

    #[tool(annotations(read_only_hint = true), description = "Codes the instance sanity check can report (admin).")]
    async fn get_sanity_check_codes(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "get_sanity_check_codes", InstanceResource::SanityCheckCodes)
            .await
    }

    #[tool(annotations(read_only_hint = true), description = "Data quality status across projects.")]
    async fn get_data_quality_status(&self, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        self.instance_resource(&context, "get_data_quality_status", InstanceResource::DataQualityStatus)
            .await
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Selected general settings of the instance (admin). Only allow-listed keys can be read."
    )]
    async fn get_general_settings(&self, Parameters(request): Parameters<GetGeneralSettingsRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = instance::get_general_settings(self.call_context(&context), request).await;
        self.finish("get_general_settings", logged, outcome)
    }

    #[tool(description = "Replace selected general settings of the instance (admin). Only allow-listed keys can be written.")]
    async fn set_general_settings(&self, Parameters(request): Parameters<SetGeneralSettingsRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let logged = log_value(&request);
        let outcome = instance::set_general_settings(self.call_context(&context), request).await;
        self.finish("set_general_settings", logged, outcome)
    }

    async fn instance_resource(
        &self,
        context: &RequestContext<RoleServer>,
        tool_name: &'static str,
        resource: InstanceResource,
    ) -> Result<CallToolResult, ErrorData> {
        let outcome = instance::instance_resource(self.call_context(context), tool_name, resource).await;
        self.finish(tool_name, None, outcome)
    }

    fn finish(&self, tool_name: &str, request: Option<Value>, outcome: Result<Value, ErrorData>) -> Result<CallToolResult, ErrorData> {
        match outcome {
            Ok(structured) => {
                let response = CallToolResult::structured(structured_object(structured));
                self.emit_log(tool_name, request, Some(serde_json::to_value(&response).unwrap_or(Value::Null)));
                Ok(response)
            }
            Err(error) => {
                warn!(tool = tool_name, code = ?error.code, message = %error.message, "tool call failed");
                self.emit_log(tool_name, request, error.data.clone());
                Err(error)
            }
        }
    }

    fn emit_log(&self, tool_name: &str, request: Option<Value>, response: Option<Value>) {
        info!(tool = tool_name, "MCP tool call");
        let request = request.unwrap_or_default();
        let response = response.unwrap_or_default();
        debug!(tool = tool_name, request = %request, response = %response, "MCP tool payload");
    }
}

/// Structured tool content must be a JSON object: listings are returned
/// under `items`, any other non-object value under `result`.
fn structured_object(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        Value::Array(items) => json!({ "items": items }),
        other => json!({ "result": other }),
    }
}

fn log_value<T: Serialize>(request: &T) -> Option<Value> {
    serde_json::to_value(request).ok()
}

#[tool_handler]
impl ServerHandler for DssMcpCore {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "dssmcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Dataiku DSS MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn registers_every_tool() {
        let names: BTreeSet<String> = DssMcpCore::tool_router()
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        for expected in [
            "list_projects",
            "create_project",
            "list_project_folders",
            "get_project_folder",
            "move_project_to_folder",
            "delete_project",
            "duplicate_project",
            "get_project_timeline",
            "list_project_datasets",
            "list_project_saved_models",
            "create_managed_dataset",
            "get_dataset_sample",
            "create_recipe",
            "get_recipe_settings",
            "set_code_recipe_code",
            "set_visual_recipe_payload",
            "run_recipe",
            "get_flow_graph",
            "list_futures",
            "list_running_scenarios",
            "get_auth_info",
            "list_connections_names",
            "list_code_envs",
            "get_data_quality_status",
            "get_general_settings",
            "set_general_settings",
        ] {
            assert!(names.contains(expected), "missing tool {expected}");
        }
        assert_eq!(names.len(), 54);
    }

    #[test]
    fn sample_tool_schema_documents_defaults() {
        let tools = DssMcpCore::tool_router().list_all();
        let sample = tools
            .iter()
            .find(|tool| tool.name == "get_dataset_sample")
            .expect("sample tool");
        let schema = serde_json::to_value(sample.input_schema.as_ref()).expect("schema");
        assert!(schema["properties"]["num_rows"].is_object());
        assert!(schema["required"].as_array().expect("required").iter().any(|field| field == "dataset_name"));
    }

    #[test]
    fn server_info_enables_tools_only() {
        let info = core().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert_eq!(info.server_info.name, "dssmcp");
    }

    fn core() -> DssMcpCore {
        let connector = DssConnector::new(
            "https://dss.example.com",
            &dssmcp_api::ClientOptions::default(),
            Arc::new(dssmcp_api::ForwardedBearer),
        )
        .expect("connector");
        DssMcpCore::new(Arc::new(connector))
    }

    #[test]
    fn structured_content_is_always_an_object() {
        let core = core();
        let listing = core
            .finish("list_futures", None, Ok(json!([{"jobId": "a"}])))
            .expect("listing");
        assert_eq!(listing.structured_content, Some(json!({"items": [{"jobId": "a"}]})));

        let object = core
            .finish("get_auth_info", None, Ok(json!({"isAdmin": true})))
            .expect("object");
        assert_eq!(object.structured_content, Some(json!({"isAdmin": true})));

        let empty = core.finish("duplicate_project", None, Ok(Value::Null)).expect("null");
        assert_eq!(empty.structured_content, Some(json!({"result": null})));
    }
}
