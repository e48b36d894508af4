//! Tool request parameters.
//!
//! Field names are the snake_case parameter names tools are called with;
//! optional parameters carry the defaults documented in their descriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use dssmcp_types::{DEFAULT_SAMPLE_ROWS, OutputSpec};

fn default_true() -> bool {
    true
}

fn default_listing_count() -> usize {
    10
}

fn default_timeline_items() -> u32 {
    100
}

fn default_sample_rows() -> i64 {
    DEFAULT_SAMPLE_ROWS
}

fn default_duplication_mode() -> String {
    "MINIMAL".to_string()
}

fn default_job_type() -> String {
    "NON_RECURSIVE_FORCED_BUILD".to_string()
}

/// Tools that take no parameters.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmptyRequest {}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListProjectsRequest {
    #[schemars(description = "Include each project's folder location (slower).")]
    #[serde(default)]
    pub include_location: bool,
    #[schemars(description = "Include project descriptions. Uses many more tokens; only request when needed.")]
    #[serde(default)]
    pub include_description: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct CreateProjectRequest {
    #[schemars(description = "Display name of the new project.")]
    pub project_name: String,
    #[schemars(description = "Login of the project owner. Defaults to the calling user.")]
    pub owner: Option<String>,
    #[schemars(description = "Project description.")]
    pub description: Option<String>,
    #[schemars(
        description = "Unique project key. Generated from the name when omitted (letters uppercased, digits kept, everything else becomes '_'). If the key already exists, retry with a '_1', '_2', ... suffix."
    )]
    pub project_key: Option<String>,
    #[schemars(description = "Folder to create the project in. Defaults to the root folder, which needs the 'write in root folder' right.")]
    pub project_folder_id: Option<String>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ProjectFolderRequest {
    #[schemars(description = "Project folder id; use 'ROOT' for the root folder.")]
    pub folder_id: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct MoveProjectRequest {
    pub project_key: String,
    #[schemars(description = "Destination folder id; use 'ROOT' for the root folder.")]
    pub destination_folder_id: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct DeleteProjectRequest {
    pub project_key: String,
    #[schemars(description = "Drop the data of managed datasets (default false).")]
    #[serde(default)]
    pub clear_managed_datasets: bool,
    #[schemars(description = "Drop the data of managed folders used as recipe outputs (default false).")]
    #[serde(default)]
    pub clear_output_managed_folders: bool,
    #[schemars(description = "Clear job and scenario logs (default true).")]
    #[serde(default = "default_true")]
    pub clear_job_and_scenario_logs: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct DuplicateProjectRequest {
    #[schemars(description = "Key of the project to copy.")]
    pub project_key: String,
    #[schemars(description = "Unique key for the copy.")]
    pub target_project_key: String,
    #[schemars(description = "Display name for the copy.")]
    pub target_project_name: String,
    #[schemars(description = "One of MINIMAL (structure only), SHARING, FULL (structure and data) or NONE. Defaults to MINIMAL.")]
    #[serde(default = "default_duplication_mode")]
    pub duplication_mode: String,
    #[serde(default = "default_true")]
    pub export_analysis_models: bool,
    #[serde(default = "default_true")]
    pub export_saved_models: bool,
    #[serde(default = "default_true")]
    pub export_insights_data: bool,
    #[schemars(description = "Folder for the copy. Defaults to the source project's folder.")]
    pub target_project_folder_id: Option<String>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ProjectKeyRequest {
    #[schemars(description = "Project key, for example 'SALES_FORECAST'.")]
    pub project_key: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct SetProjectMetadataRequest {
    pub project_key: String,
    #[schemars(description = "Full metadata object (label, description, tags, checklists, custom), based on get_project_metadata output.")]
    pub metadata: Value,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct SetProjectPermissionsRequest {
    pub project_key: String,
    #[schemars(description = "Full permissions object (owner and per-group permissions), based on get_project_permissions output.")]
    pub permissions: Value,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ProjectTimelineRequest {
    pub project_key: String,
    #[schemars(description = "Maximum number of modifications to return (default 100).")]
    #[serde(default = "default_timeline_items")]
    pub item_count: u32,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ListProjectDatasetsRequest {
    pub project_key: String,
    #[schemars(description = "Also list datasets shared into this project from other projects (default false).")]
    #[serde(default)]
    pub include_shared: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ListProjectJobsRequest {
    pub project_key: String,
    #[schemars(description = "Number of jobs to return (default 10).")]
    #[serde(default = "default_listing_count")]
    pub num_jobs: usize,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ListProjectMlTasksRequest {
    pub project_key: String,
    #[schemars(description = "Number of ML tasks to return (default 10).")]
    #[serde(default = "default_listing_count")]
    pub num_ml_tasks: usize,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ListProjectAnalysesRequest {
    pub project_key: String,
    #[schemars(description = "Number of visual analyses to return (default 10).")]
    #[serde(default = "default_listing_count")]
    pub num_analyses: usize,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct CreateManagedDatasetRequest {
    pub project_key: String,
    pub dataset_name: String,
    #[schemars(
        description = "Connection to store the data on, for example 'filesystem_managed'. The params.connection field of get_dataset_settings on an existing dataset shows valid names."
    )]
    pub connection: String,
    #[schemars(description = "Format preset such as 'PARQUET' or 'CSV_EXCEL_GZIP'. Defaults to the connection's format.")]
    pub format_option_id: Option<String>,
    #[schemars(description = "Dataset sub-type. Defaults to the connection's type.")]
    pub type_option_id: Option<String>,
    #[schemars(description = "Replace an existing dataset of the same name, dropping its data (default false).")]
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct DeleteDatasetRequest {
    pub project_key: String,
    pub dataset_name: String,
    #[schemars(description = "Also drop the stored data (default false).")]
    #[serde(default)]
    pub drop_data: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct RenameDatasetRequest {
    pub project_key: String,
    pub dataset_name: String,
    pub new_name: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct DatasetRequest {
    pub project_key: String,
    pub dataset_name: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct DatasetSampleRequest {
    pub project_key: String,
    pub dataset_name: String,
    #[schemars(description = "Rows to return (default 50, clamped to 1..=1000).")]
    #[serde(default = "default_sample_rows")]
    pub num_rows: i64,
    #[schemars(description = "Partition identifier or comma-separated list of partitions.")]
    pub partitions: Option<String>,
}

/// Output dataset of a recipe being created.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct RecipeOutputParam {
    #[schemars(description = "Output dataset name.")]
    pub name: String,
    #[schemars(description = "Append instead of overwriting (default false).")]
    #[serde(default)]
    pub append: bool,
}

impl From<&RecipeOutputParam> for OutputSpec {
    fn from(param: &RecipeOutputParam) -> Self {
        OutputSpec {
            name: param.name.clone(),
            append: param.append,
        }
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct CreateRecipeRequest {
    pub project_key: String,
    #[schemars(
        description = "Recipe type. Single-input visual (1 input, 1 output): sync, csync, sort, topn, distinct, prepare, shaker, sampling, grouping, window, pivot, download, export, upsert. Multi-output visual (1 input, 1+ outputs): split. Multi-input visual (1+ inputs, 1 output): join, vstack, generate_features, sql_query. Code (1+ inputs, 1+ outputs): python, r, sql_script, pyspark, sparkr, spark_scala, shell, spark_sql_query, cpython, ksql, streaming_spark_scala. Scoring (1 input, 1 output): prediction_scoring, clustering_scoring, evaluation, standalone_evaluation, nlp_llm_evaluation. Other (1 input, 1 output): extract_failed_rows, nlp_llm_rag_embedding, embed_dataset, embed_documents."
    )]
    pub recipe_type: String,
    #[schemars(description = "Input dataset names. They must already exist.")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output datasets. They must already exist (see create_managed_dataset).")]
    pub outputs: Vec<RecipeOutputParam>,
    #[schemars(description = "Recipe name. Defaults to 'compute_<first output>'.")]
    pub recipe_name: Option<String>,
    #[schemars(description = "Initial script; only valid for code recipe types.")]
    pub code: Option<String>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct RecipeRequest {
    pub project_key: String,
    pub recipe_name: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct SetCodeRecipeCodeRequest {
    pub project_key: String,
    pub recipe_name: String,
    #[schemars(description = "Complete new script source.")]
    pub code: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct SetVisualRecipePayloadRequest {
    pub project_key: String,
    pub recipe_name: String,
    #[schemars(description = "Full JSON payload, based on the payload returned by get_recipe_settings.")]
    pub payload: Value,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct RunRecipeRequest {
    pub project_key: String,
    pub recipe_name: String,
    #[schemars(
        description = "NON_RECURSIVE_FORCED_BUILD (default, only this recipe's outputs), RECURSIVE_BUILD (also missing upstream dependencies), RECURSIVE_FORCED_BUILD (rebuild everything upstream) or RECURSIVE_MISSING_ONLY_BUILD."
    )]
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[schemars(description = "Wait for the job to finish (default true). When false, returns immediately with the job id.")]
    #[serde(default = "default_true")]
    pub wait: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct AllUsersRequest {
    #[schemars(description = "Include every user's tasks; requires admin rights (default false).")]
    #[serde(default)]
    pub all_users: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListUsersRequest {
    #[schemars(description = "Include detailed user settings (default false).")]
    #[serde(default)]
    pub include_settings: bool,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ConnectionNamesRequest {
    #[schemars(description = "Connection type to filter on, or 'all'.")]
    pub connection_type: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct GetGeneralSettingsRequest {
    #[schemars(
        description = "Settings keys to return; all allowed keys when omitted. Allowed: sparkSettings, containerSettings, defaultK8sClusterId, security, cgroupSettings, maxRunningActivitiesPerJob, maxRunningActivities, maxRunningActivitiesPerKey."
    )]
    pub settings_keys: Option<Vec<String>>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct SetGeneralSettingsRequest {
    #[schemars(description = "Settings to replace, keyed by allowed settings key. Other settings are left unchanged.")]
    pub settings: Map<String, Value>,
}
