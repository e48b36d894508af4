//! Project, project folder and account endpoints.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::{Value, json};

use dssmcp_types::{FolderNode, ProjectFolder};

use crate::client::{DssClient, flag};
use crate::error::ApiError;

/// Per-project object collections exposed as listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectCollection {
    Recipes,
    Scenarios,
    Jobs,
    MlTasks,
    Analyses,
    SavedModels,
    ManagedFolders,
}

impl ProjectCollection {
    fn segments(self) -> &'static [&'static str] {
        match self {
            Self::Recipes => &["recipes", ""],
            Self::Scenarios => &["scenarios", ""],
            Self::Jobs => &["jobs", ""],
            Self::MlTasks => &["models", "lab", ""],
            Self::Analyses => &["lab", ""],
            Self::SavedModels => &["savedmodels", ""],
            Self::ManagedFolders => &["managedfolders", ""],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub project_key: String,
    pub name: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Cleanup applied to a project's data when it is deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteProjectOptions {
    pub clear_managed_datasets: bool,
    pub clear_output_managed_folders: bool,
    pub clear_job_and_scenario_logs: bool,
}

#[derive(Debug, Clone)]
pub struct DuplicateProject {
    pub target_project_key: String,
    pub target_project_name: String,
    pub duplication_mode: String,
    pub export_analysis_models: bool,
    pub export_saved_models: bool,
    pub export_insights_data: bool,
    pub target_project_folder_id: Option<String>,
}

/// Root folder identifier understood by the folder endpoints.
pub const ROOT_FOLDER_ID: &str = "ROOT";

impl DssClient {
    pub async fn list_projects(&self, include_location: bool) -> Result<Vec<Value>, ApiError> {
        self.get_json(&["projects", ""], &[("includeLocation", flag(include_location))]).await
    }

    /// Identity of the key holder; `authIdentifier` is the user login or API key id.
    pub async fn auth_info(&self) -> Result<Value, ApiError> {
        self.get_json(&["auth", "info"], &[("withSecrets", flag(false))]).await
    }

    pub async fn create_project(&self, project: &NewProject, folder_id: Option<&str>) -> Result<Value, ApiError> {
        let query: Vec<(&str, String)> = folder_id
            .map(|folder_id| vec![("projectFolderId", folder_id.to_string())])
            .unwrap_or_default();
        self.post_json(&["projects", ""], &query, project).await
    }

    pub async fn project_summary(&self, project_key: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, ""], &[]).await
    }

    pub async fn project_metadata(&self, project_key: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "metadata"], &[]).await
    }

    pub async fn set_project_metadata(&self, project_key: &str, metadata: &Value) -> Result<Value, ApiError> {
        self.put_json(&["projects", project_key, "metadata"], metadata).await
    }

    pub async fn project_permissions(&self, project_key: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "permissions"], &[]).await
    }

    pub async fn set_project_permissions(&self, project_key: &str, permissions: &Value) -> Result<Value, ApiError> {
        self.put_json(&["projects", project_key, "permissions"], permissions).await
    }

    pub async fn project_interest(&self, project_key: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "interest"], &[]).await
    }

    pub async fn project_timeline(&self, project_key: &str, item_count: u32) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "timeline"], &[("itemCount", item_count.to_string())])
            .await
    }

    pub async fn list_project_items(&self, project_key: &str, collection: ProjectCollection) -> Result<Vec<Value>, ApiError> {
        let mut segments = vec!["projects", project_key];
        segments.extend_from_slice(collection.segments());
        self.get_json(&segments, &[]).await
    }

    /// Delete a project. Deletion may run as a background future, which is
    /// awaited before returning.
    pub async fn delete_project(&self, project_key: &str, options: DeleteProjectOptions) -> Result<Value, ApiError> {
        let query = [
            ("clearManagedDatasets", flag(options.clear_managed_datasets)),
            ("clearOutputManagedFolders", flag(options.clear_output_managed_folders)),
            ("clearJobAndScenarioLogs", flag(options.clear_job_and_scenario_logs)),
        ];
        let response = self.delete(&["projects", project_key], &query).await?;
        self.wait_for_optional_future(response).await
    }

    /// Duplicate a project under a new key, waiting for the copy to finish.
    pub async fn duplicate_project(&self, project_key: &str, request: &DuplicateProject) -> Result<Value, ApiError> {
        let mut body = json!({
            "targetProjectKey": request.target_project_key,
            "targetProjectName": request.target_project_name,
            "duplicationMode": request.duplication_mode,
            "exportAnalysisModels": request.export_analysis_models,
            "exportSavedModels": request.export_saved_models,
            "exportInsightsData": request.export_insights_data,
            "remapping": {"connections": [], "codeEnvs": []},
        });
        if let Some(folder_id) = &request.target_project_folder_id {
            body["targetProjectFolderId"] = Value::String(folder_id.clone());
        }
        let response: Value = self.post_json(&["projects", project_key, "duplicate", ""], &[], &body).await?;
        self.wait_for_optional_future(response).await
    }

    pub async fn root_project_folder(&self) -> Result<ProjectFolder, ApiError> {
        self.get_json(&["project-folders", ""], &[]).await
    }

    pub async fn project_folder(&self, folder_id: &str) -> Result<ProjectFolder, ApiError> {
        if folder_id == ROOT_FOLDER_ID {
            return self.root_project_folder().await;
        }
        self.get_json(&["project-folders", folder_id], &[]).await
    }

    /// Folder currently holding a project.
    pub async fn project_folder_of(&self, project_key: &str) -> Result<ProjectFolder, ApiError> {
        self.get_json(&["projects", project_key, "project-folder"], &[]).await
    }

    /// A folder followed by each of its ancestors up to the root.
    pub async fn folder_ancestry(&self, folder: ProjectFolder) -> Result<Vec<ProjectFolder>, ApiError> {
        let mut chain = vec![folder];
        while let Some(parent_id) = chain.last().and_then(|folder| folder.parent_id.clone()) {
            if chain.iter().any(|folder| folder.id == parent_id) {
                break;
            }
            chain.push(self.project_folder(&parent_id).await?);
        }
        Ok(chain)
    }

    /// The whole folder hierarchy below the root, children fetched one by one.
    pub async fn project_folder_tree(&self) -> Result<FolderNode, ApiError> {
        let root = self.root_project_folder().await?;
        self.folder_subtree(root, "/".to_string()).await
    }

    fn folder_subtree<'a>(
        &'a self,
        folder: ProjectFolder,
        path: String,
    ) -> Pin<Box<dyn Future<Output = Result<FolderNode, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let mut children = Vec::with_capacity(folder.children_ids.len());
            for child_id in &folder.children_ids {
                let child = self.project_folder(child_id).await?;
                let child_path = FolderNode::child_path(&path, &child.name);
                children.push(self.folder_subtree(child, child_path).await?);
            }
            Ok(FolderNode {
                id: folder.id,
                name: folder.name,
                path,
                project_keys: folder.project_keys,
                children,
            })
        })
    }

    pub async fn move_project_to_folder(&self, project_key: &str, from_folder_id: &str, to_folder_id: &str) -> Result<(), ApiError> {
        self.send_json::<Value>(
            reqwest::Method::POST,
            &["project-folders", from_folder_id, "projects", project_key, "move"],
            &[("destination", to_folder_id.to_string())],
            None,
        )
        .await?;
        Ok(())
    }
}
