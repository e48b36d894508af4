//! Dataset endpoints, including streamed row sampling.

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use dssmcp_types::TsvRowDecoder;

use crate::client::{DssClient, flag};
use crate::error::ApiError;

/// Storage choices for a new managed dataset.
#[derive(Debug, Clone, Default)]
pub struct ManagedDatasetSpec {
    pub connection_id: String,
    pub type_option_id: Option<String>,
    pub format_option_id: Option<String>,
}

impl ManagedDatasetSpec {
    fn creation_settings(&self) -> Value {
        let mut specific = serde_json::Map::new();
        if let Some(format) = &self.format_option_id {
            specific.insert("formatOptionId".to_string(), Value::String(format.clone()));
        }
        let mut settings = json!({
            "connectionId": self.connection_id,
            "specificSettings": specific,
        });
        if let Some(type_option) = &self.type_option_id {
            settings["typeOptionId"] = Value::String(type_option.clone());
        }
        settings
    }
}

impl DssClient {
    pub async fn list_datasets(&self, project_key: &str, include_shared: bool) -> Result<Vec<Value>, ApiError> {
        self.get_json(&["projects", project_key, "datasets", ""], &[("foreign", flag(include_shared))])
            .await
    }

    /// Names of every dataset in the project.
    pub async fn dataset_names(&self, project_key: &str) -> Result<Vec<String>, ApiError> {
        let datasets = self.list_datasets(project_key, false).await?;
        Ok(datasets
            .iter()
            .filter_map(|dataset| dataset.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    pub async fn dataset_exists(&self, project_key: &str, dataset_name: &str) -> Result<bool, ApiError> {
        match self.dataset_settings(project_key, dataset_name).await {
            Ok(_) => Ok(true),
            Err(ApiError::NotFound { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Create a managed dataset. With `overwrite`, an existing dataset of the
    /// same name is deleted together with its data first.
    pub async fn create_managed_dataset(
        &self,
        project_key: &str,
        dataset_name: &str,
        spec: &ManagedDatasetSpec,
        overwrite: bool,
    ) -> Result<Value, ApiError> {
        if overwrite && self.dataset_exists(project_key, dataset_name).await? {
            debug!(project_key, dataset_name, "dropping existing dataset before re-creation");
            self.delete_dataset(project_key, dataset_name, true).await?;
        }
        let body = json!({
            "name": dataset_name,
            "creationSettings": spec.creation_settings(),
        });
        self.post_json(&["projects", project_key, "datasets", "managed"], &[], &body).await
    }

    pub async fn delete_dataset(&self, project_key: &str, dataset_name: &str, drop_data: bool) -> Result<(), ApiError> {
        self.delete(&["projects", project_key, "datasets", dataset_name], &[("dropData", flag(drop_data))])
            .await?;
        Ok(())
    }

    pub async fn rename_dataset(&self, project_key: &str, dataset_name: &str, new_name: &str) -> Result<(), ApiError> {
        self.post_json::<Value, _>(
            &["projects", project_key, "datasets", dataset_name, "actions", "rename"],
            &[],
            &json!({"newName": new_name}),
        )
        .await?;
        Ok(())
    }

    pub async fn dataset_settings(&self, project_key: &str, dataset_name: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "datasets", dataset_name, ""], &[]).await
    }

    pub async fn dataset_schema(&self, project_key: &str, dataset_name: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "datasets", dataset_name, "schema"], &[]).await
    }

    pub async fn dataset_metadata(&self, project_key: &str, dataset_name: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "datasets", dataset_name, "metadata"], &[])
            .await
    }

    /// Stream at most `limit` rows of a dataset.
    ///
    /// Rows arrive as header-less Excel-dialect TSV; the body is read chunk by
    /// chunk and the response is dropped as soon as `limit` rows are decoded.
    pub async fn sample_rows(
        &self,
        project_key: &str,
        dataset_name: &str,
        limit: usize,
        partitions: Option<&[String]>,
    ) -> Result<Vec<Vec<String>>, ApiError> {
        let mut query = vec![("format", "tsv-excel-noheader".to_string())];
        if let Some(partitions) = partitions {
            query.push(("partitions", partitions.join(",")));
        }
        let segments = ["projects", project_key, "datasets", dataset_name, "data", ""];
        let mut response = self.execute(Method::GET, &segments, &query, None).await?;
        let url = response.url().to_string();

        let mut decoder = TsvRowDecoder::new();
        let mut rows = Vec::with_capacity(limit);
        while rows.len() < limit {
            let Some(chunk) = response.chunk().await.map_err(|error| ApiError::transport(&url, error))? else {
                if let Some(last) = decoder.finish() {
                    rows.push(last);
                }
                break;
            };
            rows.extend(decoder.feed(&chunk));
        }
        rows.truncate(limit);
        debug!(project_key, dataset_name, rows = rows.len(), "sampled dataset rows");
        Ok(rows)
    }
}

/// Column names listed in a dataset schema, in schema order.
pub fn schema_column_names(schema: &Value) -> Vec<String> {
    schema
        .get("columns")
        .and_then(Value::as_array)
        .map(|columns| {
            columns
                .iter()
                .filter_map(|column| column.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
