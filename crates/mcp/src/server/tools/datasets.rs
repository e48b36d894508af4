//! Dataset tools.

use dssmcp_api::{ManagedDatasetSpec, schema_column_names};
use dssmcp_types::{DatasetSample, clamp_sample_rows, parse_partitions, zip_row};
use rmcp::model::ErrorData;
use serde_json::{Value, json};
use tracing::info;

use crate::server::errors::remote;
use crate::server::schemas::{CreateManagedDatasetRequest, DatasetRequest, DatasetSampleRequest, DeleteDatasetRequest, RenameDatasetRequest};
use crate::server::tools::{CallContext, to_structured};

pub(crate) async fn create_managed_dataset(context: CallContext, request: CreateManagedDatasetRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "create_managed_dataset";
    let client = context.client(OPERATION)?;
    let spec = ManagedDatasetSpec {
        connection_id: request.connection.clone(),
        type_option_id: request.type_option_id,
        format_option_id: request.format_option_id,
    };
    client
        .create_managed_dataset(&request.project_key, &request.dataset_name, &spec, request.overwrite)
        .await
        .map_err(remote(OPERATION))?;
    info!(project_key = %request.project_key, dataset = %request.dataset_name, "created managed dataset");
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "dataset_name": request.dataset_name,
        "connection": request.connection,
        "message": format!(
            "Managed dataset '{}' created successfully on connection '{}'",
            request.dataset_name, request.connection
        ),
    }))
}

pub(crate) async fn delete_dataset(context: CallContext, request: DeleteDatasetRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "delete_dataset";
    let client = context.client(OPERATION)?;
    client
        .delete_dataset(&request.project_key, &request.dataset_name, request.drop_data)
        .await
        .map_err(remote(OPERATION))?;
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "dataset_name": request.dataset_name,
        "drop_data": request.drop_data,
        "message": format!("Dataset '{}' deleted successfully", request.dataset_name),
    }))
}

pub(crate) async fn rename_dataset(context: CallContext, request: RenameDatasetRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "rename_dataset";
    let client = context.client(OPERATION)?;
    client
        .rename_dataset(&request.project_key, &request.dataset_name, &request.new_name)
        .await
        .map_err(remote(OPERATION))?;
    Ok(json!({
        "success": true,
        "project_key": request.project_key,
        "old_name": request.dataset_name,
        "new_name": request.new_name,
        "message": format!("Dataset renamed from '{}' to '{}'", request.dataset_name, request.new_name),
    }))
}

pub(crate) async fn get_dataset_settings(context: CallContext, request: DatasetRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_dataset_settings";
    let client = context.client(OPERATION)?;
    client
        .dataset_settings(&request.project_key, &request.dataset_name)
        .await
        .map_err(remote(OPERATION))
}

pub(crate) async fn get_dataset_schema(context: CallContext, request: DatasetRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_dataset_schema";
    let client = context.client(OPERATION)?;
    client
        .dataset_schema(&request.project_key, &request.dataset_name)
        .await
        .map_err(remote(OPERATION))
}

pub(crate) async fn get_dataset_metadata(context: CallContext, request: DatasetRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_dataset_metadata";
    let client = context.client(OPERATION)?;
    client
        .dataset_metadata(&request.project_key, &request.dataset_name)
        .await
        .map_err(remote(OPERATION))
}

/// Read the first rows of a dataset as column-name keyed objects.
pub(crate) async fn get_dataset_sample(context: CallContext, request: DatasetSampleRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_dataset_sample";
    let num_rows = clamp_sample_rows(request.num_rows);
    let partitions = parse_partitions(request.partitions.as_deref());
    let client = context.client(OPERATION)?;

    let schema = client
        .dataset_schema(&request.project_key, &request.dataset_name)
        .await
        .map_err(remote(OPERATION))?;
    let columns = schema_column_names(&schema);
    let records = client
        .sample_rows(&request.project_key, &request.dataset_name, num_rows, partitions.as_deref())
        .await
        .map_err(remote(OPERATION))?;
    let rows: Vec<_> = records.into_iter().map(|values| zip_row(&columns, values)).collect();

    let sample = DatasetSample {
        project_key: request.project_key,
        dataset_name: request.dataset_name,
        num_rows_requested: num_rows,
        num_rows_returned: rows.len(),
        columns,
        rows,
    };
    to_structured(OPERATION, &sample)
}
