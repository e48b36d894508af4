//! Flow graph tool.

use dssmcp_types::traversal_order;
use rmcp::model::ErrorData;
use serde_json::{Value, json};

use crate::server::errors::remote;
use crate::server::schemas::ProjectKeyRequest;
use crate::server::tools::CallContext;

/// Flow nodes of a project, ordered so the graph reads left to right.
pub(crate) async fn get_flow_graph(context: CallContext, request: ProjectKeyRequest) -> Result<Value, ErrorData> {
    const OPERATION: &str = "get_flow_graph";
    let client = context.client(OPERATION)?;
    let graph = client.flow_graph(&request.project_key).await.map_err(remote(OPERATION))?;
    let nodes = traversal_order(&graph.nodes);
    Ok(json!({
        "project_key": request.project_key,
        "nodes": nodes,
    }))
}
