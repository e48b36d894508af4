//! Flow graph, build jobs and long-running futures.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use dssmcp_types::{FlowNode, JobType, UNKNOWN_JOB_STATE, is_terminal_job_state};

use crate::client::{DssClient, flag};
use crate::error::ApiError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, FlowNode>,
}

/// One object a build job should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTarget {
    pub id: String,
    pub object_type: String,
}

/// State reported for a job; `UNKNOWN` when the platform omits it.
pub fn job_state(status: &Value) -> &str {
    status
        .pointer("/baseStatus/state")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_JOB_STATE)
}

impl DssClient {
    pub async fn flow_graph(&self, project_key: &str) -> Result<FlowGraph, ApiError> {
        self.get_json(&["projects", project_key, "flow", "graph", ""], &[]).await
    }

    /// Start a build job and return its identifier.
    pub async fn start_job(&self, project_key: &str, job_type: JobType, targets: &[JobTarget]) -> Result<String, ApiError> {
        let outputs: Vec<Value> = targets
            .iter()
            .map(|target| json!({"projectKey": project_key, "id": target.id, "type": target.object_type}))
            .collect();
        let body = json!({"type": job_type.as_str(), "outputs": outputs});
        let response: Value = self.post_json(&["projects", project_key, "jobs", ""], &[], &body).await?;
        response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::decode(format!("projects/{project_key}/jobs/"), "job creation response has no 'id'"))
    }

    pub async fn job_status(&self, project_key: &str, job_id: &str) -> Result<Value, ApiError> {
        self.get_json(&["projects", project_key, "jobs", job_id, ""], &[]).await
    }

    /// Poll a job until it reaches a terminal state and return its final status.
    ///
    /// A failed or aborted job is returned like a successful one.
    pub async fn wait_for_job(&self, project_key: &str, job_id: &str) -> Result<Value, ApiError> {
        loop {
            let status = self.job_status(project_key, job_id).await?;
            let state = job_state(&status);
            if is_terminal_job_state(state) {
                info!(project_key, job_id, state, "job finished");
                return Ok(status);
            }
            debug!(project_key, job_id, state, "job still running");
            tokio::time::sleep(self.poll_interval()).await;
        }
    }

    pub async fn future_state(&self, job_id: &str) -> Result<Value, ApiError> {
        self.get_json(&["futures", job_id], &[("peek", flag(false))]).await
    }

    /// Resolve a response that may describe a background future.
    ///
    /// Responses carrying a `jobId` are polled until the future has a result,
    /// which is returned; any other response is returned unchanged. A state
    /// that reports no result and does not say the task is alive ends the wait.
    pub async fn wait_for_optional_future(&self, response: Value) -> Result<Value, ApiError> {
        let Some(job_id) = response.get("jobId").and_then(Value::as_str).map(str::to_string) else {
            return Ok(response);
        };
        loop {
            let state = self.future_state(&job_id).await?;
            if state.get("hasResult").and_then(Value::as_bool).unwrap_or(false) {
                return Ok(state.get("result").cloned().unwrap_or(Value::Null));
            }
            if !state.get("alive").and_then(Value::as_bool).unwrap_or(false) {
                let message = state
                    .get("stackTrace")
                    .and_then(Value::as_str)
                    .unwrap_or("the task ended without a result")
                    .to_string();
                return Err(ApiError::BackgroundTaskFailed { job_id, message });
            }
            debug!(job_id, "background task still running");
            tokio::time::sleep(self.poll_interval()).await;
        }
    }

    pub async fn list_futures(&self, all_users: bool, with_scenarios: bool) -> Result<Vec<Value>, ApiError> {
        let query = [
            ("withScenarios", flag(with_scenarios)),
            ("withNotScenarios", flag(!with_scenarios)),
            ("allUsers", flag(all_users)),
        ];
        self.get_json(&["futures", ""], &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_job_state() {
        assert_eq!(job_state(&json!({"baseStatus": {"state": "RUNNING"}})), "RUNNING");
        assert_eq!(job_state(&json!({})), UNKNOWN_JOB_STATE);
    }

    #[test]
    fn decodes_flow_graph_nodes() {
        let graph: FlowGraph = serde_json::from_value(json!({
            "nodes": {
                "orders": {"ref": "orders", "type": "COMPUTABLE_DATASET", "predecessors": [], "successors": ["r"]},
                "r": {"ref": "r", "type": "RUNNABLE_RECIPE", "predecessors": ["orders"], "successors": []},
            },
            "datasets": {},
        }))
        .expect("graph");
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.nodes["r"].is_recipe());
    }
}
