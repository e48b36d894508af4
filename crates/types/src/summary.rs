//! Typed projections of platform listings.
//!
//! Listing endpoints return large objects; the tools only forward the fields
//! a model needs. Each projection deserializes straight from the platform JSON
//! (missing optional fields fall back to defaults, missing required fields are
//! decode errors) and serializes back under the platform's field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Project entry returned by `list_projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(default)]
    pub name: String,
    pub project_key: String,
    #[serde(default)]
    pub owner_display_name: String,
    #[serde(default)]
    pub owner_login: String,
    #[serde(default = "empty_string")]
    pub tutorial_project: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_location: Option<Value>,
}

impl ProjectSummary {
    /// Drop the optional heavy fields the caller did not ask for.
    ///
    /// Requested fields that the platform omitted are reported as `null`.
    pub fn with_optional_fields(mut self, include_description: bool, include_location: bool) -> Self {
        self.description = if include_description {
            Some(self.description.unwrap_or(Value::Null))
        } else {
            None
        };
        self.project_location = if include_location {
            Some(self.project_location.unwrap_or(Value::Null))
        } else {
            None
        };
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    #[serde(rename = "type", default)]
    pub dataset_type: String,
    pub managed: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub smart_name: String,
    #[serde(default)]
    pub format_type: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "empty_object")]
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    #[serde(rename = "type", default)]
    pub recipe_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(default = "empty_object")]
    pub inputs: Value,
    #[serde(default = "empty_object")]
    pub outputs: Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFolderSummary {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub folder_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "empty_object")]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEnvSummary {
    #[serde(default)]
    pub env_name: String,
    pub env_lang: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub python_interpreter: String,
}

/// Raw project folder definition as stored by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFolder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub project_keys: Vec<String>,
    #[serde(default)]
    pub children_ids: Vec<String>,
}

/// One folder in the recursive tree returned by `list_project_folders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub path: String,
    pub project_keys: Vec<String>,
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Path of a child folder below `parent_path`.
    pub fn child_path(parent_path: &str, child_name: &str) -> String {
        if parent_path == "/" || parent_path.is_empty() {
            format!("/{child_name}")
        } else {
            format!("{parent_path}/{child_name}")
        }
    }
}

/// Single folder view returned by `get_project_folder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDetail {
    pub id: String,
    pub name: String,
    pub path: String,
    pub project_keys: Vec<String>,
    pub children_ids: Vec<String>,
}

/// Build the display path of a folder from its ancestor chain.
///
/// `ancestors` runs from the folder itself up to (and including) the root.
/// The root contributes no path segment.
pub fn folder_path(ancestors: &[ProjectFolder]) -> String {
    let names: Vec<&str> = ancestors
        .iter()
        .rev()
        .filter(|folder| folder.parent_id.is_some())
        .map(|folder| folder.name.as_str())
        .collect();
    if names.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", names.join("/"))
    }
}

fn empty_string() -> Value {
    Value::String(String::new())
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Decode every element of a platform listing into a projection.
pub fn project_list<T: for<'de> Deserialize<'de>>(items: Vec<Value>) -> Result<Vec<T>, serde_json::Error> {
    items.into_iter().map(serde_json::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_summary_trims_unrequested_fields() {
        let raw = json!({
            "projectKey": "SALES",
            "name": "Sales",
            "ownerLogin": "alice",
            "description": "long text",
            "projectLocation": "/a",
            "versionTag": {"versionNumber": 4},
        });
        let summary: ProjectSummary = serde_json::from_value(raw).expect("decode");
        let trimmed = summary.with_optional_fields(false, true);
        let value = serde_json::to_value(&trimmed).expect("encode");
        assert_eq!(value["projectKey"], "SALES");
        assert_eq!(value["ownerDisplayName"], "");
        assert_eq!(value["projectLocation"], "/a");
        assert!(value.get("description").is_none());
        assert!(value.get("versionTag").is_none());
    }

    #[test]
    fn project_summary_requires_project_key() {
        let raw = json!({"name": "No key"});
        assert!(serde_json::from_value::<ProjectSummary>(raw).is_err());
    }

    #[test]
    fn dataset_summary_keeps_type_and_schema() {
        let raw = json!({
            "type": "Filesystem",
            "managed": true,
            "name": "orders",
            "projectKey": "SALES",
            "schema": {"columns": [{"name": "id", "type": "bigint"}]},
            "params": {"connection": "filesystem_managed"},
        });
        let summary: DatasetSummary = serde_json::from_value(raw).expect("decode");
        let value = serde_json::to_value(&summary).expect("encode");
        assert_eq!(value["type"], "Filesystem");
        assert_eq!(value["schema"]["columns"][0]["name"], "id");
        assert!(value.get("params").is_none());
    }

    #[test]
    fn folder_path_skips_root() {
        let root = ProjectFolder {
            id: "ROOT".into(),
            name: "Root".into(),
            parent_id: None,
            project_keys: vec![],
            children_ids: vec!["a".into()],
        };
        let child = ProjectFolder {
            id: "a".into(),
            name: "Team".into(),
            parent_id: Some("ROOT".into()),
            project_keys: vec![],
            children_ids: vec!["b".into()],
        };
        let grandchild = ProjectFolder {
            id: "b".into(),
            name: "Reports".into(),
            parent_id: Some("a".into()),
            project_keys: vec![],
            children_ids: vec![],
        };
        assert_eq!(folder_path(std::slice::from_ref(&root)), "/");
        assert_eq!(folder_path(&[grandchild, child, root]), "/Team/Reports");
        assert_eq!(FolderNode::child_path("/", "Team"), "/Team");
        assert_eq!(FolderNode::child_path("/Team", "Reports"), "/Team/Reports");
    }
}
