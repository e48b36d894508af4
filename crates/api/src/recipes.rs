//! Recipe endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use dssmcp_types::ValidatedRecipe;

use crate::client::DssClient;
use crate::error::ApiError;

/// Recipe definition and payload, as read and saved through the settings endpoint.
///
/// Unknown fields are preserved so a read-modify-save cycle does not lose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    pub recipe: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RecipeDefinition {
    pub fn recipe_type(&self) -> &str {
        self.recipe.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Value {
        self.recipe.get(name).cloned().unwrap_or_else(|| json!({}))
    }

    /// Payload decoded as JSON; an empty payload is `null`.
    pub fn json_payload(&self) -> Result<Value, serde_json::Error> {
        match self.payload.as_deref().map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(raw) => serde_json::from_str(raw),
        }
    }

    pub fn set_json_payload(&mut self, payload: &Value) -> Result<(), serde_json::Error> {
        self.payload = Some(serde_json::to_string_pretty(payload)?);
        Ok(())
    }
}

/// Output schema changes the platform proposes after a recipe edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaUpdates {
    #[serde(default)]
    pub total_incompatibilities: u64,
    #[serde(default)]
    pub computables: Vec<ComputableSchemaUpdate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputableSchemaUpdate {
    pub id: String,
    #[serde(rename = "type")]
    pub computable_type: String,
    #[serde(default)]
    pub new_schema: Value,
    #[serde(default)]
    pub drop_and_recreate: bool,
    #[serde(default)]
    pub synchronize_metastore: bool,
}

impl SchemaUpdates {
    pub fn any_action_required(&self) -> bool {
        self.total_incompatibilities > 0
    }
}

/// Build the creation request for a validated recipe.
pub fn recipe_creation_body(project_key: &str, recipe_name: &str, recipe: &ValidatedRecipe) -> Value {
    let inputs: Vec<Value> = recipe.inputs.iter().map(|name| json!({"ref": name, "deps": []})).collect();
    let outputs: Vec<Value> = recipe
        .outputs
        .iter()
        .map(|output| json!({"ref": output.name, "appendMode": output.append}))
        .collect();
    let mut creation_settings = serde_json::Map::new();
    if let Some(script) = recipe.script.as_deref().filter(|script| !script.is_empty()) {
        creation_settings.insert("script".to_string(), Value::String(script.to_string()));
    }
    json!({
        "recipePrototype": {
            "type": recipe.recipe_type.as_str(),
            "name": recipe_name,
            "projectKey": project_key,
            "inputs": {"main": {"items": inputs}},
            "outputs": {"main": {"items": outputs}},
        },
        "creationSettings": creation_settings,
    })
}

impl DssClient {
    pub async fn list_recipes(&self, project_key: &str) -> Result<Vec<Value>, ApiError> {
        self.get_json(&["projects", project_key, "recipes", ""], &[]).await
    }

    /// Create a recipe and return the name the platform assigned to it.
    pub async fn create_recipe(&self, project_key: &str, recipe_name: &str, recipe: &ValidatedRecipe) -> Result<String, ApiError> {
        let body = recipe_creation_body(project_key, recipe_name, recipe);
        let response: Value = self.post_json(&["projects", project_key, "recipes", ""], &[], &body).await?;
        let name = response
            .get("name")
            .or_else(|| response.get("id"))
            .and_then(Value::as_str)
            .unwrap_or(recipe_name);
        Ok(name.to_string())
    }

    pub async fn recipe_definition(&self, project_key: &str, recipe_name: &str) -> Result<RecipeDefinition, ApiError> {
        self.get_json(&["projects", project_key, "recipes", recipe_name], &[]).await
    }

    pub async fn save_recipe_definition(&self, project_key: &str, recipe_name: &str, definition: &RecipeDefinition) -> Result<(), ApiError> {
        self.put_json(&["projects", project_key, "recipes", recipe_name], definition).await?;
        Ok(())
    }

    pub async fn compute_schema_updates(&self, project_key: &str, recipe_name: &str) -> Result<SchemaUpdates, ApiError> {
        self.get_json(&["projects", project_key, "recipes", recipe_name, "schema-update"], &[])
            .await
    }

    /// Apply every proposed output schema, one computable at a time.
    pub async fn apply_schema_updates(&self, project_key: &str, recipe_name: &str, updates: &SchemaUpdates) -> Result<(), ApiError> {
        for computable in &updates.computables {
            debug!(project_key, recipe_name, computable = %computable.id, "applying output schema update");
            let body = schema_update_body(computable);
            self.send_json::<Value>(
                Method::POST,
                &["projects", project_key, "recipes", recipe_name, "actions", "updateOutputSchema"],
                &[],
                Some(&body),
            )
            .await?;
        }
        Ok(())
    }
}

fn schema_update_body(computable: &ComputableSchemaUpdate) -> Value {
    json!({
        "computableType": computable.computable_type,
        "computableId": computable.id,
        "newSchema": computable.new_schema,
        "dropAndRecreate": computable.drop_and_recreate,
        "synchronizeMetastore": computable.synchronize_metastore,
    })
}
