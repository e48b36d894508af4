//! Recipe type classification and pre-flight shape validation.
//!
//! Every recipe type the platform accepts belongs to exactly one
//! [`ArityClass`]. The class decides how many inputs and outputs a recipe may
//! declare and whether it carries a script. Validation here is purely local:
//! it runs before any remote call so that malformed requests fail with an
//! actionable message instead of a deep platform error.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cardinality rules shared by a group of recipe types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArityClass {
    /// Visual recipes with exactly one input and one output.
    SingleInputSingleOutput,
    /// Visual recipes with one input and any number of outputs.
    SingleInputMultiOutput,
    /// Visual recipes combining several inputs into one output.
    MultiInputSingleOutput,
    /// Code recipes: any number of inputs and outputs, optional script body.
    Code,
    /// Model scoring and evaluation recipes.
    Scoring,
    /// Remaining single-input, single-output recipe kinds.
    Other,
}

impl ArityClass {
    pub fn single_input(self) -> bool {
        matches!(
            self,
            Self::SingleInputSingleOutput | Self::SingleInputMultiOutput | Self::Scoring | Self::Other
        )
    }

    pub fn single_output(self) -> bool {
        matches!(
            self,
            Self::SingleInputSingleOutput | Self::MultiInputSingleOutput | Self::Scoring | Self::Other
        )
    }

    pub fn is_code(self) -> bool {
        matches!(self, Self::Code)
    }

    /// Short human-readable description used in tool documentation.
    pub fn describe(self) -> &'static str {
        match self {
            Self::SingleInputSingleOutput => "single-input visual (exactly 1 input, 1 output)",
            Self::SingleInputMultiOutput => "multi-output visual (1 input, 1+ output)",
            Self::MultiInputSingleOutput => "multi-input visual (1+ inputs, 1 output)",
            Self::Code => "code (any number of inputs/outputs)",
            Self::Scoring => "scoring/evaluation (1 input, 1 output)",
            Self::Other => "other (1 input, 1 output)",
        }
    }
}

macro_rules! recipe_types {
    ($($variant:ident => $wire:literal : $class:ident),+ $(,)?) => {
        /// A recipe type identifier understood by the platform.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RecipeType {
            $($variant),+
        }

        impl RecipeType {
            /// Every accepted recipe type, in declaration order.
            pub const ALL: &'static [RecipeType] = &[$(RecipeType::$variant),+];

            /// Wire identifier sent to and received from the platform.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(RecipeType::$variant => $wire),+
                }
            }

            pub fn arity_class(self) -> ArityClass {
                match self {
                    $(RecipeType::$variant => ArityClass::$class),+
                }
            }
        }
    };
}

recipe_types! {
    Sync => "sync": SingleInputSingleOutput,
    Csync => "csync": SingleInputSingleOutput,
    Sort => "sort": SingleInputSingleOutput,
    TopN => "topn": SingleInputSingleOutput,
    Distinct => "distinct": SingleInputSingleOutput,
    Prepare => "prepare": SingleInputSingleOutput,
    Shaker => "shaker": SingleInputSingleOutput,
    Sampling => "sampling": SingleInputSingleOutput,
    Grouping => "grouping": SingleInputSingleOutput,
    Window => "window": SingleInputSingleOutput,
    Pivot => "pivot": SingleInputSingleOutput,
    Download => "download": SingleInputSingleOutput,
    Export => "export": SingleInputSingleOutput,
    Upsert => "upsert": SingleInputSingleOutput,
    Split => "split": SingleInputMultiOutput,
    Join => "join": MultiInputSingleOutput,
    Vstack => "vstack": MultiInputSingleOutput,
    GenerateFeatures => "generate_features": MultiInputSingleOutput,
    SqlQuery => "sql_query": MultiInputSingleOutput,
    Python => "python": Code,
    R => "r": Code,
    SqlScript => "sql_script": Code,
    Pyspark => "pyspark": Code,
    SparkR => "sparkr": Code,
    SparkScala => "spark_scala": Code,
    Shell => "shell": Code,
    SparkSqlQuery => "spark_sql_query": Code,
    CPython => "cpython": Code,
    Ksql => "ksql": Code,
    StreamingSparkScala => "streaming_spark_scala": Code,
    PredictionScoring => "prediction_scoring": Scoring,
    ClusteringScoring => "clustering_scoring": Scoring,
    Evaluation => "evaluation": Scoring,
    StandaloneEvaluation => "standalone_evaluation": Scoring,
    NlpLlmEvaluation => "nlp_llm_evaluation": Scoring,
    ExtractFailedRows => "extract_failed_rows": Other,
    NlpLlmRagEmbedding => "nlp_llm_rag_embedding": Other,
    EmbedDataset => "embed_dataset": Other,
    EmbedDocuments => "embed_documents": Other,
}

impl RecipeType {
    pub fn is_code(self) -> bool {
        self.arity_class().is_code()
    }

    /// Sorted wire identifiers of every accepted type.
    pub fn sorted_identifiers() -> Vec<&'static str> {
        let mut identifiers: Vec<&'static str> = Self::ALL.iter().map(|recipe_type| recipe_type.as_str()).collect();
        identifiers.sort_unstable();
        identifiers
    }

    /// Returns true when a raw platform type string names a code recipe.
    ///
    /// Unknown identifiers are treated as visual recipes, matching how the
    /// platform stores payloads for them.
    pub fn is_code_identifier(identifier: &str) -> bool {
        identifier.parse::<RecipeType>().map(RecipeType::is_code).unwrap_or(false)
    }
}

impl fmt::Display for RecipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a known recipe type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown recipe type '{0}'")]
pub struct UnknownRecipeType(pub String);

impl FromStr for RecipeType {
    type Err = UnknownRecipeType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|recipe_type| recipe_type.as_str() == value)
            .ok_or_else(|| UnknownRecipeType(value.to_string()))
    }
}

/// One requested recipe output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Output dataset name.
    pub name: String,
    /// Append to the output instead of overwriting it.
    #[serde(default)]
    pub append: bool,
}

/// Which side of a recipe a missing dataset was referenced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetRole {
    Input,
    Output,
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("Input"),
            Self::Output => f.write_str("Output"),
        }
    }
}

/// Reasons a recipe creation request is rejected before reaching the platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeShapeError {
    #[error("Invalid recipe_type '{recipe_type}'. Must be one of: {}", format_list(.valid.as_slice()))]
    UnknownRecipeType { recipe_type: String, valid: Vec<&'static str> },

    #[error("Recipes require at least 1 input, got 0")]
    MissingInputs,

    #[error("Recipes require at least 1 output, got 0")]
    MissingOutputs,

    #[error("Recipe type '{recipe_type}' requires exactly 1 input, got {count}")]
    InputArityViolation { recipe_type: RecipeType, count: usize },

    #[error("Recipe type '{recipe_type}' requires exactly 1 output, got {count}")]
    OutputArityViolation { recipe_type: RecipeType, count: usize },

    #[error("The 'code' parameter is only valid for code recipe types, not '{recipe_type}'")]
    ScriptNotApplicable { recipe_type: RecipeType },

    #[error(
        "{role} dataset(s) not found in project '{project_key}': {}. Create them first with create_managed_dataset.",
        format_list(.missing.as_slice())
    )]
    DatasetNotFound {
        project_key: String,
        role: DatasetRole,
        missing: Vec<String>,
    },
}

fn format_list<T: AsRef<str>>(items: &[T]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

/// A recipe creation request that passed local shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecipe {
    pub recipe_type: RecipeType,
    pub inputs: Vec<String>,
    pub outputs: Vec<OutputSpec>,
    pub script: Option<String>,
}

/// Validate a requested recipe shape without contacting the platform.
///
/// Checks short-circuit in a fixed order: type membership, non-empty inputs,
/// non-empty outputs, input arity, output arity, then script applicability.
pub fn validate_recipe_request(
    recipe_type: &str,
    inputs: &[String],
    outputs: &[OutputSpec],
    script: Option<&str>,
) -> Result<ValidatedRecipe, RecipeShapeError> {
    let parsed = recipe_type
        .parse::<RecipeType>()
        .map_err(|_| RecipeShapeError::UnknownRecipeType {
            recipe_type: recipe_type.to_string(),
            valid: RecipeType::sorted_identifiers(),
        })?;

    if inputs.is_empty() {
        return Err(RecipeShapeError::MissingInputs);
    }
    if outputs.is_empty() {
        return Err(RecipeShapeError::MissingOutputs);
    }

    let class = parsed.arity_class();
    if class.single_input() && inputs.len() > 1 {
        return Err(RecipeShapeError::InputArityViolation {
            recipe_type: parsed,
            count: inputs.len(),
        });
    }
    if class.single_output() && outputs.len() > 1 {
        return Err(RecipeShapeError::OutputArityViolation {
            recipe_type: parsed,
            count: outputs.len(),
        });
    }
    if script.is_some() && !class.is_code() {
        return Err(RecipeShapeError::ScriptNotApplicable { recipe_type: parsed });
    }

    Ok(ValidatedRecipe {
        recipe_type: parsed,
        inputs: inputs.to_vec(),
        outputs: outputs.to_vec(),
        script: script.map(str::to_string),
    })
}

impl ValidatedRecipe {
    /// Confirm that every referenced dataset exists in the project catalog.
    ///
    /// Inputs are checked before outputs; the first side with missing
    /// entries is reported.
    pub fn check_catalog(&self, project_key: &str, catalog: &HashSet<String>) -> Result<(), RecipeShapeError> {
        let missing_inputs: Vec<String> = self.inputs.iter().filter(|name| !catalog.contains(*name)).cloned().collect();
        if !missing_inputs.is_empty() {
            return Err(RecipeShapeError::DatasetNotFound {
                project_key: project_key.to_string(),
                role: DatasetRole::Input,
                missing: missing_inputs,
            });
        }

        let missing_outputs: Vec<String> = self
            .outputs
            .iter()
            .filter(|output| !catalog.contains(&output.name))
            .map(|output| output.name.clone())
            .collect();
        if !missing_outputs.is_empty() {
            return Err(RecipeShapeError::DatasetNotFound {
                project_key: project_key.to_string(),
                role: DatasetRole::Output,
                missing: missing_outputs,
            });
        }
        Ok(())
    }

    /// Recipe name used when the caller does not provide one.
    pub fn default_name(&self) -> String {
        match self.outputs.first() {
            Some(output) => format!("compute_{}", output.name),
            None => format!("compute_{}", self.recipe_type),
        }
    }

    pub fn output_names(&self) -> Vec<String> {
        self.outputs.iter().map(|output| output.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn outputs(values: &[&str]) -> Vec<OutputSpec> {
        values
            .iter()
            .map(|value| OutputSpec {
                name: value.to_string(),
                append: false,
            })
            .collect()
    }

    #[test]
    fn every_identifier_round_trips_and_is_unique() {
        let mut seen = HashSet::new();
        for recipe_type in RecipeType::ALL {
            assert!(seen.insert(recipe_type.as_str()), "duplicate identifier {}", recipe_type);
            assert_eq!(recipe_type.as_str().parse::<RecipeType>().expect("parse"), *recipe_type);
        }
        assert_eq!(seen.len(), 39);
    }

    #[test]
    fn classification_matches_expected_examples() {
        assert_eq!(RecipeType::Sync.arity_class(), ArityClass::SingleInputSingleOutput);
        assert_eq!(RecipeType::Split.arity_class(), ArityClass::SingleInputMultiOutput);
        assert_eq!(RecipeType::Join.arity_class(), ArityClass::MultiInputSingleOutput);
        assert_eq!(RecipeType::SqlQuery.arity_class(), ArityClass::MultiInputSingleOutput);
        assert_eq!(RecipeType::Python.arity_class(), ArityClass::Code);
        assert_eq!(RecipeType::Shell.arity_class(), ArityClass::Code);
        assert_eq!(RecipeType::Evaluation.arity_class(), ArityClass::Scoring);
        assert!(RecipeType::is_code_identifier("sql_script"));
        assert!(!RecipeType::is_code_identifier("join"));
        assert!(!RecipeType::is_code_identifier("not_a_type"));
    }

    #[test]
    fn unknown_type_lists_valid_set() {
        let error = validate_recipe_request("bogus", &names(&["a"]), &outputs(&["b"]), None).expect_err("unknown type");
        let message = error.to_string();
        assert!(message.starts_with("Invalid recipe_type 'bogus'"));
        assert!(message.contains("'join'"));
        assert!(message.contains("'window'"));
    }

    #[test]
    fn unknown_type_is_reported_before_empty_lists() {
        let error = validate_recipe_request("bogus", &[], &[], None).expect_err("unknown type");
        assert!(matches!(error, RecipeShapeError::UnknownRecipeType { .. }));
    }

    #[test]
    fn empty_inputs_and_outputs_are_rejected_in_order() {
        assert_eq!(
            validate_recipe_request("sync", &[], &[], None),
            Err(RecipeShapeError::MissingInputs)
        );
        assert_eq!(
            validate_recipe_request("sync", &names(&["a"]), &[], None),
            Err(RecipeShapeError::MissingOutputs)
        );
    }

    #[test]
    fn single_input_classes_reject_multiple_inputs() {
        for recipe_type in RecipeType::ALL.iter().filter(|recipe_type| recipe_type.arity_class().single_input()) {
            let error = validate_recipe_request(recipe_type.as_str(), &names(&["a", "b"]), &outputs(&["c"]), None)
                .expect_err("arity violation");
            assert_eq!(
                error,
                RecipeShapeError::InputArityViolation {
                    recipe_type: *recipe_type,
                    count: 2
                }
            );
        }
    }

    #[test]
    fn single_output_classes_reject_multiple_outputs() {
        for recipe_type in RecipeType::ALL.iter().filter(|recipe_type| recipe_type.arity_class().single_output()) {
            let error = validate_recipe_request(recipe_type.as_str(), &names(&["a"]), &outputs(&["b", "c"]), None)
                .expect_err("arity violation");
            assert!(matches!(error, RecipeShapeError::OutputArityViolation { count: 2, .. }));
        }
    }

    #[test]
    fn multi_classes_accept_many_datasets() {
        assert!(validate_recipe_request("join", &names(&["a", "b", "c"]), &outputs(&["d"]), None).is_ok());
        assert!(validate_recipe_request("split", &names(&["a"]), &outputs(&["b", "c"]), None).is_ok());
        assert!(validate_recipe_request("python", &names(&["a", "b"]), &outputs(&["c", "d"]), Some("print(1)")).is_ok());
    }

    #[test]
    fn script_is_rejected_for_visual_types() {
        let error = validate_recipe_request("grouping", &names(&["a"]), &outputs(&["b"]), Some("select 1")).expect_err("script");
        assert_eq!(
            error,
            RecipeShapeError::ScriptNotApplicable {
                recipe_type: RecipeType::Grouping
            }
        );
        assert_eq!(
            error.to_string(),
            "The 'code' parameter is only valid for code recipe types, not 'grouping'"
        );
    }

    #[test]
    fn catalog_check_names_missing_input() {
        let validated = validate_recipe_request("join", &names(&["A", "B"]), &outputs(&["C"]), None).expect("valid");
        let catalog: HashSet<String> = names(&["A", "C"]).into_iter().collect();
        let error = validated.check_catalog("PRJ", &catalog).expect_err("missing B");
        assert_eq!(
            error,
            RecipeShapeError::DatasetNotFound {
                project_key: "PRJ".into(),
                role: DatasetRole::Input,
                missing: vec!["B".into()],
            }
        );
        assert!(error.to_string().contains("'B'"));
        assert!(error.to_string().contains("create_managed_dataset"));
    }

    #[test]
    fn catalog_check_reports_outputs_after_inputs() {
        let validated = validate_recipe_request("sync", &names(&["A"]), &outputs(&["Z"]), None).expect("valid");
        let catalog: HashSet<String> = names(&["A"]).into_iter().collect();
        let error = validated.check_catalog("PRJ", &catalog).expect_err("missing Z");
        assert!(matches!(error, RecipeShapeError::DatasetNotFound { role: DatasetRole::Output, .. }));
    }

    #[test]
    fn default_name_uses_first_output() {
        let validated = validate_recipe_request("sync", &names(&["in"]), &outputs(&["out"]), None).expect("valid");
        assert_eq!(validated.default_name(), "compute_out");
    }
}
