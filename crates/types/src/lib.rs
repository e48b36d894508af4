//! Shared types for the dssmcp workspace.
//!
//! Everything in this crate is pure data and validation: the recipe-type
//! table and shape validator, project-key derivation, typed projections of
//! platform listings, flow ordering, sampling helpers and job metadata. No
//! module performs I/O.

pub mod flow;
pub mod job;
pub mod project_key;
pub mod recipe;
pub mod sample;
pub mod settings;
pub mod summary;

pub use flow::{FlowNode, first_successor_computable, traversal_order};
pub use job::{JobType, UNKNOWN_JOB_STATE, UnknownJobType, is_terminal_job_state};
pub use project_key::generate_project_key;
pub use recipe::{
    ArityClass, DatasetRole, OutputSpec, RecipeShapeError, RecipeType, UnknownRecipeType, ValidatedRecipe, validate_recipe_request,
};
pub use sample::{DEFAULT_SAMPLE_ROWS, DatasetSample, MAX_SAMPLE_ROWS, TsvRowDecoder, clamp_sample_rows, parse_partitions, zip_row};
pub use settings::{ALLOWED_GENERAL_SETTINGS_KEYS, InvalidSettingsKeys, check_settings_keys};
pub use summary::{
    CodeEnvSummary, DatasetSummary, FolderDetail, FolderNode, ManagedFolderSummary, ProjectFolder, ProjectSummary, RecipeSummary,
    folder_path, project_list,
};
