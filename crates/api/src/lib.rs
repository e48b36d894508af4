//! REST client for the data-science platform's public API.
//!
//! The entry point is [`DssConnector`], built once from the server
//! configuration and a [`CredentialStrategy`]. Each tool call asks it for a
//! [`DssClient`] scoped to the caller's API key; endpoint groups are exposed as
//! inherent methods on that client:
//!
//! - [`projects`]: projects, project folders, identity
//! - [`datasets`]: managed datasets, schemas, streamed row samples
//! - [`recipes`]: recipe creation, settings and schema updates
//! - [`jobs`]: flow graph, build jobs, futures
//! - [`instance`]: instance listings, admin probe, general settings
//!
//! Failures are reported as [`ApiError`], which separates local credential
//! problems, transport failures and each kind of platform rejection.

mod client;
mod credentials;
mod error;

pub mod datasets;
pub mod instance;
pub mod jobs;
pub mod projects;
pub mod recipes;

pub use client::{DssClient, Query, flag};
pub use credentials::{ApiKey, ClientOptions, CredentialError, CredentialStrategy, DssConnector, ForwardedBearer, StaticApiKey, TlsPolicy, validate_base_url};
pub use datasets::{ManagedDatasetSpec, schema_column_names};
pub use error::ApiError;
pub use instance::InstanceResource;
pub use jobs::{FlowGraph, JobTarget, job_state};
pub use projects::{DeleteProjectOptions, DuplicateProject, NewProject, ProjectCollection, ROOT_FOLDER_ID};
pub use recipes::{RecipeDefinition, SchemaUpdates, recipe_creation_body};
