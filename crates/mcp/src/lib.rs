//! MCP server exposing a Dataiku DSS instance as tools.
//!
//! The crate is split into configuration loading ([`config`]) and the MCP
//! host ([`server`]), which serves the tool set over streamable HTTP or stdio.
//! Each tool call builds its own credential-scoped platform client from a
//! shared [`dssmcp_api::DssConnector`].

pub mod config;
pub mod server;

pub use config::{ConfigError, ConfigOverrides, ServerConfig, Transport};
pub use server::{DssMcpCore, McpHttpServer, RunningMcpHttpServer, serve_stdio};
