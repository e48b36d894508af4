mod core;
mod errors;
mod http;
mod schemas;
mod stdio;
mod tools;

pub use core::DssMcpCore;
pub use http::{McpHttpServer, RunningMcpHttpServer};
pub use stdio::serve_stdio;
