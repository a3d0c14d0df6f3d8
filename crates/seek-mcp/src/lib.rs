//! MCP transport for Seek.
//!
//! Exposes the knowledge services as the `ingest`, `update` and `search`
//! tools over newline-delimited JSON-RPC 2.0. Stdout carries only protocol
//! messages; diagnostics go to stderr.

pub mod config;
pub mod protocol;
pub mod server;
pub mod tools;

pub use config::ServerConfig;
pub use server::McpServer;
