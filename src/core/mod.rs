//! Core types & traits: protocol codec, schema description and the tool contract.

pub mod content;
pub mod error;
pub mod mcp;
pub mod schema;
pub mod tool;
