//! Song-request handling shared by chat messages and slash commands.

pub mod parser;
pub mod router;
pub mod workflow;
