//! Analysis of loaded agent tables.

pub mod columns;

pub use columns::{analyze_agents, AgentAnalysis, ColumnReport};
