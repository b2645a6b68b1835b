//! # research-core
//!
//! Core logic of the deep-research agent: the canonical message protocol,
//! the tool execution harness, and the orchestration state machine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ResearchAgent                            │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────┐   │
//! │  │ Orchestrator│  │    Tool      │  │   LlmProvider      │   │
//! │  │ (AGENT/     │──│   Harness    │──│   (Strategy)       │   │
//! │  │  ACTION FSM)│  │  + Registry  │  │                    │   │
//! │  └─────────────┘  └──────────────┘  └────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, Anthropic,
//! Together, or any other backend without changing agent logic; the
//! orchestration loop only ever sees canonical messages. A run always ends
//! in exactly one `ResearchSummary`, no matter how malformed the model or
//! tool output was along the way.

pub mod agent;
pub mod error;
pub mod message;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod state;
pub mod tool;

pub use agent::ResearchAgent;
pub use error::{AgentError, Result};
pub use message::{Message, Role, ToolCall, FINALIZE_TOOL_NAME};
pub use provider::{LlmProvider, RetryPolicy};
pub use report::{ResearchSummary, SearchResult};
pub use state::{Phase, RunState};
pub use tool::{SearchTool, ToolRegistry, ToolSchema};
