//! Orchestration State Machine
//!
//! The run state, the enumerated phase type, the pure routing function
//! evaluated after every reasoning step, and the three terminal builders.
//! Termination is structural: the router's first check is the iteration
//! budget, independent of anything the model produced, and the outer driver
//! adds a hard step ceiling on top.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, Role};
use crate::report::{decode_sources, ResearchSummary};

/// State of a single research run.
///
/// Exclusively owned by its run; messages are append-only and the final
/// answer is set at most once (first write wins).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunState {
    /// Original query text
    pub query: String,

    /// Full transcript, append-only
    pub messages: Vec<Message>,

    /// Terminal output, populated exactly once by a terminal phase
    pub final_answer: Option<ResearchSummary>,

    /// Iteration budget (maximum reasoning steps)
    pub max_iterations: u32,

    /// Reasoning steps taken so far
    pub current_iteration: u32,
}

impl RunState {
    /// Seed a fresh run: system instructions, the user query, iteration 0
    pub fn new(query: impl Into<String>, system_prompt: &str, max_iterations: u32) -> Self {
        let query = query.into();
        Self {
            messages: vec![Message::system(system_prompt), Message::user(query.clone())],
            query,
            final_answer: None,
            max_iterations,
            current_iteration: 0,
        }
    }

    /// The message produced by the most recent reasoning step
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Record the terminal output. A second write is ignored.
    pub fn set_final_answer(&mut self, answer: ResearchSummary) {
        if self.final_answer.is_some() {
            tracing::warn!("final answer already set, ignoring second write");
            return;
        }
        self.final_answer = Some(answer);
    }
}

/// Phases of the research loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Invoke the reasoning backend
    Agent,
    /// Execute the requested tool batch
    Action,
    /// Terminal: assemble the answer from the finalize call
    Finalize,
    /// Terminal: iteration budget exhausted
    ForceFinishIterations,
    /// Terminal: the model produced no tool call
    ForceFinishNoTool,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Phase::Finalize | Phase::ForceFinishIterations | Phase::ForceFinishNoTool
        )
    }
}

/// Route to the next phase after a completed reasoning step.
///
/// Strict precedence: budget first (independent of model output), then the
/// finalize call, then any ordinary tool call, else forced finish.
pub fn route(state: &RunState) -> Phase {
    if state.current_iteration >= state.max_iterations {
        tracing::warn!(
            max_iterations = state.max_iterations,
            "iteration budget reached, forcing finish"
        );
        return Phase::ForceFinishIterations;
    }

    let Some(last) = state.last_assistant() else {
        tracing::warn!("router evaluated without an assistant message, forcing finish");
        return Phase::ForceFinishNoTool;
    };

    if last.finalize_call().is_some() {
        tracing::info!("finalize call detected, preparing final answer");
        Phase::Finalize
    } else if last.has_tool_calls() {
        tracing::debug!(count = last.tool_calls.len(), "tool calls detected, continuing to action");
        Phase::Action
    } else {
        tracing::warn!("no tool calls in the assistant message, forcing finish");
        Phase::ForceFinishNoTool
    }
}

/// Assemble the answer from the finalize call's arguments.
///
/// Finalize takes unconditional precedence: ordinary calls co-present in
/// the same batch are discarded unexecuted. Every malformation is absorbed
/// here; this function cannot fail.
pub fn finalize(state: &RunState) -> ResearchSummary {
    let Some(call) = state.last_assistant().and_then(Message::finalize_call) else {
        tracing::error!("finalize phase entered without a finalize call");
        return ResearchSummary::without_sources(
            "Error: Agent attempted to finalize without a proper research_summary call.",
        );
    };

    let summary = match call.arguments.get("summary") {
        Some(Value::String(text)) => text.clone(),
        Some(other) => {
            tracing::warn!(raw = %other, "finalize summary was not a string");
            format!("Error processing final answer: summary argument was not text ({other}).")
        }
        None => "No summary provided by agent.".into(),
    };

    let sources = decode_sources(call.arguments.get("sources"));

    tracing::info!(
        sources = sources.len(),
        preview = %summary.chars().take(100).collect::<String>(),
        "final answer prepared"
    );
    ResearchSummary::new(summary, sources)
}

/// Terminal answer when the iteration budget is exhausted
pub fn force_finish_iterations(state: &RunState) -> ResearchSummary {
    tracing::warn!(
        max_iterations = state.max_iterations,
        "research terminated at the iteration limit"
    );
    ResearchSummary::without_sources(
        "The research process was terminated due to reaching the maximum iteration limit. \
         The web search may not have yielded a conclusive answer within the allowed steps.",
    )
}

/// Terminal answer when the model answered in prose instead of calling a
/// tool. Non-empty content is quoted back verbatim, labeled unverified.
pub fn force_finish_no_tool(state: &RunState) -> ResearchSummary {
    let direct_text = state
        .last_assistant()
        .filter(|m| !m.has_tool_calls() && !m.content.is_empty())
        .map(|m| m.content.clone());

    let summary = match direct_text {
        Some(content) => format!(
            "The agent provided a direct textual response instead of using the \
             research_summary function: '{content}'. No verifiable sources were cited \
             through the structured process."
        ),
        None => "The web search did not give information to answer the initial query, \
                 or the agent workflow concluded unexpectedly."
            .into(),
    };

    ResearchSummary::without_sources(summary)
}
