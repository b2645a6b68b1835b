//! Research Agent Facade
//!
//! Seeds the run state and drives the state machine to a terminal phase.
//! After construction a run is infallible: every failure path degrades into
//! a `ResearchSummary` instead of surfacing an error mid-run.

use std::sync::Arc;

use crate::message::Message;
use crate::prompts::MAIN_SYSTEM_PROMPT;
use crate::provider::LlmProvider;
use crate::report::ResearchSummary;
use crate::state::{self, Phase, RunState};
use crate::tool::{run_tool_batch, ToolRegistry};

/// Default iteration budget per run
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// The research agent: one provider, one static tool registry.
///
/// Runs are stateless with respect to each other; concurrent runs share
/// only these read-only handles.
pub struct ResearchAgent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    max_iterations: u32,
}

impl ResearchAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Override the iteration budget
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Process one research query to completion.
    ///
    /// Always yields exactly one summary, success or degraded; callers
    /// never observe an error mid-run.
    pub async fn run(&self, query: &str) -> ResearchSummary {
        let query = query.trim();
        if query.is_empty() {
            return ResearchSummary::without_sources("Please enter a valid query.");
        }

        tracing::info!(query, "processing research query");
        let mut run = RunState::new(query, MAIN_SYSTEM_PROMPT, self.max_iterations);

        // Hard ceiling on driver steps, strictly greater than twice the
        // iteration budget, so the run halts even if routing misbehaves.
        let step_ceiling = 2 * self.max_iterations as usize + 5;
        let mut phase = Phase::Agent;

        for step in 0..step_ceiling {
            tracing::debug!(step, ?phase, iteration = run.current_iteration, "run step");
            match phase {
                Phase::Agent => {
                    self.reasoning_step(&mut run).await;
                    phase = state::route(&run);
                }
                Phase::Action => {
                    // The whole batch completes before control returns to
                    // the reasoning phase.
                    let last = run
                        .last_assistant()
                        .cloned()
                        .unwrap_or_else(|| Message::assistant(""));
                    let appended = run_tool_batch(&self.tools, &last).await;
                    run.messages.extend(appended);
                    phase = Phase::Agent;
                }
                Phase::Finalize => {
                    run.set_final_answer(state::finalize(&run));
                    break;
                }
                Phase::ForceFinishIterations => {
                    run.set_final_answer(state::force_finish_iterations(&run));
                    break;
                }
                Phase::ForceFinishNoTool => {
                    run.set_final_answer(state::force_finish_no_tool(&run));
                    break;
                }
            }
        }

        run.final_answer.take().unwrap_or_else(|| {
            tracing::error!(step_ceiling, "step ceiling exhausted without a terminal phase");
            state::force_finish_iterations(&run)
        })
    }

    /// One reasoning step: invoke the provider and append its message.
    ///
    /// A final (post-retry) invocation error is degraded into a synthetic
    /// assistant message describing the failure, with no tool calls, so the
    /// router can still drive the run to a terminal phase.
    async fn reasoning_step(&self, run: &mut RunState) {
        let tools = self.tools.advertised_schemas();
        let message = match self.provider.complete(&run.messages, &tools).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(provider = self.provider.name(), error = %e, "reasoning step failed");
                Message::assistant(format!(
                    "An error occurred while processing your request. Provider: {}, \
                     Error: {e}. Please try again or rephrase your query.",
                    self.provider.name()
                ))
            }
        };

        run.messages.push(message);
        run.current_iteration += 1;
    }
}
