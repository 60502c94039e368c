//! Action executor: fires the planned service calls against the backend.
//!
//! Calls are issued one at a time in plan order. A failed call is logged
//! and recorded but never stops the remaining calls, and never changes the
//! reply text returned to the user.

use std::time::Instant;

use hv_backend::AutomationBackend;
use hv_protocol::{ActionPlan, ServiceCall};

use crate::error::ExecutionOperationError;
use crate::planner::plan_calls;

/// What happened while executing one plan.
#[derive(Debug)]
pub struct ExecutionReport {
    /// The plan's reply text, returned unconditionally.
    pub reply: String,
    /// Every call attempted, in issue order.
    pub issued: Vec<ServiceCall>,
    pub failures: Vec<ExecutionOperationError>,
}

/// Executes action plans against an automation backend.
pub struct ActionExecutor<'a> {
    backend: &'a dyn AutomationBackend,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(backend: &'a dyn AutomationBackend) -> Self {
        Self { backend }
    }

    /// Execute the plan and return its reply text.
    pub async fn execute(&self, plan: &ActionPlan) -> String {
        self.run(plan).await.reply
    }

    /// Execute the plan and report every call attempted.
    pub async fn run(&self, plan: &ActionPlan) -> ExecutionReport {
        let mut issued = Vec::new();
        let mut failures = Vec::new();

        for command in plan.commands() {
            let calls = plan_calls(command);
            if calls.is_empty() {
                tracing::debug!(
                    category = %command.category(),
                    entity_id = %command.target().entity_id,
                    "no state change needed"
                );
                continue;
            }

            for call in calls {
                let start = Instant::now();
                match self.backend.call_service(&call).await {
                    Ok(()) => tracing::info!(
                        service = %call.path(),
                        entity_id = %call.entity_id(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "service call sent"
                    ),
                    Err(source) => {
                        let err = ExecutionOperationError {
                            call: call.clone(),
                            source,
                        };
                        tracing::warn!(error = %err, "service call failed, continuing");
                        failures.push(err);
                    }
                }
                issued.push(call);
            }
        }

        ExecutionReport {
            reply: plan.response.clone(),
            issued,
            failures,
        }
    }
}
