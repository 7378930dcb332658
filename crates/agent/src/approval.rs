//! Human-in-the-loop review of tool calls.
//!
//! When an agent runs with `human_in_loop`, every tool call is first put
//! to an [`ApprovalGate`]. [`HumanInLoop`] parks the call as a pending
//! review until someone answers it through [`HumanInLoop::submit_review`]
//! or the timeout approves it.

use aifoundation_config::HumanInLoopConfig;
use aifoundation_core::event::{DomainEvent, EventBus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// A tool call awaiting a decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolReviewRequest {
    pub agent: String,
    pub task: String,
    pub tool: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalDecision {
    Approve,
    /// The reason is fed back to the model as the observation.
    Reject { reason: String },
    /// Run the tool with these arguments instead.
    Modify { arguments: Map<String, Value> },
}

#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn review(&self, request: ToolReviewRequest) -> ApprovalDecision;
}

/// Approves everything. For non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn review(&self, _request: ToolReviewRequest) -> ApprovalDecision {
        ApprovalDecision::Approve
    }
}

/// A pending review as shown to a reviewer.
#[derive(Debug, Clone, Serialize)]
pub struct PendingReview {
    pub review_id: String,
    pub request: ToolReviewRequest,
    pub created_at: DateTime<Utc>,
}

struct Waiting {
    review: PendingReview,
    reply: oneshot::Sender<ApprovalDecision>,
}

pub struct HumanInLoop {
    pending: Mutex<HashMap<String, Waiting>>,
    timeout: Duration,
    enabled: AtomicBool,
    event_bus: Option<Arc<EventBus>>,
}

impl HumanInLoop {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            timeout,
            enabled: AtomicBool::new(true),
            event_bus: None,
        }
    }

    pub fn from_config(config: &HumanInLoopConfig) -> Self {
        let gate = Self::new(Duration::from_secs(config.timeout_secs));
        gate.enabled.store(config.enabled, Ordering::Relaxed);
        gate
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// While disabled, every review is approved immediately.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn pending_reviews(&self) -> Vec<PendingReview> {
        let mut reviews: Vec<_> = self
            .lock()
            .values()
            .map(|w| w.review.clone())
            .collect();
        reviews.sort_by_key(|r| r.created_at);
        reviews
    }

    /// Answer a pending review. Returns `false` for unknown or expired ids.
    pub fn submit_review(&self, review_id: &str, decision: ApprovalDecision) -> bool {
        let Some(waiting) = self.lock().remove(review_id) else {
            return false;
        };
        info!(review_id, ?decision, "Review answered");
        waiting.reply.send(decision).is_ok()
    }

    pub fn approve(&self, review_id: &str) -> bool {
        self.submit_review(review_id, ApprovalDecision::Approve)
    }

    pub fn reject(&self, review_id: &str, reason: impl Into<String>) -> bool {
        self.submit_review(
            review_id,
            ApprovalDecision::Reject {
                reason: reason.into(),
            },
        )
    }

    pub fn modify(&self, review_id: &str, arguments: Map<String, Value>) -> bool {
        self.submit_review(review_id, ApprovalDecision::Modify { arguments })
    }

    /// Drop a pending review; the waiting call sees a rejection.
    pub fn cancel_review(&self, review_id: &str) -> bool {
        self.lock().remove(review_id).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Waiting>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ApprovalGate for HumanInLoop {
    async fn review(&self, request: ToolReviewRequest) -> ApprovalDecision {
        if !self.is_enabled() {
            return ApprovalDecision::Approve;
        }

        let review_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let (reply, decision) = oneshot::channel();
        let tool = request.tool.clone();
        self.lock().insert(
            review_id.clone(),
            Waiting {
                review: PendingReview {
                    review_id: review_id.clone(),
                    request,
                    created_at: Utc::now(),
                },
                reply,
            },
        );

        info!(review_id = %review_id, tool = %tool, "Waiting for human review");
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ReviewRequested {
                review_id: review_id.clone(),
                tool_name: tool,
                timestamp: Utc::now(),
            });
        }

        match tokio::time::timeout(self.timeout, decision).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(_)) => ApprovalDecision::Reject {
                reason: "Review cancelled".into(),
            },
            Err(_) => {
                self.lock().remove(&review_id);
                warn!(review_id = %review_id, "Review timed out, auto-approving");
                ApprovalDecision::Approve
            }
        }
    }
}
