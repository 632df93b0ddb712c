// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-once lead handoff pipeline.
//!
//! [`DeliveryOrchestrator`] sequences one invocation: idempotency fast path,
//! transcript retrieval, contact and readiness gating, warm-conversation
//! deferral, lease acquisition, message assembly, and delivery.
//! [`RetryRunner`] fires deferred invocations.

pub mod contact;
pub mod gate;
pub mod lease;
pub mod orchestrator;
pub mod outcome;
pub mod retry;
pub mod runner;

pub use contact::ContactExtractor;
pub use lease::{Acquire, LeaseManager, LeaseTimings, RecordState};
pub use orchestrator::{DeliveryOrchestrator, PipelineDeps};
pub use outcome::{HandoffOutcome, OutcomeReason};
pub use retry::{RetryScheduler, Warmth, schedule_name};
pub use runner::RetryRunner;
