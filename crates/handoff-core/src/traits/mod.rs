// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the pipeline's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod conversation;
pub mod fetcher;
pub mod mail;
pub mod records;
pub mod schedule;
pub mod summarizer;

pub use adapter::PluginAdapter;
pub use conversation::ConversationApi;
pub use fetcher::AttachmentFetcher;
pub use mail::MailTransport;
pub use records::{AttributionLog, RecordStore};
pub use schedule::ScheduleStore;
pub use summarizer::Summarizer;
