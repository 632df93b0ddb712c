// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the handoff notification pipeline.
//!
//! Defines the error taxonomy, the domain types shared by every stage, and
//! the adapter traits through which the pipeline reaches its external
//! collaborators (conversation API, summarizer, durable store, scheduler,
//! email transport, object store).

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::{ErrorKind, HandoffError};
pub use types::{AdapterType, HealthStatus, ThreadId};

pub use traits::{
    AttachmentFetcher, AttributionLog, ConversationApi, MailTransport, PluginAdapter, RecordStore,
    ScheduleStore, Summarizer,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_conversation<T: ConversationApi>() {}
        fn _assert_summarizer<T: Summarizer>() {}
        fn _assert_record_store<T: RecordStore>() {}
        fn _assert_attribution<T: AttributionLog>() {}
        fn _assert_schedule_store<T: ScheduleStore>() {}
        fn _assert_mail<T: MailTransport>() {}
        fn _assert_fetcher<T: AttachmentFetcher>() {}
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;
        for variant in [
            AdapterType::Conversation,
            AdapterType::Summarizer,
            AdapterType::RecordStore,
            AdapterType::ScheduleStore,
            AdapterType::MailTransport,
            AdapterType::AttachmentFetcher,
        ] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
        assert_eq!(AdapterType::RecordStore.to_string(), "record_store");
    }
}
