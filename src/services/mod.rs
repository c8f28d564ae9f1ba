//! Service layer for the paste monitor.
//!
//! This module contains the I/O-facing pieces and the matching logic:
//! - Keyword matching (`KeywordMatcher`)
//! - Upstream paste listing and download (`PasteSource`)
//! - Notification delivery (`Notifier`)

mod matcher;
mod notifier;
mod source;

pub use matcher::{CompiledPattern, KeywordMatcher};
pub use notifier::{Notifier, WebhookNotifier};
pub use source::{PasteSource, PastebinClient};
