//! Completion session domain.
//!
//! - [`entities::Message`]: a single chat message sent to a completion service
//! - [`entities::Conversation`]: the growing message list of one agent turn

pub mod entities;
