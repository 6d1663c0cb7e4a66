//! Webhook event handling for GitHub events.
//!
//! This module provides typed representations of the two webhook classes the
//! bot reacts to, plus a parser from raw payload JSON. Signature verification
//! and transport are the hosting platform's concern; the bot receives an
//! already-delivered payload.

pub mod events;
pub mod parser;

pub use events::{CommentAction, Event, IssueCommentEvent, PrAction, PullRequestEvent};
pub use parser::{parse_webhook, ParseError};
