//! Command parsing for cherry-pick requests.
//!
//! This module provides types and parsing for the commands users issue via
//! GitHub PR comments, and for the trigger labels applied to PRs.
//!
//! # Supported Commands
//!
//! - `/cherrypick <branch>` or `/cherry-pick <branch>` - request a pick to
//!   `<branch>`; one branch per line, multiple lines allowed
//! - `/cherrypick-invite` or `/cherry-pick-invite` - enable comment-triggered
//!   picks on the pull request
//! - Label `<label_prefix><branch>` - request a pick to `<branch>` by labeling
//!
//! # Example
//!
//! ```
//! use cherrypicker::commands::match_cherry_pick_command;
//!
//! let cmd = match_cherry_pick_command("/cherrypick release/v1.2\n/cherrypick release/v1.3");
//! assert!(cmd.matched);
//! assert_eq!(cmd.branches, vec!["release/v1.2", "release/v1.3"]);
//! ```

mod parser;

pub use parser::{
    is_cherry_pick_invite_command, match_cherry_pick_command, match_label, CherryPickCommand,
};
