//! Cherry-pick bot - a GitHub bot that replays merged pull requests onto
//! release branches.
//!
//! The bot reacts to two webhook classes: issue comments carrying a
//! `/cherrypick <branch>` command, and `needs-cherry-pick/<branch>` labels
//! applied to a pull request. For each requested target branch it forks the
//! repository under the bot identity, applies the merged PR's patch on a
//! fresh branch, pushes to the fork, and opens a pull request against the
//! target branch - or reports the conflict back on the source PR.

pub mod commands;
pub mod config;
pub mod git;
pub mod github;
pub mod picker;
pub mod types;
pub mod webhooks;
