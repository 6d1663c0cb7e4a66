//! Parser for cherry-pick commands in comment text.
//!
//! This module provides a pure parser that extracts target branches from
//! unstructured GitHub comment text and from trigger labels.

/// Result of scanning a comment body for `/cherrypick` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CherryPickCommand {
    /// True iff at least one branch was extracted.
    pub matched: bool,
    /// Target branches in first-seen order, duplicates removed.
    pub branches: Vec<String>,
}

/// Scans every line of `text` for a cherry-pick command.
///
/// # Parsing Rules
///
/// - A line matches iff it starts with `/cherrypick` or `/cherry-pick`
///   (case-sensitive, leading `/` required) followed by at least one
///   whitespace character and a non-empty remainder
/// - The remainder of the line, trimmed, is the branch name - taken verbatim,
///   including embedded punctuation and non-ASCII characters
/// - Duplicate branches across lines are collapsed, first-seen order preserved
/// - `matched` is true iff the resulting branch list is non-empty
///
/// # Examples
///
/// ```
/// use cherrypicker::commands::match_cherry_pick_command;
///
/// let cmd = match_cherry_pick_command("/cherrypick release/v1.2");
/// assert_eq!(cmd.branches, vec!["release/v1.2"]);
///
/// // Missing whitespace separator invalidates the match.
/// assert!(!match_cherry_pick_command("/cherrypickxxx").matched);
/// ```
pub fn match_cherry_pick_command(text: &str) -> CherryPickCommand {
    let mut branches: Vec<String> = Vec::new();

    for line in text.lines() {
        let Some(rest) = strip_command_keyword(line) else {
            continue;
        };
        // At least one whitespace character must separate keyword and branch.
        let Some(rest) = rest.strip_prefix(|c: char| c.is_whitespace()) else {
            continue;
        };
        let branch = rest.trim();
        // A command line with only whitespace after the keyword yields no
        // branch, not an empty-string branch.
        if branch.is_empty() {
            continue;
        }
        if !branches.iter().any(|b| b == branch) {
            branches.push(branch.to_string());
        }
    }

    CherryPickCommand {
        matched: !branches.is_empty(),
        branches,
    }
}

/// Returns true iff any line of `text` is a cherry-pick invite command.
///
/// A line matches iff it starts with `/cherrypick-invite` or
/// `/cherry-pick-invite` at a word boundary: the literal suffix may be
/// followed by end-of-line or any non-word character, so
/// `/cherrypick-invite lbw` matches but `/cherrypick-invitexx` and
/// `/cherrypick-invite_lbw` do not (underscore counts as a word character).
pub fn is_cherry_pick_invite_command(text: &str) -> bool {
    text.lines().any(|line| {
        let Some(rest) = strip_command_keyword(line) else {
            return false;
        };
        let Some(rest) = rest.strip_prefix("-invite") else {
            return false;
        };
        match rest.chars().next() {
            None => true,
            Some(c) => !is_word_char(c),
        }
    })
}

/// Returns the suffix of `label` after the first matching prefix.
///
/// Prefixes are tried in list order; the first prefix that `label` starts
/// with wins. Empty prefixes never match (an empty string is not treated as
/// a universal prefix), and an empty prefix list always yields `None`.
/// The suffix is returned verbatim - labels may legitimately contain
/// whitespace, and the trigger branch must round-trip unchanged.
///
/// # Examples
///
/// ```
/// use cherrypicker::commands::match_label;
///
/// let prefixes = vec!["needs-cherry-pick-".to_string(), "lbw".to_string()];
/// assert_eq!(match_label(&prefixes, "needs-cherry-pick-xxx").as_deref(), Some("xxx"));
/// assert_eq!(match_label(&prefixes, "lbwnb").as_deref(), Some("nb"));
/// assert_eq!(match_label(&[], "anything"), None);
/// ```
pub fn match_label(prefixes: &[String], label: &str) -> Option<String> {
    prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| label.strip_prefix(prefix.as_str()))
        .map(|suffix| suffix.to_string())
}

/// Strips the `/cherrypick` or `/cherry-pick` keyword from the start of a
/// line, returning the remainder.
fn strip_command_keyword(line: &str) -> Option<&str> {
    line.strip_prefix("/cherrypick")
        .or_else(|| line.strip_prefix("/cherry-pick"))
}

/// Word characters in the regex `\b` sense: alphanumerics and underscore.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
