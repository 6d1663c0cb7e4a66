//! Mining closing issue references from commit messages.
//!
//! When a PR is squash-merged, GitHub resolves its `Closes #N` references at
//! merge time; the cherry-picked copy would silently lose them. With
//! `copy_issue_numbers_from_squashed_commit` enabled, the squashed commit
//! message is scanned and the references are re-attached to the new PR body.

/// GitHub's closing keywords, lowercase.
const CLOSING_KEYWORDS: &[&str] = &[
    "close", "closes", "closed", "fix", "fixes", "fixed", "resolve", "resolves", "resolved",
];

/// Extracts issue numbers referenced with a closing keyword (`Fixes #12`,
/// `closes: #7`), case-insensitive, deduplicated in first-seen order.
///
/// # Examples
///
/// ```
/// use cherrypicker::picker::issue_refs::closing_issue_refs;
///
/// let message = "Add retry logic\n\nFixes #12, closes #7 and fixes #12 again";
/// assert_eq!(closing_issue_refs(message), vec![12, 7]);
/// ```
pub fn closing_issue_refs(message: &str) -> Vec<u64> {
    let mut refs = Vec::new();
    let mut after_keyword = false;

    for word in message.split_whitespace() {
        if after_keyword {
            if let Some(number) = issue_number(word) {
                if !refs.contains(&number) {
                    refs.push(number);
                }
            }
        }
        let bare = word.trim_end_matches([':', ',', '.']).to_ascii_lowercase();
        after_keyword = CLOSING_KEYWORDS.contains(&bare.as_str());
    }

    refs
}

/// Parses a `#N` token, tolerating trailing punctuation.
fn issue_number(word: &str) -> Option<u64> {
    let digits = word
        .strip_prefix('#')?
        .trim_end_matches([',', '.', ';', ')', ':']);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
