//! Bot configuration, read from GitHub Actions inputs.
//!
//! Inputs arrive as `INPUT_<NAME>` environment variables, the convention the
//! Actions runner uses for `with:` blocks. Parsing is factored through a
//! lookup function so tests never touch process environment.

/// Configuration recognized by the orchestrator.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether everyone is allowed to cherry-pick, bypassing membership and
    /// collaborator checks.
    pub allow_all: bool,
    /// Whether to open a tracking issue (rather than only a comment) when a
    /// pick conflicts.
    pub create_issue_on_conflict: bool,
    /// Label prefix that triggers a pick: `<label_prefix><branch>`.
    pub label_prefix: String,
    /// Label prefix recording a completed pick: `<picked_label_prefix><branch>`.
    pub picked_label_prefix: String,
    /// Labels never copied from the source PR onto the new PR.
    pub exclude_labels: Vec<String>,
    /// Whether to mine issue references from the squashed commit message and
    /// carry them into the new PR body.
    pub copy_issue_numbers_from_squashed_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_all: false,
            create_issue_on_conflict: false,
            label_prefix: "needs-cherry-pick/".to_string(),
            picked_label_prefix: "cherry-picked/".to_string(),
            exclude_labels: Vec::new(),
            copy_issue_numbers_from_squashed_commit: false,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary input source.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            allow_all: bool_input(&get, "allow-all").unwrap_or(defaults.allow_all),
            create_issue_on_conflict: bool_input(&get, "create-issue-on-conflict")
                .unwrap_or(defaults.create_issue_on_conflict),
            label_prefix: input(&get, "label-prefix").unwrap_or(defaults.label_prefix),
            picked_label_prefix: input(&get, "picked-label-prefix")
                .unwrap_or(defaults.picked_label_prefix),
            exclude_labels: multiline_input(&get, "exclude-labels"),
            copy_issue_numbers_from_squashed_commit: bool_input(
                &get,
                "copy-issue-numbers-from-squashed-commit",
            )
            .unwrap_or(defaults.copy_issue_numbers_from_squashed_commit),
        }
    }
}

/// Reads a single input. Empty values are treated as absent, matching the
/// Actions runner (unset inputs are exported as empty strings).
fn input(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    let env_name = format!("INPUT_{}", name.to_uppercase().replace(' ', "_"));
    get(&env_name).filter(|v| !v.trim().is_empty())
}

/// Reads a boolean input. Accepts the YAML 1.2 core booleans the Actions
/// toolkit accepts: `true`/`True`/`TRUE` and `false`/`False`/`FALSE`.
fn bool_input(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    match input(get, name)?.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Reads a multiline input: one entry per line, trimmed, empties dropped.
fn multiline_input(get: &impl Fn(&str) -> Option<String>, name: &str) -> Vec<String> {
    input(get, name)
        .map(|v| {
            v.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
