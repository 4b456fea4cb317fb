//! Longest-match-first resolution of a token sequence to a command name.

/// Joins the words of a multi-word command name (`exit force` → `exit_force`).
pub const SEPARATOR: &str = "_";

/// Every prefix concatenation of `tokens`, shortest first:
/// `["exit", "force", "now"]` → `exit`, `exit_force`, `exit_force_now`.
pub fn candidate_names<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut candidates = Vec::with_capacity(tokens.len());
    let mut name = String::new();
    for token in tokens {
        if !name.is_empty() {
            name.push_str(SEPARATOR);
        }
        name.push_str(token.as_ref());
        candidates.push(name.clone());
    }
    candidates
}

/// Find the most specific registered candidate. Returns the matched name and
/// how many tokens it consumed; the rest are the command's arguments.
pub fn longest_match<S: AsRef<str>>(
    tokens: &[S],
    is_registered: impl Fn(&str) -> bool,
) -> Option<(String, usize)> {
    candidate_names(tokens)
        .into_iter()
        .enumerate()
        .rev()
        .find(|(_, name)| is_registered(name))
        .map(|(i, name)| (name, i + 1))
}
