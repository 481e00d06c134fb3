//! Approximate cyclomatic complexity.
//!
//! Complexity = 1 + count of branching constructs: conditionals, loops,
//! switch cases, catch clauses, and short-circuit `&&` / `||`. This is a
//! lexical approximation, not a control-flow analysis - strings and
//! comments containing keywords will inflate the count slightly. The
//! metric feeds coarse buckets (low/medium/high/critical), so that noise
//! is acceptable.

use once_cell::sync::Lazy;
use regex::Regex;

/// Branch-introducing keywords across the supported languages.
/// `else if` / `elif` count once via their `if`/`elif` token.
static BRANCH_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|elif|for|while|case|when|catch|except|rescue)\b")
        .expect("branch keyword pattern is valid")
});

/// Short-circuit logical operators add decision points.
static LOGICAL_OP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&&|\|\|").expect("logical operator pattern is valid"));

/// Compute approximate cyclomatic complexity for a whole file.
pub fn approximate_complexity(content: &str) -> u32 {
    let branches = BRANCH_KEYWORD.find_iter(content).count();
    let logicals = LOGICAL_OP.find_iter(content).count();
    1 + (branches + logicals) as u32
}
