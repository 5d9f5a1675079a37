//! Heuristic pre-filter for candidate job posts.

/// Minimum length, in characters, of a candidate post.
pub const MIN_POST_CHARS: usize = 50;

const PROMOTIONAL_PHRASES: &[&str] = &["subscribe to", "join our", "follow us"];

const POINTER_PREFIXES: &[&str] = &["\u{1F446}", "\u{2B06}\u{FE0F}"];

const JOB_KEYWORDS: &[&str] = &[
    "job",
    "hiring",
    "position",
    "vacancy",
    "developer",
    "engineer",
    "salary",
    "remote",
    "experience",
    "apply",
];

/// Cheap check run before any reasoning call.
///
/// Rejects short text, channel promotion and "see above" pointer posts, then
/// requires at least one job keyword.
pub fn is_candidate_post(content: &str) -> bool {
    if content.trim().is_empty() || content.chars().count() < MIN_POST_CHARS {
        return false;
    }

    let lower = content.to_lowercase();
    if PROMOTIONAL_PHRASES.iter().any(|p| lower.contains(p))
        || POINTER_PREFIXES.iter().any(|p| lower.starts_with(p))
    {
        return false;
    }

    JOB_KEYWORDS.iter().any(|k| lower.contains(k))
}
