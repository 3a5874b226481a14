//! URL identity extraction.
//!
//! # Responsibilities
//! - Recognize hosted-repository paths (`/gh/owner/name`, `/github/owner/name`)
//! - Recognize registry-package paths (`/npm/name`)
//! - Return canonical identity strings for gate comparison
//!
//! # Design Decisions
//! - Original case is preserved; gates fold case at comparison time
//! - Plain string matching, no regex, to guarantee O(n) extraction
//! - Total over malformed input: anything unrecognized is `None`

/// Extract a hosted-repository identity (`"owner/name"`) from a request path.
///
/// Matches `/gh/<owner>/<name>` and `/github/<owner>/<name>` where owner and
/// name are each a single nonempty path segment. The name segment is taken
/// verbatim, so versioned references like `owner/repo@1.2.3` keep their
/// version suffix.
pub fn hosted_repo(path: &str) -> Option<String> {
    let rest = path
        .strip_prefix("/gh/")
        .or_else(|| path.strip_prefix("/github/"))?;

    let mut segments = rest.splitn(3, '/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let name = segments.next().filter(|s| !s.is_empty())?;

    Some(format!("{}/{}", owner, name))
}

/// Extract a registry-package identity from a request path.
///
/// Matches `/npm/<name>` where the name is the nonempty run of characters
/// before the first `@` or `/`. Scoped packages (`/npm/@scope/pkg`) start
/// with `@` and therefore yield no identity.
pub fn registry_package(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/npm/")?;

    let end = rest
        .find(|c| c == '@' || c == '/')
        .unwrap_or(rest.len());

    (end > 0).then(|| rest[..end].to_string())
}
