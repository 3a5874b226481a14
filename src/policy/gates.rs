//! Policy gate evaluation.
//!
//! # Responsibilities
//! - Decide, per gate, whether a request may be forwarded
//! - Run the gates in their fixed order with first-failure short-circuit
//! - Produce the status code and contact-bearing message for rejections
//!
//! # Gate order
//! file type (415) → hosted repository (403) → registry package (403)
//! → referer (403). Later gates are not evaluated after a failure.

use axum::http::StatusCode;
use url::Url;

use crate::config::{ListMode, ListPair, ProxyConfig};
use crate::policy::identity;

/// A failed policy decision: the response status and a human-readable
/// message including the configured contact address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: String,
}

/// True if the path's file extension is allowed.
///
/// An empty allow-list means no restriction. A final path segment without a
/// `.` (directory-like or extensionless API paths) always passes; otherwise
/// the extension from the final `.` is compared case-insensitively.
pub fn file_type_allowed(path: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let Some(dot) = last_segment.rfind('.') else {
        return true;
    };

    let extension = last_segment[dot..].to_lowercase();
    allowed.iter().any(|e| e.eq_ignore_ascii_case(&extension))
}

/// True if the identity passes the configured list.
///
/// Absent identities and mode `none` always pass. Comparison is
/// case-insensitive exact match against the relevant list.
pub fn identity_allowed(identity: Option<&str>, mode: ListMode, lists: &ListPair) -> bool {
    let Some(identity) = identity else {
        return true;
    };

    match mode {
        ListMode::None => true,
        ListMode::Blacklist => !lists
            .blacklist
            .iter()
            .any(|entry| identity.eq_ignore_ascii_case(entry)),
        ListMode::Whitelist => lists
            .whitelist
            .iter()
            .any(|entry| identity.eq_ignore_ascii_case(entry)),
    }
}

/// True if the referer passes the configured site list.
///
/// Absent or unparseable referers and mode `none` pass (fail-open: an
/// unknown referer is not treated as hostile). Matching is bidirectional
/// substring containment on the lowercase host, so subdomains and partial
/// domain entries both match.
pub fn referer_allowed(referer: Option<&str>, mode: ListMode, lists: &ListPair) -> bool {
    let Some(referer) = referer else {
        return true;
    };
    if mode == ListMode::None {
        return true;
    }

    let host = match Url::parse(referer) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_lowercase(),
            None => return true,
        },
        Err(_) => return true,
    };

    let contains = |entry: &String| {
        let entry = entry.to_lowercase();
        host.contains(&entry) || entry.contains(&host)
    };

    match mode {
        ListMode::None => true,
        ListMode::Blacklist => !lists.blacklist.iter().any(contains),
        ListMode::Whitelist => lists.whitelist.iter().any(contains),
    }
}

/// Run every gate in order against the request path and referer.
///
/// Returns the first failing gate's rejection; later gates are skipped.
pub fn evaluate(path: &str, referer: Option<&str>, config: &ProxyConfig) -> Result<(), Rejection> {
    if !file_type_allowed(path, &config.allowed_extensions) {
        return Err(Rejection {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: format!(
                "File type not allowed, supported types: {}. Contact {}",
                config.allowed_extensions.join(", "),
                config.contact
            ),
        });
    }

    let repo = identity::hosted_repo(path);
    if !identity_allowed(repo.as_deref(), config.list_mode, &config.github_repos) {
        return Err(Rejection {
            status: StatusCode::FORBIDDEN,
            message: format!(
                "Repository {} is not allowed, contact {}",
                repo.unwrap_or_default(),
                config.contact
            ),
        });
    }

    let package = identity::registry_package(path);
    if !identity_allowed(package.as_deref(), config.list_mode, &config.npm_packages) {
        return Err(Rejection {
            status: StatusCode::FORBIDDEN,
            message: format!(
                "npm package {} is not allowed, contact {}",
                package.unwrap_or_default(),
                config.contact
            ),
        });
    }

    if !referer_allowed(referer, config.list_mode, &config.sites) {
        return Err(Rejection {
            status: StatusCode::FORBIDDEN,
            message: format!("Referring site is not allowed, contact {}", config.contact),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(blacklist: &[&str], whitelist: &[&str]) -> ListPair {
        ListPair {
            blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
            whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_allow_list_accepts_any_extension() {
        assert!(file_type_allowed("/npm/lodash/lodash.min.js", &[]));
        assert!(file_type_allowed("/anything.exe", &[]));
    }

    #[test]
    fn extensionless_final_segment_always_passes() {
        let allowed = vec![".js".to_string()];
        assert!(file_type_allowed("/npm/lodash", &allowed));
        assert!(file_type_allowed("/gh/owner/repo/dist/", &allowed));
        // A dot in an earlier segment is not an extension.
        assert!(file_type_allowed("/gh/owner/repo@1.2/dist", &allowed));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let allowed = vec![".js".to_string(), ".css".to_string()];
        assert!(file_type_allowed("/pkg/foo/file.JS", &allowed));
        assert!(file_type_allowed("/pkg/foo/file.css", &allowed));
        assert!(!file_type_allowed("/pkg/foo/file.png", &allowed));
    }

    #[test]
    fn absent_identity_passes_every_mode() {
        let lists = pair(&["evil/repo"], &["good/repo"]);
        assert!(identity_allowed(None, ListMode::None, &lists));
        assert!(identity_allowed(None, ListMode::Blacklist, &lists));
        assert!(identity_allowed(None, ListMode::Whitelist, &lists));
    }

    #[test]
    fn blacklist_rejects_case_insensitively() {
        let lists = pair(&["evil/repo"], &[]);
        assert!(!identity_allowed(Some("EVIL/Repo"), ListMode::Blacklist, &lists));
        assert!(identity_allowed(Some("good/repo"), ListMode::Blacklist, &lists));
    }

    #[test]
    fn empty_whitelist_is_closed() {
        let lists = pair(&[], &[]);
        assert!(!identity_allowed(Some("any/repo"), ListMode::Whitelist, &lists));
        // Empty blacklist is open.
        assert!(identity_allowed(Some("any/repo"), ListMode::Blacklist, &lists));
    }

    #[test]
    fn referer_substring_matches_both_directions() {
        let lists = pair(&[], &["example.com"]);
        // Subdomain host contains the listed entry.
        assert!(referer_allowed(
            Some("https://sub.example.com/page"),
            ListMode::Whitelist,
            &lists
        ));
        // Listed entry contains the bare host.
        let lists = pair(&[], &["cdn.example.com"]);
        assert!(referer_allowed(
            Some("https://example.com/"),
            ListMode::Whitelist,
            &lists
        ));
    }

    #[test]
    fn short_entries_match_superstrings() {
        // Deliberately preserved behavior: "a.com" also matches "ba.com".
        let lists = pair(&["a.com"], &[]);
        assert!(!referer_allowed(
            Some("https://ba.com/page"),
            ListMode::Blacklist,
            &lists
        ));
    }

    #[test]
    fn unparseable_referer_fails_open() {
        let lists = pair(&[], &["example.com"]);
        assert!(referer_allowed(Some("not a url"), ListMode::Whitelist, &lists));
        assert!(referer_allowed(None, ListMode::Whitelist, &lists));
    }

    #[test]
    fn referer_blocked_by_blacklist() {
        let lists = pair(&["badsite.org"], &[]);
        assert!(!referer_allowed(
            Some("https://badsite.org/embed"),
            ListMode::Blacklist,
            &lists
        ));
        assert!(referer_allowed(
            Some("https://goodsite.org/embed"),
            ListMode::Blacklist,
            &lists
        ));
    }

    #[test]
    fn gates_run_in_order_and_short_circuit() {
        let config = ProxyConfig {
            contact: "admin@example.com".into(),
            allowed_extensions: vec![".js".into()],
            list_mode: ListMode::Blacklist,
            github_repos: pair(&["evil/repo"], &[]),
            ..Default::default()
        };

        // File type fails first even though the repo is also blacklisted.
        let rejection = evaluate("/gh/evil/repo/logo.png", None, &config).unwrap_err();
        assert_eq!(rejection.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(rejection.message.contains("admin@example.com"));

        // With an allowed extension the repo gate is reached.
        let rejection = evaluate("/gh/evil/REPO/index.js", None, &config).unwrap_err();
        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert!(rejection.message.contains("evil/REPO"));

        assert!(evaluate("/gh/good/repo/index.js", None, &config).is_ok());
    }

    #[test]
    fn package_whitelist_gates_by_base_token() {
        let config = ProxyConfig {
            contact: "admin@example.com".into(),
            list_mode: ListMode::Whitelist,
            npm_packages: pair(&[], &["lodash"]),
            ..Default::default()
        };

        assert!(evaluate("/npm/lodash@4/index.js", None, &config).is_ok());

        let rejection = evaluate("/npm/leftpad/index.js", None, &config).unwrap_err();
        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert!(rejection.message.contains("leftpad"));
    }

    #[test]
    fn mode_none_passes_everything() {
        let config = ProxyConfig {
            github_repos: pair(&["evil/repo"], &[]),
            sites: pair(&["badsite.org"], &[]),
            ..Default::default()
        };
        assert!(evaluate(
            "/gh/evil/repo/index.js",
            Some("https://badsite.org/"),
            &config
        )
        .is_ok());
    }
}
