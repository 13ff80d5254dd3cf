//! Canonicalization of Drive-style share URLs into direct download URLs.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Url;

use super::types::LinkSet;

const DRIVE_HOSTS: [&str; 2] = ["drive.google.com", "docs.google.com"];

// Tried in order; the first match wins.
static ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"[?&]id=([\w-]+)", r"/d/([\w-]+)", r"file/d/([\w-]+)"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Whether the URL is hosted on a Drive domain.
pub fn is_drive_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed
            .host_str()
            .is_some_and(|host| DRIVE_HOSTS.contains(&host))
}

/// Rewrites Drive share URLs to `https://drive.google.com/uc?export=download&id=<ID>`.
///
/// URLs on other hosts, or Drive URLs without a recognizable file id, are
/// returned unchanged. Applying this twice gives the same result as once.
pub fn canonicalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if !is_drive_url(trimmed) {
        return trimmed.to_string();
    }

    ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(trimmed).and_then(|c| c.get(1)))
        .map(|id| format!("https://drive.google.com/uc?export=download&id={}", id.as_str()))
        .unwrap_or_else(|| trimmed.to_string())
}

/// Canonicalizes every URL in a link set.
pub fn canonicalize_links(links: LinkSet) -> LinkSet {
    links
        .into_iter()
        .map(|(kind, url)| {
            let url = canonicalize_url(&url);
            (kind, url)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "https://drive.google.com/uc?export=download&id=AbC-12_x";

    #[test]
    fn test_file_d_form() {
        assert_eq!(
            canonicalize_url("https://drive.google.com/file/d/AbC-12_x/view?usp=sharing"),
            CANONICAL
        );
    }

    #[test]
    fn test_open_id_form() {
        assert_eq!(
            canonicalize_url("https://drive.google.com/open?id=AbC-12_x"),
            CANONICAL
        );
    }

    #[test]
    fn test_docs_host() {
        assert_eq!(
            canonicalize_url("https://docs.google.com/uc?id=AbC-12_x&export=download"),
            CANONICAL
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://drive.google.com/file/d/AbC-12_x/view",
            "https://drive.google.com/open?id=AbC-12_x",
            "https://cdn.example.com/video.mp4",
            "https://drive.google.com/drive/folders",
        ];
        for input in inputs {
            let once = canonicalize_url(input);
            assert_eq!(canonicalize_url(&once), once, "input {input}");
        }
    }

    #[test]
    fn test_non_drive_unchanged() {
        let url = "https://cdn.example.com/watch?id=123";
        assert_eq!(canonicalize_url(url), url);
        assert!(!is_drive_url(url));
    }

    #[test]
    fn test_scheme_and_host_case_insensitive() {
        assert!(is_drive_url("HTTPS://Drive.Google.com/file/d/ABC123/view"));
        assert_eq!(
            canonicalize_url("HTTPS://drive.google.com/file/d/ABC123/view"),
            "https://drive.google.com/uc?export=download&id=ABC123"
        );
    }

    #[test]
    fn test_unparseable_kept_verbatim() {
        let urls = [
            "drive.google.com/file/d/ABC/view",
            "not a url",
            "ftp://drive.google.com/d/ABC",
        ];
        for url in urls {
            assert!(!is_drive_url(url));
            assert_eq!(canonicalize_url(url), url);
        }
    }

    #[test]
    fn test_drive_without_id_unchanged() {
        let url = "https://drive.google.com/drive/my-drive";
        assert_eq!(canonicalize_url(url), url);
    }

    #[test]
    fn test_canonicalize_links() {
        let mut links = LinkSet::new();
        links.insert("720p".into(), "https://drive.google.com/file/d/XYZ/view".into());
        links.insert("360p".into(), "https://mirror.example.org/e1.mp4".into());

        let out = canonicalize_links(links);
        assert_eq!(out["720p"], "https://drive.google.com/uc?export=download&id=XYZ");
        assert_eq!(out["360p"], "https://mirror.example.org/e1.mp4");
    }
}
