// src/image.rs
//
// External-storage reference handling. The sheet collects image links in
// whatever shape the reporter pasted: share links, open?id= links, direct
// download links, sometimes a bare file id. We extract the id and rebuild
// a stable direct-view reference; when nothing matches, the original
// string passes through untouched.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Path-style share link: `/d/<id>/` or `/f/<id>/` segments.
static PATH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[df]+/([a-zA-Z0-9_-]+)").unwrap());
/// Query-style link: `?id=<id>` or `&id=<id>`.
static QUERY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").unwrap());
static NON_ID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").unwrap());

/// Hosts whose URLs are already direct-content references and can be
/// used as-is when no id is recoverable.
const DIRECT_CONTENT_HOST: &str = "drive.usercontent.google.com";

/// Resolved reference: the best usable reference string plus the file id
/// when one could be recovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub image_src: String,
    pub file_id: Option<String>,
}

/// Pull a file id out of a reference string, if any of the known shapes
/// match. Path-style wins over query-style when both are present; this
/// precedence is load-bearing for existing sheet data, do not reorder.
pub fn extract_file_id(reference: &str) -> Option<String> {
    if reference.is_empty() {
        return None;
    }

    let file_id = if let Some(c) = PATH_ID.captures(reference) {
        Some(c[1].to_string())
    } else if let Some(c) = QUERY_ID.captures(reference) {
        Some(c[1].to_string())
    } else if reference.len() > 20
        && reference.len() < 50
        && !reference.contains("http")
        && !reference.contains("://")
    {
        // Looks like a bare id pasted without a URL around it.
        Some(reference.trim().to_string())
    } else {
        None
    };

    file_id
        .map(|id| NON_ID_CHARS.replace_all(&id, "").to_string())
        .filter(|id| !id.is_empty())
}

/// Normalize a raw image reference into `{image_src, file_id}`.
///
/// When the cell holds several comma-separated links only the first is
/// used. Soft failure by design: an unrecognized reference is returned
/// unchanged with `file_id: None`, never an error.
pub fn process_reference(reference: &str) -> ResolvedImage {
    let reference = reference.trim();
    if reference.is_empty() {
        return ResolvedImage {
            image_src: String::new(),
            file_id: None,
        };
    }

    let first = reference
        .split(',')
        .next()
        .unwrap_or(reference)
        .trim()
        .to_string();

    if let Some(file_id) = extract_file_id(&first) {
        let image_src = format!("https://drive.google.com/uc?export=view&id={}", file_id);
        debug!(%file_id, %image_src, "rebuilt direct-view reference");
        return ResolvedImage {
            image_src,
            file_id: Some(file_id),
        };
    }

    if first.contains(DIRECT_CONTENT_HOST) {
        debug!(reference = %first, "already a direct-content reference");
        return ResolvedImage {
            image_src: first,
            file_id: None,
        };
    }

    warn!(reference = %first, "could not extract file id, passing through");
    ResolvedImage {
        image_src: first,
        file_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_style_share_link() {
        assert_eq!(
            extract_file_id("https://drive.example.com/file/d/ABC123/view"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn query_style_open_link() {
        assert_eq!(
            extract_file_id("https://drive.google.com/open?id=XYZ_9-8"),
            Some("XYZ_9-8".to_string())
        );
    }

    #[test]
    fn path_style_wins_over_query_style() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/PATHID/view?id=QUERYID"),
            Some("PATHID".to_string())
        );
    }

    #[test]
    fn bare_token_between_20_and_50_chars() {
        let token = "a".repeat(30);
        assert_eq!(extract_file_id(&token), Some(token.clone()));
        // Too short, too long, or carrying a scheme: not an id.
        assert_eq!(extract_file_id(&"a".repeat(20)), None);
        assert_eq!(extract_file_id(&"a".repeat(50)), None);
        assert_eq!(extract_file_id(&format!("http{}", "a".repeat(26))), None);
    }

    #[test]
    fn id_is_sanitized_to_safe_charset() {
        assert_eq!(
            extract_file_id("https://drive.google.com/open?id=AB-12_cd"),
            Some("AB-12_cd".to_string())
        );
        let messy = format!("{}??", "x".repeat(25));
        assert_eq!(extract_file_id(&messy), Some("x".repeat(25)));
    }

    #[test]
    fn unrecognized_reference_passes_through() {
        let out = process_reference("not a valid ref??");
        assert_eq!(out.image_src, "not a valid ref??");
        assert_eq!(out.file_id, None);
    }

    #[test]
    fn rebuilds_canonical_direct_view_form() {
        let out = process_reference("https://drive.google.com/file/d/ABC123/view");
        assert_eq!(
            out.image_src,
            "https://drive.google.com/uc?export=view&id=ABC123"
        );
        assert_eq!(out.file_id.as_deref(), Some("ABC123"));
    }

    #[test]
    fn first_comma_separated_segment_only() {
        let out = process_reference(
            "https://drive.google.com/open?id=FIRST, https://drive.google.com/open?id=SECOND",
        );
        assert_eq!(out.file_id.as_deref(), Some("FIRST"));
    }

    #[test]
    fn direct_content_host_passes_through_unchanged() {
        let url = "https://drive.usercontent.google.com/download?export=download";
        let out = process_reference(url);
        assert_eq!(out.image_src, url);
        assert_eq!(out.file_id, None);
    }

    #[test]
    fn empty_reference_is_empty_result() {
        let out = process_reference("");
        assert_eq!(out.image_src, "");
        assert_eq!(out.file_id, None);
    }
}
