use std::sync::OnceLock;

use regex::Regex;

/// Result of splitting raw response text into display text and references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub cleaned_text: String,
    pub references: Vec<String>,
}

fn trailing_references_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"References:\s*([^\n]*)\z").expect("references regex must compile")
    })
}

fn url_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"https://\S+").expect("url regex must compile"))
}

/// Split `text` into display text and a normalized reference list.
///
/// A trailing `References:` section on the final line wins over the
/// `supplied` out-of-band list; when neither source yields anything the
/// result carries an empty (not absent) list. Order and duplicates are
/// preserved because `[n]` markers index positionally into the list.
pub fn extract_references(text: &str, supplied: Option<&[String]>) -> Extraction {
    if let Some(captures) = trailing_references_regex().captures(text) {
        let section = captures
            .get(1)
            .map(|group| group.as_str())
            .unwrap_or_default();
        let references = section
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(normalize_reference)
            .collect();
        let full = captures
            .get(0)
            .expect("whole-match group is always present");
        let cleaned_text = text[..full.start()].trim_end().to_string();

        return Extraction {
            cleaned_text,
            references,
        };
    }

    let references = supplied
        .unwrap_or_default()
        .iter()
        .map(|raw| normalize_reference(raw))
        .collect();

    Extraction {
        cleaned_text: text.to_string(),
        references,
    }
}

/// Normalize one raw reference to its first `https://` URL when present.
pub fn normalize_reference(raw: &str) -> String {
    match url_regex().find(raw) {
        Some(found) => found.as_str().to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_references, normalize_reference};

    #[test]
    fn trailing_section_is_removed_and_split_into_references() {
        let extraction = extract_references(
            "See [1] and [2]. References: https://a.example/x, https://b.example/y",
            None,
        );

        assert_eq!(extraction.cleaned_text, "See [1] and [2].");
        assert_eq!(
            extraction.references,
            vec![
                "https://a.example/x".to_string(),
                "https://b.example/y".to_string(),
            ]
        );
    }

    #[test]
    fn trailing_section_wins_over_supplied_references() {
        let supplied = vec!["https://stale.example/".to_string()];
        let extraction = extract_references("Text References: https://fresh.example/", Some(&supplied));

        assert_eq!(extraction.references, vec!["https://fresh.example/".to_string()]);
    }

    #[test]
    fn supplied_references_are_normalized_when_no_trailing_section() {
        let supplied = vec![
            "Source A https://a.example/doc trailing".to_string(),
            "plain label".to_string(),
        ];
        let extraction = extract_references("No citations here", Some(&supplied));

        assert_eq!(extraction.cleaned_text, "No citations here");
        assert_eq!(
            extraction.references,
            vec!["https://a.example/doc".to_string(), "plain label".to_string()]
        );
    }

    #[test]
    fn no_source_yields_empty_reference_list() {
        let extraction = extract_references("No citations here", None);

        assert_eq!(extraction.cleaned_text, "No citations here");
        assert!(extraction.references.is_empty());
    }

    #[test]
    fn empty_trailing_section_removes_heading_and_yields_no_references() {
        let extraction = extract_references("Body text. References:", None);

        assert_eq!(extraction.cleaned_text, "Body text.");
        assert!(extraction.references.is_empty());
    }

    #[test]
    fn references_heading_before_final_line_is_left_in_place() {
        let extraction = extract_references("References: early\nactual answer", None);

        assert_eq!(extraction.cleaned_text, "References: early\nactual answer");
        assert!(extraction.references.is_empty());
    }

    #[test]
    fn duplicate_references_are_preserved_in_order() {
        let extraction =
            extract_references("x References: https://a.example/, https://a.example/", None);

        assert_eq!(
            extraction.references,
            vec!["https://a.example/".to_string(), "https://a.example/".to_string()]
        );
    }

    #[test]
    fn extraction_is_idempotent_on_cleaned_text() {
        let first = extract_references("See [1]. References: https://a.example/x", None);
        let second = extract_references(&first.cleaned_text, Some(&first.references));

        assert_eq!(second.cleaned_text, first.cleaned_text);
        assert_eq!(second.references, first.references);
    }

    #[test]
    fn normalize_keeps_raw_label_without_url() {
        assert_eq!(normalize_reference("  RFC 9110  "), "RFC 9110");
        assert_eq!(
            normalize_reference("docs at https://docs.example/a see also"),
            "https://docs.example/a"
        );
    }
}
