use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::extract::extract_references;

/// Render-ready message content plus its normalized reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedMessage {
    pub html: String,
    pub references: Vec<String>,
}

fn marker_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("marker regex must compile"))
}

fn missing_sentence_space_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"([.!?])([A-Za-z])|([a-z])([A-Z])").expect("spacing regex must compile")
    })
}

/// Insert missing sentence spacing left behind by upstream chunking.
///
/// A space is added after `.`/`!`/`?` followed by a letter, and between
/// a lowercase letter and an uppercase letter. Applied once, before
/// marker scanning, so inserted link markup is never mutated.
pub fn repair_sentence_spacing(text: &str) -> String {
    missing_sentence_space_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            if let (Some(punct), Some(letter)) = (captures.get(1), captures.get(2)) {
                format!("{} {}", punct.as_str(), letter.as_str())
            } else {
                format!("{} {}", &captures[3], &captures[4])
            }
        })
        .into_owned()
}

/// Rewrite `[k]` markers in `text` into anchors targeting `references[k-1]`.
///
/// Out-of-range markers are left byte-identical. Each marker resolves
/// independently in a single pass over the original marker positions.
pub fn link_citations(text: &str, references: &[String]) -> String {
    marker_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            let marker = &captures[0];
            let index = captures[1]
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1));
            match index.and_then(|index| references.get(index)) {
                Some(target) => format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{marker}</a>",
                    escape_html(target)
                ),
                None => marker.to_string(),
            }
        })
        .into_owned()
}

/// Run the full rendering pipeline over raw (possibly partial) response
/// text: reference extraction, spacing repair, HTML escaping, marker
/// linking, and the trailing reference list when non-empty.
///
/// Extraction runs first so the spacing heuristic never touches URLs
/// sitting in a trailing `References:` section.
pub fn render_message(raw_text: &str, supplied: Option<&[String]>) -> LinkedMessage {
    let extraction = extract_references(raw_text, supplied);
    let repaired = repair_sentence_spacing(&extraction.cleaned_text);
    let mut html = link_citations(&escape_html(&repaired), &extraction.references);

    if !extraction.references.is_empty() {
        html.push_str(&render_reference_list(&extraction.references));
    }

    LinkedMessage {
        html,
        references: extraction.references,
    }
}

fn render_reference_list(references: &[String]) -> String {
    let mut list = String::from("\n<ol class=\"references\">");
    for (index, reference) in references.iter().enumerate() {
        let escaped = escape_html(reference);
        list.push_str(&format!(
            "\n<li><a href=\"{escaped}\" target=\"_blank\" rel=\"noopener noreferrer\">[{}]</a> {escaped}</li>",
            index + 1
        ));
    }
    list.push_str("\n</ol>");
    list
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
