//! Reduce fetched HTML to readable text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Elements dropped together with their content.
const DROPPED_ELEMENTS: [&str; 8] = [
    "head", "script", "style", "nav", "footer", "header", "aside", "noscript",
];

// The regex crate has no backreferences, so each element gets its own pattern.
static DROPPED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DROPPED_ELEMENTS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("static element pattern"))
        .collect()
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static comment pattern"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static tag pattern"));

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("static entity pattern"));

/// Text of an HTML document, one text run per line, blank lines removed.
#[must_use]
pub fn to_text(html: &str) -> String {
    let mut doc = COMMENT.replace_all(html, "").into_owned();
    for element in DROPPED.iter() {
        doc = element.replace_all(&doc, "").into_owned();
    }
    let text = TAG.replace_all(&doc, "\n");
    non_blank_lines(&decode_entities(&text))
}

/// Strip inline markup (e.g. `<strong>` highlights) from a short snippet.
#[must_use]
pub fn strip_tags(snippet: &str) -> String {
    decode_entities(&TAG.replace_all(snippet, ""))
}

/// Trimmed lines, empty ones dropped.
#[must_use]
pub fn non_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode named entities common in page text and all numeric ones; unknown names are kept.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        _ => return None,
    })
}
