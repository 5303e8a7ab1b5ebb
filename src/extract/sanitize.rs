// src/extract/sanitize.rs
// =============================================================================
// Allowlist sanitizer + email highlighter.
//
// Instead of editing the parsed tree and calling .html() on it, we walk the
// subtree and write out only what is allowed:
//
//   allowed tag      -> written, with only its allowed attributes
//   other tag        -> "unwrapped": tag dropped, children still written
//   script/style/... -> dropped together with everything inside
//   comment          -> dropped
//   text             -> escaped, emails wrapped in a highlight <span>
//
// Highlighting happens on text nodes only, so an address that survives in an
// attribute (e.g. href="mailto:me@x.com") is never rewritten.
// =============================================================================

use html_escape::{encode_double_quoted_attribute, encode_text};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};

/// Tags that may appear in sanitized output
pub const ALLOWED_TAGS: &[&str] = &[
    "a", "img", "h1", "h2", "h3", "h4", "h5", "h6", "p", "strong", "em", "u", "code", "ul", "ol",
    "li", "blockquote",
];

// Dropped with their contents; unwrapping these would leak code as text.
// <object>/<embed> are not listed: their fallback text is unwrapped like any
// other disallowed tag.
const DROPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe"];

/// Opening tag of the email highlight marker
pub const HIGHLIGHT_OPEN: &str = r#"<span class="email-highlight">"#;
pub const HIGHLIGHT_CLOSE: &str = "</span>";

/// Loose, case-insensitive email pattern
pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").expect("valid email regex")
});

/// Attributes kept for a given (allowed) tag
pub fn allowed_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href"],
        "img" => &["src", "alt"],
        _ => &[],
    }
}

/// Sanitized markup of one element plus the emails found in its text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub html: String,
    pub emails: Vec<String>,
    /// Some non-whitespace text made it into `html`
    pub has_text: bool,
}

// Sanitizes an element (the element itself included) into a markup string
pub fn sanitize(element: ElementRef<'_>) -> Sanitized {
    // Everything is appended to one String; no intermediate trees
    let mut out = Sanitized::default();
    write_element(element, &mut out);
    out
}

fn write_element(element: ElementRef<'_>, out: &mut Sanitized) {
    // scraper reports tag names in lowercase
    let name = element.value().name();

    // Drop: the element and everything inside it disappear
    if DROPPED_TAGS.contains(&name) {
        return;
    }

    // Unwrap: the tag disappears, its children are still written
    if !ALLOWED_TAGS.contains(&name) {
        write_children(element, out);
        return;
    }

    // Keep: write the opening tag ourselves
    out.html.push('<');
    out.html.push_str(name);
    // Walk the allowlist rather than the element's attributes so the output
    // order is fixed: href, then src, then alt.
    for &attr in allowed_attributes(name) {
        let Some(value) = element.value().attr(attr) else {
            continue;
        };
        // href="javascript:..." is removed, the element itself stays
        if !is_script_url(attr, value) {
            out.html.push(' ');
            out.html.push_str(attr);
            out.html.push_str("=\"");
            out.html.push_str(&encode_double_quoted_attribute(value));
            out.html.push('"');
        }
    }
    out.html.push('>');

    // <img> is a void element: no children, no closing tag
    if name == "img" {
        return;
    }

    write_children(element, out);

    out.html.push_str("</");
    out.html.push_str(name);
    out.html.push('>');
}

// Comments, doctypes and processing instructions fall through and vanish
fn write_children(element: ElementRef<'_>, out: &mut Sanitized) {
    // children() yields raw tree nodes; ElementRef::wrap succeeds only for
    // elements, so everything else is checked for text
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            write_element(child, out);
        } else if let Node::Text(text) = child.value() {
            write_text(text, out);
        }
    }
}

fn write_text(text: &str, out: &mut Sanitized) {
    if !text.trim().is_empty() {
        out.has_text = true;
    }

    // `last` is the byte offset just past the previous match
    let mut last = 0;
    for found in EMAIL_PATTERN.find_iter(text) {
        // Plain text before the email, then the email inside the marker.
        // encode_text turns < > & into entities so text can't become markup.
        out.html.push_str(&encode_text(&text[last..found.start()]));
        out.html.push_str(HIGHLIGHT_OPEN);
        out.html.push_str(&encode_text(found.as_str()));
        out.html.push_str(HIGHLIGHT_CLOSE);
        out.emails.push(found.as_str().to_string());
        last = found.end();
    }
    // Whatever follows the last email (or the whole text if there was none)
    out.html.push_str(&encode_text(&text[last..]));
}

// href/src values that would run code when followed
pub(super) fn is_script_url(attr: &str, value: &str) -> bool {
    if attr != "href" && attr != "src" {
        return false;
    }
    // Browsers ignore leading whitespace and case in the scheme
    let value = value.trim_start().to_ascii_lowercase();
    value.starts_with("javascript:") || value.starts_with("vbscript:")
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Unwrap vs drop
//    - Unwrap: <span>hi</span> becomes "hi" (tag gone, text kept)
//    - Drop: <script>x()</script> becomes "" (tag and contents gone)
//    - Unwrapping a <script> would print its code as page text
//
// 2. Why escape text we got from an HTML parser?
//    - The parser already decoded "&lt;" into "<"
//    - Writing it back raw would create a real tag, so encode_text
//      turns it into "&lt;" again
//    - Attribute values get encode_double_quoted_attribute for the same reason
//
// 3. What is Lazy<Regex>?
//    - once_cell's Lazy runs the closure the first time EMAIL_PATTERN is used
//    - The compiled regex is then shared for the rest of the program
//
// 4. Why &mut Sanitized instead of returning Strings?
//    - Every recursive call appends to the same buffer
//    - No temporary Strings are built and concatenated
// -----------------------------------------------------------------------------
