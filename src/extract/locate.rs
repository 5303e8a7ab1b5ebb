// src/extract/locate.rs
// =============================================================================
// Finds the part of a page that holds the actual content.
//
// 1. Strip page chrome (scripts, navigation, headers, footers, sidebars).
// 2. Try the content selectors in priority order; the first one that matches
//    anything inside <body> wins.
// 3. Nothing matched? Use <body> itself.
//
// Generic semantic tags come first, then platform-specific containers
// (Wikipedia, Medium, WordPress, Dev.to), then loose "*content*" patterns.
// =============================================================================

use crate::error::ParseError;
use crate::model::NO_TITLE;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// One candidate for the main content container. Lower priority wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSelector {
    pub css: &'static str,
    pub priority: u8,
}

const fn candidate(css: &'static str, priority: u8) -> ContentSelector {
    ContentSelector { css, priority }
}

pub const CONTENT_SELECTORS: &[ContentSelector] = &[
    candidate("article", 0),
    candidate("main", 1),
    // Wikipedia
    candidate("div#mw-content-text", 10),
    // Medium
    candidate(r#"div[data-testid="post-content"]"#, 11),
    candidate(r#"div[data-testid="story-content"]"#, 12),
    candidate(r#"section[data-testid="post-content"]"#, 13),
    // WordPress and common blog themes
    candidate("div.entry-content", 20),
    candidate("div.post-content", 21),
    candidate("div.article-content", 22),
    candidate("div.article-body", 23),
    // Dev.to
    candidate("div.crayons-article__body", 24),
    candidate(r#"div[class*="post-content"]"#, 30),
    candidate(r#"div[class*="story-content"]"#, 31),
    candidate("div.blog-post", 32),
    candidate("div.post", 33),
    candidate("div.article", 34),
    candidate("div.content", 35),
    // last resort before falling back to <body>
    candidate(r#"div[class*="content"]"#, 50),
    candidate(r#"div[id*="content"]"#, 51),
];

// Page chrome removed before we look for content
const NOISE: &str = "script, style, noscript, template, iframe, nav, header, footer, aside, sidebar, \
     [role=navigation], [role=banner], [role=contentinfo], \
     .sidebar, #sidebar, .navbar, .breadcrumb, .breadcrumbs";

static NOISE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(NOISE).expect("valid noise selector"));

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("valid body selector"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid title selector"));

static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid h1 selector"));

// Compiled once, sorted by priority
static COMPILED_SELECTORS: Lazy<Vec<(Selector, ContentSelector)>> = Lazy::new(|| {
    let mut candidates = CONTENT_SELECTORS.to_vec();
    candidates.sort_by_key(|c| c.priority);
    candidates
        .into_iter()
        .map(|c| {
            let selector = Selector::parse(c.css).expect("valid content selector");
            (selector, c)
        })
        .collect()
});

/// Where the content came from
#[derive(Debug, Clone, Copy)]
pub enum Located<'a> {
    /// A content selector matched
    Container {
        element: ElementRef<'a>,
        selector: &'static str,
    },
    /// Nothing matched; the whole body is used
    Body(ElementRef<'a>),
}

impl<'a> Located<'a> {
    pub fn element(&self) -> ElementRef<'a> {
        match self {
            Located::Container { element, .. } => *element,
            Located::Body(element) => *element,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Located::Body(_))
    }
}

// Detaches every noise element (and its subtree) from the document
//
// <html>, <head> and <body> are never removed even if a site puts a
// "sidebar" class on them.
pub fn remove_noise(document: &mut Html) {
    let noise: Vec<_> = document
        .select(&NOISE_SELECTOR)
        .filter(|element| !matches!(element.value().name(), "html" | "head" | "body"))
        .map(|element| element.id())
        .collect();

    for id in noise {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

// The first content selector (by priority) with a match under `root`
pub fn first_match(root: ElementRef<'_>) -> Option<(ElementRef<'_>, &'static str)> {
    COMPILED_SELECTORS.iter().find_map(|(selector, candidate)| {
        root.select(selector)
            .next()
            .map(|element| (element, candidate.css))
    })
}

// Picks the content container, falling back to <body>
pub fn locate_content(document: &Html) -> Result<Located<'_>, ParseError> {
    let body = document
        .select(&BODY_SELECTOR)
        .next()
        .ok_or(ParseError::MissingBody)?;

    Ok(match first_match(body) {
        Some((element, selector)) => Located::Container { element, selector },
        None => Located::Body(body),
    })
}

// Page title: <title>, else the first <h1>, else "No Title"
pub fn page_title(document: &Html) -> String {
    [&*TITLE_SELECTOR, &*H1_SELECTOR]
        .into_iter()
        .filter_map(|selector| document.select(selector).next())
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|title| !title.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located_tag(html: &str) -> (String, bool) {
        let mut document = Html::parse_document(html);
        remove_noise(&mut document);
        let located = locate_content(&document).unwrap();
        (located.element().value().name().to_string(), located.is_fallback())
    }

    #[test]
    fn test_selectors_are_in_priority_order() {
        let priorities: Vec<u8> = CONTENT_SELECTORS.iter().map(|c| c.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);

        // every selector must compile
        assert_eq!(COMPILED_SELECTORS.len(), CONTENT_SELECTORS.len());
    }

    #[test]
    fn test_article_beats_main() {
        let html = r#"<body><main><p>m</p></main><article><p>a</p></article></body>"#;
        assert_eq!(located_tag(html), ("article".to_string(), false));
    }

    #[test]
    fn test_platform_selectors() {
        let document = Html::parse_document(
            r#"<body><div class="content">x</div><div id="mw-content-text"><p>wiki</p></div></body>"#,
        );
        match locate_content(&document).unwrap() {
            Located::Container { selector, element } => {
                assert_eq!(selector, "div#mw-content-text");
                assert_eq!(element.value().id(), Some("mw-content-text"));
            }
            Located::Body(_) => panic!("expected a container"),
        }

        let document = Html::parse_document(
            r#"<body><div class="wrapper entry-content"><p>post</p></div></body>"#,
        );
        assert!(matches!(
            locate_content(&document).unwrap(),
            Located::Container { selector: "div.entry-content", .. }
        ));
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = r#"<body><div class="wrapper"><p>one</p></div></body>"#;
        assert_eq!(located_tag(html), ("body".to_string(), true));
    }

    #[test]
    fn test_noise_is_removed_before_locating() {
        // the only <article> lives inside <aside>, so it must not be picked
        let html = r#"<body><aside><article><p>related</p></article></aside><p>real</p></body>"#;
        assert_eq!(located_tag(html), ("body".to_string(), true));

        let mut document = Html::parse_document(
            r#"<html><head><script>x()</script></head><body class="sidebar"><nav><a href="/">Home</a></nav><p>text</p><footer>c</footer></body></html>"#,
        );
        remove_noise(&mut document);
        let html = document.html();
        assert!(!html.contains("Home"));
        assert!(!html.contains("x()"));
        assert!(!html.contains("<footer>"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn test_title_fallbacks() {
        let document = Html::parse_document("<title>  My\n Page </title><h1>Heading</h1>");
        assert_eq!(page_title(&document), "My Page");

        let document = Html::parse_document("<title> </title><body><h1>Heading <em>one</em></h1></body>");
        assert_eq!(page_title(&document), "Heading one");

        let document = Html::parse_document("<body><p>nothing</p></body>");
        assert_eq!(page_title(&document), NO_TITLE);
    }
}
