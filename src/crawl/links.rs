// src/crawl/links.rs
// =============================================================================
// URL handling for the crawler.
//
// - normalize_url: resolve + drop the #fragment so equal pages compare equal
// - DomainScope: decides which URLs belong to the site we are crawling
// - discover_links: pulls in-scope links out of a fetched page
//
// "https://a.com/x#top" and "https://a.com/x#bottom" are the same page, so
// both normalize to "https://a.com/x". We do NOT strip trailing slashes:
// "/docs" and "/docs/" can be different resources.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

// Removes the fragment from an already-absolute URL
pub fn normalize_url(mut url: Url) -> Url {
    // set_fragment(None) removes "#..." entirely (not just its contents)
    url.set_fragment(None);
    url
}

// Resolves a (possibly relative) href against the page URL and normalizes it
//
// Returns None for hrefs that never point at another page:
//   "" / "#section" / "mailto:..." / "tel:..." / "javascript:..."
//
// Examples (base = "https://example.com/blog/post"):
//   "/about"        -> "https://example.com/about"
//   "next#comments" -> "https://example.com/blog/next"
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    // Attribute values often carry stray whitespace from templates
    let href = href.trim();

    // Empty hrefs and same-page anchors don't lead anywhere new
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    // Schemes are case-insensitive ("JavaScript:" is still javascript)
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("mailto:") || lower.starts_with("tel:") || lower.starts_with("javascript:") {
        return None;
    }

    // Url::join handles every relative form for us:
    //   "b", "./b", "../b", "/b", "//host/b" and absolute URLs
    // .ok() turns a join error (malformed href) into None
    base.join(href).ok().map(normalize_url)
}

/// The part of the web a crawl is allowed to visit.
///
/// The domain root is the last two labels of the seed host, so a crawl of
/// `blog.example.com` also covers `example.com` and `docs.example.com`.
/// This is a heuristic: for `shop.example.co.uk` the root becomes `co.uk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    root: String,
}

impl DomainScope {
    pub fn for_seed(seed: &Url) -> Self {
        Self::from_host(seed.host_str().unwrap_or_default())
    }

    pub fn from_host(host: &str) -> Self {
        // "blog.example.com" -> ["blog", "example", "com"]
        let labels: Vec<&str> = host.split('.').collect();
        let root = if labels.len() > 2 {
            labels[labels.len() - 2..].join(".")
        } else {
            host.to_string()
        };
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    // http(s) only, and the host must end with the domain root
    //
    // This is a plain suffix test with no label boundary, so for the root
    // "example.com" the host "notexample.com" is in scope as well.
    pub fn contains(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| host.ends_with(&self.root))
    }
}

// Collects every in-scope link on a page
//
// Links come back normalized, de-duplicated, in the order they first appear
// in the document, which keeps breadth-first order deterministic.
pub fn discover_links(document: &Html, page_url: &Url, scope: &DomainScope) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    // a[href] only matches anchors that have an href attribute
    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        // Skip mailto:, #anchors and anything that won't parse
        let Some(url) = resolve_link(page_url, href) else {
            continue;
        };

        // HashSet::insert returns false when the value was already there
        if scope.contains(&url) && seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Url instead of String?
//    - Url is parsed once and validated; a String could hold anything
//    - url.host_str(), url.scheme() etc. are cheap accessors, no re-parsing
//    - Url::join() implements the browser's rules for relative links
//
// 2. What does `mut url: Url` in a parameter mean?
//    - The function takes ownership of the Url and may change it
//    - The caller's value is moved in, so nothing is copied
//
// 3. What is `let ... else`?
//    - `let Some(x) = expr else { continue; };` unpacks an Option
//    - If it is None, the else block runs (it must leave the loop/function)
//
// 4. Why a HashSet AND a Vec in discover_links?
//    - HashSet answers "seen before?" quickly
//    - Vec keeps the order links appear on the page
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_normalize_strips_fragment() {
        assert_eq!(normalize_url(url("https://a.com/x#frag")).as_str(), "https://a.com/x");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_url(url("https://a.com/docs/?q=1#top"));
        let twice = normalize_url(once.clone());
        assert_eq!(once, twice);
        assert_eq!(twice.as_str(), "https://a.com/docs/?q=1");
    }

    #[test]
    fn test_normalize_keeps_trailing_slash() {
        assert_eq!(normalize_url(url("https://a.com/docs/")).as_str(), "https://a.com/docs/");
        assert_eq!(normalize_url(url("https://a.com/docs")).as_str(), "https://a.com/docs");
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = url("https://example.com/blog/post");
        assert_eq!(resolve_link(&base, "/about").unwrap().as_str(), "https://example.com/about");
        assert_eq!(
            resolve_link(&base, " next#comments ").unwrap().as_str(),
            "https://example.com/blog/next"
        );
    }

    #[test]
    fn test_skip_non_page_links() {
        let base = url("https://example.com/page");
        for href in ["", "#section", "mailto:test@example.com", "JavaScript:void(0)", "tel:123"] {
            assert_eq!(resolve_link(&base, href), None, "{:?}", href);
        }
    }

    #[test]
    fn test_domain_root() {
        assert_eq!(DomainScope::from_host("blog.example.com").root(), "example.com");
        assert_eq!(DomainScope::from_host("example.com").root(), "example.com");
        assert_eq!(DomainScope::from_host("localhost").root(), "localhost");
        // known limitation of the two-label heuristic
        assert_eq!(DomainScope::from_host("shop.example.co.uk").root(), "co.uk");
    }

    #[test]
    fn test_scope_allows_subdomains_both_ways() {
        let scope = DomainScope::for_seed(&url("https://example.com/"));
        assert!(scope.contains(&url("https://blog.example.com/post")));
        assert!(scope.contains(&url("http://example.com/")));
        assert!(!scope.contains(&url("https://other.com/")));
        assert!(!scope.contains(&url("ftp://example.com/file")));

        let scope = DomainScope::for_seed(&url("https://blog.example.com/"));
        assert!(scope.contains(&url("https://example.com/about")));
    }

    #[test]
    fn test_scope_is_a_plain_suffix_match() {
        let scope = DomainScope::for_seed(&url("https://example.com/"));
        // no label boundary is required, so look-alike hosts are included
        assert!(scope.contains(&url("https://notexample.com/")));
        assert!(!scope.contains(&url("https://example.com.evil.org/")));
    }

    #[test]
    fn test_discover_links_filters_and_dedupes() {
        let html = Html::parse_document(
            r##"
            <a href="/a">A</a>
            <a href="/a#again">A again</a>
            <a href="https://docs.example.com/guide">Docs</a>
            <a href="https://elsewhere.org/">External</a>
            <a href="#top">Top</a>
            <a href="mailto:me@example.com">Mail</a>
            <a href="">Empty</a>
            <a href="b">B</a>
        "##,
        );
        let page = url("https://example.com/dir/");
        let scope = DomainScope::for_seed(&page);
        let links: Vec<String> = discover_links(&html, &page, &scope)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/a",
                "https://docs.example.com/guide",
                "https://example.com/dir/b",
            ]
        );
    }
}
