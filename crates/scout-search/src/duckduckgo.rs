//! Result extraction from DuckDuckGo's HTML-only search page.
//!
//! The page is parsed with a handful of regular expressions instead of a DOM:
//! every element whose class list contains `result` opens a result block,
//! and the block's `result__a` / `result__snippet` elements hold the title
//! and snippet text.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

pub const NO_RESULTS: &str = "No results found.";

lazy_static! {
    static ref CLASSED_TAG: Regex =
        Regex::new(r#"<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*?\bclass\s*=\s*["']([^"']*)["'][^>]*>"#)
            .expect("valid classed-tag pattern");
    static ref ANY_TAG: Regex = Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern");
    static ref ENTITY: Regex =
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn to_markdown(&self) -> String {
        format!("**{}**\n{}", self.title, self.snippet)
    }
}

struct ClassedTag<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    classes: &'a str,
}

impl ClassedTag<'_> {
    fn has_class(&self, class: &str) -> bool {
        self.classes.split_whitespace().any(|c| c == class)
    }
}

/// Extract at most `limit` hits, in page order.
pub fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let tags: Vec<ClassedTag> = CLASSED_TAG
        .captures_iter(html)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(ClassedTag {
                start: whole.start(),
                end: whole.end(),
                name: cap.get(1)?.as_str(),
                classes: cap.get(2)?.as_str(),
            })
        })
        .collect();

    let block_starts: Vec<usize> = tags
        .iter()
        .enumerate()
        .filter(|(_, tag)| tag.has_class("result"))
        .map(|(i, _)| i)
        .collect();

    let mut hits = Vec::new();
    for (n, &first) in block_starts.iter().enumerate() {
        if hits.len() >= limit {
            break;
        }
        let block_end = block_starts
            .get(n + 1)
            .map(|&next| tags[next].start)
            .unwrap_or(html.len());
        let inner = &tags[first + 1..block_starts.get(n + 1).copied().unwrap_or(tags.len())];

        let title = element_text(html, inner, "result__a", block_end);
        let snippet = element_text(html, inner, "result__snippet", block_end);

        if title.is_empty() && snippet.is_empty() {
            continue;
        }
        hits.push(SearchHit { title, snippet });
    }
    hits
}

/// Format hits as bolded titles over snippets, separated by blank lines.
pub fn format_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(SearchHit::to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn element_text(html: &str, tags: &[ClassedTag], class: &str, limit: usize) -> String {
    let Some(tag) = tags.iter().find(|t| t.has_class(class)) else {
        return String::new();
    };
    let rest = &html[tag.end..limit.max(tag.end)];
    let close = format!("</{}", tag.name);
    let body = match rest.to_ascii_lowercase().find(&close.to_ascii_lowercase()) {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    clean_text(body)
}

fn clean_text(fragment: &str) -> String {
    let without_tags = ANY_TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<div class="serp__results">
  <div class="result results_links results_links_deep web-result ">
    <div class="links_main links_deep result__body">
      <h2 class="result__title">
        <a rel="nofollow" class="result__a" href="https://www.rust-lang.org/">Rust <b>Programming</b> Language</a>
      </h2>
      <a class="result__snippet" href="https://www.rust-lang.org/">A language empowering everyone to build reliable &amp; efficient software.</a>
    </div>
  </div>
  <div class="result results_links web-result ">
    <div class="links_main result__body">
      <h2 class="result__title"><a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a></h2>
      <a class="result__snippet" href="#">Learn Rust &#8212; step&nbsp;by step.</a>
    </div>
  </div>
</div>
"##;

    #[test]
    fn test_parses_titles_and_snippets() {
        let hits = parse_results(PAGE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust Programming Language");
        assert_eq!(
            hits[0].snippet,
            "A language empowering everyone to build reliable & efficient software."
        );
        assert_eq!(hits[1].title, "The Rust Book");
        assert_eq!(hits[1].snippet, "Learn Rust \u{2014} step by step.");
    }

    #[test]
    fn test_limit_is_respected() {
        let hits = parse_results(PAGE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_result_body_class_does_not_open_a_block() {
        let html = r#"<div class="result__body"><a class="result__a">Orphan</a></div>"#;
        assert!(parse_results(html, 5).is_empty());
    }

    #[test]
    fn test_format_results() {
        let hits = vec![
            SearchHit { title: "A".into(), snippet: "first".into() },
            SearchHit { title: "B".into(), snippet: "second".into() },
        ];
        assert_eq!(format_results(&hits), "**A**\nfirst\n\n**B**\nsecond");
        assert_eq!(format_results(&[]), NO_RESULTS);
    }
}
