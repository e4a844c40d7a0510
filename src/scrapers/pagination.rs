//! "Next page" link discovery for link-based pagination.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Link texts that mark a pagination control.
const NEXT_WORDS: &[&str] = &["next", "more", "older"];

/// Find the URL of the page after `html`, resolved against `page_url`.
///
/// `<link rel="next">` wins when present. Otherwise candidates are `<a>`
/// elements whose text mentions next/more/older; among them a `rel="next"`
/// anchor is preferred, then one with a "next" class, then one whose href
/// mentions "page", and finally the last candidate.
pub fn next_page_url(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let href = head_link(&document).or_else(|| anchor_link(&document))?;
    resolve(base.as_ref(), &href)
}

fn usable_href(element: &ElementRef) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') || href.to_lowercase().starts_with("javascript:")
    {
        return None;
    }
    Some(href.to_string())
}

fn has_rel_next(element: &ElementRef) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")))
        .unwrap_or(false)
}

fn head_link(document: &Html) -> Option<String> {
    let selector = Selector::parse("link[rel]").ok()?;
    document
        .select(&selector)
        .filter(has_rel_next)
        .find_map(|e| usable_href(&e))
}

fn anchor_link(document: &Html) -> Option<String> {
    let selector = Selector::parse("a[href]").ok()?;

    let candidates: Vec<(ElementRef, String)> = document
        .select(&selector)
        .filter(|a| {
            let text = a.text().collect::<String>().to_lowercase();
            NEXT_WORDS.iter().any(|w| text.contains(w))
        })
        .filter_map(|a| usable_href(&a).map(|href| (a, href)))
        .collect();

    let by_rel = candidates.iter().find(|(a, _)| has_rel_next(a));
    let by_class = || {
        candidates.iter().find(|(a, _)| {
            a.value()
                .attr("class")
                .map(|c| c.to_lowercase().contains("next"))
                .unwrap_or(false)
        })
    };
    let by_href = || {
        candidates
            .iter()
            .find(|(_, href)| href.to_lowercase().contains("page"))
    };

    by_rel
        .or_else(by_class)
        .or_else(by_href)
        .or_else(|| candidates.last())
        .map(|(_, href)| href.clone())
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}
