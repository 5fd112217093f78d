//! HTML parsing for the origin site's listing and detail pages.
//!
//! All functions here are pure: they take decoded HTML and return parsed
//! values, so they can be tested against fixture markup without a network.

use crate::config::SiteConfig;
use crate::error::Error;
use crate::types::{ArticleDetail, ArticleStub, ListPage};
use crate::Result;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// The page title the origin site serves instead of content when the session
/// cookie is missing or expired.
const AUTH_WALL_TITLE: &str = "提示信息";

/// Beijing time offset; the site renders timestamps in UTC+8 without a zone.
const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("literal regex"))
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})\s+(\d{2}):(\d{2}):(\d{2})").expect("literal regex")
    })
}

fn ascii_parens_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^()]+)\)").expect("literal regex"))
}

fn cjk_parens_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"（([^（）]+)）").expect("literal regex"))
}

fn selector(spec: &str) -> Result<Selector> {
    Selector::parse(spec).map_err(|e| Error::Site(format!("invalid selector '{}': {}", spec, e)))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether the decoded page is the site's auth wall rather than content
pub(super) fn is_login_required(html: &str) -> Result<bool> {
    let doc = Html::parse_document(html);
    let title_sel = selector("title")?;
    let title = doc
        .select(&title_sel)
        .next()
        .map(element_text)
        .unwrap_or_default();
    Ok(title == AUTH_WALL_TITLE)
}

/// Parse one listing page into article stubs
///
/// Rows missing an id or a link are skipped; no status filtering happens
/// here — the orchestrator filters on the site-reported status.
pub(super) fn parse_list_page(page: u32, html: &str, base_url: &str) -> Result<ListPage> {
    let doc = Html::parse_document(html);

    // Total article count from the pager ("共 N 条")
    let total_sel = selector("a.a1")?;
    let total_count = doc
        .select(&total_sel)
        .next()
        .map(element_text)
        .and_then(|text| {
            digits_re()
                .find(&text)
                .and_then(|m| m.as_str().parse::<u64>().ok())
        })
        .unwrap_or(0);

    let row_sel = selector("tr")?;
    let center_td_sel = selector(r#"td[align="center"]"#)?;
    let left_td_sel = selector(r#"td[align="left"]"#)?;
    let td_sel = selector("td")?;
    let link_sel = selector("a")?;

    let mut articles = Vec::new();

    for row in doc.select(&row_sel) {
        // Skip header and filler rows
        if row.select(&td_sel).count() < 5 {
            continue;
        }

        let center_tds: Vec<_> = row.select(&center_td_sel).collect();
        if center_tds.len() < 4 {
            continue;
        }

        let source_id = element_text(center_tds[0]);
        let link = row
            .select(&left_td_sel)
            .next()
            .and_then(|td| td.select(&link_sel).next());
        let (href, title) = match link {
            Some(a) => (
                a.value().attr("href").unwrap_or_default().to_string(),
                element_text(a),
            ),
            None => (String::new(), String::new()),
        };

        if source_id.is_empty() || href.is_empty() {
            continue;
        }

        articles.push(ArticleStub {
            source_id,
            source_url: resolve_link(base_url, &href),
            title,
            category: element_text(center_tds[1]),
            publish_time: parse_publish_time(&element_text(center_tds[2])),
            site_status: element_text(center_tds[3]),
        });
    }

    Ok(ListPage {
        page,
        total_count,
        articles,
    })
}

/// Resolve a listing-page link to an absolute URL
fn resolve_link(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    match url::Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(absolute) => absolute.to_string(),
        // Fall back to naive concatenation for a malformed base
        Err(_) => format!("{}{}", base_url.trim_end_matches('/'), href),
    }
}

/// Parse one article detail page
pub(super) fn parse_detail_page(
    source_id: &str,
    html: &str,
    site: &SiteConfig,
) -> Result<ArticleDetail> {
    let doc = Html::parse_document(html);

    let title_sel = selector(".article-hd h1")?;
    let title = doc
        .select(&title_sel)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let content_sel = selector("#text_content")?;
    let content_html = doc
        .select(&content_sel)
        .next()
        .map(|el| el.inner_html())
        .unwrap_or_default();

    if title.is_empty() && content_html.is_empty() {
        return Err(Error::Site(format!(
            "article {} page has no recognizable content",
            source_id
        )));
    }

    let content_text = html_to_text(&content_html);

    // "来源：XXX 编辑：YYY" — keep the part before the editor credit
    let source_sel = selector(".source")?;
    let source_name = doc
        .select(&source_sel)
        .next()
        .map(element_text)
        .unwrap_or_default()
        .split("编辑：")
        .next()
        .unwrap_or_default()
        .replace("来源：", "")
        .replace('\u{a0}', "")
        .trim()
        .to_string();

    let crumbs_sel = selector("div.crumbs a")?;
    let category = doc
        .select(&crumbs_sel)
        .last()
        .map(element_text)
        .unwrap_or_default();

    let time_sel = selector("span.time")?;
    let publish_time = doc
        .select(&time_sel)
        .next()
        .map(element_text)
        .and_then(|text| parse_publish_time(&text));

    Ok(ArticleDetail {
        source_id: source_id.to_string(),
        author: extract_author(&content_html),
        region: analyze_region(&title, site),
        title,
        content_html,
        content_text,
        source_name,
        category,
        publish_time,
    })
}

/// Extract the author from the article body
///
/// The site's convention puts the author in the last parenthesized group of
/// the body, in either ASCII or CJK parentheses. Returns an empty string
/// when no group is found.
pub fn extract_author(content: &str) -> String {
    for re in [ascii_parens_re(), cjk_parens_re()] {
        if let Some(captures) = re.captures_iter(content).last() {
            if let Some(author) = captures.get(1) {
                return author.as_str().trim().to_string();
            }
        }
    }
    String::new()
}

/// Derive the region from the article title via configured keywords
fn analyze_region(title: &str, site: &SiteConfig) -> String {
    for (region, keywords) in &site.region_keywords {
        for keyword in keywords {
            if title.contains(keyword.as_str()) {
                return region.clone();
            }
        }
    }
    site.default_region.clone()
}

/// Convert an HTML fragment to plain text
///
/// Script and style contents are dropped and whitespace is collapsed.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();

    for node in fragment.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let skipped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| el.name() == "script" || el.name() == "style")
                    .unwrap_or(false)
            });
            if !skipped {
                out.push_str(text);
            }
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the site's timestamp strings into UTC
///
/// The site renders Beijing time without a zone marker; RFC 3339 input is
/// also accepted. Returns None for anything unparseable.
pub fn parse_publish_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    let captures = datetime_re().captures(text)?;
    let field = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = captures.get(1).and_then(|m| m.as_str().parse::<i32>().ok())?;
    let (month, day) = (field(2)?, field(3)?);
    let (hour, minute, second) = (field(4)?, field(5)?, field(6)?);

    let beijing = FixedOffset::east_opt(BEIJING_OFFSET_SECS)?;
    beijing
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
