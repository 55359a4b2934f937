use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nc_core::{Article, Error, Result};
use scraper::Html;
use std::time::Duration;

const USER_AGENT: &str = concat!("newscast/", env!("CARGO_PKG_VERSION"));

/// An entry as it came out of a feed, before identity checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl RawEntry {
    /// Convert to an [`Article`] from feed `source`. Entries without a link
    /// have no identity and yield `None`.
    pub fn into_article(self, source: &str) -> Option<Article> {
        let link = self.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
        Some(Article {
            title: self.title.unwrap_or_default().trim().to_string(),
            summary: self.summary.unwrap_or_default(),
            link,
            source: source.to_string(),
            published: self.published,
        })
    }
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch at most `limit` entries from the feed at `url`.
    async fn fetch(&self, url: &str, limit: usize) -> Result<Vec<RawEntry>>;
}

/// Fetches RSS/Atom/JSON feeds over HTTP.
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str, limit: usize) -> Result<Vec<RawEntry>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        parse_feed(&bytes, limit)
    }
}

/// Parse a feed document and keep its first `limit` entries.
pub fn parse_feed(bytes: &[u8], limit: usize) -> Result<Vec<RawEntry>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| Error::Feed(format!("Failed to parse feed: {}", e)))?;

    Ok(feed
        .entries
        .into_iter()
        .take(limit)
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()));
            let summary = entry
                .summary
                .map(|t| t.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|s| strip_html(&s));

            RawEntry {
                title: entry.title.map(|t| strip_html(&t.content)),
                summary,
                link,
                published: entry.published.or(entry.updated),
            }
        })
        .collect())
}

/// Reduce an HTML fragment to its text with whitespace collapsed.
pub fn strip_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <link>https://news.example</link>
    <description>Example</description>
    <item>
      <title>FAA cuts flights due to shutdown</title>
      <link>https://news.example/faa</link>
      <description>&lt;p&gt;Airlines are &lt;b&gt;cutting&lt;/b&gt; flights.&lt;/p&gt;</description>
      <pubDate>Mon, 10 Nov 2025 12:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No link here</title>
      <description>Orphan entry</description>
    </item>
    <item>
      <title>Third item</title>
      <link>https://news.example/third</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss() {
        let entries = parse_feed(RSS.as_bytes(), 20).unwrap();
        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("FAA cuts flights due to shutdown"));
        assert_eq!(first.link.as_deref(), Some("https://news.example/faa"));
        assert_eq!(first.summary.as_deref(), Some("Airlines are cutting flights."));
        assert_eq!(
            first.published.unwrap(),
            DateTime::parse_from_rfc3339("2025-11-10T12:00:00Z").unwrap()
        );
        assert!(entries[2].published.is_none());
    }

    #[test]
    fn test_limit_per_feed() {
        assert_eq!(parse_feed(RSS.as_bytes(), 1).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        assert!(matches!(parse_feed(b"<html>not a feed", 10), Err(Error::Feed(_))));
    }

    #[test]
    fn test_entries_without_link_have_no_identity() {
        let entry = RawEntry {
            title: Some("Title".to_string()),
            link: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(entry.into_article("https://feed").is_none());

        let article = RawEntry {
            title: Some(" Title ".to_string()),
            link: Some("https://a".to_string()),
            ..Default::default()
        }
        .into_article("https://feed")
        .unwrap();
        assert_eq!(article.title, "Title");
        assert_eq!(article.summary, "");
        assert_eq!(article.source, "https://feed");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <i>world</i></p>\n <br/> again"), "Hello world again");
        assert_eq!(strip_html("plain text"), "plain text");
    }
}
