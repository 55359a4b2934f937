use chrono::{DateTime, Duration, Utc};
use nc_core::Article;

pub const DEFAULT_FRESHNESS_HOURS: i64 = 36;

/// Rejects articles published longer ago than `max_age`.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessFilter {
    max_age: Duration,
}

impl Default for FreshnessFilter {
    fn default() -> Self {
        Self::hours(DEFAULT_FRESHNESS_HOURS)
    }
}

impl FreshnessFilter {
    pub fn hours(hours: i64) -> Self {
        Self {
            max_age: Duration::hours(hours),
        }
    }

    /// Articles without a timestamp count as fresh, as do timestamps in the
    /// future. An article exactly `max_age` old is still fresh.
    pub fn is_fresh(&self, article: &Article, now: DateTime<Utc>) -> bool {
        match article.published {
            Some(published) => now - published <= self.max_age,
            None => true,
        }
    }
}

/// Case-insensitive substring match against title and summary.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        let haystack = format!("{} {}", article.title, article.summary).to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Keep matching articles. When nothing matches, or no keywords are
    /// configured, the input comes back unfiltered.
    pub fn apply(&self, articles: Vec<Article>) -> Vec<Article> {
        if self.keywords.is_empty() {
            return articles;
        }
        let matched: Vec<Article> = articles.iter().filter(|a| self.matches(a)).cloned().collect();
        if matched.is_empty() {
            articles
        } else {
            matched
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, published: Option<DateTime<Utc>>) -> Article {
        Article {
            title: title.to_string(),
            summary: String::new(),
            link: format!("https://news.example/{}", title.len()),
            source: "https://news.example/rss".to_string(),
            published,
        }
    }

    #[test]
    fn test_freshness_boundary() {
        let now = Utc::now();
        let filter = FreshnessFilter::default();

        assert!(filter.is_fresh(&article("exact", Some(now - Duration::hours(36))), now));
        let just_too_old = now - Duration::hours(36) - Duration::seconds(1);
        assert!(!filter.is_fresh(&article("old", Some(just_too_old)), now));
        assert!(filter.is_fresh(&article("recent", Some(now - Duration::minutes(10))), now));
        assert!(filter.is_fresh(&article("undated", None), now));
        assert!(filter.is_fresh(&article("future", Some(now + Duration::hours(3))), now));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let filter = KeywordFilter::new(["Atlanta", "openai"]);
        assert!(filter.matches(&article("ATLANTA council votes", None)));

        let mut in_summary = article("Model release", None);
        in_summary.summary = "OpenAI ships a model".to_string();
        assert!(filter.matches(&in_summary));
        assert!(!filter.matches(&article("Weather", None)));
    }

    #[test]
    fn test_keyword_filter_falls_back_to_input() {
        let filter = KeywordFilter::new(["atlanta"]);
        let kept = filter.apply(vec![article("Atlanta news", None), article("Other", None)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Atlanta news");

        let all = filter.apply(vec![article("Other", None), article("Weather", None)]);
        assert_eq!(all.len(), 2);

        let none = KeywordFilter::new(Vec::<String>::new());
        assert_eq!(none.apply(vec![article("Other", None)]).len(), 1);
    }
}
