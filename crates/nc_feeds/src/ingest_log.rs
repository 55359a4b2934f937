use chrono::{DateTime, Utc};
use nc_core::{write_atomic, Article, Result};
use std::path::{Path, PathBuf};

/// Path of the log file for the UTC day of `now`.
pub fn log_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("ingest_{}.json", now.format("%Y-%m-%d")))
}

/// Write the articles accepted by a run to the day's log file. A later run on
/// the same day replaces the file.
pub async fn write_ingest_log(
    dir: &Path,
    now: DateTime<Utc>,
    articles: &[Article],
) -> Result<PathBuf> {
    let path = log_path(dir, now);
    let json = serde_json::to_vec_pretty(articles)?;
    write_atomic(&path, &json).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_writes_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 11, 10, 23, 59, 0).unwrap();
        let articles = vec![Article {
            title: "FAA cuts flights".to_string(),
            summary: "Airlines reduce schedules.".to_string(),
            link: "https://news.example/faa".to_string(),
            source: "https://news.example/rss".to_string(),
            published: None,
        }];

        let path = write_ingest_log(&dir.path().join("logs"), now, &articles).await.unwrap();
        assert!(path.ends_with("logs/ingest_2025-11-10.json"));

        let written: Vec<Article> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, articles);
    }
}
