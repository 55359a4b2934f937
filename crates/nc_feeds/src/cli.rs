use clap::{Args, Subcommand};
use nc_core::{ArticleStatus, Result, Settings};

use crate::filters::FreshnessFilter;
use crate::resolver::FeedConfig;
use crate::seen::SeenStore;
use crate::source::{FeedSource, HttpFeedSource};

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[command(subcommand)]
    pub command: FeedCommands,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommands {
    /// List configured feed groups
    Groups,
    /// Show the feed URLs selected for a user
    Resolve {
        /// User profile name; all groups when omitted or unknown
        #[arg(long)]
        user: Option<String>,
    },
    /// Fetch one feed and show how each entry compares to the seen-state
    Fetch {
        url: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub async fn handle_command(args: FeedArgs, settings: &Settings) -> Result<()> {
    match args.command {
        FeedCommands::Groups => {
            let config = FeedConfig::from_settings(settings)?;
            for (group, urls) in config.groups() {
                println!("{} ({} feeds)", group, urls.len());
                for url in urls {
                    println!("  - {}", url);
                }
            }
            if let Some(users) = config.users() {
                println!("Users:");
                for (user, groups) in users {
                    println!("  {}: {}", user, groups.join(", "));
                }
            }
        }
        FeedCommands::Resolve { user } => {
            let config = FeedConfig::from_settings(settings)?;
            let urls = config.resolve(user.as_deref());
            println!("Resolved {} feeds", urls.len());
            for url in urls {
                println!("  {}", url);
            }
        }
        FeedCommands::Fetch { url, limit } => {
            let source = HttpFeedSource::new()?;
            let seen = SeenStore::load(settings.seen_path()).await;
            let freshness = FreshnessFilter::hours(settings.freshness_hours);
            let now = chrono::Utc::now();

            let entries = source.fetch(&url, limit).await?;
            println!("Found {} entries", entries.len());
            for entry in entries {
                let Some(article) = entry.into_article(&url) else {
                    println!("❔ (no link)");
                    continue;
                };
                let emoji = match seen.status(&article) {
                    ArticleStatus::Unchanged => "⏭️",
                    _ if !freshness.is_fresh(&article, now) => "🕰️",
                    ArticleStatus::New => "🆕",
                    ArticleStatus::Updated => "📝",
                };
                println!("{} {} - {}", emoji, article.title, article.link);
            }
        }
    }
    Ok(())
}
