use nc_core::{Error, Result, Settings};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::warn;
use url::Url;

/// Name of the single group built from an inline feed list.
pub const INLINE_GROUP: &str = "inline";

/// Grouped feed configuration: `group -> [url]`, plus an optional
/// `user -> [group]` selection.
#[derive(Debug, Clone, Default)]
pub struct FeedConfig {
    groups: BTreeMap<String, Vec<String>>,
    users: Option<BTreeMap<String, Vec<String>>>,
}

impl FeedConfig {
    pub fn new(
        groups: BTreeMap<String, Vec<String>>,
        users: Option<BTreeMap<String, Vec<String>>>,
    ) -> Self {
        Self { groups, users }
    }

    /// A configuration holding `urls` as one group and no user profiles.
    pub fn inline(urls: Vec<String>) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(INLINE_GROUP.to_string(), urls);
        Self { groups, users: None }
    }

    /// Read the group file (required) and the user file (optional).
    ///
    /// An unreadable or malformed user file is ignored with a warning; every
    /// user then resolves to all groups.
    pub fn load(groups_path: &Path, users_path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(groups_path).map_err(|e| {
            Error::Config(format!("cannot read feed groups {}: {}", groups_path.display(), e))
        })?;
        let groups: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("invalid feed groups {}: {}", groups_path.display(), e))
        })?;

        let users = match std::fs::read_to_string(users_path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(users) => Some(users),
                Err(e) => {
                    warn!("Ignoring invalid user feeds {}: {}", users_path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };

        Ok(Self { groups, users })
    }

    /// The inline feed list when one is set, otherwise the feed files.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.inline_feeds.is_empty() {
            Self::load(&settings.feeds_file, &settings.user_feeds_file)
        } else {
            Ok(Self::inline(settings.inline_feeds.clone()))
        }
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    pub fn users(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.users.as_ref()
    }

    /// Group names selected for `user`: the user's own list when the profile
    /// exists, otherwise every group by name.
    pub fn groups_for(&self, user: Option<&str>) -> Vec<String> {
        let selected = user.and_then(|u| self.users.as_ref().and_then(|users| users.get(u)));
        match selected {
            Some(groups) => groups.clone(),
            None => {
                if let Some(user) = user {
                    warn!("No feed profile for user {}, using all groups", user);
                }
                self.groups.keys().cloned().collect()
            }
        }
    }

    /// Union of the feed URLs of every group selected for `user`, in
    /// configuration order with duplicates removed.
    pub fn resolve(&self, user: Option<&str>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for group in self.groups_for(user) {
            let Some(feeds) = self.groups.get(&group) else {
                warn!("Unknown feed group {}", group);
                continue;
            };
            for url in feeds {
                let url = url.trim();
                if url.is_empty() {
                    continue;
                }
                if let Err(e) = Url::parse(url) {
                    warn!("Skipping invalid feed URL {}: {}", url, e);
                    continue;
                }
                if seen.insert(url.to_string()) {
                    urls.push(url.to_string());
                }
            }
        }
        urls
    }
}
