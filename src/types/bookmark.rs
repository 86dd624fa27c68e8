use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use url::Url;

/// A saved page reference. Used for both bookmarks and open tabs.
///
/// Identity is the URL alone: `==` ignores the title, so a page whose title
/// changes after load is still the same tab. Use [`Bookmark::identical`] when
/// the title must match too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub url: Url,
    #[serde(rename = "urlTitle")]
    pub title: String,
}

impl Bookmark {
    pub fn new(url: Url, title: impl Into<String>) -> Self {
        Self {
            url,
            title: title.into(),
        }
    }

    /// Parses `url` and builds a bookmark from it.
    pub fn parse(url: &str, title: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?, title))
    }

    /// Same entity: the URLs match, titles may differ.
    pub fn same_entity(&self, other: &Bookmark) -> bool {
        self.url == other.url
    }

    /// Full structural equality: URL and title both match.
    pub fn identical(&self, other: &Bookmark) -> bool {
        self.url == other.url && self.title == other.title
    }

    /// Image cache key of this page's snapshot: the title, verbatim.
    ///
    /// Two pages sharing a title share a snapshot slot.
    pub fn snapshot_key(&self) -> &str {
        &self.title
    }

    /// Image cache key of this page's favicon.
    pub fn favicon_key(&self) -> String {
        favicon_key(&self.url)
    }
}

impl PartialEq for Bookmark {
    fn eq(&self, other: &Self) -> bool {
        self.same_entity(other)
    }
}

impl Eq for Bookmark {}

impl Hash for Bookmark {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// `"favicon-"` followed by the URL string with every `/` replaced by `-`.
pub fn favicon_key(url: &Url) -> String {
    format!("favicon-{}", url.as_str().replace('/', "-"))
}
