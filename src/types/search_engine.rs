use serde::{Deserialize, Serialize};

/// Search engine used when the address bar input is not a URL.
///
/// Persisted as its raw value, which must stay stable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "i64", into = "i64")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    DuckDuckGo,
    Yahoo,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 4] = [
        SearchEngine::Google,
        SearchEngine::Bing,
        SearchEngine::DuckDuckGo,
        SearchEngine::Yahoo,
    ];

    /// Unknown values fall back to Google.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => SearchEngine::Bing,
            2 => SearchEngine::DuckDuckGo,
            3 => SearchEngine::Yahoo,
            _ => SearchEngine::Google,
        }
    }

    pub fn raw_value(self) -> i64 {
        match self {
            SearchEngine::Google => 0,
            SearchEngine::Bing => 1,
            SearchEngine::DuckDuckGo => 2,
            SearchEngine::Yahoo => 3,
        }
    }

    /// URL prefix the URL-encoded search term is appended to.
    pub fn query_prefix(self) -> &'static str {
        match self {
            SearchEngine::Google => "https://www.google.com/search?q=",
            SearchEngine::Bing => "https://www.bing.com/search?q=",
            SearchEngine::DuckDuckGo => "https://duckduckgo.com/?q=",
            SearchEngine::Yahoo => "https://search.yahoo.com/search?p=",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SearchEngine::Google => "Google",
            SearchEngine::Bing => "Bing",
            SearchEngine::DuckDuckGo => "DuckDuckGo",
            SearchEngine::Yahoo => "Yahoo",
        }
    }
}

impl From<i64> for SearchEngine {
    fn from(raw: i64) -> Self {
        SearchEngine::from_raw(raw)
    }
}

impl From<SearchEngine> for i64 {
    fn from(engine: SearchEngine) -> Self {
        engine.raw_value()
    }
}
