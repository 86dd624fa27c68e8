// Acme Address Resolver
// Turns whatever was typed into the search bar into a URL to load.

use url::Url;

use crate::types::search_engine::SearchEngine;

/// Resolves search bar input.
///
/// Input containing `https` is loaded as-is (or `home` if it doesn't parse).
/// Anything else is tried as `https://www.<input>.com`, and input that can't
/// form a host becomes a search with the selected engine.
pub fn resolve_input(input: &str, engine: SearchEngine, home: &Url) -> Url {
    if input.contains("https") {
        return Url::parse(input).unwrap_or_else(|_| home.clone());
    }

    match Url::parse(&format!("https://www.{}.com", input)) {
        Ok(url) => url,
        Err(_) => fallback_search(input, engine).unwrap_or_else(|| home.clone()),
    }
}

/// Search URL for `term` with the engine's query prefix. Spaces become `+`.
pub fn fallback_search(term: &str, engine: SearchEngine) -> Option<Url> {
    let query = term.replace(' ', "+");
    Url::parse(&format!("{}{}", engine.query_prefix(), query)).ok()
}
