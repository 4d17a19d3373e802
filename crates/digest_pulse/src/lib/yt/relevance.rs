use itertools::Itertools;

/// Words too generic to say anything about a channel's topic
const STOP_WORDS: [&str; 8] = ["the", "and", "for", "with", "news", "daily", "today", "analysis"];

/// Scores channels by the share of topic keywords found in their title or
/// description.
#[derive(Debug, Clone)]
pub struct KeywordRelevance {
    keywords: Vec<String>,
}

impl KeywordRelevance {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .unique()
            .collect();
        Self { keywords }
    }

    /// Derives keywords from the words of the search queries
    pub fn from_queries(queries: &[String]) -> Self {
        Self::new(
            queries
                .iter()
                .flat_map(|q| q.split_whitespace())
                .map(|w| w.to_lowercase())
                .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str())),
        )
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn score(&self, title: &str, description: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }

        let haystack = format!("{} {}", title, description).to_lowercase();
        let matches = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .count();

        matches as f64 / self.keywords.len() as f64
    }
}
