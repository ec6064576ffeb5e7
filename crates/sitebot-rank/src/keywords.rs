/// Case-insensitive substring matcher for "news / latest / recent" terms.
///
/// Matching is on substrings, so `new` also matches `news` and `renewal`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshnessKeywords {
    keywords: Vec<String>,
}

impl FreshnessKeywords {
    /// Blank entries are dropped; everything else is lower-cased once here.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.is_empty() { return false; }
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    pub fn is_empty(&self) -> bool { self.keywords.is_empty() }
}
