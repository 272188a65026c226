use scraper::Html;

/// A fetched HTML page that matched its required selector.
///
/// Holds the raw body rather than a parsed tree: [`Html`] is not `Send`, so
/// callers parse on demand inside synchronous helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: String,
    body: String,
}

impl Document {
    #[must_use]
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}
