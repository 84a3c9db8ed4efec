//! Tweet content validation

use super::validation::bounded_text;
use super::ValidationError;

/// Width of the `tweets.content` column
pub const MAX_CONTENT_LEN: usize = 255;

/// Validated tweet body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetContent(String);

impl TweetContent {
    /// Create tweet content.
    ///
    /// # Rules
    /// - Not blank
    /// - Max 255 characters (stored as-is, no trimming)
    ///
    /// # Example
    /// ```
    /// use tweetmesh_server::models::TweetContent;
    ///
    /// assert!(TweetContent::new("hello world").is_ok());
    /// assert!(TweetContent::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text(s, "content", MAX_CONTENT_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_surrounding_whitespace() {
        let content = TweetContent::new("  spaced out ").unwrap();
        assert_eq!(content.as_str(), "  spaced out ");
    }

    #[test]
    fn rejects_over_long_content() {
        let long = "a".repeat(MAX_CONTENT_LEN + 1);
        assert!(matches!(
            TweetContent::new(&long),
            Err(ValidationError::TooLong { max: 255, .. })
        ));
        assert!(TweetContent::new(&"a".repeat(MAX_CONTENT_LEN)).is_ok());
    }
}
