use std::collections::BTreeMap;

/// Validity verdict and user-facing text for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFeedback {
    pub is_valid: bool,
    pub feedback_text: Option<String>,
}

impl ValidationFeedback {
    /// Valid, no text.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            feedback_text: None,
        }
    }

    /// Invalid with a message.
    pub fn invalid(text: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            feedback_text: Some(text.into()),
        }
    }

    /// A verdict without text.
    pub fn verdict(is_valid: bool) -> Self {
        Self {
            is_valid,
            feedback_text: None,
        }
    }

    /// Replace the text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.feedback_text = Some(text.into());
        self
    }

    /// The text, treating an empty string as none.
    pub fn text(&self) -> Option<&str> {
        self.feedback_text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Feedback for every configured field of a form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackMap {
    entries: BTreeMap<String, ValidationFeedback>,
}

impl FeedbackMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ValidationFeedback> {
        self.entries.get(name)
    }

    /// Check validity of one field; unknown fields count as valid.
    pub fn is_valid(&self, name: &str) -> bool {
        self.entries.get(name).is_none_or(|feedback| feedback.is_valid)
    }

    pub fn set(&mut self, name: impl Into<String>, feedback: ValidationFeedback) {
        self.entries.insert(name.into(), feedback);
    }

    pub fn is_all_valid(&self) -> bool {
        self.entries.values().all(|feedback| feedback.is_valid)
    }

    /// Names of the fields currently failing validation.
    pub fn invalid_fields(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, feedback)| !feedback.is_valid)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValidationFeedback)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ValidationFeedback)> for FeedbackMap {
    fn from_iter<I: IntoIterator<Item = (String, ValidationFeedback)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_fields_are_listed() {
        let mut map = FeedbackMap::new();
        map.set("a", ValidationFeedback::valid());
        map.set("b", ValidationFeedback::invalid("b è obbligatorio."));

        assert!(!map.is_all_valid());
        assert_eq!(map.invalid_fields().collect::<Vec<_>>(), vec!["b"]);
        assert!(map.is_valid("unknown"));
    }

    #[test]
    fn empty_text_reads_as_none() {
        assert_eq!(ValidationFeedback::valid().with_text("").text(), None);
        assert_eq!(ValidationFeedback::invalid("x").text(), Some("x"));
    }
}
