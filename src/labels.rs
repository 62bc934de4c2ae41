//! Class labels for network outputs.

use crate::error::DlInferError;
use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// Human-readable names for output classes, indexed by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    classes: Vec<String>,
}

impl Labels {
    /// Read a label file: one label per line, trimmed at both ends.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DlInferError> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Blank lines are kept so that line numbers keep matching class ids.
    pub fn parse(contents: &str) -> Self {
        let classes = contents.lines().map(|line| line.trim().to_string()).collect();
        Self { classes }
    }

    /// The label for `id`, or `label #<id>` when the file has fewer lines.
    pub fn label_for(&self, id: usize) -> Cow<'_, str> {
        match self.classes.get(id) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Owned(format!("label #{id}")),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Labels {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_keeps_blank_lines() {
        let labels = Labels::parse("  tench \r\ngoldfish\n\n\tgreat white shark\n");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.label_for(0), "tench");
        assert_eq!(labels.label_for(2), "");
        assert_eq!(labels.label_for(3), "great white shark");
    }

    #[test]
    fn test_fallback_label() {
        let labels: Labels = ["cat", "dog"].into_iter().collect();
        assert_eq!(labels.label_for(1), "dog");
        assert_eq!(labels.label_for(7), "label #7");
        assert_eq!(Labels::default().label_for(0), "label #0");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Labels::from_file(dir.path().join("none.labels"));
        assert!(matches!(result, Err(DlInferError::FileError(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.labels");
        fs::write(&path, "a\nb\nc").unwrap();
        let labels = Labels::from_file(&path).unwrap();
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
