use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// `name` と同じか、その下の階層にあるか (区切り `/` を考慮)
#[inline]
pub fn in_subtree(name: &str, subtree: &str) -> bool {
    let subtree = subtree.trim_end_matches('/');
    match name.strip_prefix(subtree) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Include / exclude subtree lists applied while walking the taxonomy.
/// A category passes when it lies in some included subtree (or the include
/// list is empty) and in no excluded subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl SubtreeFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn allows(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|s| in_subtree(name, s));
        included && !self.exclude.iter().any(|s| in_subtree(name, s))
    }
}

/// `prefix*suffix` 形式の表示名ルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAlias {
    pub prefix: String,
    pub suffix: String,
}

impl CategoryAlias {
    /// The display name a matching category is reported under: the suffix
    /// without its leading `/`, like a root-stripped path
    pub fn apply(&self, name: &str) -> Option<String> {
        if name.starts_with(&self.prefix) && name.ends_with(&self.suffix) && name.len() >= self.prefix.len() + self.suffix.len() {
            Some(self.suffix.trim_start_matches('/').to_string())
        } else {
            None
        }
    }
}

/// Category filter file consumed when the classifier model is trained.
///
/// - a plain line removes that category and its subtree from the model
/// - a line with `*` is a display alias `prefix*suffix`
/// - blank lines and `#` comments are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub removed: Vec<String>,
    pub aliases: Vec<CategoryAlias>,
}

impl CategoryFilter {
    pub fn parse(text: &str) -> Result<Self> {
        let mut filter = CategoryFilter::default();
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((prefix, suffix)) = line.split_once('*') {
                if suffix.contains('*') {
                    return Err(ClassifierError::invalid_config(format!(
                        "category filter line {}: more than one `*` in `{line}`",
                        line_no + 1
                    )));
                }
                filter.aliases.push(CategoryAlias {
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                });
            } else {
                filter.removed.push(line.trim_end_matches('/').to_string());
            }
        }
        Ok(filter)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ClassifierError::io(format!("reading category filter {}", path.display()), e))?;
        Self::parse(&text)
    }

    /// true when the category survives the filter
    pub fn keeps(&self, name: &str) -> bool {
        !self.removed.iter().any(|r| in_subtree(name, r))
    }
}
