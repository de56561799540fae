//! Subgroup configuration.
//!
//! A subgroup is a directory of source texts that is frequency-capped on
//! its own, e.g. word lists or newspaper articles.

use crate::clean::{FrequencyTable, PipelineOptions};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One named partition of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgroup {
    /// Display name, also used for combined output files.
    pub name: String,

    /// Directory relative to the corpus root.
    pub path: PathBuf,

    /// Maximum weighted occurrences of a word. `None` disables capping.
    #[serde(default)]
    pub frequency_cap: Option<u32>,

    /// Characters used as separators in every file of the subgroup.
    #[serde(default)]
    pub replace_with_space: Vec<char>,

    /// Entries are single words or short phrases rather than running text;
    /// the combiner shuffles them instead of keeping their order.
    #[serde(default)]
    pub word_list: bool,

    /// Extra separators for individual files, keyed by file name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub file_overrides: BTreeMap<String, Vec<char>>,
}

impl Subgroup {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            frequency_cap: None,
            replace_with_space: Vec::new(),
            word_list: false,
            file_overrides: BTreeMap::new(),
        }
    }

    /// Sets the frequency cap.
    pub fn with_cap(mut self, cap: u32) -> Self {
        self.frequency_cap = Some(cap);
        self
    }

    /// Marks the subgroup as a word list.
    pub fn as_word_list(mut self) -> Self {
        self.word_list = true;
        self
    }

    /// Treats the given characters as separators in every file.
    pub fn with_replace_with_space(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.replace_with_space.extend(chars);
        self
    }

    /// Treats the given characters as separators in one file.
    pub fn with_file_override(
        mut self,
        file_name: impl Into<String>,
        chars: impl IntoIterator<Item = char>,
    ) -> Self {
        self.file_overrides
            .entry(file_name.into())
            .or_default()
            .extend(chars);
        self
    }

    /// Fresh frequency table for one pass over this subgroup.
    pub fn new_table(&self) -> FrequencyTable {
        match self.frequency_cap {
            Some(cap) => FrequencyTable::new(cap),
            None => FrequencyTable::uncapped(),
        }
    }

    /// Pipeline options for one file of this subgroup.
    pub fn pipeline_options(&self, base: &PipelineOptions, file: &Path) -> PipelineOptions {
        let mut options = base
            .clone()
            .with_replace_with_space(self.replace_with_space.iter().copied());
        let file_name = file.file_name().and_then(|name| name.to_str());
        if let Some(chars) = file_name.and_then(|name| self.file_overrides.get(name)) {
            options = options.with_replace_with_space(chars.iter().copied());
        }
        options
    }

    /// Flat file name for this subgroup's combined output.
    pub fn output_file_name(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// The set of subgroups a corpus is split into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubgroupSet {
    subgroups: Vec<Subgroup>,
}

impl Default for SubgroupSet {
    fn default() -> Self {
        Self {
            subgroups: vec![
                Subgroup::new("word_lists", "word_lists")
                    .with_cap(5)
                    .with_replace_with_space(['*'])
                    .as_word_list(),
                Subgroup::new(
                    "dictionary_and_linguistic_books",
                    "dictionary_and_linguistic_books",
                )
                .with_cap(5)
                .with_file_override("KBT-20071115.txt", ['[', ']', '(', ')']),
                Subgroup::new("religious_amh", "books/religious_amh").with_cap(10),
                Subgroup::new("religious_geez", "books/religious_geez").with_cap(10),
                Subgroup::new("articles", "articles").with_cap(101),
                Subgroup::new("enh_corpus_by_year", "enh_corpus_by_year").with_cap(101),
            ],
        }
    }
}

impl SubgroupSet {
    /// Builds a set, rejecting duplicate names and nested paths.
    pub fn new(subgroups: Vec<Subgroup>) -> Result<Self> {
        for (i, a) in subgroups.iter().enumerate() {
            if a.path.as_os_str().is_empty() || a.path.is_absolute() {
                return Err(Error::Config(format!(
                    "subgroup {:?} needs a relative path, got {}",
                    a.name,
                    a.path.display()
                )));
            }
            for b in &subgroups[i + 1..] {
                if a.name == b.name {
                    return Err(Error::Config(format!("duplicate subgroup name {:?}", a.name)));
                }
                if a.path.starts_with(&b.path) || b.path.starts_with(&a.path) {
                    return Err(Error::Config(format!(
                        "subgroup paths overlap: {} and {}",
                        a.path.display(),
                        b.path.display()
                    )));
                }
            }
        }
        Ok(Self { subgroups })
    }

    /// Loads a set from a JSON array of subgroups.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let subgroups: Vec<Subgroup> = serde_json::from_str(data)?;
        Self::new(subgroups)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subgroup> {
        self.subgroups.iter()
    }

    pub fn len(&self) -> usize {
        self.subgroups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgroups.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Subgroup> {
        self.subgroups.iter().find(|s| s.name == name)
    }

    /// Subgroup whose directory contains `relative` (a path below the corpus root).
    pub fn containing(&self, relative: &Path) -> Option<&Subgroup> {
        self.subgroups.iter().find(|s| relative.starts_with(&s.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps() {
        let set = SubgroupSet::default();
        assert_eq!(set.len(), 6);
        assert_eq!(set.get("word_lists").unwrap().frequency_cap, Some(5));
        assert!(set.get("word_lists").unwrap().word_list);
        assert!(!set.get("articles").unwrap().word_list);
        assert_eq!(set.get("religious_geez").unwrap().frequency_cap, Some(10));
        assert_eq!(set.get("articles").unwrap().frequency_cap, Some(101));
    }

    #[test]
    fn test_containing() {
        let set = SubgroupSet::default();
        let found = set.containing(Path::new("books/religious_amh/bible/ot.txt"));
        assert_eq!(found.map(|s| s.name.as_str()), Some("religious_amh"));
        assert!(set.containing(Path::new("books/other/x.txt")).is_none());
    }

    #[test]
    fn test_file_override_applies_to_named_file_only() {
        let set = SubgroupSet::default();
        let dict = set.get("dictionary_and_linguistic_books").unwrap();
        let base = PipelineOptions::default();

        let options = dict.pipeline_options(&base, Path::new("d/KBT-20071115.txt"));
        assert_eq!(options.replace_with_space, vec!['[', ']', '(', ')']);

        let options = dict.pipeline_options(&base, Path::new("d/other.txt"));
        assert!(options.replace_with_space.is_empty());
    }

    #[test]
    fn test_output_file_name() {
        let set = SubgroupSet::default();
        assert_eq!(
            set.get("religious_amh").unwrap().output_file_name(),
            "books_religious_amh"
        );
    }

    #[test]
    fn test_from_json() {
        let set = SubgroupSet::from_json(
            r#"[
                {"name": "news", "path": "news", "frequency_cap": 50},
                {"name": "lists", "path": "lists", "replace_with_space": ["*", "|"]}
            ]"#,
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("news").unwrap().new_table().cap(), Some(50));
        assert_eq!(set.get("lists").unwrap().new_table().cap(), None);
        assert_eq!(set.get("lists").unwrap().replace_with_space, vec!['*', '|']);
    }

    #[test]
    fn test_rejects_overlapping_paths() {
        let err = SubgroupSet::new(vec![
            Subgroup::new("books", "books"),
            Subgroup::new("amh", "books/religious_amh"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            SubgroupSet::from_json("{not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_roundtrips_through_json() {
        let set = SubgroupSet::default();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(SubgroupSet::from_json(&json).unwrap(), set);
    }
}
