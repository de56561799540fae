//! Statistics over a cleaned corpus.
//!
//! The corpus root holds group directories (e.g. `books/`); each group
//! holds subgroup directories (e.g. `books/religious_amh/`) or, when it has
//! none, is its own single subgroup.

use crate::corpus::collect_txt_files;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Size and word statistics of a set of text files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextStats {
    pub total_size_mib: f64,
    pub files: usize,
    pub words: usize,
    /// Sum of word lengths in characters.
    pub total_word_length: usize,
    pub avg_word_length: f64,
    /// Lines the words fill once wrapped, assuming one space per word.
    pub estimated_lines: usize,
}

impl TextStats {
    /// Computes statistics over every `.txt` file below `dir`.
    pub fn of_dir(dir: &Path, line_length: usize) -> Result<Self> {
        let mut size = 0u64;
        let mut files = 0;
        let mut words = 0;
        let mut total_word_length = 0;

        for path in collect_txt_files(dir)? {
            size += fs::metadata(&path)?.len();
            files += 1;
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                for word in line?.split_whitespace() {
                    words += 1;
                    total_word_length += word.chars().count();
                }
            }
        }

        let avg_word_length = if words == 0 {
            0.0
        } else {
            round_to(total_word_length as f64 / words as f64, 2)
        };
        Ok(Self {
            total_size_mib: round_to(size as f64 / BYTES_PER_MIB, 3),
            files,
            words,
            total_word_length,
            avg_word_length,
            estimated_lines: estimate_lines(words, avg_word_length, line_length),
        })
    }

    /// Sums sizes and counts; the average is recomputed from the totals.
    fn merge<'a>(parts: impl IntoIterator<Item = &'a TextStats>) -> Self {
        let mut merged = TextStats::default();
        for part in parts {
            merged.total_size_mib += part.total_size_mib;
            merged.files += part.files;
            merged.words += part.words;
            merged.total_word_length += part.total_word_length;
            merged.estimated_lines += part.estimated_lines;
        }
        merged.total_size_mib = round_to(merged.total_size_mib, 3);
        if merged.words > 0 {
            merged.avg_word_length =
                round_to(merged.total_word_length as f64 / merged.words as f64, 2);
        }
        merged
    }
}

/// Statistics of one group and its subgroups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupStats {
    pub summary: TextStats,
    pub subgroups: BTreeMap<String, TextStats>,
}

/// Statistics of a whole cleaned corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStats {
    pub line_length: usize,
    pub summary: TextStats,
    pub groups: BTreeMap<String, GroupStats>,
}

impl CorpusStats {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn estimate_lines(words: usize, avg_word_length: f64, line_length: usize) -> usize {
    if words == 0 {
        return 0;
    }
    let words_per_line = (line_length as f64 / (avg_word_length + 1.0)).floor();
    if words_per_line < 1.0 {
        return words;
    }
    (words as f64 / words_per_line).round() as usize
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<(String, std::path::PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Collects statistics for every group under `root`.
pub fn collect_stats(root: &Path, line_length: usize) -> Result<CorpusStats> {
    if !root.is_dir() {
        return Err(Error::InputNotFound(root.to_path_buf()));
    }

    let mut groups = BTreeMap::new();
    for (group_name, group_dir) in sorted_subdirs(root)? {
        let mut subgroups = BTreeMap::new();
        let subdirs = sorted_subdirs(&group_dir)?;
        if subdirs.is_empty() {
            subgroups.insert(group_name.clone(), TextStats::of_dir(&group_dir, line_length)?);
        }
        for (name, dir) in subdirs {
            subgroups.insert(name, TextStats::of_dir(&dir, line_length)?);
        }
        let summary = TextStats::merge(subgroups.values());
        tracing::debug!(group = %group_name, words = summary.words, "group statistics collected");
        groups.insert(group_name, GroupStats { summary, subgroups });
    }

    Ok(CorpusStats {
        line_length,
        summary: TextStats::merge(groups.values().map(|g| &g.summary)),
        groups,
    })
}
