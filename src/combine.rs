//! Corpus combiner.
//!
//! Turns cleaned subgroup directories into training text: words are
//! gathered, optionally shuffled with a fixed seed, and packed into lines
//! of bounded length.

use crate::clean::FrequencyTable;
use crate::corpus::collect_txt_files;
use crate::error::{Error, Result};
use crate::subgroup::{Subgroup, SubgroupSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Characters per training line.
pub const LINE_LENGTH: usize = 80;

/// Seed for every shuffle, so reruns produce identical output.
pub const SHUFFLE_SEED: u64 = 23;

/// Words after an opening parenthesis searched for the closing one.
pub const MAX_PAREN_SPAN: usize = 5;

/// Output file name of the dictionary and word list combination.
pub const DICTIONARY_OUTPUT: &str = "dictionaries_and_word_lists";

/// Frequency cap applied to dictionary and word list entries.
pub const DICTIONARY_CAP: u32 = 5;

// Verse references such as `ዮሐ፫`
static RE_VERSE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{1200}-\x{1368}]{2,3}[\x{1369}-\x{137C}]{1,2}").unwrap());

static RE_LETTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:ድ|ተ|ገ|ቁ)[\x{1369}-\x{137C}]+").unwrap());

static RE_PREFIXED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ባ|ካ)[\x{1369}-\x{137C}0-9]+").unwrap());

/// How [`combine_all`] mixes the subgroup files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombineMode {
    /// Shuffle whole lines and write them as they are.
    #[default]
    Lines,
    /// Shuffle individual words and re-wrap them.
    Words,
}

/// Options for the combiner.
#[derive(Debug, Clone)]
pub struct CombineOptions {
    /// Lines are kept shorter than this many characters.
    pub line_length: usize,

    /// Seed for the shuffles.
    pub seed: u64,

    /// Replace existing output files instead of failing.
    pub overwrite: bool,

    pub mode: CombineMode,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            line_length: LINE_LENGTH,
            seed: SHUFFLE_SEED,
            overwrite: false,
            mode: CombineMode::Lines,
        }
    }
}

impl CombineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_length(mut self, line_length: usize) -> Self {
        self.line_length = line_length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_mode(mut self, mode: CombineMode) -> Self {
        self.mode = mode;
        self
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

/// Summary of one combined output file.
#[derive(Debug, Clone, Serialize)]
pub struct CombineReport {
    pub name: String,
    pub output: PathBuf,
    pub words: usize,
    pub lines: usize,
}

/// Packs words into lines shorter than `line_length` characters.
///
/// A word that alone reaches the limit is emitted on a line of its own.
pub fn wrap_words<S: AsRef<str>>(words: &[S], line_length: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut len = 0;

    for word in words {
        let word = word.as_ref();
        let word_len = word.chars().count();
        if word_len == 0 {
            continue;
        }
        if len + word_len < line_length {
            line.push_str(word);
            line.push(' ');
            len += word_len + 1;
            continue;
        }
        if !line.is_empty() {
            lines.push(line.trim_end().to_string());
            line.clear();
            len = 0;
        }
        if word_len >= line_length {
            lines.push(word.to_string());
        } else {
            line.push_str(word);
            line.push(' ');
            len = word_len + 1;
        }
    }
    if !line.is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Re-joins word list entries like `(ሀ ለ ሐ)` that were split on spaces.
///
/// The closing word must be among the next [`MAX_PAREN_SPAN`] words,
/// otherwise the opening word stays on its own.
pub fn group_parenthesized(words: &[String]) -> Vec<String> {
    let mut grouped = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let word = &words[i];
        if word.starts_with('(') && !word.ends_with(')') {
            let close = (i + 1..words.len())
                .take(MAX_PAREN_SPAN)
                .find(|&j| words[j].ends_with(')'));
            if let Some(j) = close {
                grouped.push(words[i..=j].join(" "));
                i = j + 1;
                continue;
            }
        }
        grouped.push(word.clone());
        i += 1;
    }
    grouped
}

/// Normalizes one dictionary or word list entry, or rejects it.
pub fn dictionary_word(word: &str) -> Option<String> {
    let word = word.trim_matches(|c: char| matches!(c, '(' | ')' | '.' | '/' | '-'));
    let mut word = if word.starts_with("ተን-") && word.matches('-').count() == 1 {
        word.replace('-', "")
    } else {
        word.to_string()
    };

    if word.is_empty()
        || RE_VERSE_REF.is_match(&word)
        || word.contains(&['.', '(', ')', '-', '[', ']'][..])
        || RE_LETTER_NUMBER.is_match(&word)
    {
        return None;
    }

    let prefix = RE_PREFIXED_NUMBER
        .captures(&word)
        .map(|caps| (caps[1].len(), if &caps[1] == "ባ" { "በ" } else { "ከ" }));
    if let Some((len, common)) = prefix {
        word.replace_range(..len, common);
    }
    Some(word)
}

/// All whitespace-separated words of the given files.
fn read_words(files: &[PathBuf]) -> Result<Vec<String>> {
    let mut words = Vec::new();
    for path in files {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            words.extend(line?.split_whitespace().map(str::to_string));
        }
    }
    Ok(words)
}

fn create_output(path: &Path, overwrite: bool) -> Result<BufWriter<File>> {
    if !overwrite && path.exists() {
        return Err(Error::OutputExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

fn write_lines(path: &Path, lines: &[String], overwrite: bool) -> Result<()> {
    let mut writer = create_output(path, overwrite)?;
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Combines one cleaned subgroup into `output_dir/<subgroup file name>`.
pub fn combine_subgroup(
    input_root: &Path,
    subgroup: &Subgroup,
    output_dir: &Path,
    options: &CombineOptions,
) -> Result<CombineReport> {
    let dir = input_root.join(&subgroup.path);
    if !dir.is_dir() {
        return Err(Error::InputNotFound(dir));
    }

    let mut words = read_words(&collect_txt_files(&dir)?)?;
    if subgroup.word_list {
        words = group_parenthesized(&words);
        words.shuffle(&mut options.rng());
    }

    let lines = wrap_words(&words, options.line_length);
    let output = output_dir.join(subgroup.output_file_name());
    write_lines(&output, &lines, options.overwrite)?;

    tracing::info!(
        subgroup = %subgroup.name,
        words = words.len(),
        lines = lines.len(),
        output = %output.display(),
        "subgroup combined"
    );
    Ok(CombineReport {
        name: subgroup.name.clone(),
        output,
        words: words.len(),
        lines: lines.len(),
    })
}

/// Combines every subgroup present under `input_root`.
///
/// Subgroups without a directory are skipped.
pub fn combine_subgroups(
    input_root: &Path,
    subgroups: &SubgroupSet,
    output_dir: &Path,
    options: &CombineOptions,
) -> Result<Vec<CombineReport>> {
    if !input_root.is_dir() {
        return Err(Error::InputNotFound(input_root.to_path_buf()));
    }
    let mut reports = Vec::new();
    for subgroup in subgroups.iter() {
        if !input_root.join(&subgroup.path).is_dir() {
            tracing::warn!(subgroup = %subgroup.name, "no cleaned directory, skipping");
            continue;
        }
        reports.push(combine_subgroup(input_root, subgroup, output_dir, options)?);
    }
    Ok(reports)
}

/// Merges dictionaries and word lists into one shuffled word file.
///
/// Entries are normalized with [`dictionary_word`] and capped with one
/// shared frequency table.
pub fn combine_dictionaries(
    input_root: &Path,
    subgroups: &[&Subgroup],
    output: &Path,
    options: &CombineOptions,
) -> Result<CombineReport> {
    let mut table = FrequencyTable::new(DICTIONARY_CAP);
    let mut words = Vec::new();
    for subgroup in subgroups {
        let dir = input_root.join(&subgroup.path);
        if !dir.is_dir() {
            return Err(Error::InputNotFound(dir));
        }
        for word in read_words(&collect_txt_files(&dir)?)? {
            if let Some(word) = dictionary_word(&word) {
                if table.admit(&word) {
                    words.push(word);
                }
            }
        }
    }
    words.shuffle(&mut options.rng());

    let lines = wrap_words(&words, options.line_length);
    write_lines(output, &lines, options.overwrite)?;
    tracing::info!(
        words = words.len(),
        lines = lines.len(),
        output = %output.display(),
        "dictionaries combined"
    );
    Ok(CombineReport {
        name: DICTIONARY_OUTPUT.to_string(),
        output: output.to_path_buf(),
        words: words.len(),
        lines: lines.len(),
    })
}

/// Shuffles the files directly inside `input_dir` into one training text.
pub fn combine_all(
    input_dir: &Path,
    output: &Path,
    options: &CombineOptions,
) -> Result<CombineReport> {
    if !input_dir.is_dir() {
        return Err(Error::InputNotFound(input_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && path != output {
            files.push(path);
        }
    }
    files.sort();

    let mut lines = Vec::new();
    for path in &files {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }

    let mut rng = options.rng();
    let (lines, words) = match options.mode {
        CombineMode::Lines => {
            lines.shuffle(&mut rng);
            let words = lines.iter().map(|l| l.split_whitespace().count()).sum();
            (lines, words)
        }
        CombineMode::Words => {
            let mut words: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
            words.shuffle(&mut rng);
            (wrap_words(&words, options.line_length), words.len())
        }
    };
    write_lines(output, &lines, options.overwrite)?;

    tracing::info!(
        files = files.len(),
        lines = lines.len(),
        output = %output.display(),
        "training text written"
    );
    Ok(CombineReport {
        name: output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        output: output.to_path_buf(),
        words,
        lines: lines.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words(&["ab", "cd", "ef"], 6), vec!["ab cd", "ef"]);
        assert!(wrap_words::<&str>(&[], 80).is_empty());
    }

    #[test]
    fn test_wrap_words_keeps_lines_under_limit() {
        let words: Vec<String> = (0..200).map(|i| "ቃል".repeat(i % 7 + 1)).collect();
        let lines = wrap_words(&words, LINE_LENGTH);
        assert!(lines.iter().all(|l| l.chars().count() < LINE_LENGTH));
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        assert_eq!(rejoined, words.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_wrap_words_oversize_word_on_own_line() {
        assert_eq!(
            wrap_words(&["ሀ", "abcdefgh", "ለ"], 5),
            vec!["ሀ", "abcdefgh", "ለ"]
        );
        assert_eq!(wrap_words(&["abcde"], 5), vec!["abcde"]);
    }

    #[test]
    fn test_group_parenthesized() {
        assert_eq!(
            group_parenthesized(&strings(&["(ሀ", "ለ", "ሐ)", "መ"])),
            strings(&["(ሀ ለ ሐ)", "መ"])
        );
        assert_eq!(
            group_parenthesized(&strings(&["(ሀ", "1", "2", "3", "4", "5)"])),
            strings(&["(ሀ 1 2 3 4 5)"])
        );
    }

    #[test]
    fn test_group_parenthesized_gives_up_on_long_spans() {
        let words = strings(&["(ሀ", "1", "2", "3", "4", "5", "6)"]);
        assert_eq!(group_parenthesized(&words), words);
        let words = strings(&["ሀ", "(ለ"]);
        assert_eq!(group_parenthesized(&words), words);
    }

    #[test]
    fn test_dictionary_word() {
        assert_eq!(dictionary_word("(ቤት)."), Some("ቤት".to_string()));
        assert_eq!(dictionary_word("ተን-ቀሳቀሰ"), Some("ተንቀሳቀሰ".to_string()));
        assert_eq!(dictionary_word("ባ፲"), Some("በ፲".to_string()));
        assert_eq!(dictionary_word("ካ20"), Some("ከ20".to_string()));
        assert_eq!(dictionary_word("ዮሐ፫"), None);
        assert_eq!(dictionary_word("ቤት-ቤት"), None);
        assert_eq!(dictionary_word("ቁ፲"), None);
        assert_eq!(dictionary_word("--"), None);
    }

    #[test]
    fn test_combine_subgroup_shuffles_word_lists_reproducibly() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let dir = input.path().join("word_lists");
        fs::create_dir_all(&dir).unwrap();
        let words: Vec<String> = (0..50).map(|i| format!("ቃል{i}")).collect();
        fs::write(dir.join("a.txt"), words.join("\n")).unwrap();

        let set = SubgroupSet::default();
        let subgroup = set.get("word_lists").unwrap();
        let options = CombineOptions::new().with_line_length(20);

        let report = combine_subgroup(input.path(), subgroup, output.path(), &options).unwrap();
        assert_eq!(report.words, 50);
        let first = fs::read_to_string(&report.output).unwrap();

        let again = CombineOptions::new().with_line_length(20).with_overwrite(true);
        combine_subgroup(input.path(), subgroup, output.path(), &again).unwrap();
        assert_eq!(fs::read_to_string(&report.output).unwrap(), first);

        let mut combined: Vec<&str> = first.split_whitespace().collect();
        assert_ne!(combined, words.iter().map(String::as_str).collect::<Vec<_>>());
        combined.sort_unstable();
        let mut expected: Vec<&str> = words.iter().map(String::as_str).collect();
        expected.sort_unstable();
        assert_eq!(combined, expected);
    }

    #[test]
    fn test_combine_subgroup_keeps_running_text_order() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let dir = input.path().join("books/religious_amh");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.txt"), "ሀ ለ\nሐ መ\n").unwrap();

        let set = SubgroupSet::default();
        let subgroup = set.get("religious_amh").unwrap();
        let report =
            combine_subgroup(input.path(), subgroup, output.path(), &CombineOptions::new())
                .unwrap();

        assert!(report.output.ends_with("books_religious_amh"));
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "ሀ ለ ሐ መ\n");
    }

    #[test]
    fn test_combine_subgroups_skips_missing_and_refuses_overwrite() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::create_dir_all(input.path().join("articles")).unwrap();
        fs::write(input.path().join("articles/a.txt"), "ሰላም\n").unwrap();

        let set = SubgroupSet::default();
        let reports =
            combine_subgroups(input.path(), &set, output.path(), &CombineOptions::new()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "articles");

        let err = combine_subgroups(input.path(), &set, output.path(), &CombineOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));
    }

    #[test]
    fn test_combine_dictionaries_caps_entries() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let dir = input.path().join("word_lists");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.txt"), "ቤት\n".repeat(6) + "ዮሐ፫\n").unwrap();

        let set = SubgroupSet::default();
        let subgroup = set.get("word_lists").unwrap();
        let out = output.path().join(DICTIONARY_OUTPUT);
        let report =
            combine_dictionaries(input.path(), &[subgroup], &out, &CombineOptions::new()).unwrap();

        assert_eq!(report.words, 4);
        assert_eq!(fs::read_to_string(out).unwrap(), "ቤት ቤት ቤት ቤት\n");
    }

    #[test]
    fn test_combine_all_lines_and_words() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::write(input.path().join("articles"), "ሀ ለ\n\nሐ መ\n").unwrap();
        fs::write(input.path().join("word_lists"), "ሠ\n").unwrap();

        let out = output.path().join("amh.training_txt");
        let report = combine_all(input.path(), &out, &CombineOptions::new()).unwrap();
        assert_eq!(report.lines, 3);
        assert_eq!(report.words, 5);
        let mut lines: Vec<String> = fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        lines.sort();
        assert_eq!(lines, strings(&["ሀ ለ", "ሐ መ", "ሠ"]));

        let options = CombineOptions::new()
            .with_mode(CombineMode::Words)
            .with_overwrite(true);
        let report = combine_all(input.path(), &out, &options).unwrap();
        assert_eq!(report.words, 5);
        assert_eq!(report.lines, 1);
    }
}
