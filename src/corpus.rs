//! Corpus cleaning driver.
//!
//! Walks `input_root/<subgroup>/**/*.txt`, cleans every file line by line
//! and mirrors it under `output_root`. Each subgroup gets its own
//! frequency table that lives exactly as long as the pass over that
//! subgroup.

use crate::clean::{DiscardReason, FrequencyTable, LineOutcome, Pipeline, PipelineOptions};
use crate::error::{Error, Result};
use crate::subgroup::{Subgroup, SubgroupSet};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name reported for files outside every configured subgroup.
pub const UNASSIGNED: &str = "unassigned";

/// Options for a corpus cleaning run.
#[derive(Debug, Clone, Default)]
pub struct CorpusOptions {
    /// Replace existing output files instead of failing.
    pub overwrite: bool,

    /// Base pipeline options; subgroup separators are added per file.
    pub pipeline: PipelineOptions,

    /// Subgroups and their caps.
    pub subgroups: SubgroupSet,
}

impl CorpusOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineOptions) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_subgroups(mut self, subgroups: SubgroupSet) -> Self {
        self.subgroups = subgroups;
        self
    }
}

/// Per-outcome line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    /// Non-blank input lines.
    pub read: usize,
    pub kept: usize,
    /// Emptied by one of the cleaning stages.
    pub emptied: usize,
    pub no_ethiopic_content: usize,
    pub known_junk: usize,
}

impl LineCounts {
    pub fn record(&mut self, outcome: &LineOutcome) {
        self.read += 1;
        match outcome {
            LineOutcome::Kept(_) => self.kept += 1,
            LineOutcome::Discarded(DiscardReason::Emptied(_)) => self.emptied += 1,
            LineOutcome::Discarded(DiscardReason::NoEthiopicContent) => {
                self.no_ethiopic_content += 1
            }
            LineOutcome::Discarded(DiscardReason::KnownJunk) => self.known_junk += 1,
        }
    }

    pub fn discarded(&self) -> usize {
        self.read - self.kept
    }

    fn add(&mut self, other: &LineCounts) {
        self.read += other.read;
        self.kept += other.kept;
        self.emptied += other.emptied;
        self.no_ethiopic_content += other.no_ethiopic_content;
        self.known_junk += other.known_junk;
    }
}

/// Result of cleaning one subgroup.
#[derive(Debug, Clone, Serialize)]
pub struct SubgroupReport {
    pub name: String,
    pub frequency_cap: Option<u32>,
    pub files: usize,
    pub lines: LineCounts,
    /// Distinct frequency keys seen (0 when uncapped).
    pub distinct_words: usize,
}

/// Result of a corpus cleaning run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusReport {
    pub subgroups: Vec<SubgroupReport>,
}

impl CorpusReport {
    pub fn files(&self) -> usize {
        self.subgroups.iter().map(|s| s.files).sum()
    }

    /// Line counts summed over all subgroups.
    pub fn totals(&self) -> LineCounts {
        let mut totals = LineCounts::default();
        for subgroup in &self.subgroups {
            totals.add(&subgroup.lines);
        }
        totals
    }

    pub fn subgroup(&self, name: &str) -> Option<&SubgroupReport> {
        self.subgroups.iter().find(|s| s.name == name)
    }
}

/// One input file and where its output goes.
#[derive(Debug, Clone)]
struct FileJob {
    input: PathBuf,
    output: PathBuf,
}

/// Cleans a whole corpus.
pub fn clean_corpus(
    input_root: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    options: &CorpusOptions,
) -> Result<CorpusReport> {
    clean_corpus_with_progress(input_root, output_root, options, |_| {})
}

/// Like [`clean_corpus`], calling `on_file` before each file is cleaned.
pub fn clean_corpus_with_progress(
    input_root: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    options: &CorpusOptions,
    mut on_file: impl FnMut(&Path),
) -> Result<CorpusReport> {
    let input_root = input_root.as_ref();
    let output_root = output_root.as_ref();
    if !input_root.is_dir() {
        return Err(Error::InputNotFound(input_root.to_path_buf()));
    }

    let files = collect_txt_files(input_root)?;
    let mut assigned: HashMap<&str, Vec<FileJob>> = HashMap::new();
    let mut unassigned = Vec::new();

    for input in files {
        let relative = input.strip_prefix(input_root).unwrap_or(&input).to_path_buf();
        let job = FileJob {
            output: output_root.join(&relative),
            input,
        };
        match options.subgroups.containing(&relative) {
            Some(subgroup) => assigned.entry(subgroup.name.as_str()).or_default().push(job),
            None => unassigned.push(job),
        }
    }

    // Configured order, unassigned files last
    let mut groups: Vec<(Option<&Subgroup>, Vec<FileJob>)> = options
        .subgroups
        .iter()
        .filter_map(|s| assigned.remove(s.name.as_str()).map(|jobs| (Some(s), jobs)))
        .collect();
    if !unassigned.is_empty() {
        groups.push((None, unassigned));
    }

    // Refuse before anything is written
    if !options.overwrite {
        if let Some(job) = groups
            .iter()
            .flat_map(|(_, jobs)| jobs)
            .find(|job| job.output.exists())
        {
            return Err(Error::OutputExists(job.output.clone()));
        }
    }

    let mut report = CorpusReport::default();
    for (subgroup, jobs) in groups {
        let name = subgroup.map_or(UNASSIGNED, |s| s.name.as_str());
        let mut table = subgroup.map_or_else(FrequencyTable::uncapped, Subgroup::new_table);
        let mut lines = LineCounts::default();

        for job in &jobs {
            on_file(&job.input);
            let pipeline_options = match subgroup {
                Some(s) => s.pipeline_options(&options.pipeline, &job.input),
                None => options.pipeline.clone(),
            };
            let pipeline = Pipeline::new(pipeline_options);
            let counts = clean_file(&job.input, &job.output, &pipeline, &mut table)?;
            lines.add(&counts);
        }

        tracing::debug!(
            subgroup = name,
            files = jobs.len(),
            read = lines.read,
            kept = lines.kept,
            distinct_words = table.len(),
            "subgroup cleaned"
        );
        report.subgroups.push(SubgroupReport {
            name: name.to_string(),
            frequency_cap: table.cap(),
            files: jobs.len(),
            lines,
            distinct_words: table.len(),
        });
    }

    Ok(report)
}

/// Cleans one file into `output`, creating parent directories.
///
/// Blank input lines are skipped. An invariant violation or an unreadable
/// line aborts the file with the offending line number attached, and the
/// partial output is removed.
pub fn clean_file(
    input: &Path,
    output: &Path,
    pipeline: &Pipeline,
    table: &mut FrequencyTable,
) -> Result<LineCounts> {
    tracing::info!(path = %input.display(), "cleaning file");

    let reader = BufReader::new(File::open(input)?);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(output)?);

    let counts = match write_cleaned(input, reader, writer, pipeline, table) {
        Ok(counts) => counts,
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(output) {
                tracing::warn!(
                    path = %output.display(),
                    error = %remove_err,
                    "failed to remove partial output"
                );
            }
            return Err(err);
        }
    };

    tracing::info!(
        path = %input.display(),
        read = counts.read,
        kept = counts.kept,
        "file cleaned"
    );
    Ok(counts)
}

fn write_cleaned(
    input: &Path,
    reader: impl BufRead,
    mut writer: impl Write,
    pipeline: &Pipeline,
    table: &mut FrequencyTable,
) -> Result<LineCounts> {
    let at_line = |index: usize, source: Error| Error::AtLine {
        path: input.to_path_buf(),
        line: index + 1,
        source: Box::new(source),
    };
    let mut counts = LineCounts::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| at_line(index, err.into()))?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = pipeline
            .clean_line(&line, table)
            .map_err(|err| at_line(index, err))?;
        if let LineOutcome::Kept(cleaned) = &outcome {
            writeln!(writer, "{cleaned}")?;
        }
        counts.record(&outcome);
    }
    writer.flush()?;
    Ok(counts)
}

/// All `.txt` files below `root`, in sorted path order.
pub fn collect_txt_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_txt(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_txt(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "txt")
}
