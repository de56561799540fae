//! ethprep CLI - Amharic OCR corpus preparation tool
//!
//! Cleans raw Ethiopic text corpora, combines them into training text and
//! reports corpus statistics.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use ethprep::combine::{self, DICTIONARY_OUTPUT};
use ethprep::corpus::{clean_corpus_with_progress, CorpusReport};
use ethprep::stats::collect_stats;
use ethprep::{
    CombineMode, CombineOptions, CombineReport, CorpusOptions, FrequencyTable, LineOutcome,
    Pipeline, PipelineOptions, SubgroupSet, LINE_LENGTH,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{filter::LevelFilter, fmt};

/// Amharic/Ethiopic corpus cleaning for OCR training data
#[derive(Parser)]
#[command(
    name = "ethprep",
    version,
    about = "Clean and combine Amharic text corpora for OCR training",
    long_about = "ethprep - Amharic/Ethiopic corpus preparation.\n\n\
                  Usage:\n  \
                  ethprep clean <input> <output>     Clean a corpus directory\n  \
                  ethprep line [TEXT]...             Clean single lines (or stdin)\n  \
                  ethprep combine <input> <output>   Build training text\n  \
                  ethprep info <cleaned>             Show corpus statistics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean every subgroup of a raw corpus
    Clean {
        /// Raw corpus root (contains subgroup directories)
        input: PathBuf,

        /// Output root, mirrors the input layout
        output: PathBuf,

        /// JSON file with subgroup definitions (default: built-in set)
        #[arg(long)]
        subgroups: Option<PathBuf>,

        /// Overwrite existing output files
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean lines given as arguments, or stdin when none are given
    Line {
        /// Lines to clean
        text: Vec<String>,

        /// Frequency cap shared by all lines (default: uncapped)
        #[arg(long)]
        cap: Option<u32>,

        /// Report discarded lines on stderr
        #[arg(long)]
        explain: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Combine cleaned text into training files
    Combine {
        /// Input directory (cleaned corpus root, or combined files for `all`)
        input: PathBuf,

        /// Output directory, or output file for `all`
        output: PathBuf,

        /// What to combine
        #[arg(long, value_enum, default_value = "subgroups")]
        mode: CombineTarget,

        /// Subgroups merged by the `dictionaries` mode
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "word_lists,dictionary_and_linguistic_books"
        )]
        dictionaries: Vec<String>,

        /// JSON file with subgroup definitions (default: built-in set)
        #[arg(long)]
        subgroups: Option<PathBuf>,

        /// Shuffle words instead of lines in `all` mode
        #[arg(long)]
        words: bool,

        /// Characters per training line
        #[arg(long, default_value_t = LINE_LENGTH)]
        line_length: usize,

        /// Shuffle seed
        #[arg(long, default_value_t = combine::SHUFFLE_SEED)]
        seed: u64,

        /// Overwrite existing output files
        #[arg(long)]
        overwrite: bool,
    },

    /// Show statistics of a cleaned corpus
    Info {
        /// Cleaned corpus root
        input: PathBuf,

        /// Characters per training line used for the line estimate
        #[arg(long, default_value_t = LINE_LENGTH)]
        line_length: usize,

        /// Output file path for JSON (default: print a table)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Pipeline flags shared by `clean` and `line`
#[derive(clap::Args)]
struct PipelineArgs {
    /// Repeat the enclosure janitor until the line stops changing
    #[arg(long)]
    converge: bool,

    /// Maximum janitor passes with --converge
    #[arg(long, default_value_t = ethprep::clean::DEFAULT_MAX_ENCLOSURE_PASSES)]
    max_passes: usize,

    /// Keep ASCII letters
    #[arg(long)]
    keep_latin: bool,
}

impl PipelineArgs {
    fn options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new();
        if self.converge {
            options = options.with_enclosure_convergence(self.max_passes);
        }
        if self.keep_latin {
            options = options.with_extra_allowed(('a'..='z').chain('A'..='Z'));
        }
        options
    }
}

/// Combine target
#[derive(Clone, Copy, ValueEnum)]
enum CombineTarget {
    /// One wrapped file per subgroup
    Subgroups,
    /// Dictionaries and word lists merged into one capped word file
    Dictionaries,
    /// All combined subgroup files shuffled into one training text
    All,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose));

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

fn load_subgroups(path: Option<&PathBuf>) -> ethprep::Result<SubgroupSet> {
    match path {
        Some(p) => SubgroupSet::from_json_file(p),
        None => Ok(SubgroupSet::default()),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Clean {
            input,
            output,
            subgroups,
            overwrite,
            pipeline,
            json,
        } => {
            let options = CorpusOptions::new()
                .with_overwrite(overwrite)
                .with_pipeline(pipeline.options())
                .with_subgroups(load_subgroups(subgroups.as_ref())?);

            let pb = create_spinner("Cleaning corpus...");
            let report = clean_corpus_with_progress(&input, &output, &options, |path| {
                pb.set_message(format!("Cleaning {}", path.display()));
            })?;
            pb.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_clean_report(&report, &output);
            }
        }

        Commands::Line {
            text,
            cap,
            explain,
            pipeline,
        } => {
            let pipeline = Pipeline::new(pipeline.options());
            let mut table = cap.map_or_else(FrequencyTable::uncapped, FrequencyTable::new);
            let stdout = io::stdout();
            let mut out = stdout.lock();

            let mut clean_one = |line: &str| -> Result<(), Box<dyn std::error::Error>> {
                match pipeline.clean_line(line, &mut table)? {
                    LineOutcome::Kept(cleaned) => writeln!(out, "{cleaned}")?,
                    LineOutcome::Discarded(reason) if explain => {
                        eprintln!("{} {:?}: {}", "✗".yellow(), line, reason)
                    }
                    LineOutcome::Discarded(_) => {}
                }
                Ok(())
            };

            if text.is_empty() {
                for line in io::stdin().lock().lines() {
                    let line = line?;
                    if !line.trim().is_empty() {
                        clean_one(&line)?;
                    }
                }
            } else {
                for line in &text {
                    clean_one(line)?;
                }
            }
        }

        Commands::Combine {
            input,
            output,
            mode,
            dictionaries,
            subgroups,
            words,
            line_length,
            seed,
            overwrite,
        } => {
            let options = CombineOptions::new()
                .with_line_length(line_length)
                .with_seed(seed)
                .with_overwrite(overwrite)
                .with_mode(if words {
                    CombineMode::Words
                } else {
                    CombineMode::Lines
                });

            let pb = create_spinner("Combining...");
            let reports = match mode {
                CombineTarget::Subgroups => {
                    let set = load_subgroups(subgroups.as_ref())?;
                    combine::combine_subgroups(&input, &set, &output, &options)?
                }
                CombineTarget::Dictionaries => {
                    let set = load_subgroups(subgroups.as_ref())?;
                    let mut selected = Vec::new();
                    for name in &dictionaries {
                        let subgroup = set.get(name).ok_or_else(|| {
                            ethprep::Error::Config(format!("unknown subgroup {name:?}"))
                        })?;
                        selected.push(subgroup);
                    }
                    let file = output.join(DICTIONARY_OUTPUT);
                    vec![combine::combine_dictionaries(
                        &input, &selected, &file, &options,
                    )?]
                }
                CombineTarget::All => vec![combine::combine_all(&input, &output, &options)?],
            };
            pb.finish_and_clear();

            print_combine_reports(&reports);
        }

        Commands::Info {
            input,
            line_length,
            output,
            json,
        } => {
            let pb = create_spinner("Collecting statistics...");
            let stats = collect_stats(&input, line_length)?;
            pb.finish_and_clear();

            if let Some(path) = output {
                fs::write(&path, stats.to_json()?)?;
                println!(
                    "{} Statistics written: {}",
                    "✓".green().bold(),
                    path.display()
                );
            } else if json {
                println!("{}", stats.to_json()?);
            } else {
                println!("{}", "Corpus Statistics".cyan().bold());
                println!("{}", "─".repeat(60));
                for (group, group_stats) in &stats.groups {
                    for (name, s) in &group_stats.subgroups {
                        println!(
                            "{:<40} {:>6} files {:>10} words {:>8} lines",
                            format!("{group}/{name}").bold(),
                            s.files,
                            s.words,
                            s.estimated_lines
                        );
                    }
                }
                println!("{}", "─".repeat(60));
                println!("{}: {}", "Files".bold(), stats.summary.files);
                println!("{}: {:.3} MiB", "Size".bold(), stats.summary.total_size_mib);
                println!("{}: {}", "Words".bold(), stats.summary.words);
                println!(
                    "{}: {}",
                    "Average word length".bold(),
                    stats.summary.avg_word_length
                );
                println!(
                    "{}: {} ({} chars)",
                    "Estimated lines".bold(),
                    stats.summary.estimated_lines,
                    stats.line_length
                );
            }
        }
    }

    Ok(())
}

fn print_clean_report(report: &CorpusReport, output: &std::path::Path) {
    println!("{}", "Cleaning Complete".green().bold());
    println!("{}", "─".repeat(40));
    println!("{}: {}", "Output".bold(), output.display());
    for subgroup in &report.subgroups {
        let cap = subgroup
            .frequency_cap
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        println!(
            "  {} {} ({} files, {}/{} lines kept, cap {})",
            "✓".green(),
            subgroup.name,
            subgroup.files,
            subgroup.lines.kept,
            subgroup.lines.read,
            cap
        );
    }

    let totals = report.totals();
    println!("\n{}", "Statistics".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("{}: {}", "Files".bold(), report.files());
    println!("{}: {}", "Lines read".bold(), totals.read);
    println!("{}: {}", "Lines kept".bold(), totals.kept);
    println!("{}: {}", "Emptied".bold(), totals.emptied);
    println!(
        "{}: {}",
        "No Ethiopic content".bold(),
        totals.no_ethiopic_content
    );
    println!("{}: {}", "Known junk".bold(), totals.known_junk);
}

fn print_combine_reports(reports: &[CombineReport]) {
    if reports.is_empty() {
        println!("{} Nothing to combine", "!".yellow().bold());
        return;
    }
    for report in reports {
        println!(
            "{} {}: {} words, {} lines -> {}",
            "✓".green().bold(),
            report.name,
            report.words,
            report.lines,
            report.output.display()
        );
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
