//! Highlight terms in an XHTML fragment.
//!
//! Reads the fragment, wraps every occurrence of the given terms and prints
//! the resulting markup to stdout. A one-line summary goes to stderr.
//!
//! Usage:
//!   mark_markup <file> <term>... [--accuracy exactly|partially|complementary]
//!               [--case-sensitive] [--across] [--config options.json] [--unmark]
//!
//! With `--unmark` the highlight elements already present in the file are
//! removed instead and no terms are needed. Set `RUST_LOG=debug` for details.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tree_marker::{AccuracyMode, ContentTree, MarkOptions, Marker, NoHooks, UnmarkOptions};

struct CliConfig {
    file: PathBuf,
    terms: Vec<String>,
    accuracy: Option<AccuracyMode>,
    case_sensitive: bool,
    across: bool,
    options_file: Option<PathBuf>,
    unmark: bool,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut file = None;
        let mut terms = Vec::new();
        let mut accuracy = None;
        let mut case_sensitive = false;
        let mut across = false;
        let mut options_file = None;
        let mut unmark = false;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--accuracy" => {
                    i += 1;
                    let value = args.get(i).ok_or("--accuracy needs a value")?;
                    accuracy = Some(match value.as_str() {
                        "exactly" => AccuracyMode::Exactly,
                        "partially" => AccuracyMode::Partially,
                        "complementary" => AccuracyMode::Complementary,
                        other => return Err(format!("unknown accuracy '{}'", other)),
                    });
                },
                "--config" => {
                    i += 1;
                    let value = args.get(i).ok_or("--config needs a file")?;
                    options_file = Some(PathBuf::from(value));
                },
                "--case-sensitive" => case_sensitive = true,
                "--across" => across = true,
                "--unmark" => unmark = true,
                "--help" | "-h" => return Err(String::new()),
                flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
                value => {
                    if file.is_none() {
                        file = Some(PathBuf::from(value));
                    } else {
                        terms.push(value.to_string());
                    }
                },
            }
            i += 1;
        }

        let file = file.ok_or("missing input file")?;
        if terms.is_empty() && !unmark {
            return Err("missing search terms".into());
        }
        Ok(Self {
            file,
            terms,
            accuracy,
            case_sensitive,
            across,
            options_file,
            unmark,
        })
    }

    fn mark_options(&self) -> Result<MarkOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.options_file {
            Some(path) => MarkOptions::from_json(&fs::read_to_string(path)?)?,
            None => MarkOptions::default(),
        };
        if let Some(accuracy) = self.accuracy {
            options = options.with_accuracy(accuracy);
        }
        if self.case_sensitive {
            options = options.with_case_sensitive(true);
        }
        if self.across {
            options = options.with_across_elements(true);
        }
        Ok(options)
    }
}

fn run(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&config.file)?;
    let mut tree = ContentTree::parse_fragment(&source)?;
    let mut marker = Marker::new(tree.root());
    let start = Instant::now();

    if config.unmark {
        let summary = marker.unmark(&mut tree, &UnmarkOptions::default())?;
        println!("{}", tree.inner_markup(tree.root()));
        eprintln!("Removed {} highlight elements in {:.2?}", summary.removed, start.elapsed());
        return Ok(());
    }

    let options = config.mark_options()?;
    let summary = marker.mark(&mut tree, config.terms.clone(), &options, &mut NoHooks)?;
    println!("{}", tree.inner_markup(tree.root()));

    let stats: Vec<String> = summary
        .term_stats
        .iter()
        .map(|(term, count)| format!("{}={}", term, count))
        .collect();
    eprintln!(
        "Marked {} matches with {} elements in {:.2?} ({})",
        summary.total_matches,
        summary.total_wraps,
        start.elapsed(),
        stats.join(", ")
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let config = match CliConfig::from_args() {
        Ok(config) => config,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("Error: {}", message);
            }
            eprintln!(
                "Usage: mark_markup <file> <term>... [--accuracy exactly|partially|complementary] \
                 [--case-sensitive] [--across] [--config options.json] [--unmark]"
            );
            std::process::exit(2);
        },
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
