// treeseal - directory integrity checker
// Records per-file digests of a directory tree into a manifest and verifies the tree against it

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use treeseal::config::Settings;
use treeseal::hash::{
    task, Algorithm, EngineMessage, EventLog, FileEvent, HashRegistry, ManifestCodec,
    ManifestSource, OperationHandle, Report, RunOutcome,
};
use treeseal::library::Library;

const EXIT_ISSUES: u8 = 1;
const EXIT_FAILED: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// treeseal - record and verify the integrity of a directory tree
#[derive(Parser, Debug)]
#[command(name = "treeseal")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash every file under ROOT and store a manifest
    Generate {
        root: PathBuf,

        /// Manifest to write (default: <checksum_dir>/<root name>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Digest algorithm
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
    },

    /// Check ROOT against a stored manifest
    Verify {
        root: PathBuf,

        /// Manifest to check against (default: <checksum_dir>/<root name>.<ext>)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Digest algorithm the manifest was made with
        #[arg(short, long)]
        algorithm: Option<Algorithm>,

        /// Only print problems and the summary
        #[arg(long)]
        errors_only: bool,

        /// Export the activity log into this directory
        #[arg(long)]
        export_log: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the roots of a library and whether a manifest is stored for each
    #[command(alias = "ls")]
    Library {
        dir: PathBuf,

        /// Only show roots whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List supported digest algorithms
    Algorithms,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Generate {
            root,
            output,
            algorithm,
        } => {
            if let Some(algorithm) = algorithm {
                settings.algorithm = algorithm;
            }
            let output = match output {
                Some(output) => output,
                None => settings.manifest_path_for(&root_name(&root)),
            };
            cmd_generate(&root, &output, &settings)
        }
        Commands::Verify {
            root,
            manifest,
            algorithm,
            errors_only,
            export_log,
            json,
        } => {
            if let Some(algorithm) = algorithm {
                settings.algorithm = algorithm;
            }
            let manifest = match manifest {
                Some(manifest) => manifest,
                None => settings.manifest_path_for(&root_name(&root)),
            };
            let options = VerifyOptions {
                errors_only,
                export_log,
                json,
            };
            cmd_verify(&root, manifest, &settings, &options)
        }
        Commands::Library { dir, search } => cmd_library(&dir, search.as_deref(), &settings),
        Commands::Algorithms => {
            for info in HashRegistry::list_algorithms() {
                let kind = if info.cryptographic { "cryptographic" } else { "non-cryptographic" };
                println!("{:<10} {:>4} bits  {}", info.name, info.output_bits, kind);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

struct VerifyOptions {
    errors_only: bool,
    export_log: Option<PathBuf>,
    json: bool,
}

fn cmd_generate(root: &Path, output: &Path, settings: &Settings) -> Result<ExitCode> {
    println!("Hashing {} with {}", root.display(), settings.algorithm);

    let handle = task::generate(root, settings);
    let (outcome, _log) = drive(handle, false);

    match outcome {
        RunOutcome::Completed(Report::Generated(generated)) => {
            ManifestCodec::write(output, &generated.entries)
                .with_context(|| format!("Failed to save manifest for {}", root.display()))?;

            let total_bytes: u64 = generated
                .entries
                .iter()
                .filter_map(|entry| fs::metadata(root.join(&entry.relative_path)).ok())
                .map(|metadata| metadata.len())
                .sum();

            println!(
                "{} {} files ({}) -> {}",
                "Hash created:".green().bold(),
                generated.entries.len(),
                format_size(total_bytes, BINARY),
                output.display()
            );
            if !generated.skipped.is_empty() {
                println!(
                    "{} {} unreadable files left out",
                    "Warning:".yellow().bold(),
                    generated.skipped.len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Cancelled(_) => {
            println!("{}", "Stopped. No manifest written.".yellow());
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        RunOutcome::Failed(e) => {
            eprintln!("{} {}", "Generate failed:".red().bold(), e);
            Ok(ExitCode::from(EXIT_FAILED))
        }
        RunOutcome::Completed(Report::Verified(_)) => {
            anyhow::bail!("generate run produced a verification report")
        }
    }
}

fn cmd_verify(
    root: &Path,
    manifest: PathBuf,
    settings: &Settings,
    options: &VerifyOptions,
) -> Result<ExitCode> {
    let banner = format!("Verifying {} against {}", root.display(), manifest.display());
    if options.json {
        eprintln!("{}", banner);
    } else {
        println!("{}", banner);
    }

    let handle = task::verify(root, ManifestSource::File(manifest), settings);
    let (outcome, mut log) = drive(handle, options.errors_only || options.json);

    if let RunOutcome::Failed(e) = &outcome {
        eprintln!("{} {}", "Verify failed:".red().bold(), e);
        return Ok(ExitCode::from(EXIT_FAILED));
    }

    let (code, lines) = verify_summary(&outcome)?;
    log.push_summary(lines.iter().cloned());

    if options.json {
        if let Some(result) = outcome.value().and_then(Report::as_verified) {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    } else {
        for line in &lines {
            let line = line.bold();
            let line = match code {
                0 => line.green(),
                EXIT_ISSUES => line.red(),
                _ => line.yellow(),
            };
            println!("{}", line);
        }
    }

    if let Some(dir) = &options.export_log {
        let path = log
            .export(dir, &root_name(root), options.errors_only)
            .context("Could not save log")?;
        let note = format!("Log exported to {}", path.display());
        if options.json {
            eprintln!("{}", note);
        } else {
            println!("{}", note);
        }
    }

    Ok(ExitCode::from(code))
}

/// Exit code and closing lines of a finished verify run
fn verify_summary(outcome: &RunOutcome<Report>) -> Result<(u8, Vec<String>)> {
    match outcome {
        RunOutcome::Completed(Report::Verified(result)) => {
            let mut lines = result.summary_lines();
            if result.issues() > 0 {
                lines.push(format!(
                    "Found {} issues! Check the log for details.",
                    result.issues()
                ));
                Ok((EXIT_ISSUES, lines))
            } else {
                lines.push("All files verified successfully!".to_string());
                Ok((0, lines))
            }
        }
        RunOutcome::Cancelled(Report::Verified(partial)) => Ok((
            EXIT_CANCELLED,
            vec![format!(
                "Stopped after {} entries (partial: {} ok, {} corrupt, {} missing)",
                partial.per_file_events.len(),
                partial.ok_count,
                partial.corrupt_count,
                partial.missing_count
            )],
        )),
        RunOutcome::Failed(e) => Ok((EXIT_FAILED, vec![format!("Verify failed: {}", e)])),
        RunOutcome::Completed(Report::Generated(_)) | RunOutcome::Cancelled(Report::Generated(_)) => {
            anyhow::bail!("verify run produced a generated manifest")
        }
    }
}

fn cmd_library(dir: &Path, search: Option<&str>, settings: &Settings) -> Result<ExitCode> {
    let library = Library::open(dir, settings)
        .with_context(|| format!("Could not list directory {}", dir.display()))?;

    let entries: Vec<_> = match search {
        Some(query) => library.search(query).collect(),
        None => library.entries().iter().collect(),
    };

    for entry in entries {
        match &entry.manifest {
            Some(manifest) => println!(
                "{:<40} {}",
                entry.name,
                format!("manifest: {}", manifest.display()).green()
            ),
            None => println!("{:<40} {}", entry.name, "(no local hash found)".dimmed()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Drain a running operation into a progress bar and an activity log
///
/// Ctrl-C cancels the run through its token.
fn drive(handle: OperationHandle, quiet_healthy: bool) -> (RunOutcome<Report>, EventLog) {
    let token = handle.token().clone();
    if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
        tracing::warn!("Cannot install Ctrl-C handler: {}", e);
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut log = EventLog::new();
    for message in handle.messages().iter() {
        match message {
            EngineMessage::Progress(percent) => pb.set_position(u64::from(percent)),
            EngineMessage::Event(event) => {
                pb.set_message(event.path.clone());
                if !quiet_healthy || event.classification.is_problem() {
                    pb.println(paint(&event).to_string());
                }
                log.push_event(&event);
            }
        }
    }
    pb.finish_and_clear();

    (handle.join(), log)
}

/// Render an event in the colour its classification suggests
fn paint(event: &FileEvent) -> ColoredString {
    let line = event.to_line();
    match parse_hex_color(event.color_hint()) {
        Some((r, g, b)) => line.truecolor(r, g, b),
        None => line.normal(),
    }
}

fn parse_hex_color(hint: &str) -> Option<(u8, u8, u8)> {
    let hex = hint.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Folder name used to name stored manifests and exported logs
fn root_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}
