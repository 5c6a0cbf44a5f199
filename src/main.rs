use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use logger_formatter::config::{self, FormatterConfig};
use logger_formatter::{
    apply_to_source, Edit, EditResult, Formatter, LineBuffer, ProposedEdit, RewriteOutcome,
    TextBuffer,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "logger-formatter")]
#[command(
    about = "Rewrite concatenated Java log messages into parameterized templates",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the nearest logger-formatter.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the rewrite offered for the statement at one line
    Suggest {
        /// Java source file
        file: PathBuf,

        /// 1-based line inside the statement
        #[arg(short, long)]
        line: usize,

        /// Print the proposal as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report every statement that would be rewritten
    Check {
        /// Files or directories to inspect
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Rewrite every eligible statement in place
    Fix {
        /// Files or directories to rewrite
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let formatter = Formatter::new(&config);

    match cli.command {
        Commands::Suggest { file, line, json } => cmd_suggest(&formatter, &file, line, json),
        Commands::Check { paths } => cmd_check(&formatter, &config, &paths),
        Commands::Fix {
            paths,
            dry_run,
            diff,
        } => cmd_fix(&formatter, &config, &paths, dry_run, diff),
    }
}

/// Initialize tracing subscriber. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration.
///
/// Priority order:
/// 1. Explicit --config flag
/// 2. logger-formatter.toml in the current directory or an ancestor
/// 3. Built-in defaults
fn load_config(explicit: Option<&Path>) -> Result<FormatterConfig> {
    if let Some(path) = explicit {
        return Ok(config::load_from_path(path)?);
    }

    let cwd = env::current_dir()?;
    match config::load_discovered(&cwd)? {
        Some((path, config)) => {
            tracing::debug!(path = %path.display(), "using discovered config");
            Ok(config)
        }
        None => Ok(FormatterConfig::default()),
    }
}

/// Expand directories into the source files they contain.
///
/// Files named explicitly are always included; files found by walking a
/// directory must carry one of the configured extensions.
fn collect_files(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            anyhow::bail!("No such file or directory: {}", path.display());
        }

        for entry in WalkDir::new(path) {
            let entry = entry?;
            let matches_extension = entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e == ext));
            if entry.file_type().is_file() && matches_extension {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn read_buffer(file: &Path) -> Result<LineBuffer> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    Ok(LineBuffer::new(source))
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (formatted)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn describe(file: &Path, buffer: &LineBuffer, proposal: &ProposedEdit) {
    let original = buffer.slice(proposal.range).unwrap_or_default();
    println!(
        "{} {}:{}",
        "⊙".yellow(),
        file.display(),
        proposal.range.start.line + 1
    );
    println!("  {} {}", "-".red(), original.replace('\n', "\n    "));
    println!("  {} {}", "+".green(), proposal.replacement);
}

fn cmd_suggest(formatter: &Formatter, file: &Path, line: usize, json: bool) -> Result<()> {
    if line == 0 {
        anyhow::bail!("line numbers start at 1");
    }
    let buffer = read_buffer(file)?;
    if line > buffer.line_count() {
        anyhow::bail!(
            "line {} is past the end of {} ({} lines)",
            line,
            file.display(),
            buffer.line_count()
        );
    }

    match formatter.propose(&buffer, line - 1) {
        Ok(RewriteOutcome::Proposed(proposal)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&proposal)?);
            } else {
                describe(file, &buffer, &proposal);
            }
        }
        Ok(RewriteOutcome::Skipped(reason)) => {
            if json {
                let skipped = serde_json::json!({ "skipped": reason.to_string() });
                println!("{}", serde_json::to_string_pretty(&skipped)?);
            } else {
                println!(
                    "{} {}:{}: No rewrite ({})",
                    "⊘".cyan(),
                    file.display(),
                    line,
                    reason
                );
            }
        }
        Err(e) => {
            eprintln!("{} {}:{}: {}", "✗".red(), file.display(), line, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn cmd_check(formatter: &Formatter, config: &FormatterConfig, paths: &[PathBuf]) -> Result<()> {
    let files = collect_files(paths, &config.rewrite.extensions)?;

    let mut pending = 0;
    let mut failed = 0;

    for file in &files {
        let buffer = match read_buffer(file) {
            Ok(buffer) => buffer,
            Err(e) => {
                eprintln!("{} {:#}", "✗".red(), e);
                failed += 1;
                continue;
            }
        };

        let report = formatter.scan(&buffer);
        for proposal in &report.proposals {
            describe(file, &buffer, proposal);
        }
        for failure in &report.failures {
            eprintln!("{} {}: {}", "✗".red(), file.display(), failure);
        }
        pending += report.proposals.len();
        failed += report.failures.len();
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files checked", files.len());
    println!("  {} to rewrite", format!("{}", pending).yellow());
    println!("  {} failed", format!("{}", failed).red());

    if pending > 0 || failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_fix(
    formatter: &Formatter,
    config: &FormatterConfig,
    paths: &[PathBuf],
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let files = collect_files(paths, &config.rewrite.extensions)?;

    if dry_run {
        println!("{}", "[DRY RUN - showing what would be rewritten]".cyan());
    }

    let mut rewritten = 0;
    let mut already_applied = 0;
    let mut files_changed = 0;
    let mut failed = 0;

    for file in &files {
        match fix_file(formatter, file, dry_run, show_diff) {
            Ok(summary) => {
                if summary.statements > 0 {
                    files_changed += 1;
                    rewritten += summary.statements;
                }
                already_applied += summary.already_applied;
                failed += summary.errors;
            }
            Err(e) => {
                eprintln!("{} {}: {:#}", "✗".red(), file.display(), e);
                failed += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    let verb = if dry_run { "would be rewritten" } else { "rewritten" };
    println!("  {} {}", format!("{}", rewritten).green(), verb);
    println!(
        "  {} already applied",
        format!("{}", already_applied).yellow()
    );
    println!("  {} files changed", files_changed);
    println!("  {} failed", format!("{}", failed).red());

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

struct FileSummary {
    /// Statements rewritten, or that would be on a dry run
    statements: usize,
    already_applied: usize,
    errors: usize,
}

fn fix_file(formatter: &Formatter, file: &Path, dry_run: bool, show_diff: bool) -> Result<FileSummary> {
    let buffer = read_buffer(file)?;
    let report = formatter.scan(&buffer);

    for failure in &report.failures {
        eprintln!("{} {}: {}", "✗".red(), file.display(), failure);
    }

    let edits = report
        .proposals
        .iter()
        .map(|proposal| Edit::from_proposal(file, &buffer, proposal))
        .collect::<Result<Vec<_>, _>>()?;

    if edits.is_empty() {
        return Ok(FileSummary {
            statements: 0,
            already_applied: 0,
            errors: report.failures.len(),
        });
    }

    let (updated, results) = if dry_run {
        apply_to_source(buffer.source(), &edits)?
    } else {
        let results = Edit::apply_batch(&edits)?;
        let updated = fs::read_to_string(file)
            .with_context(|| format!("failed to re-read {}", file.display()))?;
        (updated, results)
    };

    let already_applied = results
        .iter()
        .filter(|result| matches!(result, EditResult::AlreadyApplied { .. }))
        .count();
    let statements = results.len() - already_applied;

    if statements > 0 {
        let action = if dry_run { "Would rewrite" } else { "Rewrote" };
        println!(
            "{} {}: {} {} statement(s)",
            "✓".green(),
            file.display(),
            action,
            statements
        );
    }
    if already_applied > 0 {
        println!(
            "{} {}: Already applied to {} statement(s)",
            "⊙".yellow(),
            file.display(),
            already_applied
        );
    }

    if show_diff && statements > 0 {
        display_diff(file, buffer.source(), &updated);
    }

    Ok(FileSummary {
        statements,
        already_applied,
        errors: report.failures.len(),
    })
}
