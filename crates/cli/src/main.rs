use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asset_cleaner_core::{
    human_size, AssetCleaner, BladeCleaner, Candidate, CandidateScanner, Cleaner, CleanerConfig,
    Component, DeletionResult, ImageAsset, SearchPatterns,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const SCAN_PREVIEW_LIMIT: usize = 20;

#[derive(Debug, Parser)]
#[command(
    name = "asset-cleaner",
    version,
    about = "Find and remove unused images and Blade components."
)]
struct Cli {
    /// Project root that every configured path is relative to.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// Config file. Defaults to `<root>/asset-cleaner.json` when present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Unused image assets.
    Assets {
        #[command(subcommand)]
        action: Action,
    },
    /// Unused Blade components.
    Components {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Detect unused candidates and write the review manifest.
    Scan(ScanArgs),
    /// Delete the candidates listed in the manifest.
    Clean(CleanArgs),
    /// List the files that reference one candidate.
    Refs(RefsArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Also print totals for used and unused candidates.
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Args)]
struct CleanArgs {
    /// Report what would be deleted without touching any file.
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(long)]
    force: bool,

    /// Scan and delete in one pass without a manifest.
    #[arg(long)]
    trust: bool,

    /// Do not copy files to the backup folder before deleting.
    #[arg(long)]
    no_backup: bool,
}

#[derive(Debug, Args)]
struct RefsArgs {
    /// Relative asset path or component name.
    #[arg(value_name = "TARGET")]
    target: String,
}

#[derive(Debug, Serialize)]
struct ReferenceReport<'a> {
    target: &'a str,
    references: Vec<String>,
}

trait Describe {
    fn describe(&self) -> String;
}

impl Describe for ImageAsset {
    fn describe(&self) -> String {
        format!("{} ({})", self.relative_path, self.human_size())
    }
}

impl Describe for Component {
    fn describe(&self) -> String {
        let kind = if self.is_inline() {
            "class, inline"
        } else if self.is_class_based {
            "class"
        } else {
            "anonymous"
        };
        format!("<{}> [{}] ({})", self.tag_name(), kind, self.human_size())
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli.root, cli.config.as_deref())?;
    debug!("project root {}", cli.root.display());

    match cli.command {
        Commands::Assets { action } => {
            let cleaner = AssetCleaner::from_config(&cli.root, &config.assets)
                .context("failed to set up asset cleaner")?;
            run_action(cleaner, action, cli.json)
        }
        Commands::Components { action } => {
            let cleaner = BladeCleaner::from_config(&cli.root, &config.components)
                .context("failed to set up component cleaner")?;
            run_action(cleaner, action, cli.json)
        }
    }
}

fn load_config(root: &Path, path: Option<&Path>) -> Result<CleanerConfig> {
    match path {
        Some(path) => CleanerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => CleanerConfig::load_or_default(root).context("failed to load project config"),
    }
}

fn run_action<S, P>(cleaner: Cleaner<S, P>, action: Action, json: bool) -> Result<()>
where
    S: CandidateScanner,
    S::Candidate: Describe,
    P: SearchPatterns<Candidate = S::Candidate>,
{
    match action {
        Action::Scan(args) => run_scan_command(&cleaner, args, json),
        Action::Clean(args) => {
            let cleaner = if args.no_backup {
                cleaner.without_backup()
            } else {
                cleaner
            };
            run_clean_command(&cleaner, args, json)
        }
        Action::Refs(args) => run_refs_command(&cleaner, args, json),
    }
}

fn run_scan_command<S, P>(cleaner: &Cleaner<S, P>, args: ScanArgs, json: bool) -> Result<()>
where
    S: CandidateScanner,
    S::Candidate: Describe,
    P: SearchPatterns<Candidate = S::Candidate>,
{
    let kind = <S::Candidate as Candidate>::KIND;

    if args.stats {
        let stats = cleaner.statistics();
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("failed to serialize statistics")?
            );
        } else {
            println!(
                "Scanned {} {}: {} used, {} unused ({} of {}).",
                stats.total,
                kind.plural(),
                stats.used,
                stats.unused,
                human_size(stats.unused_size),
                human_size(stats.total_size)
            );
        }
        return Ok(());
    }

    let manifest = cleaner
        .generate_manifest()
        .with_context(|| format!("failed to write {} manifest", kind.plural()))?;
    let manifest_path = cleaner.manifest().full_path();

    if manifest.total_unused == 0 {
        cleaner
            .manifest()
            .delete()
            .with_context(|| format!("failed to remove {}", manifest_path.display()))?;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?
            );
        } else {
            println!(
                "No unused {} found among {} scanned.",
                kind.plural(),
                manifest.total_scanned
            );
        }
        return Ok(());
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?
        );
        return Ok(());
    }

    println!(
        "Found {} unused {} out of {} scanned ({}).",
        manifest.total_unused,
        kind.plural(),
        manifest.total_scanned,
        manifest.total_size_human
    );
    let review = manifest.instructions.clone();
    let candidates = cleaner.manifest().candidates_from(manifest);
    for candidate in candidates.iter().take(SCAN_PREVIEW_LIMIT) {
        println!("- {}", candidate.describe());
    }
    if candidates.len() > SCAN_PREVIEW_LIMIT {
        println!("... and {} more", candidates.len() - SCAN_PREVIEW_LIMIT);
    }
    println!("Manifest written to {}", manifest_path.display());
    println!("{}", review.review);
    println!("{}", review.delete_entry);
    println!("{}", review.clean);

    Ok(())
}

fn run_clean_command<S, P>(cleaner: &Cleaner<S, P>, args: CleanArgs, json: bool) -> Result<()>
where
    S: CandidateScanner,
    S::Candidate: Describe,
    P: SearchPatterns<Candidate = S::Candidate>,
{
    let kind = <S::Candidate as Candidate>::KIND;
    let needs_confirmation = !args.force && !args.dry_run;

    if args.trust {
        if needs_confirmation
            && !confirm(&format!(
                "Delete every unused {} without a review manifest?",
                kind.plural()
            ))?
        {
            eprintln!("Aborted.");
            return Ok(());
        }
        let result = cleaner.clean_all(args.dry_run);
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("failed to serialize result")?
            );
        } else {
            println!("Scanned {} {}.", result.scanned, kind.plural());
            print_deletion(cleaner, &result.deletion, args.dry_run);
        }
        return Ok(());
    }

    let manifest_path = cleaner.manifest().full_path();
    if !cleaner.manifest().exists() {
        anyhow::bail!(
            "no manifest at {}; run `asset-cleaner {} scan` first",
            manifest_path.display(),
            kind.plural()
        );
    }

    if needs_confirmation {
        let listed = cleaner.manifest().candidates().len();
        if !confirm(&format!(
            "Delete {} {} listed in {}?",
            listed,
            kind.plural(),
            manifest_path.display()
        ))? {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let result = cleaner
        .clean_from_manifest(args.dry_run)
        .with_context(|| format!("failed to clean from {}", manifest_path.display()))?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("failed to serialize result")?
        );
    } else {
        print_deletion(cleaner, &result, args.dry_run);
        if !cleaner.manifest().exists() {
            println!("Manifest {} removed.", manifest_path.display());
        }
    }
    Ok(())
}

fn run_refs_command<S, P>(cleaner: &Cleaner<S, P>, args: RefsArgs, json: bool) -> Result<()>
where
    S: CandidateScanner,
    S::Candidate: Describe,
    P: SearchPatterns<Candidate = S::Candidate>,
{
    let kind = <S::Candidate as Candidate>::KIND;
    let candidate = cleaner
        .find_candidate(&args.target)
        .with_context(|| format!("no scanned {} matches '{}'", kind.plural(), args.target))?;
    let references = cleaner.find_references(&candidate);

    if json {
        let report = ReferenceReport {
            target: &args.target,
            references,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize references")?
        );
        return Ok(());
    }

    println!("{}", candidate.describe());
    if references.is_empty() {
        println!("No references found.");
    } else {
        println!("Referenced in {} file(s):", references.len());
        for reference in &references {
            println!("- {}", reference);
        }
    }
    Ok(())
}

fn print_deletion<S, P>(cleaner: &Cleaner<S, P>, result: &DeletionResult, dry_run: bool)
where
    S: CandidateScanner,
    P: SearchPatterns<Candidate = S::Candidate>,
{
    let kind = <S::Candidate as Candidate>::KIND;
    if dry_run {
        println!(
            "Dry run: would delete {} {} ({}).",
            result.deleted,
            kind.plural(),
            human_size(result.total_size)
        );
    } else {
        println!(
            "Deleted {} {} ({} freed).",
            result.deleted,
            kind.plural(),
            human_size(result.total_size)
        );
    }
    if result.backed_up > 0 {
        println!(
            "Backed up {} file(s) under {}",
            result.backed_up,
            cleaner.deleter().backup_root().display()
        );
    }
    if !result.failed.is_empty() {
        println!("Failed ({}):", result.failed.len());
        for failure in &result.failed {
            println!("- {}", failure);
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush().context("failed to flush stderr")?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
