//! `verba` -- transcript evaluation CLI.
//!
//! - `verba evaluate` -- align reference and hypothesis transcripts, write the
//!   stats / word error / error context tables, the alignment dump and a zip
//!   bundle of all of them.
//! - `verba inspect` -- reload exported tables and print dashboard views.
//! - `verba settings` -- show or reset persisted defaults.

mod archive;
mod corpus;
mod settings;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use verba_core::graph::{
    keyword_views, parse_keywords, ConfusionFilter, DashboardPayload, DashboardQuery, WordMode,
};
use verba_core::report::table;
use verba_core::{Category, VerbaEngine};

use settings::{default_settings_path, load_settings, save_settings, CliSettings};

/// Word-level transcript evaluation.
#[derive(Parser)]
#[command(name = "verba", about = "Transcript alignment and WER error analysis", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the user data directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a batch of transcript pairs and export the report.
    Evaluate(EvaluateArgs),

    /// Load exported tables and print dashboard views as JSON.
    Inspect(InspectArgs),

    /// Show or reset persisted settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Args)]
struct EvaluateArgs {
    /// Directory of reference (ground truth) `.txt` transcripts.
    #[arg(long, required_unless_present = "manifest")]
    reference: Option<PathBuf>,

    /// Directory of hypothesis (recognizer output) `.txt` transcripts.
    #[arg(long, required_unless_present = "manifest")]
    hypothesis: Option<PathBuf>,

    /// JSON manifest of `{id, reference, hypothesis}` objects.
    #[arg(long, conflicts_with_all = ["reference", "hypothesis"])]
    manifest: Option<PathBuf>,

    /// Output directory (default: a timestamped folder).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Analysis worker threads (0 = all cores).
    #[arg(long)]
    workers: Option<usize>,

    /// Leading metadata tokens dropped from every line.
    #[arg(long)]
    metadata_fields: Option<usize>,

    /// Context words on each side of an error.
    #[arg(long)]
    context_radius: Option<usize>,

    /// Skip writing output.zip.
    #[arg(long)]
    no_archive: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Exported word_errors.csv.
    #[arg(long)]
    word_errors: PathBuf,

    /// Exported errors_context.csv, for drill-down rows.
    #[arg(long)]
    errors_context: Option<PathBuf>,

    /// Keep only these categories (repeatable).
    #[arg(long = "category", value_enum)]
    categories: Vec<CategoryArg>,

    /// Source word must contain this substring.
    #[arg(long)]
    source_contains: Option<String>,

    /// Destination word must contain this substring.
    #[arg(long)]
    destination_contains: Option<String>,

    #[arg(long)]
    min_count: Option<u64>,

    #[arg(long)]
    max_count: Option<u64>,

    /// Select rows for this word.
    #[arg(long)]
    word: Option<String>,

    /// Side the selected word is matched on.
    #[arg(long, value_enum, default_value = "reference")]
    mode: ModeArg,

    /// Word on the other side, narrowing the drill-down.
    #[arg(long)]
    counterpart: Option<String>,

    /// Drill-down category (default: substitutions).
    #[arg(long, value_enum)]
    drill: Option<CategoryArg>,

    /// Comma-separated keywords; prints one view per keyword.
    #[arg(long, conflicts_with = "word")]
    keywords: Option<String>,

    /// File holding a comma-separated keyword list.
    #[arg(long, conflicts_with_all = ["word", "keywords"])]
    keywords_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings.
    Show,
    /// Restore default settings.
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Correct,
    Substitutions,
    Deletions,
    Insertions,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Correct => Category::Correct,
            CategoryArg::Substitutions => Category::Substitutions,
            CategoryArg::Deletions => Category::Deletions,
            CategoryArg::Insertions => Category::Insertions,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Reference,
    Hypothesis,
}

impl From<ModeArg> for WordMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Reference => WordMode::Reference,
            ModeArg::Hypothesis => WordMode::Hypothesis,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Tracing ───────────────────────────────────────────────────────────
    let default_directive = if cli.verbose { "verba=debug" } else { "verba=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);

    match cli.command {
        Commands::Evaluate(args) => evaluate(args, &settings_path).await,
        Commands::Inspect(args) => inspect(args),
        Commands::Settings { action } => settings_command(action, &settings_path),
    }
}

async fn evaluate(args: EvaluateArgs, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path);
    let mut config = settings.engine_config();
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(n) = args.metadata_fields {
        config.metadata_fields = n;
    }
    if let Some(radius) = args.context_radius {
        config.context_radius = radius;
    }

    let pairs = match (&args.manifest, &args.reference, &args.hypothesis) {
        (Some(manifest), _, _) => corpus::load_manifest(manifest)?,
        (None, Some(reference), Some(hypothesis)) => corpus::collect_pairs(reference, hypothesis)?,
        _ => bail!("either --manifest or both --reference and --hypothesis are required"),
    };

    let output = args
        .output
        .unwrap_or_else(|| default_output_dir(settings.output_root.as_deref()));

    let engine = Arc::new(VerbaEngine::new(config).context("invalid engine configuration")?);
    let report = Arc::clone(&engine)
        .evaluate_async(pairs)
        .await
        .context("batch evaluation failed")?;

    let written = report
        .write_to_dir(&output)
        .with_context(|| format!("failed to write report to {}", output.display()))?;
    if settings.write_archive && !args.no_archive {
        archive::write_archive(&output, &written)?;
    }

    let snap = engine.diagnostics_snapshot();
    let totals = report.totals();
    info!(
        pairs = snap.pairs_analyzed,
        skipped = snap.pairs_skipped,
        short_lines = snap.short_lines,
        "evaluation complete"
    );
    println!(
        "{} pairs analysed ({} skipped), WER {:.2}% over {} reference words -> {}",
        snap.pairs_analyzed,
        snap.pairs_skipped,
        totals.wer() * 100.0,
        totals.reference_len(),
        output.display()
    );
    Ok(())
}

fn default_output_dir(root: Option<&Path>) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    root.unwrap_or_else(|| Path::new("."))
        .join(format!("verba-{stamp}"))
}

fn inspect(args: InspectArgs) -> Result<()> {
    let view = inspect_view(args)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn inspect_view(args: InspectArgs) -> Result<serde_json::Value> {
    let keywords = match (&args.keywords, &args.keywords_file) {
        (Some(list), _) => Some(parse_keywords(list)),
        (None, Some(path)) => Some(parse_keywords(
            &std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        )),
        (None, None) => None,
    };

    let entries = table::read_word_errors(
        File::open(&args.word_errors)
            .with_context(|| format!("failed to open {}", args.word_errors.display()))?,
    )
    .with_context(|| format!("invalid word errors table {}", args.word_errors.display()))?;

    let errors = match &args.errors_context {
        Some(path) => table::read_errors_context(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )
        .with_context(|| format!("invalid errors context table {}", path.display()))?,
        None => Vec::new(),
    };

    let query = DashboardQuery {
        filter: ConfusionFilter {
            categories: args.categories.into_iter().map(Category::from).collect(),
            source_contains: args.source_contains,
            destination_contains: args.destination_contains,
            min_count: args.min_count,
            max_count: args.max_count,
        },
        word: args.word,
        mode: args.mode.into(),
        counterpart: args.counterpart,
        category: args.drill.map(Category::from),
    };

    let view = match keywords {
        Some(keywords) => {
            serde_json::to_value(keyword_views(&entries, &errors, &query, &keywords))?
        }
        None => serde_json::to_value(DashboardPayload::build(&entries, &errors, &query))?,
    };
    Ok(view)
}

fn settings_command(action: SettingsAction, path: &Path) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = load_settings(path);
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Reset => {
            save_settings(path, &CliSettings::default())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("settings reset: {}", path.display());
        }
    }
    Ok(())
}
