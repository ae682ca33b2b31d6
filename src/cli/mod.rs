//! CLI subcommands — init, validate, render, lineage, list, snapshot,
//! iterations, render-iteration, promote, drift, log, completions.

use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{CommandFactory, Parser, Subcommand};
use regex::Regex;

use crate::config::{Config, OutputFormat};
use crate::core::types::{Amount, DateKey, Definition, JournalEvent, ResolvedRecipe};
use crate::core::{render, resolver, scale, validate};
use crate::error::{GalleyError, GalleyResult};
use crate::history::{drift, iterations, journal};
use crate::store::fs::{write_atomic, FsStore};
use crate::store::RecipeStore;

const SLUG_PATTERN: &str = "^[a-z0-9][a-z0-9_-]*$";

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_PATTERN).expect("slug pattern must compile"));

#[derive(Parser, Debug)]
#[command(
    name = "galley",
    version,
    about = "Versioned, composable recipes — derivation, composition, dated iterations"
)]
pub struct Cli {
    /// Directory holding one subdirectory per recipe
    #[arg(long, global = true, env = "GALLEY_RECIPES_DIR")]
    pub recipes_dir: Option<PathBuf>,

    /// Config file (default: ./galley.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a new recipe
    Init {
        /// Recipe slug (lowercase letters, digits, '-' and '_')
        slug: String,
    },

    /// Resolve and structurally validate recipes
    Validate {
        /// Recipe slug
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        slug: Option<String>,

        /// Validate every recipe
        #[arg(long)]
        all: bool,
    },

    /// Print a resolved recipe
    Render {
        /// Recipe slug
        slug: String,

        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Scale ingredients to this yield amount
        #[arg(long = "yield")]
        target_yield: Option<f64>,
    },

    /// Show what a recipe derives from and uses
    Lineage {
        /// Recipe slug
        slug: String,
    },

    /// List recipes
    List {
        /// Include name, version, yield and tags
        #[arg(long)]
        details: bool,
    },

    /// Save a dated snapshot of a recipe
    Snapshot {
        /// Recipe slug
        slug: String,

        /// Snapshot date YYYY-MM-DD (default: today, local time)
        #[arg(long)]
        date: Option<String>,

        /// Free-text note stored with the snapshot
        #[arg(long)]
        note: Option<String>,
    },

    /// List the dated snapshots of a recipe
    Iterations {
        /// Recipe slug
        slug: String,
    },

    /// Print a recipe as it was on a snapshot date
    RenderIteration {
        /// Recipe slug
        slug: String,

        /// Snapshot date YYYY-MM-DD
        date: String,

        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Scale ingredients to this yield amount
        #[arg(long = "yield")]
        target_yield: Option<f64>,
    },

    /// Replace the live definition with a snapshot
    Promote {
        /// Recipe slug
        slug: String,

        /// Snapshot date YYYY-MM-DD
        date: String,
    },

    /// Compare live definitions with their latest snapshot
    Drift {
        /// Only check this recipe
        slug: Option<String>,

        /// Exit non-zero on any drift (for CI/cron)
        #[arg(long)]
        tripwire: bool,
    },

    /// Show the provenance journal of a recipe
    Log {
        /// Recipe slug
        slug: String,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Load config from the global flags, then dispatch.
pub fn run(cli: Cli) -> GalleyResult<()> {
    if let Commands::Completions { shell } = cli.command {
        return cmd_completions(shell);
    }
    let config = Config::load(cli.config.as_deref(), cli.recipes_dir)?;
    dispatch(cli.command, &config)
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands, config: &Config) -> GalleyResult<()> {
    let store = FsStore::new(&config.recipes_dir);
    match cmd {
        Commands::Init { slug } => cmd_init(&store, &slug),
        Commands::Validate { slug, all } => cmd_validate(&store, slug.as_deref(), all),
        Commands::Render {
            slug,
            format,
            target_yield,
        } => cmd_render(&store, &slug, format.unwrap_or(config.format), target_yield),
        Commands::Lineage { slug } => cmd_lineage(&store, &slug),
        Commands::List { details } => cmd_list(&store, details),
        Commands::Snapshot { slug, date, note } => {
            cmd_snapshot(&store, &slug, date.as_deref(), note.as_deref())
        }
        Commands::Iterations { slug } => cmd_iterations(&store, &slug),
        Commands::RenderIteration {
            slug,
            date,
            format,
            target_yield,
        } => cmd_render_iteration(
            &store,
            &slug,
            &date,
            format.unwrap_or(config.format),
            target_yield,
        ),
        Commands::Promote { slug, date } => cmd_promote(&store, &slug, &date),
        Commands::Drift { slug, tripwire } => cmd_drift(&store, slug.as_deref(), tripwire),
        Commands::Log { slug } => cmd_log(&store, &slug),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// "sour-dough_v2" -> "Sour Dough_v2"
fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn template(slug: &str) -> Definition {
    Definition {
        id: Some(slug.to_string()),
        lineage_id: Some("REPLACE-WITH-UUID".to_string()),
        name: Some(title_from_slug(slug)),
        iteration: Some(serde_json::Value::from(1)),
        version: Some("0.1.0".to_string()),
        authors: Some(serde_json::Value::Array(Vec::new())),
        tags: Some(serde_json::Value::Array(Vec::new())),
        yields: Some(Amount {
            amount: Some(serde_json::Value::from(1000)),
            unit: Some("g".to_string()),
            ..Amount::default()
        }),
        ingredients: Some(Vec::new()),
        steps: Some(Vec::new()),
        ..Definition::default()
    }
}

fn cmd_init(store: &FsStore, slug: &str) -> GalleyResult<()> {
    if !SLUG_REGEX.is_match(slug) {
        return Err(GalleyError::InvalidSlug {
            slug: slug.to_string(),
        });
    }
    let dir = store.recipe_dir(slug)?;
    if dir.exists() {
        return Err(GalleyError::AlreadyExists { path: dir });
    }

    let def = template(slug);
    store.write_definition(slug, &def)?;
    let name = def.name.unwrap_or_default();
    write_atomic(
        &dir.join("README.md"),
        &format!("## {}\n\nDescribe the recipe.\n", name),
    )?;
    store.append_event(
        slug,
        JournalEvent::RecipeInitialized {
            slug: slug.to_string(),
        },
    )?;

    println!("Initialized {}", dir.display());
    Ok(())
}

/// One status block per recipe: `[VALID]`, `[INVALID]` plus findings, or
/// `[ERROR]` when resolution itself failed. Returns the block and whether it
/// counts as a failure.
fn validation_block(slug: &str, resolved: GalleyResult<ResolvedRecipe>) -> (String, bool) {
    match resolved {
        Ok(doc) => {
            let report = validate::validate(&doc);
            if report.valid {
                (format!("[VALID] {}", slug), false)
            } else {
                let mut lines = vec![format!("[INVALID] {}", slug)];
                lines.extend(report.errors.iter().map(|e| format!("  - {}", e)));
                (lines.join("\n"), true)
            }
        }
        Err(e) => (format!("[ERROR] {}: {}", slug, e), true),
    }
}

fn cmd_validate(store: &FsStore, slug: Option<&str>, all: bool) -> GalleyResult<()> {
    let slugs = match slug {
        Some(s) if !all => vec![s.to_string()],
        _ => store.list_slugs()?,
    };

    let mut failed = 0;
    for slug in &slugs {
        let (block, is_failure) = validation_block(slug, resolver::resolve(store, slug));
        println!("{}", block);
        if is_failure {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(GalleyError::ValidationFailed { failed });
    }
    Ok(())
}

/// Format a resolved document, scaling first when a target yield is given.
fn render_document(
    mut doc: ResolvedRecipe,
    format: OutputFormat,
    target_yield: Option<f64>,
    label: Option<&str>,
) -> GalleyResult<String> {
    if let Some(target) = target_yield {
        scale::scale_to_yield(&mut doc, target);
    }
    match format {
        OutputFormat::Md => Ok(render::markdown(&doc, label)),
        OutputFormat::Json => render::json(&doc),
        OutputFormat::Yaml => render::yaml(&doc),
    }
}

fn cmd_render(
    store: &FsStore,
    slug: &str,
    format: OutputFormat,
    target_yield: Option<f64>,
) -> GalleyResult<()> {
    let doc = resolver::resolve(store, slug)?;
    print!("{}", render_document(doc, format, target_yield, None)?);
    Ok(())
}

fn cmd_lineage(store: &FsStore, slug: &str) -> GalleyResult<()> {
    let def = store.read_definition(slug)?;
    print!("{}", render::lineage(slug, &def));
    Ok(())
}

/// `slug  name  version  yield  [tags]`; records that fail to load show the
/// slug only.
fn list_line(slug: &str, def: GalleyResult<Definition>) -> String {
    let Ok(def) = def else {
        return slug.to_string();
    };
    let yields = def
        .yields
        .as_ref()
        .map(|y| {
            let amount = y.amount.as_ref().map(|a| a.to_string()).unwrap_or_default();
            format!("{} {}", amount, y.unit.as_deref().unwrap_or_default())
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());
    let tags = match &def.tags {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => format!(
            "[{}]",
            items.iter().map(render::plain).collect::<Vec<_>>().join(", ")
        ),
        Some(serde_json::Value::Array(_)) | Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => format!("[{}]", render::plain(other)),
    };
    format!(
        "{:<24} {:<28} {:<10} {:<10} {}",
        slug,
        def.name.as_deref().unwrap_or("-"),
        def.version.as_deref().unwrap_or("-"),
        yields,
        tags
    )
    .trim_end()
    .to_string()
}

fn cmd_list(store: &FsStore, details: bool) -> GalleyResult<()> {
    let slugs = store.list_slugs()?;
    if slugs.is_empty() {
        println!("No recipes in {}", store.root().display());
        return Ok(());
    }
    for slug in &slugs {
        if details {
            println!("{}", list_line(slug, store.read_definition(slug)));
        } else {
            println!("{}", slug);
        }
    }
    Ok(())
}

fn cmd_snapshot(
    store: &FsStore,
    slug: &str,
    date: Option<&str>,
    note: Option<&str>,
) -> GalleyResult<()> {
    let date = match date {
        Some(d) => DateKey::parse(d)?,
        None => DateKey::today(),
    };
    let outcome = iterations::snapshot(store, slug, &date, note)?;
    if let iterations::SnapshotResolution::RawOnly { reason } = &outcome.resolution {
        eprintln!("warning: stored raw definition only ({})", reason);
    }
    println!("Snapshot saved: {}", outcome.location);
    Ok(())
}

fn cmd_iterations(store: &FsStore, slug: &str) -> GalleyResult<()> {
    let rows = drift::summarize(store, slug)?;
    if rows.is_empty() {
        println!("No iterations yet.");
        return Ok(());
    }
    for row in &rows {
        let marker = if row.matches_live { "*" } else { " " };
        match &row.note {
            Some(note) => println!("{} {}  {}", marker, row.date, note),
            None => println!("{} {}", marker, row.date),
        }
    }
    Ok(())
}

fn cmd_render_iteration(
    store: &FsStore,
    slug: &str,
    date: &str,
    format: OutputFormat,
    target_yield: Option<f64>,
) -> GalleyResult<()> {
    let date = DateKey::parse(date)?;
    let it = iterations::load(store, slug, &date)?;
    print!(
        "{}",
        render_document(it.resolved, format, target_yield, Some(date.as_str()))?
    );
    Ok(())
}

fn cmd_promote(store: &FsStore, slug: &str, date: &str) -> GalleyResult<()> {
    let date = DateKey::parse(date)?;
    iterations::promote(store, slug, &date)?;
    println!("Promoted {}@{} to live definition", slug, date);
    Ok(())
}

fn cmd_drift(store: &FsStore, slug: Option<&str>, tripwire: bool) -> GalleyResult<()> {
    let findings = match slug {
        Some(slug) => drift::check_drift(store, slug)?.into_iter().collect(),
        None => drift::detect_drift(store)?,
    };

    for f in &findings {
        println!(
            "DRIFTED: {} (latest snapshot {})\n  expected: {}\n  actual:   {}",
            f.slug, f.latest_snapshot, f.expected_hash, f.actual_hash
        );
    }

    if findings.is_empty() {
        println!("No drift detected.");
    } else if tripwire {
        return Err(GalleyError::Drifted {
            count: findings.len(),
        });
    } else {
        println!("{} recipe(s) drifted", findings.len());
    }
    Ok(())
}

fn cmd_log(store: &FsStore, slug: &str) -> GalleyResult<()> {
    let events = journal::read_events(&store.recipe_dir(slug)?)?;
    if events.is_empty() {
        println!("No events recorded for {}", slug);
        return Ok(());
    }
    for e in &events {
        let line = serde_json::to_string(&e.event).map_err(|err| GalleyError::Serialize {
            what: "journal event",
            message: err.to_string(),
        })?;
        println!("{}  {}", e.ts, line);
    }
    Ok(())
}

fn cmd_completions(shell: clap_complete::Shell) -> GalleyResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
