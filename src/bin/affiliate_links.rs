//! Command-line front end for the affiliate link catalogs.
//!
//! `check` reports conformance problems, `convert` regenerates v1 files from
//! v2 sources, `diff` applies the version-bump rules to two revisions of a
//! file, `stale` shows what a cached client would refetch, `bump` records an
//! item edit in place and `url` prints where a category is served. Reports go
//! to stdout; logs go to stderr (`RUST_LOG` controls verbosity).

use affiliate_links::{
    CategoryId, ItemId, SchemaGeneration, category_url, check_dir, check_file,
    config::Config,
    convert::{ConvertOptions, convert_dir},
    find_data_root, load_document_from_path, resolve_config,
    revision::{diff_documents, needs_refresh, record_edits, stale_items},
    save_document,
    schema_loader::{CategorySchema, SchemaLoadOptions, load_category_schema},
    today,
};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::Url;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

/// Author, convert and check affiliate link category documents.
#[derive(Parser)]
#[command(name = "affiliate-links", version, about)]
struct Cli {
    /// TOML config file (defaults to affiliate-links.toml in the data root).
    #[arg(long, global = true, env = "AFFILIATE_LINKS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the v{major}/ folders.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Schema generation to operate on (overrides the config file).
    #[arg(long, global = true)]
    generation: Option<SchemaGeneration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report conformance violations for files or directories.
    Check {
        /// Files or directories; defaults to the generation directory.
        paths: Vec<PathBuf>,
        /// Validate against this schema file instead of the built-in one.
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Convert v2 category files into v1 documents.
    Convert {
        /// Directory of v2 files (defaults to <root>/v2).
        #[arg(long)]
        from: Option<PathBuf>,
        /// Output directory (defaults to <root>/v1).
        #[arg(long)]
        to: Option<PathBuf>,
        /// lastUpdated for every converted file (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Document version to stamp (overrides the config file).
        #[arg(long)]
        document_version: Option<i64>,
    },
    /// Compare two revisions of a category and check the version bumps.
    Diff {
        previous: PathBuf,
        next: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List items a client holding CACHED must refetch after FETCHED.
    Stale { cached: PathBuf, fetched: PathBuf },
    /// Record an edit to an item: bump itemVersion, version and lastUpdated.
    Bump {
        /// Category file, or a category id resolved under the data root.
        target: String,
        /// Item whose links were edited.
        #[arg(long, required = true)]
        item: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the URL a category is served from.
    Url {
        category: String,
        /// Hosting base URL (overrides publish.base_url).
        #[arg(long)]
        base: Option<Url>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

struct Session {
    config: Config,
    generation: SchemaGeneration,
    root: Option<PathBuf>,
}

impl Session {
    fn root(&self) -> Result<&Path> {
        match self.root.as_deref() {
            Some(root) => Ok(root),
            None => bail!(
                "no data root found; pass --root or set {}",
                affiliate_links::ROOT_ENV
            ),
        }
    }

    fn generation_dir(&self) -> Result<PathBuf> {
        Ok(self.root()?.join(self.generation.dir_name()))
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let discovery_generation = cli.generation.unwrap_or_default();
    let root = match cli.root.clone() {
        Some(root) => Some(root),
        None => find_data_root(discovery_generation).ok(),
    };
    let config = resolve_config(cli.config.as_deref(), root.as_deref())?;
    let generation = cli.generation.unwrap_or(config.publish.generation);
    let ctx = Session {
        config,
        generation,
        root,
    };

    match cli.command {
        Command::Check {
            paths,
            schema,
            format,
        } => run_check(&ctx, paths, schema.as_deref(), format),
        Command::Convert {
            from,
            to,
            date,
            document_version,
        } => run_convert(&ctx, from, to, date, document_version),
        Command::Diff {
            previous,
            next,
            format,
        } => run_diff(&previous, &next, format),
        Command::Stale { cached, fetched } => run_stale(&cached, &fetched),
        Command::Bump { target, item, date } => run_bump(&ctx, &target, &item, date),
        Command::Url { category, base } => run_url(&ctx, &category, base),
    }
}

fn run_check(
    ctx: &Session,
    paths: Vec<PathBuf>,
    schema_path: Option<&Path>,
    format: OutputFormat,
) -> Result<bool> {
    let generation_label = ctx.generation.to_string();
    let schema: CategorySchema = load_category_schema(SchemaLoadOptions {
        schema_path,
        expected_generation: Some(&generation_label),
    })?;

    let paths = if paths.is_empty() {
        vec![ctx.generation_dir()?]
    } else {
        paths
    };

    let mut violations = Vec::new();
    for path in &paths {
        if path.is_dir() {
            violations.extend(check_dir(path, &schema)?);
        } else {
            violations.extend(check_file(path, &schema));
        }
    }

    match format {
        OutputFormat::Json => print_json(&violations)?,
        OutputFormat::Text => {
            for violation in &violations {
                println!("{violation}");
            }
        }
    }
    if violations.is_empty() {
        log::info!("[check] no violations");
    } else {
        log::warn!("[check] {} violations", violations.len());
    }
    Ok(violations.is_empty())
}

fn run_convert(
    ctx: &Session,
    from: Option<PathBuf>,
    to: Option<PathBuf>,
    date: Option<NaiveDate>,
    document_version: Option<i64>,
) -> Result<bool> {
    let from = match from {
        Some(dir) => dir,
        None => ctx.root()?.join("v2"),
    };
    let to = match to {
        Some(dir) => dir,
        None => ctx.generation_dir()?,
    };

    let mut options = ConvertOptions::from_config(&ctx.config.convert, date.unwrap_or_else(today));
    if let Some(version) = document_version {
        if version < 0 {
            bail!("--document-version must be non-negative");
        }
        options.document_version = version;
    }

    let summary = convert_dir(&from, &to, &options)?;
    println!(
        "converted {} file(s), failed {} file(s), output {}",
        summary.converted.len(),
        summary.failed.len(),
        to.display()
    );
    for failed in &summary.failed {
        println!("  failed {}: {}", failed.file, failed.error);
    }
    Ok(summary.is_success())
}

fn run_diff(previous: &Path, next: &Path, format: OutputFormat) -> Result<bool> {
    let before = load_document_from_path(previous)?;
    let after = load_document_from_path(next)?;
    let report = diff_documents(&before, &after);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!(
                "{}: version {} -> {}, lastUpdated {} -> {}",
                after.category_id, before.version, after.version, before.last_updated,
                after.last_updated
            );
            for (label, ids) in [
                ("added", &report.added),
                ("removed", &report.removed),
                ("changed", &report.changed),
            ] {
                for id in ids {
                    println!("  {label} {id}");
                }
            }
            for violation in &report.violations {
                println!("  violation {violation}");
            }
        }
    }
    Ok(report.is_clean())
}

fn run_stale(cached: &Path, fetched: &Path) -> Result<bool> {
    let cached = load_document_from_path(cached)?;
    let fetched = load_document_from_path(fetched)?;
    if !needs_refresh(&cached, &fetched) {
        log::info!("[stale] {} is up to date", fetched.category_id);
        return Ok(true);
    }
    for id in stale_items(&cached, &fetched) {
        println!("{id}");
    }
    Ok(true)
}

fn run_bump(ctx: &Session, target: &str, items: &[String], date: Option<NaiveDate>) -> Result<bool> {
    let path = resolve_category_target(ctx, target)?;
    let mut doc = load_document_from_path(&path)?;
    let edit_date = date.unwrap_or_else(today);
    let item_ids: Vec<ItemId> = items.iter().map(|item| ItemId(item.clone())).collect();
    record_edits(&mut doc, &item_ids, edit_date)
        .with_context(|| format!("bumping {}", path.display()))?;
    save_document(&path, &doc)?;
    println!(
        "{}: version {}, lastUpdated {}",
        doc.category_id, doc.version, doc.last_updated
    );
    Ok(true)
}

fn run_url(ctx: &Session, category: &str, base: Option<Url>) -> Result<bool> {
    let base = match base {
        Some(base) => base,
        None => ctx.config.publish.base_url()?,
    };
    let url = category_url(&base, ctx.generation, &CategoryId(category.to_string()))?;
    println!("{url}");
    Ok(true)
}

/// A path to an existing file, or a category id looked up under the root.
fn resolve_category_target(ctx: &Session, target: &str) -> Result<PathBuf> {
    let as_path = PathBuf::from(target);
    if as_path.is_file() {
        return Ok(as_path);
    }
    let candidate = affiliate_links::layout::category_file(
        ctx.root()?,
        ctx.generation,
        &CategoryId(target.to_string()),
    );
    if !candidate.is_file() {
        bail!("category '{target}' not found (looked for {})", candidate.display());
    }
    Ok(candidate)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
