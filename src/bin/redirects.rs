//! # Redirects CLI (`redirects`)
//!
//! Maintenance commands for the per-locale `_redirects.txt` files.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `redirects validate [files...]` | Strictly load redirect files; exit 1 on any error |
//! | `redirects test <urls...>` | Print where each URL resolves |
//! | `redirects add <from> <to>` | Validate and store a new redirect |
//! | `redirects fix [locales...]` | Recompact locales, optionally pruning orphans |
//!
//! ## Examples
//!
//! ```bash
//! CONTENT_ROOT=./files redirects validate
//! redirects --content-root ./files test /en-US/docs/Old_Slug
//! redirects add /en-US/docs/Old_Slug /en-US/docs/New_Slug
//! redirects fix en-US fr --prune
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use redirect_kernel::logging::{init_tracing, LogFormat};
use redirect_kernel::{
    AddOptions, ContentRoots, FsDocumentStore, Locale, RedirectEngine, DEFAULT_LOCALE,
};

/// Redirect maintenance for locale-partitioned documentation.
#[derive(Parser)]
#[command(name = "redirects", version, about)]
struct Cli {
    /// Root of the default-locale content.
    #[arg(long, global = true, env = "CONTENT_ROOT")]
    content_root: Option<PathBuf>,

    /// Root holding every other locale.
    #[arg(long, global = true, env = "CONTENT_TRANSLATED_ROOT")]
    translated_root: Option<PathBuf>,

    /// Newline-separated list of archived URLs that count as existing.
    #[arg(long, global = true, env = "ARCHIVED_URLS_FILE")]
    archived_urls: Option<PathBuf>,

    /// Log every file checked and every warning.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Check the _redirects.txt file(s).
    ///
    /// Every file must parse, and no file may contain a redirect cycle.
    /// Without arguments, every locale folder under the roots is checked.
    Validate {
        /// Files to check instead of discovering them.
        files: Vec<PathBuf>,
    },

    /// Test URLs (pathnames) to see if they redirect.
    Test {
        /// URLs to test.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Add a new redirect.
    ///
    /// The locale is taken from the from-URL.
    Add {
        /// From-URL.
        from: String,
        /// To-URL.
        to: String,
    },

    /// Consolidate/fix redirects.
    Fix {
        /// Locales to fix (default: en-US).
        locales: Vec<String>,

        /// Also remove redirects whose source exists or whose target is gone.
        #[arg(long)]
        prune: bool,
    },
}

impl Cli {
    fn roots(&self) -> Result<ContentRoots> {
        let content_root = self
            .content_root
            .clone()
            .context("--content-root or CONTENT_ROOT must be set")?;
        let mut roots = ContentRoots::new(content_root);
        if let Some(translated) = &self.translated_root {
            roots = roots.with_translated_root(translated);
        }
        if let Some(archived) = &self.archived_urls {
            roots = roots.with_archived_urls_file(archived);
        }
        Ok(roots)
    }

    fn engine(&self) -> Result<RedirectEngine<FsDocumentStore>> {
        let roots = self.roots()?;
        let documents = FsDocumentStore::open(roots.clone())?;
        Ok(RedirectEngine::new(roots, documents))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = if cli.verbose { "redirect_kernel=debug" } else { "redirect_kernel=warn" };
    init_tracing(LogFormat::from_env(LogFormat::Pretty), filter);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let engine = cli.engine()?;

    match &cli.command {
        Commands::Validate { files } => {
            let files = (!files.is_empty()).then_some(files.as_slice());
            let table = engine.load(files, true).context("invalid redirects")?;
            println!(
                "All is well in the world of redirects ({} redirects in {} files)",
                table.len(),
                table.files()
            );
        }

        Commands::Test { urls } => {
            for url in urls {
                let resolution = engine.lookup(url);
                if resolution.is_redirect() {
                    println!("{:<50} -> {}", url, resolution.target);
                } else {
                    println!("{:<50} Not a redirecting URL", url);
                }
            }
        }

        Commands::Add { from, to } => {
            let pair = engine
                .validate_pair(from, to)
                .with_context(|| format!("cannot redirect '{}' to '{}'", from, to))?;
            let locale = pair.from.locale();
            let outcome = engine.add(locale.as_str(), &[(from.as_str(), to.as_str())], AddOptions::default())?;
            println!("Saved '{}' → '{}' ({})", pair.from, pair.to, outcome.path.display());
        }

        Commands::Fix { locales, prune } => {
            let locales = if locales.is_empty() {
                vec![DEFAULT_LOCALE]
            } else {
                locales
                    .iter()
                    .map(|code| Locale::parse(code).with_context(|| format!("'{}' is not a valid locale", code)))
                    .collect::<Result<Vec<_>>>()?
            };
            let options = AddOptions {
                fix: *prune,
                ..AddOptions::default()
            };
            for locale in locales {
                let outcome = engine.add::<&str>(locale.as_str(), &[], options)?;
                println!(
                    "Fixed {}: {} redirects, {} cycles dropped, {} orphans pruned{}",
                    locale,
                    outcome.pairs.len(),
                    outcome.cycles.len(),
                    outcome.orphans_removed.len(),
                    if outcome.changed { "" } else { " (unchanged)" }
                );
            }
        }
    }

    Ok(())
}
