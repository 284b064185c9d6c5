//! CLI binary for book2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `DownloadConfig`, prompts for a book URL when none is given, and renders
//! progress.

use anyhow::{bail, Context, Result};
use book2pdf::{
    download, Credentials, DownloadConfig, DownloadOutput, DownloadProgressCallback,
    ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Account file loaded before flag parsing so `--email`/`--password` env
/// fallbacks can come from it.
const DEFAULT_ACCOUNT_FILE: &str = "account.env";

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar fed by the monitor's poll ticks,
/// plus per-page log lines. Pages complete out of order, so the bar position
/// tracks the registry size rather than counting events.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_run_start` once
    /// discovery knows the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Logging in…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Downloading");
    }
}

impl DownloadProgressCallback for CliProgressCallback {
    fn on_run_start(&self, expected_pages: usize) {
        self.activate_bar(expected_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Downloading {expected_pages} pages…"))
        ));
    }

    fn on_page_complete(&self, page: u32) {
        self.bar
            .println(format!("  {} Page {:>4}", green("✓"), page));
    }

    fn on_page_error(&self, page: u32, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Page {:>4}  {}", red("✗"), page, red(&msg)));
    }

    fn on_progress(&self, completed: usize, _expected: usize) {
        self.bar.set_position(completed as u64);
    }

    fn on_run_complete(&self, completed: usize, expected: usize) {
        let failed = expected.saturating_sub(completed);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages downloaded",
                green("✔"),
                bold(&completed.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages downloaded  ({} failed)",
                if completed == 0 { red("✘") } else { cyan("⚠") },
                bold(&completed.to_string()),
                expected,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive: prompts for the book URL
  book2pdf

  # Direct
  book2pdf https://urait.ru/book/some-book-123456

  # Into a directory, quieter fetch pace
  book2pdf -o downloads --concurrency 2 https://urait.ru/book/some-book-123456

  # Stats as JSON, no prompts (for scripts)
  book2pdf --json --no-wait https://urait.ru/book/some-book-123456

ACCOUNT SETUP:
  Create an account.env file next to the binary (or pass --account-file):

    BOOK2PDF_EMAIL=reader@example.com
    BOOK2PDF_PASSWORD=secret

  Both values can also be passed as environment variables or flags.

ENVIRONMENT VARIABLES:
  BOOK2PDF_EMAIL          Account email
  BOOK2PDF_PASSWORD       Account password
  BOOK2PDF_BASE_URL       Override the service base URL
  BOOK2PDF_OUTPUT_DIR     Where the bound PDF is written
  BOOK2PDF_CONCURRENCY    Concurrent page fetches (default 4)
"#;

/// Download a book from its page viewer and bind it into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "book2pdf",
    version,
    about = "Download a book from its SVG page viewer and bind it into one PDF",
    long_about = "Download paginated books served page-by-page as SVG behind an authenticated \
session, convert each page to PDF, and bind everything into a single file named after the \
book title. Pages that fail to fetch or convert are skipped; the rest of the book is kept.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Book landing-page URL (…/book/…). Prompted for on stdin when omitted.
    url: Option<String>,

    /// Directory the bound PDF is written to.
    #[arg(short, long, env = "BOOK2PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Account email.
    #[arg(long, env = "BOOK2PDF_EMAIL")]
    email: Option<String>,

    /// Account password.
    #[arg(long, env = "BOOK2PDF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Env-file with BOOK2PDF_EMAIL / BOOK2PDF_PASSWORD.
    #[arg(long, default_value = DEFAULT_ACCOUNT_FILE)]
    account_file: PathBuf,

    /// Service base URL.
    #[arg(long, env = "BOOK2PDF_BASE_URL", default_value = "https://urait.ru")]
    base_url: String,

    /// Number of concurrent page fetches.
    #[arg(short, long, env = "BOOK2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Trailing page numbers the viewer reports but never serves.
    #[arg(long, env = "BOOK2PDF_TRAILING_MARGIN", default_value_t = 1)]
    trailing_margin: u32,

    /// Per-request timeout in seconds.
    #[arg(long, env = "BOOK2PDF_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Print run stats as JSON instead of the human summary.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "BOOK2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Skip the desktop notification on completion.
    #[arg(long)]
    no_notify: bool,

    /// Exit without waiting for a final keypress.
    #[arg(long)]
    no_wait: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BOOK2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BOOK2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load the default account file before parsing so clap's env fallbacks
    // see its values.
    if Path::new(DEFAULT_ACCOUNT_FILE).exists() {
        let _ = dotenvy::from_path(DEFAULT_ACCOUNT_FILE);
    }
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters. The renderer's own parse
    // warnings stay quiet unless explicitly requested via RUST_LOG.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{filter},usvg=error,svg2pdf=error"))),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve the book URL ─────────────────────────────────────────────
    let url = match cli.url.clone() {
        Some(url) => url,
        None => match prompt_for_url() {
            Ok(url) => url,
            Err(e) => {
                eprintln!("{} {e:#}", red("✘"));
                wait_for_ack(&cli);
                std::process::exit(1);
            }
        },
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let result = run(&cli, &url, show_progress).await;
    match &result {
        Ok(output) => {
            if cli.json {
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("{} Failed to serialise output: {e}", red("✘")),
                }
            } else if !cli.quiet {
                eprintln!(
                    "{}  {}/{} pages  {}  →  {}",
                    if output.is_complete() { green("✔") } else { cyan("⚠") },
                    output.stats.completed_pages,
                    output.stats.expected_pages,
                    dim(&format!("{}ms", output.stats.duration_ms)),
                    bold(&output.output_path.display().to_string()),
                );
            }

            if !cli.no_notify {
                notify(&output.book.title, &url);
            }
        }
        Err(e) => {
            eprintln!("{} {e:#}", red("✘"));
        }
    }

    wait_for_ack(&cli);
    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: &Cli, url: &str, show_progress: bool) -> Result<DownloadOutput> {
    let credentials = resolve_credentials(cli)?;

    let mut builder = DownloadConfig::builder(credentials)
        .base_url(&cli.base_url)
        .concurrency(cli.concurrency)
        .trailing_margin(cli.trailing_margin)
        .fetch_timeout_secs(cli.fetch_timeout)
        .output_dir(&cli.output_dir);

    if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        builder = builder.progress(cb as ProgressCallback);
    }

    let config = builder.build().context("Invalid configuration")?;
    let output = download(url, &config).await.context("Download failed")?;
    Ok(output)
}

/// Credentials from flags/env, falling back to a non-default account file.
fn resolve_credentials(cli: &Cli) -> Result<Credentials> {
    let mut email = cli.email.clone();
    let mut password = cli.password.clone();

    if (email.is_none() || password.is_none()) && cli.account_file.exists() {
        let _ = dotenvy::from_path(&cli.account_file);
        email = email.or_else(|| std::env::var("BOOK2PDF_EMAIL").ok());
        password = password.or_else(|| std::env::var("BOOK2PDF_PASSWORD").ok());
    }

    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
        _ => bail!(
            "No account configured.\nPut BOOK2PDF_EMAIL and BOOK2PDF_PASSWORD in '{}' \
             or pass --email/--password.",
            cli.account_file.display()
        ),
    }
}

fn prompt_for_url() -> Result<String> {
    eprint!("Enter the book URL (e.g. https://urait.ru/book/...): ");
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read URL from stdin")?;
    let url = line.trim().to_string();
    if url.is_empty() {
        bail!("No URL given");
    }
    Ok(url)
}

/// Desktop notification on completion; failures only show up in debug logs.
fn notify(title: &str, url: &str) {
    let result = notify_rust::Notification::new()
        .summary("Book downloaded")
        .body(&format!("{title}\n{url}"))
        .show();
    if let Err(e) = result {
        tracing::debug!("Desktop notification failed: {e}");
    }
}

/// The final acknowledgement keypress, so a double-clicked console window
/// doesn't vanish with its output.
fn wait_for_ack(cli: &Cli) {
    if cli.no_wait {
        return;
    }
    eprint!("\nPress Enter to exit");
    io::stderr().flush().ok();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}
