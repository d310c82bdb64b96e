//! CLI entry point for openqr
//!
//! Provides commands for listening to a scanner, generating QR codes,
//! and managing history and settings.

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::*;
use openqr::{
    config::{escapes::decode_escapes, Settings, SettingsStore},
    core::{
        timeout_from_secs, DomainPolicy, HomeHandle, HomeLoop, HookStatus, InputHook,
        ScanFrameAssembler,
    },
    generator::{load_logo, overlay_logo, QrGenerator, QrStyle},
    history::HistoryStore,
    input::{LineHook, TerminalHook},
    watcher::SettingsWatcher,
};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

/// How often `listen` checks the settings file for edits
const RELOAD_INTERVAL: Duration = Duration::from_millis(500);

/// Output file for `generate` when neither `--output` nor `--copy` is given
const DEFAULT_OUTPUT: &str = "qr_code.png";

#[derive(Parser)]
#[command(name = "openqr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for scanner input and print scanned URLs
    Listen(ListenArgs),

    /// Generate a QR code for a URL
    Generate(GenerateArgs),

    /// Show or clear scan history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Inspect or edit settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage cached QR codes
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args)]
struct ListenArgs {
    /// Read newline-terminated scans from stdin instead of raw key events
    #[arg(long)]
    stdin: bool,

    /// Scan prefix, escaped (e.g. "qr_")
    #[arg(long)]
    prefix: Option<String>,

    /// Scan suffix, escaped (e.g. "\r" or "<tab>")
    #[arg(long)]
    suffix: Option<String>,

    /// Inactivity timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<f64>,

    /// Exit after the first scan
    #[arg(long)]
    once: bool,

    /// Do not record scans in history
    #[arg(long)]
    no_history: bool,

    /// Open every accepted URL in the default browser (allowlisted hosts
    /// always open)
    #[arg(long)]
    open: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// URL to encode
    url: String,

    /// Output PNG file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Module colour (name or #rrggbb)
    #[arg(long)]
    fill: Option<String>,

    /// Background colour (name or #rrggbb)
    #[arg(long)]
    back: Option<String>,

    /// Logo image to centre on the code
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Copy the image to the clipboard
    #[arg(long)]
    copy: bool,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List recorded scans
    List,
    /// Delete all recorded scans
    Clear,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory
    Path,
    /// Delete every cached QR code
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print effective settings
    Show,
    /// Print the settings file path
    Path,
    /// Store a new scan prefix and suffix (escaped)
    SetFraming {
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long)]
        suffix: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    openqr::logging::init(cli.verbose);

    let store = match cli.config {
        Some(path) => SettingsStore::new(expand_path(&path)?),
        None => SettingsStore::new(SettingsStore::default_path()),
    };

    match cli.command {
        Commands::Listen(args) => listen(&store, args)?,
        Commands::Generate(args) => generate(&store, args)?,
        Commands::History { action } => history(&store, action)?,
        Commands::Config { action } => config(&store, action)?,
        Commands::Cache { action } => cache(action)?,
    }

    Ok(())
}

/// Expands `~` and environment variables in a user-supplied path
fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let raw = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?;
    let expanded = shellexpand::full(raw).with_context(|| format!("Cannot expand {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn load_settings(store: &SettingsStore) -> anyhow::Result<Settings> {
    store
        .load()
        .with_context(|| format!("Failed to load settings from {}", store.path().display()))
}

/// Run the scanner listener until interrupted
fn listen(store: &SettingsStore, args: ListenArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(store)?;
    let framing_overridden = args.prefix.is_some() || args.suffix.is_some();

    if let Some(prefix) = args.prefix {
        settings.scanner.prefix = prefix;
    }
    if let Some(suffix) = args.suffix {
        settings.scanner.suffix = suffix;
    }
    if let Some(timeout) = args.timeout {
        settings.scanner.timeout_secs = timeout;
    }
    if args.once {
        settings.scanner.stop_after_first_scan = true;
    }

    let config = settings
        .scanner
        .assembler_config()
        .context("Invalid scanner settings")?;

    let mut home = HomeLoop::new();
    let assembler = ScanFrameAssembler::new(config, home.handle());

    let sink = ScanSink {
        policy: settings.domains.policy(),
        safe_schemes: settings.domains.safe_schemes.clone(),
        history: (!args.no_history)
            .then(|| HistoryStore::open(store.history_path(), settings.history.max_items)),
        open_urls: args.open || settings.domains.open_urls,
        raw_mode: !args.stdin,
        quit_after: args.once.then(|| home.handle()),
    };
    assembler.connect(move |payload| sink.handle(payload));

    let quit = home.handle();
    let hook: Box<dyn InputHook> = if args.stdin {
        Box::new(LineHook::stdin().on_eof(move || quit.quit()))
    } else {
        Box::new(TerminalHook::new().on_interrupt(move || quit.quit()))
    };
    assembler.attach_hook(hook);

    if framing_overridden {
        tracing::info!("Framing given on the command line; settings reload disabled");
    } else {
        match SettingsWatcher::new(store.path()) {
            Ok(watcher) => poll_settings(watcher, store.clone(), assembler.clone()),
            Err(e) => tracing::warn!(error = %e, "Settings reload unavailable"),
        }
    }

    eprintln!(
        "{} Listening for scans ({})",
        "→".cyan(),
        assembler.framing()
    );
    if args.stdin {
        eprintln!("{}", "  One scan per line; end input to stop.".dimmed());
    } else {
        eprintln!("{}", "  Press Esc or Ctrl+C to stop.".dimmed());
    }

    match assembler.start() {
        HookStatus::Scheduled => {}
        HookStatus::NoHook | HookStatus::HostUnavailable => bail!("Input hook could not be scheduled"),
    }

    // Runs the queued install so a failed hook is reported instead of hanging
    home.run_pending();
    if !assembler.hook_installed() {
        assembler.stop();
        home.run_pending();
        bail!("Failed to capture input (is this a terminal? try --stdin)");
    }

    home.run();

    assembler.stop();
    home.run_pending();
    eprintln!("{} Stopped listening", "✓".green());

    Ok(())
}

/// Validates, prints, records and optionally opens completed scans
struct ScanSink {
    policy: DomainPolicy,
    safe_schemes: Vec<String>,
    history: Option<HistoryStore>,
    open_urls: bool,
    raw_mode: bool,
    quit_after: Option<HomeHandle>,
}

impl ScanSink {
    fn handle(&self, payload: &str) {
        match self.policy.check_payload(payload, &self.safe_schemes) {
            Ok((url, host)) => {
                self.print(format_args!(
                    "{} {} {}",
                    "✓".green(),
                    url.as_str().bold(),
                    format!("({host})").dimmed()
                ));

                if let Some(history) = &self.history {
                    if let Err(e) = history.add(url.as_str()) {
                        tracing::warn!(error = %e, "Failed to record scan in history");
                    }
                }

                if self.policy.should_open(&host, self.open_urls) {
                    match open::that(url.as_str()) {
                        Ok(()) => tracing::info!(url = %url, "Opened scanned URL"),
                        Err(e) => tracing::warn!(url = %url, error = %e, "Failed to open URL"),
                    }
                }
            }
            Err(e) => {
                self.print(format_args!("{} {} {}", "✗".red(), payload, format!("({e})").yellow()));
            }
        }

        if let Some(home) = &self.quit_after {
            home.quit();
        }
    }

    fn print(&self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = write_line(&mut io::stdout().lock(), line, self.raw_mode) {
            tracing::debug!(error = %e, "Failed to write scan to stdout");
        }
    }
}

/// Writes and flushes one line, ending it with `\r\n` in raw mode
fn write_line<W: Write>(out: &mut W, line: std::fmt::Arguments<'_>, raw_mode: bool) -> io::Result<()> {
    let eol = if raw_mode { "\r\n" } else { "\n" };
    write!(out, "{line}{eol}")?;
    out.flush()
}

/// Re-applies framing and timeout whenever the settings file changes
fn poll_settings(watcher: SettingsWatcher, store: SettingsStore, assembler: ScanFrameAssembler) {
    if watcher.check_for_changes() {
        match store.load() {
            Ok(settings) => match settings.scanner.framing() {
                Ok((prefix, suffix)) => {
                    assembler.set_framing(&prefix, &suffix);
                    if let Ok(timeout) = timeout_from_secs(settings.scanner.timeout_secs) {
                        assembler.set_inactivity_timeout(timeout);
                    }
                    tracing::info!(framing = %assembler.framing(), "Settings reloaded");
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring invalid framing"),
            },
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable settings"),
        }
    }

    let home = assembler.home().clone();
    let next = move || poll_settings(watcher, store, assembler);
    if home.post_after(RELOAD_INTERVAL, next).is_err() {
        tracing::debug!("Home loop gone; settings reload stopped");
    }
}

/// Generate a QR code, then save and/or copy it
fn generate(store: &SettingsStore, args: GenerateArgs) -> anyhow::Result<()> {
    let settings = load_settings(store)?;
    let style = QrStyle::new(
        args.fill.unwrap_or(settings.generator.fill_color),
        args.back.unwrap_or(settings.generator.back_color),
    );

    let generator = QrGenerator::new().context("Failed to prepare QR cache")?;
    let mut image = generator.generate(&args.url, &style)?;

    if let Some(logo_path) = args.logo.or(settings.generator.logo_path) {
        let logo_path = expand_path(&logo_path)?;
        let logo = load_logo(&logo_path)
            .with_context(|| format!("Failed to load logo {}", logo_path.display()))?;
        overlay_logo(&mut image, &logo);
    }

    let output = match args.output {
        Some(path) => Some(expand_path(&path)?),
        None if !args.copy => Some(PathBuf::from(DEFAULT_OUTPUT)),
        None => None,
    };

    if let Some(path) = output {
        generator.save(&image, &path)?;
        println!("{} Saved {}", "✓".green(), path.display());
    }

    if args.copy {
        generator.copy_to_clipboard(&image)?;
        println!("{} Copied to clipboard", "✓".green());
    }

    Ok(())
}

fn history(store: &SettingsStore, action: HistoryAction) -> anyhow::Result<()> {
    let settings = load_settings(store)?;
    let history = HistoryStore::open(store.history_path(), settings.history.max_items);

    match action {
        HistoryAction::List => {
            let records = history.load()?;
            if records.is_empty() {
                println!("{}", "No scans recorded".dimmed());
                return Ok(());
            }

            for record in &records {
                println!(
                    "{} {} {}",
                    format!("{:>4}.", record.id).dimmed(),
                    record.timestamp.cyan(),
                    record.url
                );
            }
            println!("\n{} Total: {} scans", "✓".green(), records.len());
        }
        HistoryAction::Clear => {
            history.clear()?;
            println!("{} History cleared", "✓".green());
        }
    }

    Ok(())
}

fn config(store: &SettingsStore, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = load_settings(store)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Path => println!("{}", store.path().display()),
        ConfigAction::SetFraming { prefix, suffix } => {
            let prefix = decode_escapes(&prefix).context("Invalid prefix")?;
            let suffix = decode_escapes(&suffix).context("Invalid suffix")?;

            let mut settings = load_settings(store)?;
            settings.scanner.set_framing(&prefix, &suffix);
            store.save(&settings)?;

            let (prefix, suffix) = settings.scanner.framing()?;
            println!(
                "{} Framing set to {}",
                "✓".green(),
                openqr::core::Framing::new(&prefix, &suffix)
            );
        }
    }

    Ok(())
}

fn cache(action: CacheAction) -> anyhow::Result<()> {
    let generator = QrGenerator::new().context("Failed to prepare QR cache")?;

    match action {
        CacheAction::Path => println!("{}", generator.cache_dir().display()),
        CacheAction::Clear => {
            let removed = generator.clear_cache()?;
            println!(
                "{} Removed {} cached code{}",
                "✓".green(),
                removed,
                if removed == 1 { "" } else { "s" }
            );
        }
    }

    Ok(())
}
