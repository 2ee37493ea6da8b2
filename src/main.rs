use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gitward::audit::{AuditLogger, AuditSink, TracingAudit};
use gitward::config::{Config, UiStateStore};
use gitward::git::repository;
use gitward::ui::App;
use gitward::{AppResult, GitExecutor, GitVersion, RepositoryRegistry};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    let config = Config::load_or_default()?;
    init_logging(&Config::config_dir()?.join("gitward.log"))?;

    // Optional first argument: any path inside the working directory
    let root = match env::args_os().nth(1) {
        Some(start) => repository::discover_from(PathBuf::from(start))?,
        None => repository::discover()?,
    };

    let audit: Arc<dyn AuditSink> = if config.audit.enabled {
        Arc::new(AuditLogger::with_path(config.audit_path()?)?)
    } else {
        Arc::new(TracingAudit)
    };
    let executor = GitExecutor::new(&root)
        .with_binary(config.git.binary.clone())
        .with_locale_c(config.git.locale_c)
        .with_audit(audit);

    let version = GitVersion::validate(&executor).await?;
    eprintln!("Git version: {}", version);
    info!(%version, root = %root.display(), "starting");

    let registry = RepositoryRegistry::discover(executor, config.ui.include_submodules).await?;
    let ui_state = UiStateStore::open_default()?;
    let mut app = App::new(
        registry,
        ui_state,
        Duration::from_millis(config.ui.refresh_interval_ms),
    );

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result?;
    info!("exiting");
    Ok(())
}

/// Diagnostics go to a file; the terminal belongs to the TUI
fn init_logging(log_path: &Path) -> io::Result<()> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("GITWARD_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
