use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};

use typist::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    corpus::{BuiltinCorpus, FileCorpus, TextProvider},
    logging,
    results::CsvResultsStore,
    runtime::{CrosstermEventSource, EventSource, Runner},
    ui,
};

/// terminal typing speed test with per-user history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type a random line of text as fast as you can. Exact matches are saved per user and charted over time."
)]
pub struct Cli {
    /// text file with one typing sample per line (default: builtin corpus)
    #[clap(short = 'c', long)]
    corpus: Option<PathBuf>,

    /// CSV file completed tests are appended to
    #[clap(short = 'r', long)]
    results: Option<PathBuf>,

    /// pre-fill the name field
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// log more detail (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// where to write the log
    #[clap(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(e) = logging::init_logging(cli.verbose, &log_path) {
        eprintln!("warning: {e}");
    }

    let config_store = FileConfigStore::new();
    let config = config_store.load();

    let provider = corpus_provider(cli.corpus.clone().or(config.corpus_path.clone()));

    let results_path = cli
        .results
        .clone()
        .unwrap_or_else(|| config.results_path_or_default());
    let store = CsvResultsStore::new(&results_path);
    if let Err(e) = store.initialize() {
        warn!(path = %store.path().display(), error = %e, "cannot create results file");
    }
    info!(results = %store.path().display(), "starting");

    let username = cli
        .name
        .clone()
        .or(config.last_username.clone())
        .unwrap_or_default();

    let mut app = App::new(provider, Box::new(store))
        .with_config(Box::new(config_store), config)
        .with_username(username);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new());
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn corpus_provider(path: Option<PathBuf>) -> Box<dyn TextProvider> {
    match path {
        Some(path) => {
            let corpus = FileCorpus::new(path);
            info!(corpus = %corpus.path().display(), "using corpus file");
            Box::new(corpus)
        }
        None => {
            let corpus = BuiltinCorpus;
            if corpus.is_empty() {
                warn!("builtin corpus has no usable lines");
            } else {
                info!(lines = corpus.len(), "using builtin corpus");
            }
            Box::new(corpus)
        }
    }
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    while let Some(event) = runner.next_event() {
        if app.handle_event(event) == Control::Quit {
            break;
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
