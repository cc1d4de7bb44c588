use clap::{error::ErrorKind, CommandFactory, Parser};
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
    sync::Arc,
    time::Duration,
};

use quizr::app::App;
use quizr::app_dirs::AppDirs;
use quizr::catalog;
use quizr::config::{ConfigStore, FileConfigStore};
use quizr::runtime::{CrosstermEventSource, QuizEvent, Runner};
use quizr::session::{Session, WrongAnswer};
use quizr::sets::{BundledSource, Choice, HttpSource, SetSource};
use quizr::store::JsonFileStore;
use quizr::{logging, ui};

const TICK_RATE_MS: u64 = 250;

/// terminal self-quiz with saved selections and wrong-answer review
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal self-quiz: pick a question set, answer multiple-choice questions, \
see explanations, and review everything you ever got wrong. Selections and the \
wrong-answer ledger persist between runs."
)]
pub struct Cli {
    /// question set to start with
    #[clap(short = 's', long)]
    set: Option<String>,

    /// base url to fetch question sets from instead of the bundled content
    #[clap(long)]
    source_url: Option<String>,

    /// directory for saved selections and the wrong-answer ledger
    #[clap(long)]
    state_dir: Option<PathBuf>,

    /// list the available question sets and exit
    #[clap(long)]
    list_sets: bool,
}

type FileApp = App<JsonFileStore<Choice>, JsonFileStore<WrongAnswer>>;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_sets {
        for name in catalog::names() {
            println!("{name}");
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    logging::init();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if cli.source_url.is_some() {
        config.source_url = cli.source_url.clone();
    }

    let source: Arc<dyn SetSource> = match &config.source_url {
        Some(base) => Arc::new(HttpSource::new(base.clone())),
        None => Arc::new(BundledSource),
    };

    let (selections_path, wrong_answers_path) = state_paths(&cli);
    let session = Session::new(
        JsonFileStore::open(selections_path),
        JsonFileStore::open(wrong_answers_path),
    );

    let start_set = cli
        .set
        .clone()
        .or_else(|| config.last_set.clone().filter(|s| catalog::contains(s)))
        .unwrap_or_else(|| catalog::first().to_string());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let tx = events.sender();
    let runner = Runner::new(events, Duration::from_millis(TICK_RATE_MS));

    let mut app = App::new(session, source, tx);
    app.request_set(&start_set);

    let result = run_loop(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Next launch resumes on whatever set the learner ended on.
    config.last_set = app.session.active_set_name().map(str::to_string);
    let _ = config_store.save(&config);

    result
}

fn state_paths(cli: &Cli) -> (PathBuf, PathBuf) {
    match &cli.state_dir {
        Some(dir) => (dir.join("selections.json"), dir.join("wrong_answers.json")),
        None => (
            AppDirs::selections_path().unwrap_or_else(|| PathBuf::from("quizr_selections.json")),
            AppDirs::wrong_answers_path()
                .unwrap_or_else(|| PathBuf::from("quizr_wrong_answers.json")),
        ),
    }
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut FileApp,
    runner: &Runner<CrosstermEventSource>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            QuizEvent::Key(key) => {
                if app.handle_key(key) {
                    break;
                }
            }
            QuizEvent::SetLoaded { token, outcome, .. } => {
                app.on_set_loaded(token, outcome);
            }
            QuizEvent::Resize | QuizEvent::Tick => {}
        }
    }

    Ok(())
}
