mod app;
mod event;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use typedsa::config::Config;
use typedsa::provider;
use typedsa::session::SessionState;
use typedsa::session::selection::{TimeBudget, Topic};
use typedsa::store::json_store::JsonStore;
use typedsa::store::schema::HistorySummary;
use typedsa::store::{MemorySink, ResultsSink};

use app::{App, AppScreen};
use event::{AppEvent, EventHandler};
use ui::components::metrics_bar::MetricsBar;
use ui::components::results_panel::{ResultsPanel, ResultsSummary};
use ui::components::selector::Selector;
use ui::components::typing_area::TypingArea;
use ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "typedsa",
    version,
    about = "Timed typing practice on data structures and algorithms topics"
)]
struct Cli {
    #[arg(short, long, help = "Preselected topic, e.g. arrays or binary-search")]
    topic: Option<Topic>,

    #[arg(long, help = "Preselected time limit: 30s, 60s or \"No Limit\"")]
    time: Option<TimeBudget>,

    #[arg(short, long, help = "Save results under this user id")]
    user: Option<String>,

    #[arg(short, long, help = "Paragraph source (bundled, gemini)")]
    source: Option<String>,

    #[arg(long, help = "Print saved results and exit")]
    history: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|err| {
        eprintln!("Ignoring unreadable config {}: {err}", Config::config_path().display());
        Config::default()
    });
    if let Some(topic) = cli.topic {
        config.default_topic = topic.key().to_string();
    }
    if let Some(time) = cli.time {
        config.default_time_budget = time.label().to_string();
    }
    if let Some(user) = cli.user {
        config.user_id = Some(user);
    }
    if let Some(source) = cli.source {
        config.paragraph_source = source;
    }
    config.validate();

    init_logging(&config.data_dir_path());
    log::info!("starting typedsa with {} paragraphs", config.paragraph_source);

    let store = JsonStore::with_base_dir(config.data_dir_path());

    if cli.history {
        return print_history(&store?, &config);
    }

    let sink: Box<dyn ResultsSink> = match store {
        Ok(store) => Box::new(store),
        Err(err) => {
            log::warn!("results will not be saved: {err:#}");
            Box::new(MemorySink::default())
        }
    };
    let provider = provider::from_config(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Release events are filtered in App::handle_key.
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(&config, sink, provider, events.sender());
    let theme = Theme::default();

    let result = run_app(&mut terminal, &mut app, &events, &theme);

    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("{err:#}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// The TUI owns the terminal, so log lines go to `<data_dir>/typedsa.log`.
fn init_logging(dir: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let file = fs::create_dir_all(dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("typedsa.log"))
    });
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn print_history(store: &JsonStore, config: &Config) -> Result<()> {
    let history = store.load_history()?;
    let results: Vec<_> = match config.user_id.as_deref() {
        Some(user) => history.for_user(user).collect(),
        None => history.sessions.iter().collect(),
    };
    if results.is_empty() {
        println!("No saved sessions in {}", store.base_dir().display());
        return Ok(());
    }

    let summary = HistorySummary::from_results(results.iter().copied());
    println!(
        "{} sessions  best {} wpm  mean {:.0} wpm  mean accuracy {:.1}%",
        summary.sessions, summary.best_wpm, summary.mean_wpm, summary.mean_accuracy
    );
    println!();
    for result in results.iter().rev().take(10) {
        println!(
            "{}  {:<20} {:>8}  {:>3} wpm  {:>5.1}%",
            result.timestamp.format("%Y-%m-%d %H:%M"),
            result.topic.map(|t| t.label()).unwrap_or("-"),
            result.time_budget.map(|b| b.label()).unwrap_or("-"),
            result.wpm,
            result.accuracy
        );
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    theme: &Theme,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app, theme))?;

        match events.next()? {
            AppEvent::Key(key) => app.handle_key(key),
            AppEvent::Paragraph { attempt, result } => app.on_paragraph(attempt, result),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }
        // Key bursts starve Tick events, so the clock is polled after every event.
        app.on_tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App, theme: &Theme) {
    let area = frame.area();
    let colors = &theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(bg, area);

    let layout = AppLayout::new(area);
    render_header(frame, app, theme, layout.header);

    match app.screen {
        AppScreen::Setup => {
            let selector_area = centered_rect(60, 70, layout.main);
            frame.render_widget(
                Selector::new(&app.setup, app.error.as_deref(), theme),
                selector_area,
            );
        }
        AppScreen::Practice => render_practice(frame, app, theme, layout.main),
        AppScreen::Results => {
            let session = &app.session;
            let summary = ResultsSummary {
                metrics: session.final_metrics().unwrap_or_default(),
                reason: session.finish_reason(),
                topic: session.topic(),
                time_budget: session.time_budget(),
                elapsed_secs: session.elapsed_secs(),
                typed_chars: session.typed().len(),
                target_chars: session.target().len(),
                saved_as: session.user_id(),
                notice: session.notice(),
            };
            let panel_area = centered_rect(50, 50, layout.main);
            frame.render_widget(ResultsPanel::new(summary, theme), panel_area);
        }
    }

    let hints: &[&str] = match app.screen {
        AppScreen::Setup => &[
            "[\u{2191}\u{2193}/jk] Move",
            "[Tab] Switch field",
            "[Enter] Start",
            "[q] Quit",
        ],
        AppScreen::Practice => &["[Esc] Back", "[Ctrl+S] Stop", "[Ctrl+C] Quit"],
        AppScreen::Results => &["[r] Retry", "[Esc] Back", "[q] Quit"],
    };
    let footer_lines: Vec<Line> = pack_hint_lines(hints, layout.footer.width as usize)
        .into_iter()
        .take(1)
        .map(|line| Line::from(Span::styled(line, Style::default().fg(colors.untyped))))
        .collect();
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);
}

fn render_header(frame: &mut ratatui::Frame, app: &App, theme: &Theme, area: ratatui::layout::Rect) {
    let colors = &theme.colors;
    let selection = app.setup.selection();
    let topic = app
        .session
        .topic()
        .or(selection.topic)
        .map(|t| t.label())
        .unwrap_or("-");
    let budget = app
        .session
        .time_budget()
        .or(selection.time_budget)
        .map(|b| b.label())
        .unwrap_or("-");
    let info = format!(
        " {topic} | {budget} | {} paragraphs ",
        app.provider_name
    );

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " typedsa ",
            Style::default()
                .fg(colors.title_fg)
                .bg(colors.title_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default()
                .fg(colors.untyped)
                .bg(colors.title_bg),
        ),
    ]))
    .style(Style::default().bg(colors.title_bg));
    frame.render_widget(header, area);
}

fn render_practice(frame: &mut ratatui::Frame, app: &App, theme: &Theme, area: ratatui::layout::Rect) {
    let session = &app.session;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let metrics = MetricsBar::new(
        session.remaining_secs().is_some(),
        app.seconds_shown(),
        session.live_metrics(),
        session.progress(),
        theme,
    );
    frame.render_widget(metrics, rows[0]);

    let typing = TypingArea::new(
        session.target(),
        session.typed(),
        session.state() == SessionState::Active,
        theme,
    );
    frame.render_widget(typing, rows[1]);
}
