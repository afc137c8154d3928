use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use typedsa::config::Config;
use typedsa::engine::timer::SecondClock;
use typedsa::provider::{ParagraphConstraints, ParagraphProvider};
use typedsa::session::error::ProviderError;
use typedsa::session::machine::{Delivery, ParagraphRequest};
use typedsa::session::selection::{ALL_TIME_BUDGETS, ALL_TOPICS, PracticeSelection};
use typedsa::session::{Session, SessionState};
use typedsa::store::ResultsSink;

use crate::event::{AppEvent, key_input};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Setup,
    Practice,
    Results,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupField {
    Topic,
    TimeBudget,
}

/// Cursor positions on the setup screen.
#[derive(Clone, Copy, Debug)]
pub struct SetupState {
    pub topic_idx: usize,
    pub budget_idx: usize,
    pub field: SetupField,
}

impl SetupState {
    pub fn from_selection(selection: &PracticeSelection) -> Self {
        let topic_idx = selection
            .topic
            .and_then(|t| ALL_TOPICS.iter().position(|&x| x == t))
            .unwrap_or(0);
        let budget_idx = selection
            .time_budget
            .and_then(|b| ALL_TIME_BUDGETS.iter().position(|&x| x == b))
            .unwrap_or(0);
        Self {
            topic_idx,
            budget_idx,
            field: SetupField::Topic,
        }
    }

    pub fn selection(&self) -> PracticeSelection {
        PracticeSelection {
            topic: ALL_TOPICS.get(self.topic_idx).copied(),
            time_budget: ALL_TIME_BUDGETS.get(self.budget_idx).copied(),
        }
    }

    fn next(&mut self) {
        match self.field {
            SetupField::Topic => self.topic_idx = (self.topic_idx + 1) % ALL_TOPICS.len(),
            SetupField::TimeBudget => {
                self.budget_idx = (self.budget_idx + 1) % ALL_TIME_BUDGETS.len()
            }
        }
    }

    fn prev(&mut self) {
        match self.field {
            SetupField::Topic => {
                self.topic_idx = self.topic_idx.checked_sub(1).unwrap_or(ALL_TOPICS.len() - 1)
            }
            SetupField::TimeBudget => {
                self.budget_idx = self
                    .budget_idx
                    .checked_sub(1)
                    .unwrap_or(ALL_TIME_BUDGETS.len() - 1)
            }
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            SetupField::Topic => SetupField::TimeBudget,
            SetupField::TimeBudget => SetupField::Topic,
        };
    }
}

pub struct App {
    pub screen: AppScreen,
    pub setup: SetupState,
    pub session: Session<Box<dyn ResultsSink>>,
    pub error: Option<String>,
    pub provider_name: &'static str,
    pub should_quit: bool,
    provider: Arc<dyn ParagraphProvider>,
    constraints: ParagraphConstraints,
    clock: SecondClock,
    events: Sender<AppEvent>,
}

impl App {
    pub fn new(
        config: &Config,
        sink: Box<dyn ResultsSink>,
        provider: Arc<dyn ParagraphProvider>,
        events: Sender<AppEvent>,
    ) -> Self {
        Self {
            screen: AppScreen::Setup,
            setup: SetupState::from_selection(&config.default_selection()),
            session: Session::new(sink, config.user_id.clone()),
            error: None,
            provider_name: provider.name(),
            should_quit: false,
            provider,
            constraints: config.paragraph_constraints(),
            clock: SecondClock::default(),
            events,
        }
    }

    pub fn start_practice(&mut self) {
        self.clock.stop();
        match self.session.start(&self.setup.selection()) {
            Ok(request) => {
                self.error = None;
                self.screen = AppScreen::Practice;
                self.spawn_fetch(request);
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
    }

    fn spawn_fetch(&self, request: ParagraphRequest) {
        let provider = Arc::clone(&self.provider);
        let constraints = self.constraints;
        let tx = self.events.clone();
        thread::spawn(move || {
            let result = provider.request(request.topic, &constraints);
            // The loop may already be gone on quit.
            let _ = tx.send(AppEvent::Paragraph {
                attempt: request.attempt,
                result,
            });
        });
    }

    pub fn on_paragraph(&mut self, attempt: u64, result: Result<String, ProviderError>) {
        match self.session.deliver(attempt, result) {
            Delivery::Activated => {
                self.clock.start(Instant::now());
            }
            Delivery::Failed(err) => {
                self.error = Some(err.to_string());
                self.screen = AppScreen::Setup;
            }
            Delivery::Stale => {}
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        let due = self.clock.due_ticks(now);
        if let Some(handle) = self.session.timer_handle() {
            for _ in 0..due {
                self.session.tick(handle);
            }
        }
        self.sync_finished();
    }

    fn sync_finished(&mut self) {
        if self.session.state() == SessionState::Finished && self.screen == AppScreen::Practice {
            self.clock.stop();
            self.screen = AppScreen::Results;
        }
    }

    fn back_to_setup(&mut self) {
        self.session.reset();
        self.clock.stop();
        self.screen = AppScreen::Setup;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            AppScreen::Setup => self.handle_setup_key(key),
            AppScreen::Practice => self.handle_practice_key(key),
            AppScreen::Results => self.handle_results_key(key),
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Left | KeyCode::Char('h') => {
                self.setup.prev()
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Char('l') => {
                self.setup.next()
            }
            KeyCode::Tab | KeyCode::BackTab => self.setup.toggle_field(),
            KeyCode::Enter => self.start_practice(),
            _ => {}
        }
    }

    fn handle_practice_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_to_setup(),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.session.stop();
                self.sync_finished();
            }
            _ => {
                self.session.key(key_input(&key));
                self.sync_finished();
            }
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => self.start_practice(),
            KeyCode::Esc => self.back_to_setup(),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    pub fn seconds_shown(&self) -> u32 {
        self.session
            .remaining_secs()
            .unwrap_or_else(|| self.session.elapsed_secs())
    }
}
