use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::engine::metrics::{self, Metrics};
use crate::engine::timer::{TickOutcome, TimerCoordinator, TimerHandle, TimerMode};
use crate::provider::{ParagraphConstraints, ParagraphProvider};
use crate::session::error::{ProviderError, SessionError};
use crate::session::finalize::FinalizationGuard;
use crate::session::input::{self, KeyInput, KeyOutcome};
use crate::session::selection::{PracticeSelection, TimeBudget, Topic};
use crate::store::ResultsSink;
use crate::store::schema::PersistedResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingText,
    Active,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    BufferComplete,
    TimeExhausted,
    ManualStop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    TextReceived,
    TextRequestFailed,
    Finish(FinishReason),
    Reset,
}

/// The whole transition table. `None` means the event is a no-op in that state.
pub fn next_state(state: SessionState, event: SessionEvent) -> Option<SessionState> {
    use SessionEvent as E;
    use SessionState as S;
    match (state, event) {
        (_, E::Reset) => Some(S::Idle),
        (S::Idle, E::Start) => Some(S::AwaitingText),
        (S::AwaitingText, E::TextReceived) => Some(S::Active),
        (S::AwaitingText, E::TextRequestFailed) => Some(S::Idle),
        (S::Active, E::Finish(_)) => Some(S::Finished),
        _ => None,
    }
}

/// Picks one reason when several completion triggers are pending at once.
/// Finishing the text beats running out of time, which beats a manual stop.
pub fn resolve_finish(
    buffer_complete: bool,
    time_exhausted: bool,
    stop_requested: bool,
) -> Option<FinishReason> {
    if buffer_complete {
        Some(FinishReason::BufferComplete)
    } else if time_exhausted {
        Some(FinishReason::TimeExhausted)
    } else if stop_requested {
        Some(FinishReason::ManualStop)
    } else {
        None
    }
}

/// Ticket for one paragraph request. A reply is only applied if its attempt
/// still matches the session's current attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParagraphRequest {
    pub attempt: u64,
    pub topic: Topic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Reply for a request that was reset or replaced.
    Stale,
    Activated,
    Failed(ProviderError),
}

/// One practice attempt from topic selection to final metrics.
pub struct Session<S: ResultsSink> {
    state: SessionState,
    selection: Option<(Topic, TimeBudget)>,
    target: Vec<char>,
    typed: Vec<char>,
    timer: TimerCoordinator,
    live: Metrics,
    guard: FinalizationGuard,
    finish_reason: Option<FinishReason>,
    attempt: u64,
    user_id: Option<String>,
    sink: S,
    notice: Option<String>,
}

impl<S: ResultsSink> Session<S> {
    pub fn new(sink: S, user_id: Option<String>) -> Self {
        Self {
            state: SessionState::Idle,
            selection: None,
            target: Vec::new(),
            typed: Vec::new(),
            timer: TimerCoordinator::new(),
            live: Metrics::ZERO,
            guard: FinalizationGuard::new(),
            finish_reason: None,
            attempt: 0,
            user_id,
            sink,
            notice: None,
        }
    }

    fn transition(&mut self, event: SessionEvent) -> bool {
        match next_state(self.state, event) {
            Some(next) => {
                log::debug!("session {:?} --{:?}--> {:?}", self.state, event, next);
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Validates the selection and moves to `AwaitingText`. A finished or
    /// running attempt is discarded first.
    pub fn start(&mut self, selection: &PracticeSelection) -> Result<ParagraphRequest, SessionError> {
        let (topic, budget) = selection.validate()?;
        match self.state {
            SessionState::AwaitingText => return Err(SessionError::RequestInFlight),
            SessionState::Active | SessionState::Finished => self.reset(),
            SessionState::Idle => {}
        }
        self.clear_attempt();
        self.attempt += 1;
        self.selection = Some((topic, budget));
        self.transition(SessionEvent::Start);
        Ok(ParagraphRequest {
            attempt: self.attempt,
            topic,
        })
    }

    /// Applies the outcome of a paragraph request.
    pub fn deliver(&mut self, attempt: u64, outcome: Result<String, ProviderError>) -> Delivery {
        if self.state != SessionState::AwaitingText || attempt != self.attempt {
            log::debug!("dropping paragraph for stale attempt {attempt}");
            return Delivery::Stale;
        }
        match outcome {
            Ok(text) if !text.is_empty() => {
                self.text_received(text);
                Delivery::Activated
            }
            Ok(_) => {
                self.text_request_failed();
                Delivery::Failed(ProviderError::EmptyResponse)
            }
            Err(err) => {
                log::warn!("paragraph request failed: {err}");
                self.text_request_failed();
                Delivery::Failed(err)
            }
        }
    }

    fn text_received(&mut self, text: String) {
        let mode = self.mode();
        self.target = text.chars().collect();
        self.typed.clear();
        self.live = Metrics::ZERO;
        if self.transition(SessionEvent::TextReceived) {
            // Armed now, not on first keystroke: idle time counts.
            self.timer.arm(mode);
        }
    }

    fn text_request_failed(&mut self) {
        self.transition(SessionEvent::TextRequestFailed);
        self.selection = None;
    }

    /// Start and fetch in one blocking step.
    pub fn begin(
        &mut self,
        selection: &PracticeSelection,
        provider: &dyn ParagraphProvider,
        constraints: &ParagraphConstraints,
    ) -> Result<(), SessionError> {
        let request = self.start(selection)?;
        let outcome = provider.request(request.topic, constraints);
        match self.deliver(request.attempt, outcome) {
            Delivery::Failed(err) => Err(err.into()),
            Delivery::Activated | Delivery::Stale => Ok(()),
        }
    }

    pub fn is_accepting_input(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Feeds one key. Completion is checked inside the same step so the
    /// buffer can never run past the target.
    pub fn key(&mut self, key: KeyInput) -> KeyOutcome {
        if !self.is_accepting_input() {
            return KeyOutcome::Rejected;
        }
        let outcome = input::apply_key(&mut self.typed, &self.target, key);
        if outcome.mutated_buffer() {
            self.live = metrics::compute(&self.typed, &self.target, self.timer.elapsed_secs());
            if self.is_buffer_complete() {
                self.finish(FinishReason::BufferComplete);
            }
        }
        outcome
    }

    pub fn timer_handle(&self) -> Option<TimerHandle> {
        self.timer.handle()
    }

    /// One elapsed second for the given arming.
    pub fn tick(&mut self, handle: TimerHandle) -> TickOutcome {
        if self.state != SessionState::Active {
            return TickOutcome::Ignored;
        }
        let outcome = self.timer.tick(handle);
        if outcome == TickOutcome::Exhausted
            && let Some(reason) = resolve_finish(self.is_buffer_complete(), true, false)
        {
            self.finish(reason);
        }
        outcome
    }

    /// Ends an active attempt early. Returns whether it did anything.
    pub fn stop(&mut self) -> bool {
        match resolve_finish(self.is_buffer_complete(), false, true) {
            Some(reason) if self.state == SessionState::Active => self.finish(reason),
            _ => false,
        }
    }

    fn finish(&mut self, reason: FinishReason) -> bool {
        if !self.transition(SessionEvent::Finish(reason)) {
            return false;
        }
        self.timer.cancel();
        self.finish_reason = Some(reason);
        self.on_finished_entry();
        true
    }

    /// Finished-entry action. Safe to run again: the latch makes every call
    /// after the first a no-op, so the sink sees exactly one write.
    pub fn on_finished_entry(&mut self) {
        if self.state != SessionState::Finished {
            return;
        }
        let Some(final_metrics) =
            self.guard
                .finalize(&self.typed, &self.target, self.timer.elapsed_secs())
        else {
            return;
        };
        log::info!(
            "session finished ({:?}): {} wpm, {:.1}% accuracy",
            self.finish_reason,
            final_metrics.wpm,
            final_metrics.accuracy
        );
        self.live = final_metrics;

        let Some(user_id) = self.user_id.clone() else {
            log::info!("no user signed in, skipping save");
            return;
        };
        let record = PersistedResult {
            user_id,
            wpm: final_metrics.wpm,
            accuracy: final_metrics.accuracy,
            timestamp: Utc::now(),
            topic: self.selection.map(|(t, _)| t),
            time_budget: self.selection.map(|(_, b)| b),
            elapsed_secs: self.timer.elapsed_secs(),
            typed_chars: self.typed.len(),
            target_chars: self.target.len(),
            finish_reason: self.finish_reason,
        };
        if let Err(err) = self.sink.submit(&record) {
            log::warn!("failed to save session: {err}");
            self.notice = Some(err.to_string());
        }
    }

    /// Back to `Idle` from anywhere. Any in-flight request becomes stale.
    pub fn reset(&mut self) {
        self.transition(SessionEvent::Reset);
        self.clear_attempt();
        self.selection = None;
        self.attempt += 1;
    }

    fn clear_attempt(&mut self) {
        self.timer.reset();
        self.target.clear();
        self.typed.clear();
        self.live = Metrics::ZERO;
        self.guard.reset();
        self.finish_reason = None;
        self.notice = None;
    }

    fn mode(&self) -> TimerMode {
        self.selection
            .map(|(_, budget)| budget.timer_mode())
            .unwrap_or(TimerMode::CountUp)
    }

    fn is_buffer_complete(&self) -> bool {
        !self.target.is_empty() && self.typed.len() == self.target.len()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn topic(&self) -> Option<Topic> {
        self.selection.map(|(t, _)| t)
    }

    pub fn time_budget(&self) -> Option<TimeBudget> {
        self.selection.map(|(_, b)| b)
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn live_metrics(&self) -> Metrics {
        self.live
    }

    pub fn final_metrics(&self) -> Option<Metrics> {
        self.guard.metrics()
    }

    pub fn is_finalized(&self) -> bool {
        self.guard.is_latched()
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.timer.elapsed_secs()
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.timer.remaining_secs()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn progress(&self) -> f64 {
        if self.target.is_empty() {
            return 0.0;
        }
        self.typed.len() as f64 / self.target.len() as f64
    }

    /// Soft warning from the last finalization, e.g. a failed save.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::error::ConfigurationError;
    use crate::store::MemorySink;

    fn session() -> Session<MemorySink> {
        Session::new(MemorySink::default(), Some("user-1".to_string()))
    }

    fn active(text: &str, budget: TimeBudget) -> Session<MemorySink> {
        let mut s = session();
        let req = s
            .start(&PracticeSelection::new(Topic::Arrays, budget))
            .unwrap();
        assert_eq!(s.deliver(req.attempt, Ok(text.to_string())), Delivery::Activated);
        s
    }

    fn type_str(s: &mut Session<MemorySink>, text: &str) {
        for ch in text.chars() {
            s.key(KeyInput::Char(ch));
        }
    }

    fn tick_n(s: &mut Session<MemorySink>, n: usize) {
        for _ in 0..n {
            if let Some(h) = s.timer_handle() {
                s.tick(h);
            }
        }
    }

    #[test]
    fn transition_table() {
        use SessionEvent as E;
        use SessionState as S;
        assert_eq!(next_state(S::Idle, E::Start), Some(S::AwaitingText));
        assert_eq!(next_state(S::AwaitingText, E::TextReceived), Some(S::Active));
        assert_eq!(next_state(S::AwaitingText, E::TextRequestFailed), Some(S::Idle));
        assert_eq!(
            next_state(S::Active, E::Finish(FinishReason::TimeExhausted)),
            Some(S::Finished)
        );
        assert_eq!(next_state(S::Finished, E::Finish(FinishReason::BufferComplete)), None);
        assert_eq!(next_state(S::Idle, E::TextReceived), None);
        assert_eq!(next_state(S::Active, E::Start), None);
        for state in [S::Idle, S::AwaitingText, S::Active, S::Finished] {
            assert_eq!(next_state(state, E::Reset), Some(S::Idle));
        }
    }

    #[test]
    fn buffer_completion_beats_time_exhaustion() {
        assert_eq!(resolve_finish(true, true, false), Some(FinishReason::BufferComplete));
        assert_eq!(resolve_finish(false, true, true), Some(FinishReason::TimeExhausted));
        assert_eq!(resolve_finish(false, false, true), Some(FinishReason::ManualStop));
        assert_eq!(resolve_finish(false, false, false), None);
    }

    #[test]
    fn start_without_selection_is_configuration_error() {
        let mut s = session();
        let err = s.start(&PracticeSelection::default()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Configuration(ConfigurationError::MissingTopicAndTimeBudget)
        ));
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn start_twice_while_waiting_is_rejected() {
        let mut s = session();
        let sel = PracticeSelection::new(Topic::Trees, TimeBudget::Seconds30);
        s.start(&sel).unwrap();
        assert!(matches!(s.start(&sel), Err(SessionError::RequestInFlight)));
        assert_eq!(s.state(), SessionState::AwaitingText);
    }

    #[test]
    fn failed_request_returns_to_idle() {
        let mut s = session();
        let req = s
            .start(&PracticeSelection::new(Topic::Graphs, TimeBudget::Seconds60))
            .unwrap();
        let delivery = s.deliver(req.attempt, Err(ProviderError::Status(500)));
        assert_eq!(delivery, Delivery::Failed(ProviderError::Status(500)));
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.is_timer_running());
        assert!(s.sink().submitted.is_empty());
    }

    #[test]
    fn empty_text_counts_as_failure() {
        let mut s = session();
        let req = s
            .start(&PracticeSelection::new(Topic::Graphs, TimeBudget::Seconds60))
            .unwrap();
        assert_eq!(
            s.deliver(req.attempt, Ok(String::new())),
            Delivery::Failed(ProviderError::EmptyResponse)
        );
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn late_reply_after_reset_is_dropped() {
        let mut s = session();
        let req = s
            .start(&PracticeSelection::new(Topic::Oops, TimeBudget::NoLimit))
            .unwrap();
        s.reset();
        assert_eq!(s.deliver(req.attempt, Ok("late text".into())), Delivery::Stale);
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.target().is_empty());
    }

    #[test]
    fn timer_is_armed_on_text_arrival() {
        let s = active("abc", TimeBudget::Seconds30);
        assert_eq!(s.state(), SessionState::Active);
        assert!(s.is_timer_running());
        assert_eq!(s.remaining_secs(), Some(30));
    }

    #[test]
    fn keys_outside_active_are_rejected() {
        let mut s = session();
        assert_eq!(s.key(KeyInput::Char('a')), KeyOutcome::Rejected);
        s.start(&PracticeSelection::new(Topic::Arrays, TimeBudget::Seconds30))
            .unwrap();
        assert_eq!(s.key(KeyInput::Char('a')), KeyOutcome::Rejected);
        assert!(s.typed().is_empty());
    }

    #[test]
    fn live_metrics_follow_each_keystroke() {
        let mut s = active("hello world", TimeBudget::NoLimit);
        tick_n(&mut s, 6);
        type_str(&mut s, "hellp");
        let live = s.live_metrics();
        assert_eq!(live.accuracy, 80.0);
        assert_eq!(live.wpm, 10);

        s.key(KeyInput::Backspace);
        assert_eq!(s.live_metrics().accuracy, 100.0);
        assert_eq!(s.typed().len(), 4);
    }

    #[test]
    fn finishes_exactly_when_buffer_reaches_target_length() {
        let text: String = "ab".repeat(50);
        let mut s = active(&text, TimeBudget::Seconds60);
        let chars: Vec<char> = text.chars().collect();
        for (i, &ch) in chars.iter().enumerate() {
            assert_eq!(s.state(), SessionState::Active, "finished early at {i}");
            s.key(KeyInput::Char(ch));
        }
        assert_eq!(s.state(), SessionState::Finished);
        assert_eq!(s.typed().len(), 100);
        assert_eq!(s.finish_reason(), Some(FinishReason::BufferComplete));
        assert!(!s.is_timer_running());

        // Further keys are no-ops.
        assert_eq!(s.key(KeyInput::Char('x')), KeyOutcome::Rejected);
        assert_eq!(s.key(KeyInput::Backspace), KeyOutcome::Rejected);
        assert_eq!(s.typed().len(), 100);
    }

    #[test]
    fn countdown_exhaustion_finishes_and_freezes_elapsed() {
        let mut s = active("a long paragraph nobody finishes", TimeBudget::Seconds30);
        let handle = s.timer_handle().unwrap();
        type_str(&mut s, "a long");
        for _ in 0..30 {
            s.tick(handle);
        }
        assert_eq!(s.state(), SessionState::Finished);
        assert_eq!(s.finish_reason(), Some(FinishReason::TimeExhausted));
        assert_eq!(s.elapsed_secs(), 30);
        assert_eq!(s.tick(handle), TickOutcome::Ignored);
        assert_eq!(s.elapsed_secs(), 30);
        assert_eq!(s.final_metrics(), Some(Metrics { wpm: 2, accuracy: 100.0 }));
    }

    #[test]
    fn finished_entry_twice_writes_once() {
        let mut s = active("abc", TimeBudget::NoLimit);
        tick_n(&mut s, 3);
        type_str(&mut s, "abc");
        let first = s.final_metrics();
        s.on_finished_entry();
        s.on_finished_entry();
        assert_eq!(s.final_metrics(), first);
        assert_eq!(s.sink().submitted.len(), 1);
        assert!(!s.stop());
    }

    #[test]
    fn anonymous_sessions_are_not_saved() {
        let mut s = Session::new(MemorySink::default(), None);
        let req = s
            .start(&PracticeSelection::new(Topic::Trees, TimeBudget::NoLimit))
            .unwrap();
        s.deliver(req.attempt, Ok("ok".into()));
        type_str(&mut s, "ok");
        assert_eq!(s.state(), SessionState::Finished);
        assert!(s.final_metrics().is_some());
        assert!(s.sink().submitted.is_empty());
    }

    #[test]
    fn sink_failure_is_a_soft_notice() {
        let mut s = active("ab", TimeBudget::NoLimit);
        s.sink_mut().fail = true;
        tick_n(&mut s, 1);
        type_str(&mut s, "ab");
        assert_eq!(s.state(), SessionState::Finished);
        assert_eq!(s.final_metrics(), Some(Metrics { wpm: 24, accuracy: 100.0 }));
        assert!(s.notice().unwrap().contains("Could not save"));
        assert!(s.is_finalized());
    }

    #[test]
    fn reset_from_every_state_clears_everything() {
        let sel = PracticeSelection::new(Topic::Arrays, TimeBudget::Seconds30);

        let mut idle = session();
        idle.reset();

        let mut awaiting = session();
        awaiting.start(&sel).unwrap();
        awaiting.reset();

        let mut running = active("abcdef", TimeBudget::Seconds30);
        tick_n(&mut running, 2);
        type_str(&mut running, "ab");
        running.reset();

        let mut finished = active("ab", TimeBudget::Seconds30);
        tick_n(&mut finished, 2);
        type_str(&mut finished, "ab");
        assert!(finished.is_finalized());
        finished.reset();

        for s in [idle, awaiting, running, finished] {
            assert_eq!(s.state(), SessionState::Idle);
            assert!(s.typed().is_empty());
            assert!(s.target().is_empty());
            assert_eq!(s.live_metrics(), Metrics::ZERO);
            assert_eq!(s.final_metrics(), None);
            assert!(!s.is_finalized());
            assert!(!s.is_timer_running());
            assert_eq!(s.elapsed_secs(), 0);
        }
    }

    #[test]
    fn tick_from_previous_attempt_does_not_touch_new_one() {
        let mut s = active("abcdef", TimeBudget::NoLimit);
        let old = s.timer_handle().unwrap();
        s.tick(old);
        s.reset();
        let req = s
            .start(&PracticeSelection::new(Topic::Arrays, TimeBudget::NoLimit))
            .unwrap();
        s.deliver(req.attempt, Ok("xyz".into()));
        assert_eq!(s.tick(old), TickOutcome::Ignored);
        assert_eq!(s.elapsed_secs(), 0);
    }

    #[test]
    fn starting_again_from_finished_replaces_attempt() {
        let mut s = active("ab", TimeBudget::NoLimit);
        type_str(&mut s, "ab");
        assert_eq!(s.state(), SessionState::Finished);
        let req = s
            .start(&PracticeSelection::new(Topic::Graphs, TimeBudget::Seconds30))
            .unwrap();
        assert_eq!(s.state(), SessionState::AwaitingText);
        assert!(!s.is_finalized());
        assert_eq!(s.topic(), Some(Topic::Graphs));
        assert_eq!(s.deliver(req.attempt, Ok("new".into())), Delivery::Activated);
    }

    #[test]
    fn manual_stop_finalizes_count_up() {
        let mut s = active("abcdefghij", TimeBudget::NoLimit);
        tick_n(&mut s, 4);
        type_str(&mut s, "abcde");
        assert!(s.stop());
        assert_eq!(s.finish_reason(), Some(FinishReason::ManualStop));
        assert_eq!(s.final_metrics(), Some(Metrics { wpm: 15, accuracy: 100.0 }));
        assert!(!s.stop());
    }
}
