use std::time::Instant;

/// How the session clock runs once a paragraph has arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    Countdown { duration_secs: u32 },
    CountUp,
}

/// Identifies one arming of the coordinator. Ticks carrying a stale handle
/// are dropped, so a tick scheduled for a previous session never lands on
/// the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer not running, or the handle belongs to an older arming.
    Ignored,
    Advanced,
    /// Countdown reached zero. The coordinator has already cancelled itself.
    Exhausted,
}

#[derive(Debug, Default)]
pub struct TimerCoordinator {
    generation: u64,
    running: bool,
    mode: Option<TimerMode>,
    remaining_secs: u32,
    elapsed_secs: u32,
}

impl TimerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, mode: TimerMode) -> TimerHandle {
        self.generation += 1;
        self.running = true;
        self.mode = Some(mode);
        self.elapsed_secs = 0;
        self.remaining_secs = match mode {
            TimerMode::Countdown { duration_secs } => duration_secs,
            TimerMode::CountUp => 0,
        };
        TimerHandle(self.generation)
    }

    /// Stops ticking. Readings stay frozen at their last value.
    pub fn cancel(&mut self) {
        if self.running {
            self.running = false;
            // Invalidate any handle still held by a tick source.
            self.generation += 1;
        }
    }

    /// Cancels and forgets the mode, so readings go back to zero.
    pub fn reset(&mut self) {
        self.cancel();
        self.mode = None;
        self.remaining_secs = 0;
        self.elapsed_secs = 0;
    }

    pub fn tick(&mut self, handle: TimerHandle) -> TickOutcome {
        if !self.running || handle.0 != self.generation {
            return TickOutcome::Ignored;
        }
        match self.mode {
            Some(TimerMode::Countdown { .. }) => {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 {
                    self.cancel();
                    TickOutcome::Exhausted
                } else {
                    TickOutcome::Advanced
                }
            }
            Some(TimerMode::CountUp) => {
                self.elapsed_secs = self.elapsed_secs.saturating_add(1);
                TickOutcome::Advanced
            }
            None => TickOutcome::Ignored,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.running.then_some(TimerHandle(self.generation))
    }

    pub fn mode(&self) -> Option<TimerMode> {
        self.mode
    }

    pub fn elapsed_secs(&self) -> u32 {
        match self.mode {
            Some(TimerMode::Countdown { duration_secs }) => {
                duration_secs.saturating_sub(self.remaining_secs)
            }
            Some(TimerMode::CountUp) => self.elapsed_secs,
            None => 0,
        }
    }

    /// Seconds left on a countdown; `None` in count-up mode or when unarmed.
    pub fn remaining_secs(&self) -> Option<u32> {
        match self.mode {
            Some(TimerMode::Countdown { .. }) => Some(self.remaining_secs),
            _ => None,
        }
    }
}

/// Turns a free-running poll cadence into whole-second ticks.
#[derive(Debug, Default)]
pub struct SecondClock {
    anchor: Option<Instant>,
    emitted: u64,
}

impl SecondClock {
    pub fn start(&mut self, now: Instant) {
        self.anchor = Some(now);
        self.emitted = 0;
    }

    pub fn stop(&mut self) {
        self.anchor = None;
        self.emitted = 0;
    }

    /// Number of whole seconds that became due since the last call.
    pub fn due_ticks(&mut self, now: Instant) -> u64 {
        let Some(anchor) = self.anchor else {
            return 0;
        };
        let whole = now.saturating_duration_since(anchor).as_secs();
        let due = whole.saturating_sub(self.emitted);
        self.emitted = whole.max(self.emitted);
        due
    }
}
