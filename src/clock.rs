use std::time::{Duration, Instant};

/// Lifecycle of the simulation driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    /// Created, waiting for the first `advance`
    #[default]
    Idle,
    Running,
    Paused,
    /// Terminal; never advances again
    Stopped,
}

/// Outcome of one `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Fixed steps the caller must run now
    pub steps: u32,
    /// Backlog discarded because the catch-up cap was reached
    pub dropped: Duration,
}

impl StepResult {
    pub fn stepped(&self) -> bool {
        self.steps > 0
    }
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct SimulationClock {
    interval: Duration,
    max_catch_up: u32,
    state: ClockState,
    last: Option<Instant>,
    accumulator: Duration,
}

impl SimulationClock {
    pub fn new(interval: Duration, max_catch_up: u32) -> Self {
        Self {
            interval: interval.max(Duration::from_micros(1)),
            max_catch_up: max_catch_up.max(1),
            state: ClockState::Idle,
            last: None,
            accumulator: Duration::ZERO,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Account for wall-clock time up to `now` and report how many steps are due
    pub fn advance(&mut self, now: Instant) -> StepResult {
        match self.state {
            ClockState::Stopped => return StepResult::default(),
            ClockState::Idle => {
                self.state = ClockState::Running;
                self.last = Some(now);
                return StepResult::default();
            }
            ClockState::Paused => {
                self.last = Some(now);
                return StepResult::default();
            }
            ClockState::Running => {}
        }

        let elapsed = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last = Some(now);
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator >= self.interval && steps < self.max_catch_up {
            self.accumulator -= self.interval;
            steps += 1;
        }

        let mut dropped = Duration::ZERO;
        if self.accumulator >= self.interval {
            // Keep the sub-interval remainder so cadence stays even after a stall
            let remainder = Duration::from_nanos(
                (self.accumulator.as_nanos() % self.interval.as_nanos()) as u64,
            );
            dropped = self.accumulator - remainder;
            self.accumulator = remainder;
        }

        StepResult { steps, dropped }
    }

    pub fn pause(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
        }
    }

    /// Resume without replaying the time spent paused
    pub fn resume(&mut self) {
        if self.state == ClockState::Paused {
            self.state = ClockState::Running;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            ClockState::Running => self.pause(),
            ClockState::Paused => self.resume(),
            ClockState::Idle | ClockState::Stopped => {}
        }
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }
}
