use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Bounded exponential backoff for ICE restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(15),
            max_attempts: 5,
        }
    }
}

impl RestartPolicy {
    /// `min(base * 2^attempts, cap)`
    pub fn delay(&self, attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempts);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Arm the timer with this delay.
    Schedule(Duration),
    /// A restart is already outstanding.
    InFlight,
    /// The attempt budget just ran out.
    Exhausted,
    /// The budget ran out earlier and was already reported.
    GaveUp,
}

/// Per-link restart bookkeeping: attempt counter, in-flight guard and the
/// pending timer.
#[derive(Debug)]
pub struct RestartScheduler {
    policy: RestartPolicy,
    attempts: u32,
    in_flight: bool,
    exhausted: bool,
    timer: Option<JoinHandle<()>>,
}

impl RestartScheduler {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            in_flight: false,
            exhausted: false,
            timer: None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_timer_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Records a connectivity failure and decides what to do about it.
    /// A `Schedule` decision counts as an attempt and marks the restart as
    /// in flight until [`finish_attempt`](Self::finish_attempt).
    pub fn on_failure(&mut self) -> RestartDecision {
        if self.in_flight {
            return RestartDecision::InFlight;
        }

        if self.attempts >= self.policy.max_attempts {
            if self.exhausted {
                return RestartDecision::GaveUp;
            }
            self.exhausted = true;
            return RestartDecision::Exhausted;
        }

        let delay = self.policy.delay(self.attempts);
        self.attempts += 1;
        self.in_flight = true;
        RestartDecision::Schedule(delay)
    }

    /// Runs `fire` once `delay` has elapsed. Replaces any pending timer.
    pub fn arm<F>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.abort_timer();

        let deadline = Instant::now() + delay;
        self.timer = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            fire();
        }));
    }

    /// The timer elapsed and the restart offer is about to be made.
    pub fn timer_fired(&mut self) {
        self.timer = None;
    }

    pub fn finish_attempt(&mut self) {
        self.in_flight = false;
    }

    pub fn on_connected(&mut self) {
        self.attempts = 0;
        self.exhausted = false;
    }

    pub fn cancel(&mut self) {
        self.abort_timer();
        self.in_flight = false;
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for RestartScheduler {
    fn drop(&mut self) {
        self.abort_timer();
    }
}
