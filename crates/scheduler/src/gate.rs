//! Concurrency ceiling over independently running agent processes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sysinfo::{ProcessStatus, System};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::SchedulerError;

/// Counts agent processes that are currently alive.
pub trait ProcessProbe: Send + Sync {
    fn active(&self) -> Result<usize, SchedulerError>;
}

/// Counts live processes whose command line contains `marker`.
///
/// Agents are launched with their argument-record path on the command line,
/// so the batch's argument directory makes a good marker.
pub struct SysinfoProbe {
    system: Mutex<System>,
    marker: String,
}

impl SysinfoProbe {
    pub fn new(marker: impl Into<String>) -> Self {
        let mut system = System::new_all();
        system.refresh_all();
        Self {
            system: Mutex::new(system),
            marker: marker.into(),
        }
    }
}

impl ProcessProbe for SysinfoProbe {
    fn active(&self) -> Result<usize, SchedulerError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| SchedulerError::probe("process table lock poisoned"))?;
        system.refresh_all();

        let own = sysinfo::get_current_pid().ok();
        let count = system
            .processes()
            .iter()
            .filter(|(pid, _)| Some(**pid) != own)
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter(|(_, process)| {
                !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
            })
            .filter(|(_, process)| {
                process
                    .cmd()
                    .iter()
                    .any(|part| part.to_string_lossy().contains(&self.marker))
            })
            .count();
        Ok(count)
    }
}

/// Blocks dispatch while the active count is at or above the ceiling.
#[derive(Clone)]
pub struct ConcurrencyGate {
    probe: Arc<dyn ProcessProbe>,
    ceiling: usize,
    poll_interval: Duration,
}

impl ConcurrencyGate {
    pub fn new(probe: Arc<dyn ProcessProbe>, ceiling: usize, poll_interval: Duration) -> Self {
        Self {
            probe,
            ceiling: ceiling.max(1),
            poll_interval,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Wait until a slot is free and return the active count observed.
    ///
    /// A failing probe counts as "ceiling reached".
    pub async fn wait_for_slot(&self) -> usize {
        loop {
            match self.probe.active() {
                Ok(active) if active < self.ceiling => return active,
                Ok(active) => debug!(active, ceiling = self.ceiling, "ceiling reached, waiting"),
                Err(err) => warn!("{}; treating as ceiling reached", err),
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    struct FlakyProbe {
        failures_left: AtomicUsize,
    }

    impl ProcessProbe for FlakyProbe {
        fn active(&self) -> Result<usize, SchedulerError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(SchedulerError::probe("ps unavailable"));
            }
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failures_hold_the_gate() {
        let probe = Arc::new(FlakyProbe {
            failures_left: AtomicUsize::new(3),
        });
        let gate = ConcurrencyGate::new(probe, 2, Duration::from_secs(60));

        let started = Instant::now();
        assert_eq!(gate.wait_for_slot().await, 0);
        assert_eq!(started.elapsed(), Duration::from_secs(180));
    }

    #[test]
    fn unmatched_marker_counts_nothing() {
        let probe = SysinfoProbe::new("no-agent-has-this-marker-3f9c");
        assert_eq!(probe.active().unwrap(), 0);
    }
}
