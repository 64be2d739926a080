use bevy::prelude::*;

/// How network work is dispatched off the frame loop.
///
/// Results always come back through a channel that a frame system drains,
/// so callers behave the same under either variant.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobRunner {
    /// Detached `std::thread` per job.
    #[default]
    Background,
    /// Run the job on the calling system's thread. Used by test harnesses
    /// that need results within the same `App::update`.
    Inline,
}

impl JobRunner {
    /// Dispatch `job`. Returns false when it was dropped without running,
    /// in which case no result will ever arrive for it.
    pub fn run<F>(&self, name: &str, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            JobRunner::Background => match std::thread::Builder::new().name(name.to_string()).spawn(job) {
                Ok(_) => true,
                Err(e) => {
                    error!("Failed to spawn {} thread: {}", name, e);
                    false
                }
            },
            JobRunner::Inline => {
                job();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn inline_runs_before_returning() {
        let (tx, rx) = crossbeam_channel::unbounded();
        assert!(JobRunner::Inline.run("inline", move || {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.try_recv(), Ok(7));
    }

    #[test]
    fn background_delivers_through_channel() {
        let (tx, rx) = crossbeam_channel::unbounded();
        assert!(JobRunner::Background.run("background", move || {
            let _ = tx.send("done");
        }));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("done"));
    }
}
