//! Job-await protocol.
//!
//! Polls an asynchronous engine job to completion under a deadline, with
//! cancellation. Every operation that triggers a long-running engine
//! action (image pull, container stop) goes through [`await_job`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use berth_engine::{Engine, Job};

use crate::error::{AuxError, AuxResult};

/// Poll budgets for one await call.
#[derive(Debug, Clone, Copy)]
pub struct JobWait {
    /// Fixed interval between polls.
    pub poll_interval: Duration,
    /// Bound on each individual `get_job` call.
    pub call_timeout: Duration,
    /// Overall deadline for the job to complete.
    pub deadline: Duration,
}

impl Default for JobWait {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            call_timeout: Duration::from_secs(30),
            deadline: Duration::from_secs(300),
        }
    }
}

/// Poll `job_id` until it completes, the deadline elapses, or the cancel
/// channel signals.
///
/// On deadline expiry or cancellation a best-effort `cancel_job` is
/// issued (its errors are logged, not propagated) and an error is
/// returned. A completed job carrying an engine-reported error is
/// translated: the structured not-found code becomes
/// [`AuxError::NotFound`], anything else [`AuxError::Internal`] with the
/// engine message.
pub async fn await_job(
    engine: &dyn Engine,
    mut cancel: watch::Receiver<bool>,
    job_id: &str,
    wait: JobWait,
) -> AuxResult<Job> {
    let deadline = tokio::time::sleep(wait.deadline);
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(wait.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let job = match tokio::time::timeout(wait.call_timeout, engine.get_job(job_id)).await {
                    Ok(Ok(job)) => job,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => {
                        return Err(AuxError::Internal(format!(
                            "get_job for {job_id} timed out"
                        )));
                    }
                };
                if !job.completed {
                    debug!(%job_id, "job still running");
                    continue;
                }
                if let Some(err) = &job.error {
                    if err.is_not_found() {
                        return Err(AuxError::NotFound(err.message.clone()));
                    }
                    return Err(AuxError::Internal(err.message.clone()));
                }
                return Ok(job);
            }
            _ = &mut deadline => {
                cancel_best_effort(engine, job_id, wait.call_timeout).await;
                return Err(AuxError::Internal(format!(
                    "job {job_id} did not complete within {:?}", wait.deadline
                )));
            }
            changed = cancel.changed() => {
                // An Err means the sender side is gone; treat it as cancellation.
                if changed.is_err() || *cancel.borrow() {
                    cancel_best_effort(engine, job_id, wait.call_timeout).await;
                    return Err(AuxError::Internal(format!("job {job_id} cancelled")));
                }
            }
        }
    }
}

/// Ask the engine to cancel a job, logging any failure.
async fn cancel_best_effort(engine: &dyn Engine, job_id: &str, call_timeout: Duration) {
    match tokio::time::timeout(call_timeout, engine.cancel_job(job_id)).await {
        Ok(Ok(())) => debug!(%job_id, "job cancelled"),
        Ok(Err(e)) => warn!(%job_id, error = %e, "failed to cancel job"),
        Err(_) => warn!(%job_id, "cancel_job timed out"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_engine::{FakeEngine, JobError, JOB_CODE_NOT_FOUND};

    fn fast_wait() -> JobWait {
        JobWait {
            poll_interval: Duration::from_millis(1),
            call_timeout: Duration::from_millis(100),
            deadline: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn completes_after_several_polls() {
        let engine = FakeEngine::new();
        engine.set_job_delay(3);
        let job_id = engine.add_image("img").await.unwrap();

        let (_tx, rx) = watch::channel(false);
        let job = await_job(&engine, rx, &job_id, fast_wait()).await.unwrap();
        assert!(job.completed);
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn job_not_found_error_translates() {
        let engine = FakeEngine::new();
        engine.fail_next_job(JobError {
            code: Some(JOB_CODE_NOT_FOUND.into()),
            message: "image gone".into(),
        });
        let job_id = engine.add_image("img").await.unwrap();

        let (_tx, rx) = watch::channel(false);
        let err = await_job(&engine, rx, &job_id, fast_wait()).await.unwrap_err();
        assert!(matches!(err, AuxError::NotFound(_)));
    }

    #[tokio::test]
    async fn job_failure_translates_to_internal() {
        let engine = FakeEngine::new();
        engine.fail_next_job(JobError {
            code: None,
            message: "pull failed: manifest unknown".into(),
        });
        let job_id = engine.add_image("img").await.unwrap();

        let (_tx, rx) = watch::channel(false);
        let err = await_job(&engine, rx, &job_id, fast_wait()).await.unwrap_err();
        match err {
            AuxError::Internal(msg) => assert!(msg.contains("manifest unknown")),
            other => panic!("expected Internal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_job_id_propagates_not_found() {
        let engine = FakeEngine::new();
        let (_tx, rx) = watch::channel(false);
        let err = await_job(&engine, rx, "job-99", fast_wait()).await.unwrap_err();
        assert!(matches!(err, AuxError::NotFound(_)));
    }

    #[tokio::test]
    async fn deadline_expiry_cancels_the_job() {
        let engine = FakeEngine::new();
        engine.set_job_delay(10_000);
        let job_id = engine.add_image("img").await.unwrap();

        let (_tx, rx) = watch::channel(false);
        let wait = JobWait {
            deadline: Duration::from_millis(20),
            ..fast_wait()
        };
        let err = await_job(&engine, rx, &job_id, wait).await.unwrap_err();
        assert!(matches!(err, AuxError::Internal(_)));
        assert_eq!(engine.cancelled_jobs(), vec![job_id]);
    }

    #[tokio::test]
    async fn cancellation_signal_stops_the_wait() {
        let engine = FakeEngine::new();
        engine.set_job_delay(10_000);
        let job_id = engine.add_image("img").await.unwrap();

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(true);
        });

        let wait = JobWait {
            deadline: Duration::from_secs(30),
            ..fast_wait()
        };
        let err = await_job(&engine, rx, &job_id, wait).await.unwrap_err();
        match err {
            AuxError::Internal(msg) => assert!(msg.contains("cancelled")),
            other => panic!("expected Internal, got {other:?}"),
        }
        assert_eq!(engine.cancelled_jobs(), vec![job_id]);
    }

    #[tokio::test]
    async fn cancel_failure_is_swallowed() {
        let engine = FakeEngine::new();
        engine.set_job_delay(10_000);
        let job_id = engine.add_image("img").await.unwrap();
        engine.fail_next("cancel_job", berth_engine::EngineError::Transport("down".into()));

        let (_tx, rx) = watch::channel(false);
        let wait = JobWait {
            deadline: Duration::from_millis(20),
            ..fast_wait()
        };
        // The await still reports its own deadline error.
        let err = await_job(&engine, rx, &job_id, wait).await.unwrap_err();
        assert!(matches!(err, AuxError::Internal(_)));
        assert!(engine.cancelled_jobs().is_empty());
    }
}
