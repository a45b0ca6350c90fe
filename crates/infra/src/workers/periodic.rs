use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Runs a job on a fixed interval in a named thread.
///
/// - The job runs once immediately, then after every `interval`
/// - Job errors are logged and the loop continues
/// - Shutdown interrupts the wait; an in-flight job runs to completion
#[derive(Debug)]
pub struct PeriodicWorker;

impl PeriodicWorker {
    pub fn spawn<J>(name: &'static str, interval: Duration, mut job: J) -> io::Result<WorkerHandle>
    where
        J: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, interval, shutdown_rx, &mut job))?;

        Ok(WorkerHandle {
            name,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<J>(name: &'static str, interval: Duration, shutdown_rx: mpsc::Receiver<()>, job: &mut J)
where
    J: FnMut() -> anyhow::Result<()>,
{
    loop {
        if let Err(err) = job() {
            warn!(worker = name, error = %format!("{err:#}"), "periodic job failed");
        }

        match shutdown_rx.recv_timeout(interval) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
        }
    }
    debug!(worker = name, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn runs_until_shutdown_and_survives_job_errors() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = PeriodicWorker::spawn("test-periodic", Duration::from_millis(5), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                anyhow::bail!("first run fails");
            }
            Ok(())
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while runs.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        handle.shutdown();

        let after = runs.load(Ordering::SeqCst);
        assert!(after >= 3);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(runs.load(Ordering::SeqCst), after);
    }
}
