//! Dedicated OS thread that drives a shared queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::{LicenseGate, NetworkClient};
use crate::runtime::shared::{SharedGenerationQueue, Wake};

/// Ticks a [`SharedGenerationQueue`] on its own thread.
///
/// The thread parks on a condvar while the queue is empty and ticks every `interval`
/// while it has work. Stops on [`ThreadTickDriver::stop`] or drop.
pub struct ThreadTickDriver {
    stop: Arc<AtomicBool>,
    wake: Arc<Wake>,
    thread: Option<JoinHandle<()>>,
}

impl ThreadTickDriver {
    /// Spawn the driver thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<C, G>(
        queue: SharedGenerationQueue<C, G>,
        interval: Duration,
    ) -> Result<Self, std::io::Error>
    where
        C: NetworkClient + 'static,
        G: LicenseGate + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let wake = queue.wake();
        let thread = std::thread::Builder::new()
            .name("sdf-queue-tick".into())
            .spawn({
                let stop = Arc::clone(&stop);
                move || tick_loop(&queue, &stop, interval)
            })?;
        Ok(Self {
            stop,
            wake,
            thread: Some(thread),
        })
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.wake.interrupt();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("tick driver thread panicked");
            }
        }
    }
}

impl Drop for ThreadTickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop<C, G>(queue: &SharedGenerationQueue<C, G>, stop: &AtomicBool, interval: Duration)
where
    C: NetworkClient,
    G: LicenseGate,
{
    let wake = queue.wake();
    loop {
        {
            let mut work = wake.work_available.lock();
            while !*work && !stop.load(Ordering::Acquire) && !queue.is_active() {
                wake.condvar.wait(&mut work);
            }
            *work = false;
        }
        if stop.load(Ordering::Acquire) {
            tracing::info!("tick driver shutting down");
            return;
        }

        tracing::debug!("tick driver active");
        loop {
            if let Some(outcome) = queue.tick() {
                tracing::debug!(target_id = %outcome.target, state = ?outcome.state, "tick finished job");
            }
            if !queue.is_active() {
                break;
            }
            let mut work = wake.work_available.lock();
            if stop.load(Ordering::Acquire) {
                break;
            }
            wake.condvar.wait_for(&mut work, interval);
        }
    }
}
