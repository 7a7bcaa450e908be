//! Background loop that sends a weather notification on a fixed interval

use crate::{
    notify::NotificationSink, state::AppState, weather::WeatherClient,
};
use anyhow::Context;
use log::{debug, error, info, trace};
use std::{
    cmp,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Runs at most one notification loop at a time. Every `interval` the loop
/// fetches the weather for the current city and shows it as a notification.
/// Stopping is cooperative: the loop sleeps in `poll`-sized steps and checks
/// for a stop request between each one, so it exits within one step.
pub struct NotificationScheduler {
    state: Arc<AppState>,
    client: Arc<dyn WeatherClient>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
    poll: Duration,
    worker: Mutex<Option<Worker>>,
    /// Number of loop threads that haven't exited yet
    active_loops: Arc<AtomicUsize>,
}

impl NotificationScheduler {
    pub fn new(
        state: Arc<AppState>,
        client: Arc<dyn WeatherClient>,
        sink: Arc<dyn NotificationSink>,
        interval: Duration,
        poll: Duration,
    ) -> Self {
        // A zero poll or interval would spin. The interval is never shorter
        // than one poll.
        let poll = cmp::max(poll, Duration::from_millis(1));
        Self {
            state,
            client,
            sink,
            interval: cmp::max(interval, poll),
            poll,
            worker: Mutex::new(None),
            active_loops: Default::default(),
        }
    }

    /// Make sure the loop is running. If the previous loop was asked to stop
    /// but hasn't noticed yet, the request is withdrawn and that loop carries
    /// on. If it already committed to exiting, it's reaped and replaced.
    /// Either way there's never more than one loop.
    pub fn start(&self) -> anyhow::Result<()> {
        let mut worker = lock(&self.worker);

        if let Some(current) = worker.as_ref() {
            let mut control = lock(&current.control);
            if !current.handle.is_finished() {
                match *control {
                    LoopControl::Running => {
                        debug!("Notification loop already running");
                        return Ok(());
                    }
                    LoopControl::StopRequested => {
                        info!("Resuming notification loop");
                        *control = LoopControl::Running;
                        return Ok(());
                    }
                    LoopControl::Exited => {}
                }
            }
        }

        // Whatever is left is finished or about to be, so this is quick
        if let Some(previous) = worker.take() {
            previous.join();
        }

        let control = Arc::new(Mutex::new(LoopControl::Running));
        let context = LoopContext {
            state: Arc::clone(&self.state),
            client: Arc::clone(&self.client),
            sink: Arc::clone(&self.sink),
            control: Arc::clone(&control),
            interval: self.interval,
            poll: self.poll,
        };
        // Count the loop before it exists, so callers never see it missing
        let guard = ActiveGuard::new(Arc::clone(&self.active_loops));
        let handle = thread::Builder::new()
            .name("notifications".into())
            .spawn(move || {
                let _guard = guard;
                context.run();
            })
            .context("Error spawning notification thread")?;

        info!(
            "Started notification loop with interval {:?}",
            self.interval
        );
        *worker = Some(Worker { control, handle });
        Ok(())
    }

    /// Ask the loop to stop. Returns immediately; the loop exits at its next
    /// poll, or after an in-flight fetch completes.
    pub fn stop(&self) {
        if let Some(worker) = lock(&self.worker).as_ref() {
            let mut control = lock(&worker.control);
            if *control == LoopControl::Running {
                info!("Stopping notification loop");
                *control = LoopControl::StopRequested;
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(|worker| {
            !worker.handle.is_finished()
                && *lock(&worker.control) == LoopControl::Running
        })
    }

    /// Number of loop threads still alive. Never more than 1.
    pub fn active_loops(&self) -> usize {
        self.active_loops.load(Ordering::SeqCst)
    }

    /// Stop the loop and wait for its thread to exit
    pub fn shutdown(&self) {
        self.stop();
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            worker.join();
        }
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Lifecycle of a single loop, shared between the scheduler and the loop
/// thread. Transitions happen under the mutex, which is what keeps a resume
/// from racing with the loop's exit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum LoopControl {
    Running,
    StopRequested,
    /// The loop saw the stop request and will not run another tick
    Exited,
}

struct Worker {
    control: Arc<Mutex<LoopControl>>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn join(self) {
        if self.handle.join().is_err() {
            error!("Notification thread panicked");
        }
    }
}

/// Everything the loop thread owns
struct LoopContext {
    state: Arc<AppState>,
    client: Arc<dyn WeatherClient>,
    sink: Arc<dyn NotificationSink>,
    control: Arc<Mutex<LoopControl>>,
    interval: Duration,
    poll: Duration,
}

impl LoopContext {
    fn run(self) {
        while self.sleep() {
            self.tick();
        }
        info!("Notification loop stopped");
    }

    /// Sleep for one interval. Return `false` if a stop was requested in the
    /// meantime, in which case the loop should exit.
    fn sleep(&self) -> bool {
        let deadline = Instant::now() + self.interval;
        loop {
            if self.observe_stop() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(cmp::min(self.poll, deadline - now));
        }
    }

    /// Check for a stop request. If there is one, commit to exiting.
    fn observe_stop(&self) -> bool {
        let mut control = lock(&self.control);
        match *control {
            LoopControl::Running => false,
            LoopControl::StopRequested | LoopControl::Exited => {
                *control = LoopControl::Exited;
                true
            }
        }
    }

    /// Fetch fresh weather and show it. Errors end up in the log, not in
    /// front of the user.
    fn tick(&self) {
        let Some(city) = self.state.notification_city() else {
            trace!("No city selected, skipping notification");
            return;
        };
        match self.client.fetch(&city) {
            Ok(reading) => self.sink.notify_reading(&reading),
            Err(err) => error!("Error fetching weather for {city:?}: {err}"),
        }
    }
}

/// Keeps [NotificationScheduler::active_loops] accurate, even if the loop
/// panics
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Nothing holding these locks can panic partway through an update, so a
/// poisoned lock still holds valid data
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
