use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Repeating local tick source for the quiz countdown.
///
/// The ticker only emits events. Whoever owns the attempt state applies them, so the state stays
/// on a single thread. Dropping the ticker stops it.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Sends `event()` on `sender` every `interval` until stopped or the receiver is gone.
    pub fn start<T, F>(interval: Duration, sender: Sender<T>, event: F) -> Ticker
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::SeqCst) {
                break;
            }
            if sender.send(event()).is_err() {
                break;
            }
        });
        Ticker {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
    }

    /// Stops the ticker and waits for its thread. At most one tick may still be in flight.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Countdown thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
