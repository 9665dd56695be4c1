//! Background jobs that finish exactly once.
//!
//! A [`Task`] runs a closure on its own thread and delivers the result through
//! a channel. The UI polls it once per frame. Tasks cannot be cancelled; dropping
//! one just discards the result when it arrives.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui;

#[derive(Debug, PartialEq)]
pub enum TaskPoll<T> {
    Pending,
    Ready(T),
    /// The worker panicked or never started.
    Lost,
}

pub struct Task<T> {
    name: &'static str,
    rx: Receiver<T>,
}

impl<T: Send + 'static> Task<T> {
    pub fn spawn<F>(ctx: &egui::Context, name: &'static str, job: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let ctx = ctx.clone();

        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            let result = job();
            // The receiver may already be gone; the result is simply dropped then.
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        if let Err(e) = spawned {
            tracing::error!(task = name, "Failed to spawn worker: {}", e);
        }

        Task { name, rx }
    }
}

impl<T> Task<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn poll(&self) -> TaskPoll<T> {
        match self.rx.try_recv() {
            Ok(value) => TaskPoll::Ready(value),
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Disconnected) => TaskPoll::Lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait<T>(task: &Task<T>) -> TaskPoll<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match task.poll() {
                TaskPoll::Pending if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(5))
                }
                other => return other,
            }
        }
    }

    #[test]
    fn delivers_the_single_result() {
        let ctx = egui::Context::default();
        let task = Task::spawn(&ctx, "test-ok", || 21 * 2);
        assert_eq!(wait(&task), TaskPoll::Ready(42));
        assert_eq!(task.name(), "test-ok");
    }

    #[test]
    fn panicking_worker_is_reported_as_lost() {
        let ctx = egui::Context::default();
        let task: Task<u8> = Task::spawn(&ctx, "test-panic", || panic!("boom"));
        assert_eq!(wait(&task), TaskPoll::Lost);
    }
}
