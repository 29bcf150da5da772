use std::sync::{Condvar, Mutex, PoisonError};

/// Wake-up broadcast from the frame loop to the background workers.
///
/// Each call to [`FrameSignal::broadcast`] releases every worker currently
/// blocked in [`FrameSignal::wait`]. Workers that are busy or sleeping when
/// the broadcast happens do not see it and wait for the next one.
#[derive(Debug, Default)]
pub struct FrameSignal {
    frame: Mutex<u64>,
    condvar: Condvar,
}

impl FrameSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&self) {
        let mut frame = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        *frame += 1;
        self.condvar.notify_all();
    }

    /// Number of broadcasts so far.
    pub fn frame(&self) -> u64 {
        *self.frame.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the next broadcast and return its frame number.
    pub fn wait(&self) -> u64 {
        let guard = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        let seen = *guard;
        let guard = self
            .condvar
            .wait_while(guard, |frame| *frame == seen)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn broadcast_wakes_every_waiter() {
        let signal = Arc::new(FrameSignal::new());
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            let signal = signal.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                tx.send(signal.wait()).unwrap();
            });
        }
        drop(tx);

        let mut woken = Vec::new();
        while woken.len() < 3 {
            signal.broadcast();
            if let Ok(frame) = rx.recv_timeout(Duration::from_millis(20)) {
                woken.push(frame);
            }
        }
        assert!(woken.iter().all(|f| *f >= 1));
    }

    #[test]
    fn counts_frames() {
        let signal = FrameSignal::new();
        assert_eq!(signal.frame(), 0);
        signal.broadcast();
        signal.broadcast();
        assert_eq!(signal.frame(), 2);
    }
}
