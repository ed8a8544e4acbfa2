use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Single-slot channel where a newer value replaces an unread older one.
///
/// Built on `bounded(1)`: when the slot is full the sender drains it through
/// its own receiver clone and retries.
#[derive(Debug)]
pub struct LatestSender<T> {
    tx: Sender<T>,
    drop_rx: Receiver<T>,
}

#[derive(Debug)]
pub struct LatestReceiver<T> {
    rx: Receiver<T>,
}

pub fn latest_channel<T>() -> (LatestSender<T>, LatestReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        LatestSender {
            tx,
            drop_rx: rx.clone(),
        },
        LatestReceiver { rx },
    )
}

impl<T> LatestSender<T> {
    /// Publish `value`, discarding whatever the receiver has not taken yet.
    pub fn send(&self, value: T) {
        match self.tx.try_send(value) {
            Ok(()) => {}
            Err(TrySendError::Full(value)) => {
                while self.drop_rx.try_recv().is_ok() {}
                let _ = self.tx.try_send(value);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl<T> LatestReceiver<T> {
    /// Newest pending value, if any.
    pub fn take(&self) -> Option<T> {
        let mut latest = None;
        while let Ok(v) = self.rx.try_recv() {
            latest = Some(v);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_value_replaces_unread_one() {
        let (tx, rx) = latest_channel();
        tx.send(1);
        tx.send(2);
        tx.send(3);
        assert_eq!(rx.take(), Some(3));
        assert_eq!(rx.take(), None);
    }

    #[test]
    fn send_after_receiver_dropped_is_silent() {
        let (tx, rx) = latest_channel();
        drop(rx);
        tx.send("x");
        tx.send("y");
    }
}
