use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Create a single-slot notification channel.
///
/// The slot holds at most one value. Sending while it is full replaces the
/// pending value instead of blocking, like a hardware signal register in
/// overwrite mode.
pub fn mailbox<T>() -> (Notifier<T>, Waiter<T>) {
    let (tx, rx) = bounded(1);
    (
        Notifier {
            tx,
            drain: rx.clone(),
        },
        Waiter { rx },
    )
}

/// Sending half of a [`mailbox`]
#[derive(Debug)]
pub struct Notifier<T> {
    tx: Sender<T>,
    // Kept to discard a stale value on overwrite. Also keeps the channel
    // connected for as long as the notifier lives.
    drain: Receiver<T>,
}

impl<T> Notifier<T> {
    /// Deliver `value`, replacing any value the waiter has not taken yet
    pub fn send(&self, value: T) {
        let mut value = value;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    let _ = self.drain.try_recv();
                    value = back;
                }
                // Unreachable while `drain` is alive
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        !self.tx.is_empty()
    }
}

/// Receiving half of a [`mailbox`]
#[derive(Debug)]
pub struct Waiter<T> {
    rx: Receiver<T>,
}

impl<T> Waiter<T> {
    /// Block until a value arrives. `None` once the notifier is gone.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    #[cfg(test)]
    fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn send_then_recv() {
        let (notifier, waiter) = mailbox();
        notifier.send(7u32);
        assert!(notifier.is_pending());
        assert_eq!(waiter.recv(), Some(7));
        assert!(!notifier.is_pending());
    }

    #[test]
    fn send_overwrites_pending_value() {
        let (notifier, waiter) = mailbox();
        notifier.send(1u32);
        notifier.send(2);
        notifier.send(3);
        assert_eq!(waiter.try_recv(), Some(3));
        assert_eq!(waiter.try_recv(), None);
    }

    #[test]
    fn try_recv_on_empty_slot() {
        let (_notifier, waiter) = mailbox::<u32>();
        assert_eq!(waiter.try_recv(), None);
    }

    #[test]
    fn recv_returns_none_after_notifier_drop() {
        let (notifier, waiter) = mailbox::<u32>();
        drop(notifier);
        assert_eq!(waiter.recv(), None);
        assert_eq!(waiter.try_recv(), None);
    }

    #[test]
    fn blocked_waiter_is_woken() {
        let (notifier, waiter) = mailbox();
        let handle = thread::spawn(move || waiter.recv());
        notifier.send(42u32);
        assert_eq!(handle.join().unwrap(), Some(42));
    }
}
