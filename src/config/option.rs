use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// A named, observable configuration value.
///
/// Cloning yields another handle to the same value. Subscribers are told
/// about every change; setting an equal value is a no-op.
#[derive(Clone)]
pub struct ConfigOption<T> {
    name: Arc<str>,
    tx: Arc<watch::Sender<T>>,
}

impl<T: Clone + PartialEq> ConfigOption<T> {
    pub fn new(name: &str, value: T) -> Self {
        let (tx, _) = watch::channel(value);
        Self {
            name: Arc::from(name),
            tx: Arc::new(tx),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value. Returns whether it actually changed.
    pub fn set(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Edit in place; subscribers are notified only if the edit changed it.
    pub fn update(&self, edit: impl FnOnce(&mut T)) -> bool {
        self.tx.send_if_modified(|current| {
            let before = current.clone();
            edit(current);
            *current != before
        })
    }

    pub fn subscribe(&self) -> OptionSubscription<T> {
        OptionSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigOption<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOption")
            .field("name", &self.name)
            .field("value", &*self.tx.borrow())
            .finish()
    }
}

/// Change feed for a [`ConfigOption`]. Dropping it unsubscribes.
pub struct OptionSubscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> OptionSubscription<T> {
    /// Whether the value changed since it was last read through this handle.
    pub fn has_changed(&self) -> bool {
        matches!(self.rx.has_changed(), Ok(true))
    }

    /// Current value; marks it as seen.
    pub fn latest(&mut self) -> T {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next change. `None` once every option handle is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.latest())
    }
}
