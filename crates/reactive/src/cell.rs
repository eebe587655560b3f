use crate::Subscription;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single reactive value.
///
/// `set` and `update` notify every subscriber synchronously, in subscription
/// order, before returning. Notification fires unconditionally: writing a
/// value equal to the current one still counts as a mutation.
pub struct Cell<T> {
    value: T,
    next_id: u64,
    listeners: Vec<(u64, Box<dyn Fn(&T)>)>,
}

impl<T> Cell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value and notify all subscribers.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.notify();
    }

    /// Mutate the value in place and notify all subscribers.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.notify();
    }

    /// Fire every listener with the current value, in subscription order.
    pub fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.value);
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        Subscription(id)
    }

    /// Remove a subscription. Returns false if the handle is unknown.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != sub.0);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: Clone> Cell<T> {
    pub fn cloned(&self) -> T {
        self.value.clone()
    }
}

impl<T: Copy> Cell<T> {
    pub fn copied(&self) -> T {
        self.value
    }
}

/// Clones the value only. The clone has no listeners.
impl<T: Clone> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: Default> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Cell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Cell<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}
