use crate::Subscription;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ordered reactive list.
///
/// Structural mutations fire the `on_add`/`on_remove` registries
/// synchronously, one round per affected element, in element order.
pub struct ListCell<T> {
    items: Vec<T>,
    next_id: u64,
    on_add: Vec<(u64, Box<dyn Fn(&T)>)>,
    on_remove: Vec<(u64, Box<dyn Fn(&T)>)>,
}

impl<T> ListCell<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items,
            next_id: 0,
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        if let Some(added) = self.items.last() {
            for (_, listener) in &self.on_add {
                listener(added);
            }
        }
    }

    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
        let added = &self.items[index];
        for (_, listener) in &self.on_add {
            listener(added);
        }
    }

    /// Remove the element at `index`. Returns it, or `None` if out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        for (_, listener) in &self.on_remove {
            listener(&removed);
        }
        Some(removed)
    }

    /// Remove all elements, firing `on_remove` per element in order.
    pub fn clear(&mut self) {
        let drained: Vec<T> = std::mem::take(&mut self.items);
        for item in &drained {
            for (_, listener) in &self.on_remove {
                listener(item);
            }
        }
    }

    /// Replace the whole contents: clears, then pushes each new element.
    /// Listeners observe the removals and additions individually.
    pub fn assign(&mut self, items: impl IntoIterator<Item = T>) {
        self.clear();
        for item in items {
            self.push(item);
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn on_add(&mut self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.on_add.push((id, Box::new(listener)));
        Subscription(id)
    }

    pub fn on_remove(&mut self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.on_remove.push((id, Box::new(listener)));
        Subscription(id)
    }

    /// Remove a subscription from either registry.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.on_add.len() + self.on_remove.len();
        self.on_add.retain(|(id, _)| *id != sub.0);
        self.on_remove.retain(|(id, _)| *id != sub.0);
        self.on_add.len() + self.on_remove.len() != before
    }
}

impl<T: PartialEq> ListCell<T> {
    /// Remove the first element equal to `item`. Returns false if absent.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|x| x == item) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }
}

/// Clones the items only. The clone has no listeners.
impl<T: Clone> Clone for ListCell<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.items.clone())
    }
}

impl<T> Default for ListCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ListCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListCell")
            .field("items", &self.items)
            .field("listeners", &(self.on_add.len() + self.on_remove.len()))
            .finish()
    }
}

impl<T: PartialEq> PartialEq for ListCell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Serialize> Serialize for ListCell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ListCell<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn push_and_remove_fire_listeners() {
        let mut list = ListCell::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        list.on_add(move |v: &i32| l1.borrow_mut().push(format!("add {v}")));
        let l2 = log.clone();
        list.on_remove(move |v: &i32| l2.borrow_mut().push(format!("remove {v}")));

        list.push(1);
        list.push(2);
        list.remove(&1);
        assert_eq!(*log.borrow(), vec!["add 1", "add 2", "remove 1"]);
        assert_eq!(list.as_slice(), &[2]);
    }

    #[test]
    fn remove_at_out_of_range_is_none() {
        let mut list = ListCell::from_vec(vec![1]);
        assert_eq!(list.remove_at(3), None);
        assert_eq!(list.remove_at(0), Some(1));
    }

    #[test]
    fn clear_fires_on_remove_per_item_in_order() {
        let mut list = ListCell::from_vec(vec![1, 2, 3]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        list.on_remove(move |v: &i32| l.borrow_mut().push(*v));

        list.clear();
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert!(list.is_empty());
    }

    #[test]
    fn assign_replaces_contents() {
        let mut list = ListCell::from_vec(vec![1, 2]);
        list.assign(vec![9, 8, 7]);
        assert_eq!(list.as_slice(), &[9, 8, 7]);
    }

    #[test]
    fn unsubscribe_on_add() {
        let mut list = ListCell::new();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let sub = list.on_add(move |_: &i32| *c.borrow_mut() += 1);

        list.push(1);
        assert!(list.unsubscribe(sub));
        list.push(2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn clone_is_independent() {
        let mut list = ListCell::from_vec(vec![1, 2]);
        let mut copy = list.clone();
        copy.push(3);
        assert_eq!(list.len(), 2);
        assert_eq!(copy.len(), 3);
        list.push(4);
        assert_eq!(copy.len(), 3);
    }
}
