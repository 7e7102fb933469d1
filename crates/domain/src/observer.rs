//! Stale-data broadcast to registered list consumers.
//!
//! Index mutations notify every registered observer except the active one,
//! which is expected to redraw on its own change-detection path.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverID(usize);

#[derive(Default)]
pub struct ObserverRegistry {
    next_id: usize,
    entries: Vec<(ObserverID, Box<dyn Fn()>)>,
    active: Option<ObserverID>,
}

impl ObserverRegistry {
    pub fn register(&mut self, observer: Box<dyn Fn()>) -> ObserverID {
        let id = ObserverID(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub fn unregister(&mut self, id: ObserverID) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        if self.active == Some(id) {
            self.active = None;
        }
    }

    pub fn set_active(&mut self, id: Option<ObserverID>) {
        self.active = id;
    }

    #[must_use]
    pub fn active(&self) -> Option<ObserverID> {
        self.active
    }

    pub fn notify_stale(&self) {
        for (id, observer) in &self.entries {
            if Some(*id) != self.active {
                observer();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;

    fn counting_observer(count: &Rc<Cell<u32>>) -> Box<dyn Fn()> {
        let count = Rc::clone(count);
        Box::new(move || count.set(count.get() + 1))
    }

    #[test]
    fn test_notify_all() {
        let mut registry = ObserverRegistry::default();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        registry.register(counting_observer(&first));
        registry.register(counting_observer(&second));

        registry.notify_stale();

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_notify_skips_active() {
        let mut registry = ObserverRegistry::default();
        let foreground = Rc::new(Cell::new(0));
        let background = Rc::new(Cell::new(0));
        let id = registry.register(counting_observer(&foreground));
        registry.register(counting_observer(&background));
        registry.set_active(Some(id));

        registry.notify_stale();

        assert_eq!(foreground.get(), 0);
        assert_eq!(background.get(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut registry = ObserverRegistry::default();
        let count = Rc::new(Cell::new(0));
        let id = registry.register(counting_observer(&count));
        registry.set_active(Some(id));
        registry.unregister(id);

        registry.notify_stale();

        assert_eq!(count.get(), 0);
        assert_eq!(registry.active(), None);
    }
}
