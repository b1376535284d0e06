use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// In-process, synchronous fan-out. `emit` calls every listener in
/// subscription order before returning; nothing is queued.
#[derive(Default)]
pub struct StateChangeEmitter {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Box<dyn FnMut()>)>,
}

impl fmt::Debug for StateChangeEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChangeEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl StateChangeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn emit_reaches_listeners_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = StateChangeEmitter::new();
        for name in ["first", "second"] {
            let log = log.clone();
            emitter.subscribe(move || log.borrow_mut().push(name));
        }
        emitter.emit();
        emitter.emit();
        assert_eq!(*log.borrow(), vec!["first", "second", "first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0));
        let mut emitter = StateChangeEmitter::new();
        let counter = hits.clone();
        let id = emitter.subscribe(move || *counter.borrow_mut() += 1);
        emitter.emit();
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        emitter.emit();
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }
}
