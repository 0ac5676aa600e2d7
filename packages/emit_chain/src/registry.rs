use std::fmt;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt};

use crate::{EventName, Listener, ListenerId};

struct Registration<A> {
    id: ListenerId,
    listener: Listener<A>,
    once: bool,
}

/// The listeners registered on an emitter, per event name, in invocation order.
pub(crate) struct Registry<A> {
    events: HashMap<EventName, Vec<Registration<A>>>,
    next_id: u64,
}

impl<A> Registry<A> {
    pub(crate) fn new() -> Self {
        Self {
            events: HashMap::new(),
            next_id: 0,
        }
    }

    pub(crate) fn append(
        &mut self,
        event: EventName,
        listener: Listener<A>,
        once: bool,
    ) -> ListenerId {
        let registration = self.registration(listener, once);
        let id = registration.id;

        self.events.entry(event).or_default().push(registration);

        id
    }

    pub(crate) fn prepend(
        &mut self,
        event: EventName,
        listener: Listener<A>,
        once: bool,
    ) -> ListenerId {
        let registration = self.registration(listener, once);
        let id = registration.id;

        self.events.entry(event).or_default().insert(0, registration);

        id
    }

    /// Removes one registration. Returns `false` if it was not registered for `event`.
    pub(crate) fn remove(&mut self, event: &str, id: ListenerId) -> bool {
        let Some(registrations) = self.events.get_mut(event) else {
            return false;
        };

        let Some(index) = registrations.iter().position(|r| r.id == id) else {
            return false;
        };

        registrations.remove(index);

        if registrations.is_empty() {
            self.events.remove(event);
        }

        true
    }

    /// Removes every registration for `event`, returning how many there were.
    pub(crate) fn remove_all(&mut self, event: &str) -> usize {
        self.events.remove(event).map_or(0, |registrations| registrations.len())
    }

    pub(crate) fn count(&self, event: &str) -> usize {
        self.events.get(event).map_or(0, Vec::len)
    }

    pub(crate) fn event_names(&self) -> Vec<EventName> {
        self.events.keys().cloned().collect()
    }

    /// Takes the listener snapshot for one emission of `event`.
    ///
    /// Registrations made via `once` are removed here, before any listener is invoked, so they
    /// take part in exactly one chain.
    pub(crate) fn snapshot(&mut self, event: &str) -> Vec<Listener<A>> {
        let Some(registrations) = self.events.get_mut(event) else {
            return Vec::new();
        };

        let snapshot = registrations
            .iter()
            .map(|r| Rc::clone(&r.listener))
            .collect();

        registrations.retain(|r| !r.once);

        if registrations.is_empty() {
            self.events.remove(event);
        }

        snapshot
    }

    fn registration(&mut self, listener: Listener<A>, once: bool) -> Registration<A> {
        let id = ListenerId::new(self.next_id);

        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("listener identifiers cannot realistically be exhausted");

        Registration { id, listener, once }
    }
}

impl<A> fmt::Debug for Registry<A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();

        for (event, registrations) in &self.events {
            map.entry(event, &registrations.len());
        }

        map.finish()
    }
}
