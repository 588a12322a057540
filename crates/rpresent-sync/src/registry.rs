//! Presentation-scoped fan-out of slide numbers to viewer mailboxes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::mailbox::Mailbox;
use crate::protocol::SlideNumber;

/// Thread-safe listener table. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<HashMap<String, Vec<Arc<Mailbox>>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, presentation_id: &str, mailbox: Arc<Mailbox>) {
        let mut map = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(presentation_id.to_owned()).or_default().push(mailbox);
    }

    /// Remove `mailbox` by identity. Returns false if it was not registered.
    pub fn remove_listener(&self, presentation_id: &str, mailbox: &Arc<Mailbox>) -> bool {
        let mut map = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = map.get_mut(presentation_id) else {
            return false;
        };
        match list.iter().position(|m| Arc::ptr_eq(m, mailbox)) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Deliver `slide` to every mailbox registered under `presentation_id`.
    ///
    /// Delivery never blocks, so a stuck viewer cannot stall the presenter.
    /// Returns the number of mailboxes reached.
    pub fn broadcast(&self, presentation_id: &str, slide: SlideNumber) -> usize {
        let map = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = map.get(presentation_id) else {
            return 0;
        };
        for mailbox in list {
            mailbox.deliver(slide);
        }
        trace!(presentation = %presentation_id, %slide, listeners = list.len(), "broadcast");
        list.len()
    }

    /// Register a fresh mailbox, deregistered again when the guard drops.
    pub fn subscribe(&self, presentation_id: &str) -> Subscription {
        let mailbox = Arc::new(Mailbox::new());
        self.add_listener(presentation_id, Arc::clone(&mailbox));
        Subscription {
            registry: self.clone(),
            presentation_id: presentation_id.to_owned(),
            mailbox,
        }
    }

    pub fn listener_count(&self, presentation_id: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(presentation_id)
            .map_or(0, Vec::len)
    }

    pub fn contains(&self, presentation_id: &str, mailbox: &Arc<Mailbox>) -> bool {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(presentation_id)
            .is_some_and(|list| list.iter().any(|m| Arc::ptr_eq(m, mailbox)))
    }
}

/// Registry membership of one viewer connection.
#[derive(Debug)]
pub struct Subscription {
    registry: ListenerRegistry,
    presentation_id: String,
    mailbox: Arc<Mailbox>,
}

impl Subscription {
    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    pub fn presentation_id(&self) -> &str {
        &self.presentation_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry
            .remove_listener(&self.presentation_id, &self.mailbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn slide(n: u32) -> SlideNumber {
        SlideNumber::new(n).unwrap()
    }

    #[tokio::test]
    async fn broadcast_reaches_every_listener_of_presentation_only() {
        let registry = ListenerRegistry::new();
        let subs: Vec<_> = (0..3).map(|_| registry.subscribe("p1")).collect();
        let other = registry.subscribe("p2");

        assert_eq!(registry.broadcast("p1", slide(5)), 3);

        for sub in &subs {
            assert_eq!(
                sub.mailbox().await_update(Duration::from_millis(10)).await,
                Some(slide(5))
            );
        }
        assert_eq!(other.mailbox().take(), None);
    }

    #[test]
    fn broadcast_without_listeners_is_silent() {
        let registry = ListenerRegistry::new();
        assert_eq!(registry.broadcast("nobody", slide(1)), 0);
    }

    #[test]
    fn remove_is_by_identity_and_idempotent() {
        let registry = ListenerRegistry::new();
        let a = Arc::new(Mailbox::new());
        let b = Arc::new(Mailbox::new());
        registry.add_listener("p1", Arc::clone(&a));
        registry.add_listener("p1", Arc::clone(&b));

        assert!(registry.remove_listener("p1", &a));
        assert!(!registry.remove_listener("p1", &a));
        assert!(!registry.remove_listener("p2", &b));

        assert!(!registry.contains("p1", &a));
        assert!(registry.contains("p1", &b));
        assert_eq!(registry.listener_count("p1"), 1);
    }

    #[test]
    fn dropping_subscription_deregisters() {
        let registry = ListenerRegistry::new();
        let sub = registry.subscribe("p1");
        let mailbox = Arc::clone(sub.mailbox());
        assert_eq!(sub.presentation_id(), "p1");
        assert!(registry.contains("p1", &mailbox));

        drop(sub);
        assert!(!registry.contains("p1", &mailbox));
        assert_eq!(registry.listener_count("p1"), 0);
    }

    #[test]
    fn explicit_remove_before_drop_is_tolerated() {
        let registry = ListenerRegistry::new();
        let sub = registry.subscribe("p1");
        assert!(registry.remove_listener("p1", sub.mailbox()));
        drop(sub);
        assert_eq!(registry.listener_count("p1"), 0);
    }

    #[tokio::test]
    async fn subscription_dropped_by_aborted_task_is_cleaned_up() {
        let registry = ListenerRegistry::new();
        let task = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let sub = registry.subscribe("p1");
                sub.mailbox().await_update(Duration::from_secs(60)).await
            })
        };

        while registry.listener_count("p1") == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;
        assert_eq!(registry.listener_count("p1"), 0);
    }
}
