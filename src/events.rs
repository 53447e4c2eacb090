//! In-process notifications: background load results and the mode broadcast

use crate::boundary::BoundaryLayer;
use crate::cables::CableFeature;
use crate::error::Result;
use crate::view_mode::ViewMode;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Name of the broadcast carried by [`ModeBus`]
pub const MODE_CHANGE_EVENT: &str = "viewModeChange";

/// Result of a background fetch, handed back to the UI loop
#[derive(Debug)]
pub enum LoadEvent {
    Boundary(Result<BoundaryLayer>),
    Cables(Result<Vec<CableFeature>>),
}

/// Payload of a mode broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub event: &'static str,
    pub mode: String,
}

impl ModeChange {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            event: MODE_CHANGE_EVENT,
            mode: mode.label().to_string(),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        ViewMode::from_persisted(Some(&self.mode))
    }
}

/// Fan-out of mode changes to every live subscriber
#[derive(Default)]
pub struct ModeBus {
    subscribers: Vec<Sender<ModeChange>>,
}

impl ModeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ModeChange> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Returns how many subscribers received the change
    pub fn publish(&mut self, mode: ViewMode) -> usize {
        let change = ModeChange::new(mode);
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        tracing::trace!(event = MODE_CHANGE_EVENT, %mode, receivers = self.subscribers.len(), "published");
        self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_all_subscribers() {
        let mut bus = ModeBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_eq!(bus.publish(ViewMode::NigeriaFocus), 2);
        let got = a.try_recv().unwrap();
        assert_eq!(got.event, "viewModeChange");
        assert_eq!(got.mode, "Nigeria Focus");
        assert_eq!(b.try_recv().unwrap().view_mode(), ViewMode::NigeriaFocus);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut bus = ModeBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.publish(ViewMode::GrandScheme), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert!(keep.try_recv().is_ok());
    }
}
