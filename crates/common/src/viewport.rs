use std::collections::BTreeMap;

/// Handle returned by [`ViewportTracker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Tracks the display size and pixel density and queues a resize event for
/// every subscriber each time a new size is observed.
///
/// Events carry no payload; subscribers re-query the tracker. Delivery is
/// pull-based: the owner drains its subscription on its own frame, so no
/// callback ever runs re-entrantly.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    width: f32,
    height: f32,
    pixel_ratio: f64,
    pending: BTreeMap<SubscriptionId, usize>,
    next_id: u64,
}

impl ViewportTracker {
    pub fn new(width: f32, height: f32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
            pending: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Register interest in resize events.
    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, 0);
        id
    }

    /// Drop a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.pending.len()
    }

    /// Record a new viewport size and emit one resize event.
    pub fn observe(&mut self, width: f32, height: f32, pixel_ratio: f64) {
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        for count in self.pending.values_mut() {
            *count += 1;
        }
        tracing::debug!(width, height, pixel_ratio, "viewport resized");
    }

    /// Take the number of events queued for `id` since the last drain.
    pub fn drain(&mut self, id: SubscriptionId) -> usize {
        self.pending
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_updates_dimensions() {
        let mut tracker = ViewportTracker::new(800.0, 600.0, 1.0);
        tracker.observe(1024.0, 768.0, 2.0);
        assert_eq!(tracker.width(), 1024.0);
        assert_eq!(tracker.height(), 768.0);
        assert_eq!(tracker.pixel_ratio(), 2.0);
    }

    #[test]
    fn each_observation_queues_one_event_per_subscriber() {
        let mut tracker = ViewportTracker::new(800.0, 600.0, 1.0);
        let a = tracker.subscribe();
        let b = tracker.subscribe();
        tracker.observe(900.0, 700.0, 1.0);
        tracker.observe(1000.0, 700.0, 1.0);

        assert_eq!(tracker.drain(a), 2);
        assert_eq!(tracker.drain(a), 0);
        assert_eq!(tracker.drain(b), 2);
    }

    #[test]
    fn unsubscribed_listeners_receive_nothing() {
        let mut tracker = ViewportTracker::new(800.0, 600.0, 1.0);
        let id = tracker.subscribe();
        assert!(tracker.unsubscribe(id));
        assert!(!tracker.unsubscribe(id));
        tracker.observe(10.0, 10.0, 1.0);
        assert_eq!(tracker.drain(id), 0);
        assert_eq!(tracker.subscriber_count(), 0);
    }
}
