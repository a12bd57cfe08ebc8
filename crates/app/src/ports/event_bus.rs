//! Event bus port — publish/subscribe for control events.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::event::ControlEvent;

/// Publishes control events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: ControlEvent)
    -> impl Future<Output = Result<(), HearthError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: ControlEvent,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        (**self).publish(event)
    }
}
