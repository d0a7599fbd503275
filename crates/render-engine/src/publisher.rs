//! Progress publishing.
//!
//! Publishing is fire-and-forget: a publisher never fails the render and
//! never blocks it. Subscribers see events in emission order.

use pitchpilot_media_model::event::{LifecycleEvent, RenderProgress};
use pitchpilot_media_model::request::RenderId;
use tokio::sync::mpsc;
use tracing::field::display;

/// Sink for lifecycle events.
pub trait ProgressPublisher: Send + Sync {
    /// Deliver one lifecycle event.
    fn publish(&self, event: LifecycleEvent);

    /// Deliver an encoder progress snapshot. Ignored by default.
    fn progress(&self, _render_id: RenderId, _progress: RenderProgress) {}
}

impl<F> ProgressPublisher for F
where
    F: Fn(LifecycleEvent) + Send + Sync,
{
    fn publish(&self, event: LifecycleEvent) {
        self(event)
    }
}

/// Publisher that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

impl ProgressPublisher for NullPublisher {
    fn publish(&self, _event: LifecycleEvent) {}
}

/// Publisher that writes every event to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

impl ProgressPublisher for TracingPublisher {
    fn publish(&self, event: LifecycleEvent) {
        let payload = &event.payload;
        tracing::info!(
            topic = %event.topic,
            step = payload.step.as_str(),
            render_id = payload.render_id.map(display),
            message = payload.message.as_deref(),
            file = payload.file.as_ref().map(|p| display(p.display())),
            "Render event"
        );
    }

    fn progress(&self, render_id: RenderId, progress: RenderProgress) {
        tracing::debug!(
            %render_id,
            out_time_secs = progress.out_time_secs,
            frame = progress.frame,
            speed = progress.speed,
            "Encoder progress"
        );
    }
}

/// Messages carried by a [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq)]
pub enum PublisherMessage {
    Event(LifecycleEvent),
    Progress {
        render_id: RenderId,
        progress: RenderProgress,
    },
}

/// Publisher forwarding into an unbounded channel.
///
/// A dropped receiver silently discards further events.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<PublisherMessage>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving half of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PublisherMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressPublisher for ChannelPublisher {
    fn publish(&self, event: LifecycleEvent) {
        if self.tx.send(PublisherMessage::Event(event)).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }

    fn progress(&self, render_id: RenderId, progress: RenderProgress) {
        let _ = self.tx.send(PublisherMessage::Progress { render_id, progress });
    }
}

/// Delivers to two publishers, first `A` then `B`.
#[derive(Debug, Clone, Default)]
pub struct Fanout<A, B>(pub A, pub B);

impl<A, B> ProgressPublisher for Fanout<A, B>
where
    A: ProgressPublisher,
    B: ProgressPublisher,
{
    fn publish(&self, event: LifecycleEvent) {
        self.0.publish(event.clone());
        self.1.publish(event);
    }

    fn progress(&self, render_id: RenderId, progress: RenderProgress) {
        self.0.progress(render_id, progress);
        self.1.progress(render_id, progress);
    }
}
