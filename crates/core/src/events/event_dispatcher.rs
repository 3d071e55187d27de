use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_result::DetectionResult;

/// Error entry on the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventError {
    pub code: String,
    pub message: String,
}

/// One entry of the outbound event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostEvent {
    Detection(DetectionResult),
    Error(EventError),
}

/// Receives events on the dispatch thread.
pub trait EventSink: Send {
    fn send(&mut self, event: HostEvent);
}

impl EventSink for Sender<HostEvent> {
    fn send(&mut self, event: HostEvent) {
        // A host that dropped its receiver just stops listening.
        let _ = Sender::send(self, event);
    }
}

/// Adapts a closure into an [`EventSink`].
pub struct CallbackSink<F>(pub F);

impl<F: FnMut(HostEvent) + Send> EventSink for CallbackSink<F> {
    fn send(&mut self, event: HostEvent) {
        (self.0)(event)
    }
}

/// Identifies one `subscribe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

enum Message {
    Publish(HostEvent),
    Subscribe(SubscriptionHandle, Box<dyn EventSink>),
    Unsubscribe(SubscriptionHandle),
    Flush(Sender<()>),
    Shutdown,
}

/// Cloneable publishing side of the dispatcher, handed to detector callbacks.
///
/// Publishing never blocks and never fails; events sent after the
/// dispatcher shut down are dropped.
#[derive(Clone)]
pub struct EventPublisher {
    tx: Sender<Message>,
}

impl EventPublisher {
    pub fn publish(&self, result: DetectionResult) {
        let _ = self.tx.send(Message::Publish(HostEvent::Detection(result)));
    }

    pub fn publish_error(&self, code: &str, message: impl Into<String>) {
        let _ = self.tx.send(Message::Publish(HostEvent::Error(EventError {
            code: code.to_string(),
            message: message.into(),
        })));
    }
}

/// Single-subscriber event stream with one dedicated delivery thread.
///
/// Layout: `publishers → [unbounded queue] → dispatch thread → subscriber`
///
/// Subscriber changes travel through the same queue as events, so the
/// subscriber sees a strictly serialized sequence, and a replaced subscriber
/// receives nothing published after the replacing `subscribe` returned.
/// With no subscriber, events are dropped.
pub struct EventDispatcher {
    publisher: EventPublisher,
    next_handle: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<Message>();
        let worker = spawn_dispatch_thread(rx);
        Self {
            publisher: EventPublisher { tx },
            next_handle: AtomicU64::new(1),
            worker: Some(worker),
        }
    }

    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    /// Installs `sink` as the only subscriber, replacing any previous one.
    pub fn subscribe(&self, sink: impl EventSink + 'static) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let _ = self
            .publisher
            .tx
            .send(Message::Subscribe(handle, Box::new(sink)));
        handle
    }

    /// Removes the subscriber if `handle` is still the current one.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let _ = self.publisher.tx.send(Message::Unsubscribe(handle));
    }

    pub fn publish(&self, result: DetectionResult) {
        self.publisher.publish(result);
    }

    pub fn publish_error(&self, code: &str, message: impl Into<String>) {
        self.publisher.publish_error(code, message);
    }

    /// Blocks until everything queued before this call has been delivered.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if self.publisher.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        let _ = self.publisher.tx.send(Message::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Event dispatch thread panicked");
            }
        }
    }
}

fn spawn_dispatch_thread(rx: Receiver<Message>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut subscriber: Option<(SubscriptionHandle, Box<dyn EventSink>)> = None;
        let mut dropped: u64 = 0;

        for message in rx {
            match message {
                Message::Publish(event) => match subscriber.as_mut() {
                    Some((_, sink)) => sink.send(event),
                    None => dropped += 1,
                },
                Message::Subscribe(handle, sink) => {
                    if subscriber.is_some() {
                        log::debug!("Replacing event subscriber");
                    }
                    subscriber = Some((handle, sink));
                }
                Message::Unsubscribe(handle) => {
                    if subscriber.as_ref().is_some_and(|(current, _)| *current == handle) {
                        subscriber = None;
                    }
                }
                Message::Flush(ack) => {
                    let _ = ack.send(());
                }
                Message::Shutdown => break,
            }
        }

        if dropped > 0 {
            log::debug!("Dropped {dropped} event(s) published without a subscriber");
        }
    })
}
