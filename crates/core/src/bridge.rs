use crate::command::command_router::CommandRouter;
use crate::command::method_call::{MethodCall, MethodResult};
use crate::detection::domain::landmark_detector::DetectorFactory;
use crate::events::event_dispatcher::{EventDispatcher, EventSink, SubscriptionHandle};

/// Host-facing entry point: the `mp_tasks` command channel plus the
/// `mp_tasks/events` stream.
///
/// Dropping the bridge stops the session before the dispatch thread exits.
pub struct LandmarkBridge {
    router: CommandRouter,
    dispatcher: EventDispatcher,
}

impl LandmarkBridge {
    pub fn new(factory: Box<dyn DetectorFactory>) -> Self {
        let dispatcher = EventDispatcher::new();
        let router = CommandRouter::new(factory, dispatcher.publisher());
        Self { router, dispatcher }
    }

    pub fn handle(&self, call: &MethodCall) -> MethodResult {
        self.router.handle(call)
    }

    pub fn subscribe(&self, sink: impl EventSink + 'static) -> SubscriptionHandle {
        self.dispatcher.subscribe(sink)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.dispatcher.unsubscribe(handle);
    }

    /// Waits until every event published so far reached the subscriber.
    pub fn flush(&self) {
        self.dispatcher.flush();
    }
}
