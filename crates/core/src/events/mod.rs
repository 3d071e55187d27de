pub mod event_dispatcher;
