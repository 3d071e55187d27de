pub mod detector_session;
