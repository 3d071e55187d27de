pub mod bridge;
pub mod command;
pub mod conversion;
pub mod detection;
pub mod events;
pub mod session;
pub mod shared;
