pub mod command_router;
pub mod method_call;
