pub mod config;
pub mod constants;
pub mod frame_buffer;
pub mod model_resolver;
pub mod pixel_image;
