use std::sync::Arc;

use thiserror::Error;

use crate::conversion::{self, ConvertError};
use crate::detection::domain::landmark_detector::DetectorFactory;
use crate::events::event_dispatcher::EventPublisher;
use crate::session::detector_session::{DetectorSession, SessionState};
use crate::shared::constants::{ERROR_CODE_INIT, ERROR_CODE_PROCESS};
use crate::shared::frame_buffer::{FrameBuffer, PixelFormat, PlaneLayout};

use super::method_call::{ArgValue, ArgumentError, MethodCall, MethodResult};

pub const METHOD_INIT: &str = "init";
pub const METHOD_PROCESS_BYTES: &str = "processBytes";
pub const METHOD_PROCESS_YUV420_PLANES: &str = "processYuv420Planes";
pub const METHOD_STOP: &str = "stop";

#[derive(Error, Debug)]
enum ProcessError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Decodes host commands and drives the session.
///
/// Processing commands convert the frame on the calling thread and hand it
/// off without waiting for detection; results arrive on the event stream.
pub struct CommandRouter {
    session: DetectorSession,
    publisher: EventPublisher,
}

impl CommandRouter {
    pub fn new(factory: Box<dyn DetectorFactory>, publisher: EventPublisher) -> Self {
        let session = DetectorSession::new(factory, publisher.clone());
        Self { session, publisher }
    }

    pub fn handle(&self, call: &MethodCall) -> MethodResult {
        match call.method.as_str() {
            METHOD_INIT => self.init(call),
            METHOD_PROCESS_BYTES => self.process(call, nv21_frame),
            METHOD_PROCESS_YUV420_PLANES => self.process(call, yuv420_frame),
            METHOD_STOP => {
                self.session.stop();
                MethodResult::ack()
            }
            other => {
                log::debug!("Unhandled method {other}");
                MethodResult::NotImplemented
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    fn init(&self, call: &MethodCall) -> MethodResult {
        let face = flag(call, "face");
        let hands = flag(call, "hands");
        match self.session.start(face, hands) {
            Ok(()) => MethodResult::Success(serde_json::Value::Bool(true)),
            Err(e) => {
                log::warn!("init failed: {e}");
                MethodResult::error(ERROR_CODE_INIT, e.to_string())
            }
        }
    }

    fn process(
        &self,
        call: &MethodCall,
        decode: fn(&MethodCall) -> Result<Option<FrameBuffer>, ProcessError>,
    ) -> MethodResult {
        let result = decode(call).and_then(|frame| match frame {
            Some(frame) => {
                let image = conversion::convert(&frame)?;
                Ok(Some((image, frame.pixel_format_name(), frame.timestamp_ms)))
            }
            None => Ok(None),
        });

        match result {
            Ok(Some((image, format, timestamp_ms))) => {
                log::debug!(
                    "Submitting {format} frame as {}x{} RGBA at {timestamp_ms} ms",
                    image.width(),
                    image.height()
                );
                self.session.submit(Arc::new(image), timestamp_ms);
                MethodResult::ack()
            }
            Ok(None) => {
                log::debug!("{} missing a required argument, ignoring", call.method);
                MethodResult::ack()
            }
            Err(e) => {
                let message = e.to_string();
                self.publisher.publish_error(ERROR_CODE_PROCESS, message.clone());
                MethodResult::error(ERROR_CODE_PROCESS, message)
            }
        }
    }
}

/// Absent or non-bool means disabled.
fn flag(call: &MethodCall, key: &str) -> bool {
    matches!(call.arguments.get(key), Some(ArgValue::Bool(true)))
}

fn dimension(value: i32, name: &str) -> Result<u32, ConvertError> {
    u32::try_from(value)
        .map_err(|_| ConvertError::MalformedBuffer(format!("{name} must be positive, got {value}")))
}

fn stride(value: i32, name: &str) -> Result<usize, ConvertError> {
    usize::try_from(value)
        .map_err(|_| ConvertError::MalformedBuffer(format!("{name} must not be negative, got {value}")))
}

fn nv21_frame(call: &MethodCall) -> Result<Option<FrameBuffer>, ProcessError> {
    let Some(bytes) = call.argument::<Vec<u8>>("bytes")? else {
        return Ok(None);
    };
    let Some(width) = call.int_argument("width")? else {
        return Ok(None);
    };
    let Some(height) = call.int_argument("height")? else {
        return Ok(None);
    };
    let rotation = match call.int_argument("rotationDegrees")? {
        Some(r) => r,
        None => call.int_argument("rotationDeg")?.unwrap_or(0),
    };
    let timestamp_ms = call.number_argument("timestampMs")?.unwrap_or(0);
    let format = match call.argument::<String>("pixelFormat")? {
        Some(name) => name.parse::<PixelFormat>()?,
        None => PixelFormat::DEFAULT,
    };

    let frame = match format {
        PixelFormat::Nv21 => FrameBuffer::nv21(
            bytes,
            dimension(width, "width")?,
            dimension(height, "height")?,
        ),
    };
    Ok(Some(
        frame.with_rotation(rotation).with_timestamp(timestamp_ms),
    ))
}

fn yuv420_frame(call: &MethodCall) -> Result<Option<FrameBuffer>, ProcessError> {
    let Some(y) = call.argument::<Vec<u8>>("y")? else {
        return Ok(None);
    };
    let Some(u) = call.argument::<Vec<u8>>("u")? else {
        return Ok(None);
    };
    let Some(v) = call.argument::<Vec<u8>>("v")? else {
        return Ok(None);
    };
    let Some(width) = call.int_argument("width")? else {
        return Ok(None);
    };
    let Some(height) = call.int_argument("height")? else {
        return Ok(None);
    };
    let Some(y_row_stride) = call.int_argument("yRowStride")? else {
        return Ok(None);
    };
    let Some(u_row_stride) = call.int_argument("uRowStride")? else {
        return Ok(None);
    };
    let Some(v_row_stride) = call.int_argument("vRowStride")? else {
        return Ok(None);
    };
    let u_pixel_stride = call.int_argument("uPixelStride")?.unwrap_or(1);
    let v_pixel_stride = call.int_argument("vPixelStride")?.unwrap_or(1);
    let rotation = call.int_argument("rotationDeg")?.unwrap_or(0);
    let timestamp_ms = call.number_argument("timestampMs")?.unwrap_or(0);

    Ok(Some(FrameBuffer {
        layout: PlaneLayout::Yuv420 {
            y,
            u,
            v,
            y_row_stride: stride(y_row_stride, "yRowStride")?,
            u_row_stride: stride(u_row_stride, "uRowStride")?,
            v_row_stride: stride(v_row_stride, "vRowStride")?,
            u_pixel_stride: stride(u_pixel_stride, "uPixelStride")?,
            v_pixel_stride: stride(v_pixel_stride, "vPixelStride")?,
        },
        width: dimension(width, "width")?,
        height: dimension(height, "height")?,
        rotation_degrees: rotation,
        timestamp_ms,
    }))
}
