use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use landmark_bridge_core::bridge::LandmarkBridge;
use landmark_bridge_core::command::method_call::{MethodCall, MethodResult};
use landmark_bridge_core::conversion;
use landmark_bridge_core::detection::infrastructure::onnx_detector_factory::OnnxDetectorFactory;
use landmark_bridge_core::events::event_dispatcher::{CallbackSink, HostEvent};
use landmark_bridge_core::shared::config::BridgeConfig;
use landmark_bridge_core::shared::frame_buffer::{FrameBuffer, PlaneLayout};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FrameFormat {
    /// Luma plane followed by interleaved V,U.
    Nv21,
    /// Three contiguous planes, Y then U then V (I420).
    Yuv420,
}

/// Face and hand landmarks for raw camera frames.
#[derive(Parser)]
#[command(name = "landmark-bridge")]
struct Cli {
    /// Raw frame file.
    input: PathBuf,

    /// Frame width in pixels.
    #[arg(long)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long)]
    height: u32,

    /// Byte layout of the input file.
    #[arg(long, value_enum, default_value = "nv21")]
    format: FrameFormat,

    /// Clockwise rotation applied after conversion (multiple of 90).
    #[arg(long, default_value = "0")]
    rotation: i32,

    /// Capture timestamp in milliseconds.
    #[arg(long, default_value = "0")]
    timestamp: i64,

    /// Run the face landmarker.
    #[arg(long)]
    face: bool,

    /// Run the hand landmarker.
    #[arg(long)]
    hands: bool,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the model assets; overrides the settings file.
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    /// Also write the converted, rotated frame as a PNG.
    #[arg(long)]
    dump_png: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let bytes = fs::read(&cli.input)?;
    if let Some(path) = &cli.dump_png {
        dump_png(&frame_buffer(&cli, bytes.clone())?, path)?;
    }

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::load_or_default(),
    };
    if let Some(dir) = &cli.asset_dir {
        config.asset_dir = Some(dir.clone());
    }

    let bridge = LandmarkBridge::new(Box::new(OnnxDetectorFactory::new(config)));
    bridge.subscribe(CallbackSink(print_event));

    let init = MethodCall::new("init")
        .arg("face", cli.face)
        .arg("hands", cli.hands);
    expect_success(bridge.handle(&init))?;
    expect_success(bridge.handle(&process_call(&cli, bytes)?))?;
    // Stopping joins the detector workers, so every result is published by now.
    expect_success(bridge.handle(&MethodCall::new("stop")))?;
    bridge.flush();
    Ok(())
}

fn print_event(event: HostEvent) {
    match serde_json::to_string(&event) {
        Ok(line) => println!("{line}"),
        Err(e) => log::error!("Failed to encode event: {e}"),
    }
}

fn expect_success(result: MethodResult) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        MethodResult::Success(_) => Ok(()),
        MethodResult::Error { code, message } => Err(format!("{code}: {message}").into()),
        MethodResult::NotImplemented => Err("method not implemented".into()),
    }
}

fn process_call(cli: &Cli, bytes: Vec<u8>) -> Result<MethodCall, Box<dyn std::error::Error>> {
    let call = match cli.format {
        FrameFormat::Nv21 => MethodCall::new("processBytes")
            .arg("bytes", bytes)
            .arg("width", cli.width)
            .arg("height", cli.height)
            .arg("rotationDegrees", cli.rotation)
            .arg("pixelFormat", "nv21"),
        FrameFormat::Yuv420 => {
            let (y, u, v) = split_i420(bytes, cli.width, cli.height)?;
            let chroma_width = cli.width.div_ceil(2);
            MethodCall::new("processYuv420Planes")
                .arg("y", y)
                .arg("u", u)
                .arg("v", v)
                .arg("width", cli.width)
                .arg("height", cli.height)
                .arg("yRowStride", cli.width)
                .arg("uRowStride", chroma_width)
                .arg("vRowStride", chroma_width)
                .arg("rotationDeg", cli.rotation)
        }
    };
    Ok(call.arg("timestampMs", cli.timestamp))
}

fn split_i420(
    mut bytes: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), Box<dyn std::error::Error>> {
    let (w, h) = (width as usize, height as usize);
    let too_large = || format!("I420 frame of {width}x{height} is too large");
    let luma = w.checked_mul(h).ok_or_else(too_large)?;
    let chroma = w.div_ceil(2).checked_mul(h.div_ceil(2)).ok_or_else(too_large)?;
    let needed = chroma
        .checked_mul(2)
        .and_then(|c| c.checked_add(luma))
        .ok_or_else(too_large)?;
    if bytes.len() < needed {
        return Err(format!(
            "I420 frame of {width}x{height} needs {needed} bytes, file has {}",
            bytes.len()
        )
        .into());
    }
    let mut u = bytes.split_off(luma);
    let v = u.split_off(chroma);
    Ok((bytes, u, v))
}

fn frame_buffer(cli: &Cli, bytes: Vec<u8>) -> Result<FrameBuffer, Box<dyn std::error::Error>> {
    let frame = match cli.format {
        FrameFormat::Nv21 => FrameBuffer::nv21(bytes, cli.width, cli.height),
        FrameFormat::Yuv420 => {
            let (y, u, v) = split_i420(bytes, cli.width, cli.height)?;
            let chroma_width = cli.width.div_ceil(2) as usize;
            FrameBuffer {
                layout: PlaneLayout::Yuv420 {
                    y,
                    u,
                    v,
                    y_row_stride: cli.width as usize,
                    u_row_stride: chroma_width,
                    v_row_stride: chroma_width,
                    u_pixel_stride: 1,
                    v_pixel_stride: 1,
                },
                width: cli.width,
                height: cli.height,
                rotation_degrees: 0,
                timestamp_ms: 0,
            }
        }
    };
    Ok(frame.with_rotation(cli.rotation).with_timestamp(cli.timestamp))
}

fn dump_png(frame: &FrameBuffer, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let image = conversion::convert(frame)?;
    let (width, height) = (image.width(), image.height());
    let rgba = image::RgbaImage::from_raw(width, height, image.into_data())
        .ok_or("converted frame does not match its dimensions")?;
    rgba.save(path)?;
    log::info!("Converted frame written to {}", path.display());
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.width == 0 || cli.height == 0 {
        return Err(format!(
            "Frame dimensions must be positive, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    if i32::try_from(cli.width).is_err() || i32::try_from(cli.height).is_err() {
        return Err("Frame dimensions are too large".into());
    }
    if cli.rotation % 90 != 0 {
        return Err(format!("Rotation must be a multiple of 90, got {}", cli.rotation).into());
    }
    if !cli.face && !cli.hands {
        log::warn!("Neither --face nor --hands given; only conversion will run");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_i420_separates_planes() {
        // 3x2 frame: 6 luma bytes, 2x1 chroma per plane.
        let bytes = vec![1, 1, 1, 1, 1, 1, 2, 2, 3, 3];
        let (y, u, v) = split_i420(bytes, 3, 2).unwrap();
        assert_eq!(y, vec![1; 6]);
        assert_eq!(u, vec![2, 2]);
        assert_eq!(v, vec![3, 3]);
    }

    #[test]
    fn test_split_i420_rejects_short_file() {
        assert!(split_i420(vec![0; 5], 2, 2).is_err());
    }

    #[test]
    fn test_split_i420_large_dimensions_do_not_overflow() {
        let side = i32::MAX as u32;
        assert!(split_i420(vec![0; 16], side, side).is_err());
    }
}
