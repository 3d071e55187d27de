pub mod execution_provider;
pub mod onnx_detector_factory;
pub mod onnx_face_landmarker;
pub mod onnx_hand_landmarker;
mod tensor;
pub mod threaded_landmarker;
