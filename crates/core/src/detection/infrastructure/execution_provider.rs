/// Return the preferred ONNX execution providers for the current platform.
///
/// NNAPI on Android, CoreML on macOS. Falls back to CPU if the
/// platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "android")]
    {
        vec![ort::execution_providers::NNAPIExecutionProvider::default().build()]
    }
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "android", target_os = "macos")))]
    {
        vec![]
    }
}
