use std::fmt;

/// Failures while bringing up the window and the GPU. Once the loop runs,
/// frame-level problems are logged and skipped rather than returned.
#[derive(Debug)]
pub enum AppError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    CreateSurface(wgpu::CreateSurfaceError),
    NoAdapter,
    RequestDevice(wgpu::RequestDeviceError),
    UnsupportedSurface,
    #[cfg(target_arch = "wasm32")]
    MissingCanvasHost(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(err) => write!(f, "event loop error: {err}"),
            AppError::Window(err) => write!(f, "failed to create window: {err}"),
            AppError::CreateSurface(err) => write!(f, "failed to create surface: {err}"),
            AppError::NoAdapter => write!(f, "no graphics adapter can render to this surface"),
            AppError::RequestDevice(err) => write!(f, "failed to create device: {err}"),
            AppError::UnsupportedSurface => {
                write!(f, "surface is not supported by the selected adapter")
            }
            #[cfg(target_arch = "wasm32")]
            AppError::MissingCanvasHost(id) => {
                write!(f, "no element with id `{id}` to host the canvas")
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(err) => Some(err),
            AppError::Window(err) => Some(err),
            AppError::CreateSurface(err) => Some(err),
            AppError::RequestDevice(err) => Some(err),
            _ => None,
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(err: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(err)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(err: winit::error::OsError) -> Self {
        AppError::Window(err)
    }
}

impl From<wgpu::CreateSurfaceError> for AppError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        AppError::CreateSurface(err)
    }
}

impl From<wgpu::RequestDeviceError> for AppError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        AppError::RequestDevice(err)
    }
}
