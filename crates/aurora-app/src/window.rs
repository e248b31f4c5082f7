//! Window creation and the per-frame event loop.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]: it opens the
//! window on `resumed`, rebuilds the frame buffers on every resize, and
//! composites one frame per redraw.

use std::sync::Arc;
use std::time::Instant;

use aurora_config::Config;
use aurora_render::{FrameEncoder, RenderContext, SurfaceError, init_render_context_blocking};
use aurora_scene::{CompositorSettings, SceneCompositor, SceneError};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::orbit::OrbitCamera;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

pub struct AppState {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    compositor: Option<SceneCompositor>,
    orbit: OrbitCamera,
    last_frame: Instant,
    frame_count: u64,
}

impl AppState {
    pub fn with_config(config: Config) -> Self {
        let orbit = OrbitCamera::new(&config.camera);
        Self {
            config,
            window: None,
            gpu: None,
            compositor: None,
            orbit,
            last_frame: Instant::now(),
            frame_count: 0,
        }
    }

    pub fn compositor(&self) -> Option<&SceneCompositor> {
        self.compositor.as_ref()
    }

    /// Build the compositor at the surface size and add the configured planets.
    fn initialize_scene(&mut self, gpu: &RenderContext) -> Result<(), SceneError> {
        let (width, height) = gpu.surface_size();
        let settings = CompositorSettings::from_config(&self.config);
        let mut compositor = SceneCompositor::new(
            &gpu.device,
            &gpu.queue,
            &settings,
            gpu.surface_format,
            width,
            height,
        )?;

        for desc in &self.config.scene.planets {
            if let Err(e) = compositor.add_planet(&gpu.device, desc) {
                error!("Skipping planet at {:?}: {e}", desc.center);
            }
        }

        self.orbit.set_aspect_ratio(width, height);
        self.compositor = Some(compositor);
        Ok(())
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        gpu.resize(width, height);
        self.orbit.set_aspect_ratio(width, height);
        if let Some(compositor) = &mut self.compositor
            && let Err(e) = compositor.set_resolution(&gpu.device, width, height)
        {
            error!("Failed to resize frame buffers to {width}x{height}: {e}");
        }
        info!("Window resized to {width}x{height}");
    }

    /// Composite one frame. Returns `false` when the app should exit.
    fn redraw(&mut self) -> bool {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.orbit.advance(dt);

        let (Some(gpu), Some(compositor)) = (&mut self.gpu, &mut self.compositor) else {
            return true;
        };

        let resolved = compositor.poll_textures(&gpu.device, &gpu.queue);
        if resolved > 0 {
            info!(
                resolved,
                pending = compositor.pending_textures(),
                "Uploaded planet textures"
            );
        }

        match gpu.get_current_texture() {
            Ok(surface_texture) => {
                let mut frame =
                    FrameEncoder::new(&gpu.device, Arc::new(gpu.queue.clone()), surface_texture);
                if let Some((encoder, view)) = frame.targets()
                    && let Err(e) = compositor.render(&gpu.queue, encoder, view, self.orbit.camera())
                {
                    error!("Frame {} skipped: {e}", self.frame_count);
                }
                frame.submit();
                self.frame_count += 1;
            }
            Err(SurfaceError::Lost) => {
                let (width, height) = gpu.surface_size();
                gpu.resize(width, height);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                return false;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
        }
        true
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = window_attributes_from_config(&self.config);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let gpu = match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(gpu) => gpu,
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.initialize_scene(&gpu) {
            error!("Scene initialization failed: {e}");
            event_loop.exit();
            return;
        }

        self.gpu = Some(gpu);
        self.last_frame = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(frames = self.frame_count, "Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if !self.redraw() {
                    event_loop.exit();
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Creates an event loop and runs the viewer until the window is closed.
#[instrument(skip(config))]
pub fn run_with_config(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::with_config(config);
    event_loop.run_app(&mut app)
}
