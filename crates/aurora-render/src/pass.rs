//! Render pass abstraction for reducing wgpu boilerplate.
//!
//! Provides [`RenderPassBuilder`] for declarative render pass configuration
//! and [`FrameEncoder`] for managing the per-frame command encoding lifecycle.

use std::sync::Arc;

/// Space black, the default backdrop behind planets.
pub const SPACE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// What happens to an attachment's previous contents when the pass begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttachmentLoad<T> {
    Clear(T),
    Preserve,
}

impl<T: Copy> AttachmentLoad<T> {
    fn to_wgpu(self) -> wgpu::LoadOp<T> {
        match self {
            AttachmentLoad::Clear(value) => wgpu::LoadOp::Clear(value),
            AttachmentLoad::Preserve => wgpu::LoadOp::Load,
        }
    }
}

/// Configuration for depth stencil attachment.
#[derive(Debug)]
pub struct DepthAttachmentConfig {
    pub view: wgpu::TextureView,
    pub load: AttachmentLoad<f32>,
}

/// Builder for configuring render pass descriptors with a fluent API.
#[derive(Debug)]
pub struct RenderPassBuilder {
    color_load: AttachmentLoad<wgpu::Color>,
    depth_attachment: Option<DepthAttachmentConfig>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    /// Create a new render pass builder clearing to [`SPACE_BLACK`].
    pub fn new() -> Self {
        Self {
            color_load: AttachmentLoad::Clear(SPACE_BLACK),
            depth_attachment: None,
            label: None,
        }
    }

    /// Set the clear color for the color attachment.
    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.color_load = AttachmentLoad::Clear(color);
        self
    }

    /// Keep the color attachment's existing contents instead of clearing it.
    pub fn preserve_color(mut self) -> Self {
        self.color_load = AttachmentLoad::Preserve;
        self
    }

    /// Attach a depth buffer cleared to `clear_value`.
    pub fn depth(mut self, view: wgpu::TextureView, clear_value: f32) -> Self {
        self.depth_attachment = Some(DepthAttachmentConfig {
            view,
            load: AttachmentLoad::Clear(clear_value),
        });
        self
    }

    /// Set debug label for the render pass.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Begin a render pass drawing into `color_view`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: self.color_load.to_wgpu(),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        let depth_stencil_attachment =
            self.depth_attachment
                .as_ref()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth.load.to_wgpu(),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Manages per-frame command encoding with automatic submission and present.
pub struct FrameEncoder {
    encoder: Option<wgpu::CommandEncoder>,
    queue: Arc<wgpu::Queue>,
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: wgpu::TextureView,
}

impl FrameEncoder {
    /// Create a new frame encoder for the given device, queue, and surface texture.
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            encoder: Some(encoder),
            queue,
            surface_texture: Some(surface_texture),
            surface_view,
        }
    }

    /// The command encoder together with the surface view it will present.
    /// Returns `None` once the frame has been submitted.
    pub fn targets(&mut self) -> Option<(&mut wgpu::CommandEncoder, &wgpu::TextureView)> {
        let encoder = self.encoder.as_mut()?;
        Some((encoder, &self.surface_view))
    }

    /// Returns a reference to the queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Submit the recorded commands and present the surface texture.
    pub fn submit(mut self) {
        self.finish();
    }

    fn finish(&mut self) -> bool {
        match (self.encoder.take(), self.surface_texture.take()) {
            (Some(encoder), Some(surface_texture)) => {
                self.queue.submit([encoder.finish()]);
                surface_texture.present();
                true
            }
            _ => false,
        }
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.encoder.is_some() && self.finish() {
            log::warn!("FrameEncoder dropped without explicit submit(), auto-submitted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_clear_color() {
        let builder = RenderPassBuilder::new().clear_color(wgpu::Color::RED);
        assert_eq!(builder.color_load, AttachmentLoad::Clear(wgpu::Color::RED));
    }

    #[test]
    fn test_default_clear_color_is_space_black() {
        let builder = RenderPassBuilder::new();
        assert_eq!(builder.color_load, AttachmentLoad::Clear(SPACE_BLACK));
        assert_eq!(SPACE_BLACK.a, 1.0);
    }

    #[test]
    fn test_preserve_color_overrides_clear() {
        let builder = RenderPassBuilder::new()
            .clear_color(wgpu::Color::RED)
            .preserve_color();
        assert_eq!(builder.color_load, AttachmentLoad::Preserve);
        assert!(matches!(builder.color_load.to_wgpu(), wgpu::LoadOp::Load));
    }

    #[test]
    fn test_depth_attachment_is_optional() {
        let builder = RenderPassBuilder::new();
        assert!(builder.depth_attachment.is_none());
    }

    #[test]
    fn test_label_is_stored() {
        let builder = RenderPassBuilder::new().label("opaque-pass");
        assert_eq!(builder.label, Some("opaque-pass"));
    }

    #[test]
    fn test_clear_load_maps_to_wgpu_clear() {
        let load = AttachmentLoad::Clear(0.0f32);
        assert!(matches!(load.to_wgpu(), wgpu::LoadOp::Clear(v) if v == 0.0));
    }
}
