//! Offscreen color + depth render target.
//!
//! The opaque scene renders here first; later passes read both attachments.
//! Every target carries a generation number so consumers holding bind groups
//! against it can tell when they point at a target that has been replaced.

use crate::depth::DepthBuffer;

/// Errors raised while creating an offscreen target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("render target dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("render target {width}x{height} exceeds the device limit of {limit}")]
    ExceedsLimit { width: u32, height: u32, limit: u32 },
}

/// Color and depth attachments of one resolution, created together.
pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: DepthBuffer,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    generation: u64,
}

impl OffscreenTarget {
    /// Create both attachments. Validation happens before any GPU allocation.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        generation: u64,
    ) -> Result<Self, TargetError> {
        validate_target_size(width, height, device.limits().max_texture_dimension_2d)?;

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = DepthBuffer::new(device, width, height);

        log::debug!("Created offscreen target #{generation} ({width}x{height}, {format:?})");

        Ok(Self {
            color,
            color_view,
            depth,
            format,
            width,
            height,
            generation,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Monotonic identity of this allocation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn validate_target_size(width: u32, height: u32, limit: u32) -> Result<(), TargetError> {
    if width == 0 || height == 0 {
        return Err(TargetError::ZeroDimensions { width, height });
    }
    if width > limit || height > limit {
        return Err(TargetError::ExceedsLimit {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::request_headless_device_blocking;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            validate_target_size(0, 600, 8192),
            Err(TargetError::ZeroDimensions { width: 0, height: 600 })
        ));
        assert!(validate_target_size(800, 0, 8192).is_err());
    }

    #[test]
    fn test_oversized_rejected() {
        assert!(matches!(
            validate_target_size(9000, 10, 8192),
            Err(TargetError::ExceedsLimit { limit: 8192, .. })
        ));
        assert!(validate_target_size(8192, 8192, 8192).is_ok());
    }

    #[test]
    fn test_target_attachments_match() {
        let Ok((device, _queue)) = request_headless_device_blocking() else {
            return;
        };
        let target =
            OffscreenTarget::new(&device, wgpu::TextureFormat::Rgba8Unorm, 320, 200, 7).unwrap();
        assert_eq!(target.size(), (320, 200));
        assert_eq!(target.generation(), 7);
        assert_eq!(target.depth.width(), 320);
        assert_eq!(target.depth.height(), 200);
        assert!(
            target
                .color
                .usage()
                .contains(wgpu::TextureUsages::TEXTURE_BINDING)
        );
    }

    #[test]
    fn test_target_creation_fails_for_zero_size() {
        let Ok((device, _queue)) = request_headless_device_blocking() else {
            return;
        };
        let result = OffscreenTarget::new(&device, wgpu::TextureFormat::Rgba8Unorm, 0, 0, 1);
        assert!(result.is_err());
    }
}
