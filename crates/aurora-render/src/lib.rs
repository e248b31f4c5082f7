//! wgpu plumbing: device and surface management, render passes, offscreen targets, meshes, and textures.

pub mod blit;
pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod pipeline;
pub mod sphere;
pub mod target;
pub mod texture;

pub use blit::BlitPipeline;
pub use buffer::{MeshBuffer, VertexPositionColor, VertexPositionNormalUv};
pub use camera::Camera;
pub use depth::DepthBuffer;
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, init_render_context_blocking,
    request_headless_device, request_headless_device_blocking,
};
pub use pass::{AttachmentLoad, DepthAttachmentConfig, FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use pipeline::{
    CameraBinding, CameraUniform, UNLIT_SHADER_SOURCE, UnlitPipeline, camera_bind_group_layout,
};
pub use sphere::SphereMesh;
pub use target::{OffscreenTarget, TargetError};
pub use texture::{ManagedTexture, PLACEHOLDER_TEXTURE, TextureError, TextureManager};
