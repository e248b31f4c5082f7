//! Headless end-to-end renders of planets with and without atmospheres.

use aurora_atmosphere::{AtmosphereOptions, CompositeMode};
use aurora_config::PlanetDesc;
use aurora_render::{Camera, request_headless_device_blocking};
use aurora_scene::{CompositorSettings, SceneCompositor};
use glam::Vec3;

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Render one frame at `SIZE` x `SIZE` and return tightly packed RGBA8 pixels.
fn render_scene(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    composite: CompositeMode,
    planets: &[PlanetDesc],
) -> Vec<u8> {
    let settings = CompositorSettings {
        composite,
        sun_position: Vec3::X,
        ..CompositorSettings::default()
    };
    // Start smaller and resize so the frame reads buffers created by a resize.
    let mut compositor = SceneCompositor::new(device, queue, &settings, FORMAT, 32, 32).unwrap();
    assert_eq!(compositor.composite_mode(), composite);
    for desc in planets {
        compositor.add_planet(device, desc).unwrap();
    }
    compositor.set_resolution(device, SIZE, SIZE).unwrap();
    compositor.set_sun_position(queue, Vec3::X).unwrap();

    let output = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test-output"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let mut camera = Camera::look_at(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
    camera.set_aspect_ratio(SIZE as f32, SIZE as f32);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("test-frame"),
    });
    compositor
        .render(queue, &mut encoder, &output_view, &camera)
        .unwrap();

    // 64 px * 4 bytes is already a multiple of 256.
    let bytes_per_row = SIZE * 4;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test-readback"),
        size: (bytes_per_row * SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &output,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    queue.submit([encoder.finish()]);

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });
    rx.recv().unwrap().unwrap();
    let pixels = slice.get_mapped_range().to_vec();
    readback.unmap();
    pixels
}

fn planet(center: [f32; 3], radius: f32, atmosphere: Option<AtmosphereOptions>) -> PlanetDesc {
    PlanetDesc {
        center,
        radius,
        texture: None,
        atmosphere,
    }
}

fn single(atmosphere: Option<AtmosphereOptions>) -> [PlanetDesc; 1] {
    [planet([0.0, 0.0, 0.0], 5.0, atmosphere)]
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

#[test]
fn test_atmosphere_lights_center_and_leaves_space_untouched() {
    let Ok((device, queue)) = request_headless_device_blocking() else {
        return;
    };
    let bare = render_scene(&device, &queue, CompositeMode::Additive, &single(None));
    let lit = render_scene(
        &device,
        &queue,
        CompositeMode::Additive,
        &single(Some(AtmosphereOptions::default())),
    );

    let center_bare = pixel(&bare, SIZE / 2, SIZE / 2);
    let center_lit = pixel(&lit, SIZE / 2, SIZE / 2);
    assert!(
        center_lit[2] as i32 > center_bare[2] as i32 + 10,
        "expected scattered blue light: bare {center_bare:?}, lit {center_lit:?}"
    );
    assert!(center_lit[2] > center_lit[0], "blue should dominate red: {center_lit:?}");

    assert_eq!(pixel(&lit, 0, 0), pixel(&bare, 0, 0));
    assert_eq!(pixel(&lit, SIZE - 1, SIZE - 1), pixel(&bare, SIZE - 1, SIZE - 1));
}

#[test]
fn test_attenuate_mode_leaves_space_untouched() {
    let Ok((device, queue)) = request_headless_device_blocking() else {
        return;
    };
    let bare = render_scene(&device, &queue, CompositeMode::Attenuate, &single(None));
    let lit = render_scene(
        &device,
        &queue,
        CompositeMode::Attenuate,
        &single(Some(AtmosphereOptions::default())),
    );

    assert_eq!(pixel(&lit, 0, 0), pixel(&bare, 0, 0));
    assert_eq!(pixel(&lit, SIZE / 2, SIZE / 2)[3], 255);
    assert_ne!(pixel(&lit, SIZE / 2, SIZE / 2), pixel(&bare, SIZE / 2, SIZE / 2));
}

/// Two planets whose shells overlap on screen: the far one peeks out from
/// behind the near planet's disk but stays inside its atmosphere.
#[test]
fn test_overlapping_atmospheres_both_contribute() {
    let Ok((device, queue)) = request_headless_device_blocking() else {
        return;
    };
    let thick = AtmosphereOptions {
        atmosphere_height: 3.0,
        ..AtmosphereOptions::default()
    };
    let near = |atmosphere| planet([0.0, 0.0, 0.0], 2.0, atmosphere);
    let far = |atmosphere| planet([-12.0, 1.0, 0.0], 2.0, atmosphere);

    for mode in [CompositeMode::Additive, CompositeMode::Attenuate] {
        let both = render_scene(
            &device,
            &queue,
            mode,
            &[near(Some(thick)), far(Some(thick))],
        );
        let near_only = render_scene(&device, &queue, mode, &[near(Some(thick)), far(None)]);
        let far_only = render_scene(&device, &queue, mode, &[near(None), far(Some(thick))]);

        let overlapping = (0..SIZE)
            .flat_map(|y| (0..SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let p = pixel(&both, x, y);
                p != pixel(&near_only, x, y) && p != pixel(&far_only, x, y)
            })
            .count();
        assert!(overlapping > 0, "{mode:?}: one shell replaced the other");
        assert_eq!(pixel(&both, 0, 0), pixel(&near_only, 0, 0));
    }
}
