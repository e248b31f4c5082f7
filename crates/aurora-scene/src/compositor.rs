//! Three-pass scene compositor.
//!
//! Every frame runs the same passes in the same order:
//!
//! 1. **Opaque**: planets, the sun marker, and the orbit line render into the
//!    offscreen color + depth target with depth testing.
//! 2. **Present**: the offscreen color is copied onto the output view.
//! 3. **Atmosphere**: every atmosphere shell draws on top of the output view,
//!    reading the color and depth written in pass 1.
//!
//! The compositor exclusively owns the offscreen target. Atmospheres hold bind
//! groups against it tagged with the target's generation; a resize replaces
//! the target and rebinds every atmosphere before the next frame can render.

use std::collections::BTreeMap;
use std::sync::Arc;

use aurora_atmosphere::{
    AtmosphereError, AtmosphereParameters, AtmospherePipeline, AtmosphereRenderer, CompositeMode,
    PlanetInfo, SampleCounts, SunModel,
};
use aurora_config::{Config, PlanetDesc};
use aurora_render::{
    BlitPipeline, Camera, CameraBinding, DepthBuffer, ManagedTexture, MeshBuffer, OffscreenTarget,
    RenderPassBuilder, SPACE_BLACK, SphereMesh, TextureManager, UnlitPipeline,
    camera_bind_group_layout,
};
use glam::Vec3;
use tracing::instrument;

use crate::error::SceneError;
use crate::planet::{Planet, PlanetId};
use crate::planet_pipeline::PlanetPipeline;
use crate::sun::{OrbitLine, SunMarker};
use crate::textures::TextureLoader;

/// Everything the compositor needs to know up front.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorSettings {
    pub samples: SampleCounts,
    pub composite: CompositeMode,
    pub sun_model: SunModel,
    /// Slices and stacks of the shared sphere mesh.
    pub sphere_segments: u32,
    pub clear_color: wgpu::Color,
    pub sun_position: Vec3,
    /// Radius of the sun marker, or `None` to hide it.
    pub sun_marker_radius: Option<f32>,
    /// Radius and segment count of the orbit line, or `None` to hide it.
    pub orbit_line: Option<(f32, u32)>,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            samples: SampleCounts::default(),
            composite: CompositeMode::default(),
            sun_model: SunModel::default(),
            sphere_segments: 30,
            clear_color: SPACE_BLACK,
            sun_position: Vec3::X,
            sun_marker_radius: None,
            orbit_line: None,
        }
    }
}

impl CompositorSettings {
    pub fn from_config(config: &Config) -> Self {
        let render = &config.render;
        let scene = &config.scene;
        let [r, g, b, a] = render.clear_color;
        Self {
            samples: render.samples,
            composite: render.composite,
            sun_model: render.sun_model,
            sphere_segments: render.sphere_segments,
            clear_color: wgpu::Color { r, g, b, a },
            sun_position: Vec3::from_array(scene.sun_position),
            sun_marker_radius: scene.show_sun_marker.then_some(scene.sun_marker_radius),
            orbit_line: scene
                .show_orbit_line
                .then_some((scene.orbit_line_radius, scene.orbit_line_segments)),
        }
    }
}

/// Owns the frame buffers, the pipelines, and every planet in the scene.
pub struct SceneCompositor {
    output_format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    composite: CompositeMode,
    sun_model: SunModel,
    sun_position: Vec3,

    target: OffscreenTarget,
    next_generation: u64,

    camera: CameraBinding,
    textures: TextureManager,
    placeholder: Arc<ManagedTexture>,
    texture_loader: TextureLoader,

    planet_pipeline: PlanetPipeline,
    unlit_triangles: UnlitPipeline,
    unlit_lines: UnlitPipeline,
    blit: BlitPipeline,
    blit_bind_group: wgpu::BindGroup,
    atmosphere_pipeline: AtmospherePipeline,

    /// Unit sphere shared by planet surfaces and atmosphere shells.
    sphere: MeshBuffer,
    sun_marker: Option<SunMarker>,
    orbit_line: Option<OrbitLine>,

    planets: BTreeMap<PlanetId, Planet>,
    next_planet_id: u64,
}

impl SceneCompositor {
    /// Build pipelines and the initial frame buffers at `width` x `height`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: &CompositorSettings,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, SceneError> {
        let atmosphere_pipeline =
            AtmospherePipeline::new(device, output_format, settings.samples, settings.composite)?;
        if !settings.sun_position.is_finite() {
            return Err(
                AtmosphereError::DegenerateSunDirection(settings.sun_position.to_array()).into(),
            );
        }

        let target = OffscreenTarget::new(device, output_format, width, height, 1)?;

        let camera_layout = camera_bind_group_layout(device);
        let camera = CameraBinding::new(device, &camera_layout);
        let mut textures = TextureManager::new(device);
        let placeholder = textures.placeholder(device, queue)?;

        let planet_pipeline = PlanetPipeline::new(
            device,
            &camera_layout,
            textures.bind_group_layout(),
            output_format,
        );
        let unlit_triangles = UnlitPipeline::new(
            device,
            &camera_layout,
            output_format,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let unlit_lines = UnlitPipeline::new(
            device,
            &camera_layout,
            output_format,
            wgpu::PrimitiveTopology::LineList,
        );
        let blit = BlitPipeline::new(device, output_format);
        let blit_bind_group = blit.bind(device, &target);

        let sphere_mesh = SphereMesh::uv_sphere(settings.sphere_segments, settings.sphere_segments);
        let sphere = MeshBuffer::upload(
            device,
            "unit-sphere",
            &sphere_mesh.textured_vertices(),
            &sphere_mesh.indices,
        );
        let sun_marker = settings.sun_marker_radius.map(|radius| {
            SunMarker::new(device, sphere_mesh, settings.sun_position, radius)
        });
        let orbit_line = settings
            .orbit_line
            .map(|(radius, segments)| OrbitLine::new(device, radius, segments));

        tracing::info!(
            width,
            height,
            format = ?output_format,
            composite = %settings.composite,
            "Scene compositor ready"
        );

        Ok(Self {
            output_format,
            clear_color: settings.clear_color,
            composite: settings.composite,
            sun_model: settings.sun_model,
            sun_position: settings.sun_position,
            target,
            next_generation: 2,
            camera,
            textures,
            placeholder,
            texture_loader: TextureLoader::new(),
            planet_pipeline,
            unlit_triangles,
            unlit_lines,
            blit,
            blit_bind_group,
            atmosphere_pipeline,
            sphere,
            sun_marker,
            orbit_line,
            planets: BTreeMap::new(),
            next_planet_id: 0,
        })
    }

    /// Add a planet and, when `desc.atmosphere` is set, its atmosphere.
    ///
    /// Everything is validated before the planet joins the scene. The surface
    /// texture, if any, is decoded in the background; the planet renders with
    /// a placeholder until [`SceneCompositor::poll_textures`] installs it.
    #[instrument(skip_all, fields(center = ?desc.center, radius = desc.radius))]
    pub fn add_planet(
        &mut self,
        device: &wgpu::Device,
        desc: &PlanetDesc,
    ) -> Result<PlanetId, SceneError> {
        let info = Arc::new(PlanetInfo::new(Vec3::from_array(desc.center), desc.radius)?);

        let atmosphere = match &desc.atmosphere {
            Some(options) => {
                let mut params =
                    AtmosphereParameters::new(Arc::clone(&info), options, self.sun_model)?;
                params.set_sun_position(self.sun_position)?;
                let (width, height) = self.target.size();
                params.set_resolution(width, height)?;

                let mut renderer = AtmosphereRenderer::new(device, params);
                renderer.bind(device, &self.atmosphere_pipeline, &self.target);
                Some(renderer)
            }
            None => None,
        };

        let id = PlanetId(self.next_planet_id);
        self.next_planet_id += 1;

        let mut planet = Planet::new(
            device,
            &self.planet_pipeline,
            id,
            info,
            Arc::clone(&self.placeholder),
            desc.texture.clone(),
        );
        if let Some(atmosphere) = atmosphere {
            planet.attach_atmosphere(atmosphere);
        }
        if let Some(path) = &desc.texture {
            self.texture_loader.request(id, path.clone());
        }

        tracing::info!(%id, atmosphere = planet.atmosphere().is_some(), "Added planet");
        self.planets.insert(id, planet);
        Ok(id)
    }

    /// Remove a planet together with its atmosphere. Returns `false` if unknown.
    #[instrument(skip(self))]
    pub fn remove_planet(&mut self, id: PlanetId) -> bool {
        let Some(planet) = self.planets.remove(&id) else {
            return false;
        };
        if planet.has_texture() {
            self.textures.remove(&surface_texture_name(id));
        }
        tracing::info!("Removed planet");
        true
    }

    /// Replace the frame buffers with new ones of `width` x `height` and
    /// re-point every atmosphere at them.
    ///
    /// The new target is created before anything else changes; if that fails
    /// the previous target and bindings stay in place.
    #[instrument(skip(self, device))]
    pub fn set_resolution(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<(), SceneError> {
        let target =
            OffscreenTarget::new(device, self.output_format, width, height, self.next_generation)?;
        self.next_generation += 1;

        self.blit_bind_group = self.blit.bind(device, &target);
        for planet in self.planets.values_mut() {
            if let Some(atmosphere) = planet.atmosphere_mut() {
                atmosphere.params_mut().set_resolution(width, height)?;
                atmosphere.bind(device, &self.atmosphere_pipeline, &target);
            }
        }
        self.target = target;

        tracing::debug!(generation = self.target.generation(), "Frame buffers recreated");
        Ok(())
    }

    /// Move the sun. Every atmosphere accepts the new position or none does.
    pub fn set_sun_position(&mut self, queue: &wgpu::Queue, position: Vec3) -> Result<(), SceneError> {
        if !position.is_finite() {
            return Err(AtmosphereError::DegenerateSunDirection(position.to_array()).into());
        }
        for planet in self.planets.values() {
            if let Some(atmosphere) = planet.atmosphere() {
                atmosphere.params().check_sun_position(position)?;
            }
        }
        for planet in self.planets.values_mut() {
            if let Some(atmosphere) = planet.atmosphere_mut() {
                atmosphere.params_mut().set_sun_position(position)?;
            }
        }

        self.sun_position = position;
        if let Some(marker) = &self.sun_marker {
            marker.move_to(queue, position);
        }
        Ok(())
    }

    /// Install decoded RGBA8 pixels as the surface texture of `id`.
    ///
    /// Returns `Ok(false)` when the planet has been removed in the meantime.
    #[instrument(skip(self, device, queue, rgba))]
    pub fn resolve_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: PlanetId,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<bool, SceneError> {
        let Some(planet) = self.planets.get_mut(&id) else {
            tracing::debug!("Texture arrived for a removed planet");
            return Ok(false);
        };
        let name = surface_texture_name(id);
        self.textures.remove(&name);
        let texture = self.textures.create_texture(
            device,
            queue,
            &name,
            rgba,
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        )?;
        planet.set_texture(texture);
        Ok(true)
    }

    /// Install every texture the background loader has finished. Never blocks.
    ///
    /// Returns the number of planets whose texture was installed.
    pub fn poll_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> usize {
        let mut installed = 0;
        for loaded in self.texture_loader.drain() {
            let image = match loaded.result {
                Ok(image) => image,
                Err(err) => {
                    tracing::warn!(planet = %loaded.planet, "{err}");
                    continue;
                }
            };
            match self.resolve_texture(
                device,
                queue,
                loaded.planet,
                &image.rgba,
                image.width,
                image.height,
            ) {
                Ok(true) => installed += 1,
                Ok(false) => {}
                Err(err) => tracing::warn!(
                    planet = %loaded.planet,
                    path = %loaded.path.display(),
                    "Could not install texture: {err}"
                ),
            }
        }
        installed
    }

    /// Record the opaque, present, and atmosphere passes into `encoder`.
    ///
    /// `output_view` must match the current resolution. Nothing is recorded
    /// if any atmosphere is not bound to the current frame buffers.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        camera: &Camera,
    ) -> Result<(), SceneError> {
        let generation = self.target.generation();
        for planet in self.planets.values() {
            if let Some(atmosphere) = planet.atmosphere() {
                atmosphere.check_binding(generation)?;
            }
        }

        self.camera.write(queue, camera);
        for planet in self.planets.values() {
            let sun_direction = self
                .sun_model
                .direction(self.sun_position, planet.center())
                .unwrap_or(Vec3::ZERO);
            planet.write_uniform(queue, sun_direction);
            if let Some(atmosphere) = planet.atmosphere() {
                atmosphere.write_uniform(queue, camera);
            }
        }

        {
            let mut pass = RenderPassBuilder::new()
                .clear_color(self.clear_color)
                .depth(self.target.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
                .label("opaque-pass")
                .begin(encoder, &self.target.color_view);

            for planet in self.planets.values() {
                planet.draw(
                    &mut pass,
                    &self.planet_pipeline,
                    &self.camera.bind_group,
                    &self.sphere,
                );
            }
            if let Some(marker) = &self.sun_marker {
                self.unlit_triangles
                    .draw(&mut pass, &self.camera.bind_group, marker.mesh());
            }
            if let Some(line) = &self.orbit_line {
                self.unlit_lines
                    .draw(&mut pass, &self.camera.bind_group, line.mesh());
            }
        }

        {
            let mut pass = RenderPassBuilder::new()
                .label("present-pass")
                .begin(encoder, output_view);
            self.blit.draw(&mut pass, &self.blit_bind_group);
        }

        {
            let mut pass = RenderPassBuilder::new()
                .preserve_color()
                .label("atmosphere-pass")
                .begin(encoder, output_view);
            for planet in self.planets.values() {
                if let Some(atmosphere) = planet.atmosphere() {
                    atmosphere.draw(&mut pass, &self.atmosphere_pipeline, &self.sphere, generation)?;
                }
            }
        }

        Ok(())
    }

    /// Current frame buffer size.
    pub fn resolution(&self) -> (u32, u32) {
        self.target.size()
    }

    /// The offscreen color + depth target of the current resolution.
    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    pub fn sun_position(&self) -> Vec3 {
        self.sun_position
    }

    pub fn composite_mode(&self) -> CompositeMode {
        self.composite
    }

    pub fn planet(&self, id: PlanetId) -> Result<&Planet, SceneError> {
        self.planets.get(&id).ok_or(SceneError::UnknownPlanet(id))
    }

    /// Planets in insertion order.
    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.values()
    }

    /// Texture loads still in flight.
    pub fn pending_textures(&self) -> usize {
        self.texture_loader.pending()
    }
}

fn surface_texture_name(id: PlanetId) -> String {
    format!("{id}-surface")
}
