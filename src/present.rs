/*! Canvas surfaces.

A surface wraps a [`SurfaceTarget`] (anything that reports its current size,
typically a [`Canvas`]) and caches one texture sized to it. The cache is
checked on every [`Global::surface_get_current_texture`] call: if the canvas
was resized, or the configured format or usage changed, or the caller
destroyed the cached texture, the old texture is destroyed and a new one is
allocated.

There is no presentation. The texture returned for a frame is the one the
next frame gets back, unless something above changed.
!*/

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    api_log,
    error::InvalidResourceError,
    global::Global,
    id::{DeviceId, SurfaceId, TextureId},
    resource::{impl_resource_type, impl_storage_item, Texture, TextureDescriptor},
};

const DEFAULT_USAGE: wgt::TextureUsages = wgt::TextureUsages::RENDER_ATTACHMENT;

/// Something a surface can be created for.
pub trait SurfaceTarget: fmt::Debug + Send + Sync {
    /// Current width and height, in pixels.
    fn size(&self) -> (u32, u32);
}

/// A resizable drawing area.
#[derive(Debug)]
pub struct Canvas {
    width: AtomicU32,
    height: AtomicU32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::Relaxed),
            self.height.load(Ordering::Relaxed),
        )
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
    }
}

impl SurfaceTarget for Canvas {
    fn size(&self) -> (u32, u32) {
        Canvas::size(self)
    }
}

#[derive(Clone, Debug)]
pub struct SurfaceConfiguration {
    pub device: DeviceId,
    pub format: wgt::TextureFormat,
    /// `None` keeps the usage of the previous configuration, initially
    /// [`wgt::TextureUsages::RENDER_ATTACHMENT`].
    pub usage: Option<wgt::TextureUsages>,
}

#[derive(Debug)]
struct Presentation {
    device: Option<DeviceId>,
    format: wgt::TextureFormat,
    usage: wgt::TextureUsages,
    texture: Option<TextureId>,
}

impl Presentation {
    fn new(format: wgt::TextureFormat) -> Self {
        Self {
            device: None,
            format,
            usage: DEFAULT_USAGE,
            texture: None,
        }
    }
}

#[derive(Debug)]
pub struct Surface {
    target: Arc<dyn SurfaceTarget>,
    default_format: wgt::TextureFormat,
    presentation: Mutex<Presentation>,
}

impl Surface {
    pub fn target(&self) -> &Arc<dyn SurfaceTarget> {
        &self.target
    }

    pub fn format(&self) -> wgt::TextureFormat {
        self.presentation.lock().format
    }

    pub fn usage(&self) -> wgt::TextureUsages {
        self.presentation.lock().usage
    }

    pub fn is_configured(&self) -> bool {
        self.presentation.lock().device.is_some()
    }
}

impl_resource_type!(Surface);
impl_storage_item!(Surface);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SurfaceError {
    #[error("surface is invalid")]
    Invalid,
    #[error("surface is not configured for presentation")]
    NotConfigured,
    #[error(transparent)]
    InvalidResource(#[from] InvalidResourceError),
}

impl Global {
    fn get_surface(&self, surface_id: SurfaceId) -> Result<Arc<Surface>, SurfaceError> {
        self.surfaces
            .get(surface_id)
            .map_err(|_| SurfaceError::Invalid)
    }

    /// Destroy the texture `presentation` caches, if any.
    fn discard_surface_texture(&self, presentation: &mut Presentation) {
        if let Some(texture_id) = presentation.texture.take() {
            self.hub.texture_surfaces.remove(texture_id);
            self.texture_destroy(texture_id);
        }
    }

    pub fn instance_create_surface(&self, target: Arc<dyn SurfaceTarget>) -> SurfaceId {
        profiling::scope!("Instance::create_surface");
        api_log!("Instance::create_surface {target:?}");

        let default_format = self.instance.preferred_canvas_format;
        self.surfaces.register(Surface {
            target,
            default_format,
            presentation: Mutex::new(Presentation::new(default_format)),
        })
    }

    pub fn surface_configure(
        &self,
        surface_id: SurfaceId,
        config: &SurfaceConfiguration,
    ) -> Result<(), SurfaceError> {
        profiling::scope!("Surface::configure");
        api_log!("Surface::configure {surface_id:?} {config:?}");

        let surface = self.get_surface(surface_id)?;
        self.hub.devices.get(config.device)?;

        let mut presentation = surface.presentation.lock();
        presentation.device = Some(config.device);
        presentation.format = config.format;
        if let Some(usage) = config.usage {
            presentation.usage = usage;
        }
        Ok(())
    }

    /// Destroy the cached texture and return to the default configuration.
    pub fn surface_unconfigure(&self, surface_id: SurfaceId) -> Result<(), SurfaceError> {
        profiling::scope!("Surface::unconfigure");
        api_log!("Surface::unconfigure {surface_id:?}");

        let surface = self.get_surface(surface_id)?;
        let mut presentation = surface.presentation.lock();
        self.discard_surface_texture(&mut presentation);
        *presentation = Presentation::new(surface.default_format);
        Ok(())
    }

    /// The texture to draw the current frame into.
    ///
    /// The cached texture is returned while it is live and still matches the
    /// canvas size and the configured format and usage. Otherwise it is
    /// destroyed and replaced.
    pub fn surface_get_current_texture(
        &self,
        surface_id: SurfaceId,
    ) -> Result<TextureId, SurfaceError> {
        profiling::scope!("Surface::get_current_texture");
        api_log!("Surface::get_current_texture {surface_id:?}");

        let surface = self.get_surface(surface_id)?;
        let mut presentation = surface.presentation.lock();
        let device_id = presentation.device.ok_or(SurfaceError::NotConfigured)?;
        let (width, height) = surface.target.size();

        if let Some(texture_id) = presentation.texture {
            let reusable = match self.hub.textures.get(texture_id) {
                Ok(texture) => {
                    texture.matches(width, height, presentation.format, presentation.usage)
                }
                Err(_) => false,
            };
            if reusable {
                return Ok(texture_id);
            }
            log::debug!("Reallocating texture of {surface_id:?} for {width}x{height}");
            self.discard_surface_texture(&mut presentation);
        }

        self.hub.devices.get(device_id)?;
        let desc = TextureDescriptor::new(
            [width, height, 1],
            presentation.format,
            presentation.usage,
        );
        let texture_id = self
            .hub
            .textures
            .register(Texture::new(device_id, &desc));
        self.hub.texture_surfaces.insert(texture_id, surface_id);
        presentation.texture = Some(texture_id);
        Ok(texture_id)
    }

    /// The configured format, or the instance's preferred canvas format if
    /// the surface was never configured.
    pub fn surface_get_preferred_format(
        &self,
        surface_id: SurfaceId,
    ) -> Result<wgt::TextureFormat, SurfaceError> {
        Ok(self.get_surface(surface_id)?.format())
    }

    /// The surface whose cache currently holds `texture_id`, if any.
    pub fn texture_surface(&self, texture_id: TextureId) -> Option<SurfaceId> {
        self.hub.texture_surfaces.owner_of(texture_id)
    }

    /// Drop the surface along with its cached texture.
    pub fn surface_drop(&self, surface_id: SurfaceId) {
        profiling::scope!("Surface::drop");
        api_log!("Surface::drop {surface_id:?}");

        if let Some(surface) = self.surfaces.unregister(surface_id) {
            self.discard_surface_texture(&mut surface.presentation.lock());
        }
    }
}
