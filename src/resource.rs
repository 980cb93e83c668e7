use std::borrow::Cow;

use arrayvec::ArrayVec;

use crate::{
    id::{DeviceId, TextureId},
    memory::ExternalImageSource,
    Label, LabelHelpers as _,
};

/// Information about the resource kind, used in logs and errors.
pub trait ResourceType {
    const TYPE: &'static str;
}

macro_rules! impl_resource_type {
    ($ty:ident) => {
        impl $crate::resource::ResourceType for $ty {
            const TYPE: &'static str = stringify!($ty);
        }
    };
}

pub trait Labeled: ResourceType {
    /// Returns the label the resource was created with, or an empty string.
    fn label(&self) -> &str;

    fn error_ident(&self) -> ResourceErrorIdent {
        ResourceErrorIdent {
            r#type: Cow::Borrowed(Self::TYPE),
            label: self.label().to_owned(),
        }
    }
}

macro_rules! impl_labeled {
    ($ty:ident) => {
        impl $crate::resource::Labeled for $ty {
            fn label(&self) -> &str {
                &self.label
            }
        }
    };
}

/// A resource created by, and belonging to, a device.
pub trait ParentDevice {
    fn device(&self) -> DeviceId;
}

macro_rules! impl_parent_device {
    ($ty:ident) => {
        impl $crate::resource::ParentDevice for $ty {
            fn device(&self) -> $crate::id::DeviceId {
                self.device
            }
        }
    };
}

macro_rules! impl_storage_item {
    ($ty:ident) => {
        impl $crate::storage::StorageItem for $ty {
            type Marker = $crate::id::markers::$ty;
        }
    };
}
pub(crate) use {impl_labeled, impl_parent_device, impl_resource_type, impl_storage_item};

/// Identifies a resource in log messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceErrorIdent {
    r#type: Cow<'static, str>,
    label: String,
}

impl std::fmt::Display for ResourceErrorIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} with '{}' label", self.r#type, self.label)
    }
}

bitflags::bitflags! {
    /// Access requested by `buffer_map_async`.
    ///
    /// Bit values match `GPUMapMode`.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MapMode: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

/// Mapping state reported by [`Buffer::map_state`].
///
/// Mapping is emulated without a device timeline, so a buffer reports
/// `Mapped` only while a region handed out by `get_mapped_range` is
/// outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferMapState {
    Unmapped,
    Mapped,
}

pub type BufferDescriptor<'a> = wgt::BufferDescriptor<Label<'a>>;

#[derive(Debug)]
pub struct Buffer {
    pub(crate) device: DeviceId,
    pub(crate) usage: wgt::BufferUsages,
    pub(crate) size: wgt::BufferAddress,
    pub(crate) mapped_at_creation: bool,
    pub(crate) map_state: parking_lot::Mutex<BufferMapState>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl Buffer {
    pub fn usage(&self) -> wgt::BufferUsages {
        self.usage
    }

    pub fn size(&self) -> wgt::BufferAddress {
        self.size
    }

    pub fn mapped_at_creation(&self) -> bool {
        self.mapped_at_creation
    }

    pub fn map_state(&self) -> BufferMapState {
        *self.map_state.lock()
    }
}

impl_resource_type!(Buffer);
impl_labeled!(Buffer);
impl_parent_device!(Buffer);
impl_storage_item!(Buffer);

/// A texture extent, in either of the shapes WebGPU accepts.
///
/// `[w]`, `[w, h]` and `[w, h, d]` sequences are accepted alongside a full
/// [`wgt::Extent3d`]. [`TextureSize::normalize`] maps both to one extent;
/// every other component only ever sees the normalized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureSize {
    Sequence(ArrayVec<u32, 3>),
    Extent(wgt::Extent3d),
}

impl TextureSize {
    /// Missing components default to 1.
    pub fn normalize(&self) -> wgt::Extent3d {
        match *self {
            Self::Sequence(ref dims) => {
                let dim = |i: usize| dims.get(i).copied().unwrap_or(1);
                wgt::Extent3d {
                    width: dim(0),
                    height: dim(1),
                    depth_or_array_layers: dim(2),
                }
            }
            Self::Extent(extent) => extent,
        }
    }
}

impl From<wgt::Extent3d> for TextureSize {
    fn from(extent: wgt::Extent3d) -> Self {
        Self::Extent(extent)
    }
}

impl From<&[u32]> for TextureSize {
    /// Components past the third are ignored.
    fn from(dims: &[u32]) -> Self {
        Self::Sequence(dims.iter().copied().take(3).collect())
    }
}

impl<const N: usize> From<[u32; N]> for TextureSize {
    fn from(dims: [u32; N]) -> Self {
        Self::from(&dims[..])
    }
}

#[derive(Clone, Debug)]
pub struct TextureDescriptor<'a> {
    pub label: Label<'a>,
    pub size: TextureSize,
    /// Defaults to 1.
    pub mip_level_count: Option<u32>,
    /// Defaults to 1.
    pub sample_count: Option<u32>,
    /// Defaults to [`wgt::TextureDimension::D2`].
    pub dimension: Option<wgt::TextureDimension>,
    pub format: wgt::TextureFormat,
    pub usage: wgt::TextureUsages,
    pub view_formats: Vec<wgt::TextureFormat>,
}

impl<'a> TextureDescriptor<'a> {
    pub fn new(
        size: impl Into<TextureSize>,
        format: wgt::TextureFormat,
        usage: wgt::TextureUsages,
    ) -> Self {
        Self {
            label: None,
            size: size.into(),
            mip_level_count: None,
            sample_count: None,
            dimension: None,
            format,
            usage,
            view_formats: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug)]
pub struct Texture {
    pub(crate) device: DeviceId,
    pub(crate) size: wgt::Extent3d,
    pub(crate) mip_level_count: u32,
    pub(crate) sample_count: u32,
    pub(crate) dimension: wgt::TextureDimension,
    pub(crate) format: wgt::TextureFormat,
    pub(crate) usage: wgt::TextureUsages,
    pub(crate) view_formats: Vec<wgt::TextureFormat>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl Texture {
    pub(crate) fn new(device: DeviceId, desc: &TextureDescriptor) -> Self {
        Self {
            device,
            size: desc.size.normalize(),
            mip_level_count: desc.mip_level_count.unwrap_or(1),
            sample_count: desc.sample_count.unwrap_or(1),
            dimension: desc.dimension.unwrap_or(wgt::TextureDimension::D2),
            format: desc.format,
            usage: desc.usage,
            view_formats: desc.view_formats.clone(),
            label: desc.label.to_owned_or_default(),
        }
    }

    pub fn size(&self) -> wgt::Extent3d {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn depth_or_array_layers(&self) -> u32 {
        self.size.depth_or_array_layers
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn dimension(&self) -> wgt::TextureDimension {
        self.dimension
    }

    pub fn format(&self) -> wgt::TextureFormat {
        self.format
    }

    pub fn usage(&self) -> wgt::TextureUsages {
        self.usage
    }

    pub fn view_formats(&self) -> &[wgt::TextureFormat] {
        &self.view_formats
    }

    /// Whether the texture has the given size, format and usage.
    pub(crate) fn matches(
        &self,
        width: u32,
        height: u32,
        format: wgt::TextureFormat,
        usage: wgt::TextureUsages,
    ) -> bool {
        self.size.width == width
            && self.size.height == height
            && self.format == format
            && self.usage == usage
    }
}

impl_resource_type!(Texture);
impl_labeled!(Texture);
impl_parent_device!(Texture);
impl_storage_item!(Texture);

/// Describes a [`TextureView`].
///
/// Every `None` falls back to the corresponding property of the texture.
#[derive(Clone, Debug)]
pub struct TextureViewDescriptor<'a> {
    pub label: Label<'a>,
    pub format: Option<wgt::TextureFormat>,
    pub dimension: Option<wgt::TextureViewDimension>,
    pub aspect: wgt::TextureAspect,
    pub base_mip_level: u32,
    pub mip_level_count: Option<u32>,
    pub base_array_layer: u32,
    pub array_layer_count: Option<u32>,
}

impl Default for TextureViewDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            format: None,
            dimension: None,
            aspect: wgt::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: None,
            base_array_layer: 0,
            array_layer_count: None,
        }
    }
}

#[derive(Debug)]
pub struct TextureView {
    pub(crate) texture: TextureId,
    pub(crate) format: wgt::TextureFormat,
    pub(crate) dimension: wgt::TextureViewDimension,
    pub(crate) aspect: wgt::TextureAspect,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl TextureView {
    pub(crate) fn new(texture_id: TextureId, texture: &Texture, desc: &TextureViewDescriptor) -> Self {
        let dimension = desc.dimension.unwrap_or(match texture.dimension {
            wgt::TextureDimension::D1 => wgt::TextureViewDimension::D1,
            wgt::TextureDimension::D2 if texture.size.depth_or_array_layers > 1 => {
                wgt::TextureViewDimension::D2Array
            }
            wgt::TextureDimension::D2 => wgt::TextureViewDimension::D2,
            wgt::TextureDimension::D3 => wgt::TextureViewDimension::D3,
        });
        Self {
            texture: texture_id,
            format: desc.format.unwrap_or(texture.format),
            dimension,
            aspect: desc.aspect,
            label: desc.label.to_owned_or_default(),
        }
    }

    /// The texture this view was created from, at the time of creation.
    ///
    /// The id may no longer be live.
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn format(&self) -> wgt::TextureFormat {
        self.format
    }

    pub fn dimension(&self) -> wgt::TextureViewDimension {
        self.dimension
    }

    pub fn aspect(&self) -> wgt::TextureAspect {
        self.aspect
    }
}

impl_resource_type!(TextureView);
impl_labeled!(TextureView);
impl_storage_item!(TextureView);

/// Describes a [`Sampler`].
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerDescriptor<'a> {
    pub label: Label<'a>,
    /// How to deal with out of bounds accesses in the u, v and w directions.
    pub address_modes: [wgt::AddressMode; 3],
    pub mag_filter: wgt::FilterMode,
    pub min_filter: wgt::FilterMode,
    pub mipmap_filter: wgt::FilterMode,
    pub lod_min_clamp: f32,
    pub lod_max_clamp: f32,
    /// If this is enabled, this is a comparison sampler using the given comparison function.
    pub compare: Option<wgt::CompareFunction>,
    pub anisotropy_clamp: u16,
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_modes: [wgt::AddressMode::ClampToEdge; 3],
            mag_filter: wgt::FilterMode::Nearest,
            min_filter: wgt::FilterMode::Nearest,
            mipmap_filter: wgt::FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: None,
            anisotropy_clamp: 1,
        }
    }
}

#[derive(Debug)]
pub struct Sampler {
    pub(crate) device: DeviceId,
    pub(crate) address_modes: [wgt::AddressMode; 3],
    pub(crate) filters: [wgt::FilterMode; 3],
    pub(crate) compare: Option<wgt::CompareFunction>,
    pub(crate) anisotropy_clamp: u16,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl Sampler {
    pub(crate) fn new(device: DeviceId, desc: &SamplerDescriptor) -> Self {
        Self {
            device,
            address_modes: desc.address_modes,
            filters: [desc.mag_filter, desc.min_filter, desc.mipmap_filter],
            compare: desc.compare,
            anisotropy_clamp: desc.anisotropy_clamp,
            label: desc.label.to_owned_or_default(),
        }
    }

    pub fn address_modes(&self) -> [wgt::AddressMode; 3] {
        self.address_modes
    }

    /// Magnification, minification and mipmap filters, in that order.
    pub fn filters(&self) -> [wgt::FilterMode; 3] {
        self.filters
    }

    pub fn is_comparison(&self) -> bool {
        self.compare.is_some()
    }

    pub fn anisotropy_clamp(&self) -> u16 {
        self.anisotropy_clamp
    }
}

impl_resource_type!(Sampler);
impl_labeled!(Sampler);
impl_parent_device!(Sampler);
impl_storage_item!(Sampler);

pub type QuerySetDescriptor<'a> = wgt::QuerySetDescriptor<Label<'a>>;

#[derive(Debug)]
pub struct QuerySet {
    pub(crate) device: DeviceId,
    pub(crate) ty: wgt::QueryType,
    pub(crate) count: u32,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl QuerySet {
    pub fn ty(&self) -> wgt::QueryType {
        self.ty
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl_resource_type!(QuerySet);
impl_labeled!(QuerySet);
impl_parent_device!(QuerySet);
impl_storage_item!(QuerySet);

#[derive(Clone, Debug)]
pub struct ExternalTextureDescriptor<'a> {
    pub label: Label<'a>,
    pub source: ExternalImageSource,
}

#[derive(Debug)]
pub struct ExternalTexture {
    pub(crate) device: DeviceId,
    pub(crate) source: ExternalImageSource,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl ExternalTexture {
    pub fn source(&self) -> &ExternalImageSource {
        &self.source
    }

    /// Imported frames never expire; there is no video decoder behind them.
    pub fn expired(&self) -> bool {
        false
    }
}

impl_resource_type!(ExternalTexture);
impl_labeled!(ExternalTexture);
impl_parent_device!(ExternalTexture);
impl_storage_item!(ExternalTexture);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;

    fn texture(size: impl Into<TextureSize>) -> Texture {
        let desc = TextureDescriptor::new(
            size,
            wgt::TextureFormat::Rgba8Unorm,
            wgt::TextureUsages::TEXTURE_BINDING,
        );
        Texture::new(Id::zip(0, 1), &desc)
    }

    #[test]
    fn sequence_and_extent_normalize_alike() {
        let from_seq = TextureSize::from([640, 480]).normalize();
        let from_extent = TextureSize::from(wgt::Extent3d {
            width: 640,
            height: 480,
            depth_or_array_layers: 1,
        })
        .normalize();
        assert_eq!(from_seq, from_extent);
    }

    #[test]
    fn missing_components_default_to_one() {
        assert_eq!(
            TextureSize::from([7]).normalize(),
            wgt::Extent3d {
                width: 7,
                height: 1,
                depth_or_array_layers: 1,
            }
        );
        let long: &[u32] = &[2, 3, 4, 5];
        assert_eq!(
            TextureSize::from(long).normalize(),
            wgt::Extent3d {
                width: 2,
                height: 3,
                depth_or_array_layers: 4,
            }
        );
    }

    #[test]
    fn texture_defaults() {
        let texture = texture([16, 16]);
        assert_eq!(texture.mip_level_count(), 1);
        assert_eq!(texture.sample_count(), 1);
        assert_eq!(texture.dimension(), wgt::TextureDimension::D2);
        assert_eq!(texture.label(), "");
    }

    #[test]
    fn view_inherits_texture_properties() {
        let layered = texture([16, 16, 6]);
        let view = TextureView::new(Id::zip(0, 1), &layered, &TextureViewDescriptor::default());
        assert_eq!(view.format(), wgt::TextureFormat::Rgba8Unorm);
        assert_eq!(view.dimension(), wgt::TextureViewDimension::D2Array);

        let cube = TextureView::new(
            Id::zip(0, 1),
            &layered,
            &TextureViewDescriptor {
                dimension: Some(wgt::TextureViewDimension::Cube),
                ..Default::default()
            },
        );
        assert_eq!(cube.dimension(), wgt::TextureViewDimension::Cube);
    }

    #[test]
    fn map_mode_bits() {
        assert_eq!(MapMode::READ.bits(), 1);
        assert_eq!(MapMode::WRITE.bits(), 2);
    }
}
