use std::borrow::Cow;

use crate::{
    id::{
        BindGroupLayoutId, BufferId, DeviceId, ExternalTextureId, SamplerId, TextureViewId,
    },
    resource::{impl_labeled, impl_parent_device, impl_resource_type, impl_storage_item},
    Label,
};

/// Describes a [`BindGroupLayout`].
#[derive(Clone, Debug, Default)]
pub struct BindGroupLayoutDescriptor<'a> {
    /// Debug label of the bind group layout.
    pub label: Label<'a>,
    /// Array of entries in this BindGroupLayout
    pub entries: Cow<'a, [wgt::BindGroupLayoutEntry]>,
}

#[derive(Debug)]
pub struct BindGroupLayout {
    pub(crate) device: DeviceId,
    pub(crate) entries: Vec<wgt::BindGroupLayoutEntry>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl BindGroupLayout {
    pub fn entries(&self) -> &[wgt::BindGroupLayoutEntry] {
        &self.entries
    }
}

impl_resource_type!(BindGroupLayout);
impl_labeled!(BindGroupLayout);
impl_parent_device!(BindGroupLayout);
impl_storage_item!(BindGroupLayout);

/// Describes a pipeline layout.
///
/// A `PipelineLayoutDescriptor` can be used to create a pipeline layout.
#[derive(Clone, Debug, Default)]
pub struct PipelineLayoutDescriptor<'a> {
    /// Debug label of the pipeline layout.
    pub label: Label<'a>,
    /// Bind groups that this pipeline uses. The first entry will provide all the bindings for
    /// "set = 0", second entry will provide all the bindings for "set = 1" etc.
    pub bind_group_layouts: Cow<'a, [BindGroupLayoutId]>,
}

#[derive(Debug)]
pub struct PipelineLayout {
    pub(crate) device: DeviceId,
    pub(crate) bind_group_layouts: Vec<BindGroupLayoutId>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl PipelineLayout {
    pub fn bind_group_layouts(&self) -> &[BindGroupLayoutId] {
        &self.bind_group_layouts
    }
}

impl_resource_type!(PipelineLayout);
impl_labeled!(PipelineLayout);
impl_parent_device!(PipelineLayout);
impl_storage_item!(PipelineLayout);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferBinding {
    pub buffer_id: BufferId,
    pub offset: wgt::BufferAddress,
    pub size: Option<wgt::BufferSize>,
}

// Note: no arrays of views; WebGPU bind groups have none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingResource {
    Buffer(BufferBinding),
    Sampler(SamplerId),
    TextureView(TextureViewId),
    ExternalTexture(ExternalTextureId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindGroupEntry {
    /// Slot for which binding provides resource. Corresponds to an entry of the same
    /// binding index in the [`BindGroupLayoutDescriptor`].
    pub binding: u32,
    pub resource: BindingResource,
}

/// Describes a group of bindings and the resources to be bound.
#[derive(Clone, Debug)]
pub struct BindGroupDescriptor<'a> {
    /// Debug label of the bind group.
    pub label: Label<'a>,
    /// The [`BindGroupLayout`] that corresponds to this bind group.
    pub layout: BindGroupLayoutId,
    /// The resources to bind to this bind group.
    pub entries: Cow<'a, [BindGroupEntry]>,
}

#[derive(Debug)]
pub struct BindGroup {
    pub(crate) device: DeviceId,
    pub(crate) layout: BindGroupLayoutId,
    pub(crate) entries: Vec<BindGroupEntry>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl BindGroup {
    pub fn layout(&self) -> BindGroupLayoutId {
        self.layout
    }

    pub fn entries(&self) -> &[BindGroupEntry] {
        &self.entries
    }
}

impl_resource_type!(BindGroup);
impl_labeled!(BindGroup);
impl_parent_device!(BindGroup);
impl_storage_item!(BindGroup);
