use parking_lot::Mutex;

use crate::{
    error::ErrorFilter,
    id::{AdapterId, QueueId},
    resource::{impl_labeled, impl_resource_type, impl_storage_item},
    Label,
};

pub mod global;
pub mod queue;

/// Limits reported by adapters and devices.
///
/// Capability negotiation is not emulated: every limit is zero. Field names
/// follow `GPUSupportedLimits`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SupportedLimits {
    pub max_texture_dimension_1d: u32,
    pub max_texture_dimension_2d: u32,
    pub max_texture_dimension_3d: u32,
    pub max_texture_array_layers: u32,
    pub max_bind_groups: u32,
    pub max_dynamic_uniform_buffers_per_pipeline_layout: u32,
    pub max_dynamic_storage_buffers_per_pipeline_layout: u32,
    pub max_sampled_textures_per_shader_stage: u32,
    pub max_samplers_per_shader_stage: u32,
    pub max_storage_buffers_per_shader_stage: u32,
    pub max_storage_textures_per_shader_stage: u32,
    pub max_uniform_buffers_per_shader_stage: u32,
    pub max_uniform_buffer_binding_size: u64,
    pub max_storage_buffer_binding_size: u64,
    pub min_uniform_buffer_offset_alignment: u32,
    pub min_storage_buffer_offset_alignment: u32,
    pub max_vertex_buffers: u32,
    pub max_vertex_attributes: u32,
    pub max_vertex_buffer_array_stride: u32,
    pub max_inter_stage_shader_components: u32,
    pub max_inter_stage_shader_variables: u32,
    pub max_color_attachments: u32,
    pub max_compute_workgroup_storage_size: u32,
    pub max_compute_invocations_per_workgroup: u32,
    pub max_compute_workgroup_size_x: u32,
    pub max_compute_workgroup_size_y: u32,
    pub max_compute_workgroup_size_z: u32,
    pub max_compute_workgroups_per_dimension: u32,
}

#[derive(Clone, Debug, Default)]
pub struct QueueDescriptor<'a> {
    pub label: Label<'a>,
}

/// Describes a [`Device`].
///
/// Requested features and limits are accepted and ignored; the device
/// always reports empty features and zero limits.
#[derive(Clone, Debug, Default)]
pub struct DeviceDescriptor<'a> {
    pub label: Label<'a>,
    pub required_features: wgt::Features,
    pub required_limits: SupportedLimits,
    pub default_queue: QueueDescriptor<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceLostReason {
    Unknown,
    Destroyed,
}

/// What `device_lost` resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceLostInfo {
    pub reason: DeviceLostReason,
    pub message: String,
}

#[derive(Debug)]
pub struct Device {
    pub(crate) adapter: AdapterId,
    pub(crate) queue_id: QueueId,
    pub(crate) features: wgt::Features,
    pub(crate) limits: SupportedLimits,
    /// Filters of the currently pushed error scopes, innermost last.
    pub(crate) error_scopes: Mutex<Vec<ErrorFilter>>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl Device {
    pub fn adapter(&self) -> AdapterId {
        self.adapter
    }

    pub fn queue(&self) -> QueueId {
        self.queue_id
    }

    pub fn features(&self) -> wgt::Features {
        self.features
    }

    pub fn limits(&self) -> &SupportedLimits {
        &self.limits
    }
}

impl_resource_type!(Device);
impl_labeled!(Device);
impl_storage_item!(Device);

#[test]
fn limits_are_all_zero() {
    let limits = SupportedLimits::default();
    assert_eq!(limits.max_bind_groups, 0);
    assert_eq!(limits.max_texture_dimension_2d, 0);
    assert_eq!(limits.max_storage_buffer_binding_size, 0);
    assert_eq!(limits.max_compute_workgroups_per_dimension, 0);
}
