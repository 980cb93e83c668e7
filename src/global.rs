use std::sync::Arc;

use crate::{
    binding_model::{BindGroup, BindGroupLayout, PipelineLayout},
    command::{CommandBuffer, CommandEncoder, RenderBundle},
    device::{queue::Queue, Device},
    error::InvalidResourceError,
    hub::{Hub, HubReport},
    id,
    instance::{Adapter, Instance, InstanceDescriptor, InstanceFlags},
    pipeline::{ComputePipeline, RenderPipeline, ShaderModule},
    present::Surface,
    registry::{Registry, RegistryReport},
    resource::{Buffer, ExternalTexture, QuerySet, Sampler, Texture, TextureView},
    resource_log,
};

#[derive(Debug, PartialEq, Eq)]
pub struct GlobalReport {
    pub surfaces: RegistryReport,
    pub hub: HubReport,
}

impl GlobalReport {
    pub fn surfaces(&self) -> &RegistryReport {
        &self.surfaces
    }

    pub fn hub_report(&self) -> &HubReport {
        &self.hub
    }
}

/// An emulation instance.
///
/// Every adapter, device and resource is registered in exactly one `Global`
/// and its ids are meaningless in any other.
pub struct Global {
    pub instance: Instance,
    pub(crate) surfaces: Registry<Surface>,
    pub(crate) hub: Hub,
}

impl Global {
    pub fn new(desc: &InstanceDescriptor) -> Self {
        profiling::scope!("Global::new");
        Self {
            instance: Instance::new(desc),
            surfaces: Registry::new(),
            hub: Hub::new(),
        }
    }

    pub fn generate_report(&self) -> GlobalReport {
        GlobalReport {
            surfaces: self.surfaces.generate_report(),
            hub: self.hub.generate_report(),
        }
    }
}

impl Default for Global {
    fn default() -> Self {
        Self::new(&InstanceDescriptor::default())
    }
}

macro_rules! resource_getters {
    ($($(#[$meta:meta])* $name:ident: $registry:ident => $id:ty, $ty:ty;)*) => {
        impl Global {
            $(
                $(#[$meta])*
                pub fn $name(&self, id: $id) -> Result<Arc<$ty>, InvalidResourceError> {
                    self.hub.$registry.get(id)
                }
            )*
        }
    };
}

resource_getters! {
    adapter: adapters => id::AdapterId, Adapter;
    device: devices => id::DeviceId, Device;
    queue: queues => id::QueueId, Queue;
    buffer: buffers => id::BufferId, Buffer;
    texture: textures => id::TextureId, Texture;
    /// The view as created. Its texture may have been destroyed since.
    texture_view: texture_views => id::TextureViewId, TextureView;
    sampler: samplers => id::SamplerId, Sampler;
    external_texture: external_textures => id::ExternalTextureId, ExternalTexture;
    bind_group_layout: bind_group_layouts => id::BindGroupLayoutId, BindGroupLayout;
    pipeline_layout: pipeline_layouts => id::PipelineLayoutId, PipelineLayout;
    bind_group: bind_groups => id::BindGroupId, BindGroup;
    shader_module: shader_modules => id::ShaderModuleId, ShaderModule;
    render_pipeline: render_pipelines => id::RenderPipelineId, RenderPipeline;
    compute_pipeline: compute_pipelines => id::ComputePipelineId, ComputePipeline;
    command_encoder: command_encoders => id::CommandEncoderId, CommandEncoder;
    command_buffer: command_buffers => id::CommandBufferId, CommandBuffer;
    render_bundle: render_bundles => id::RenderBundleId, RenderBundle;
    query_set: query_sets => id::QuerySetId, QuerySet;
}

impl Drop for Global {
    fn drop(&mut self) {
        profiling::scope!("Global::drop");
        resource_log!("Global::drop");

        if !self.instance.flags.contains(InstanceFlags::DEBUG) {
            return;
        }
        let report = self.generate_report();
        for (kind, registry) in report.hub.registries() {
            if registry.num_kept_from_user != 0 {
                log::debug!(
                    "{}: {} {kind} still registered at drop",
                    self.instance.name,
                    registry.num_kept_from_user
                );
            }
        }
        if report.surfaces.num_kept_from_user != 0 {
            log::debug!(
                "{}: {} surfaces still registered at drop",
                self.instance.name,
                report.surfaces.num_kept_from_user
            );
        }
    }
}

fn _test_send_sync(global: &Global) {
    fn test_internal<T: Send + Sync>(_: T) {}
    test_internal(global)
}
