/*! The registries of every resource kind in a [`Global`].

Each field of [`Hub`] is a [`Registry`] holding all live values of one
resource kind. Besides the registries, the hub owns the state that relates
resources to each other or to their content:

- [`RelationTracker`]s mapping texture views back to their texture and
  textures back to the surface whose cache holds them,
- [`HostMemory`], the recorded content of buffers and textures.

Nothing in the hub is global to the process. Two [`Global`]s never see each
other's resources.

[`Global`]: crate::global::Global
!*/

use crate::{
    binding_model::{BindGroup, BindGroupLayout, PipelineLayout},
    command::{CommandBuffer, CommandEncoder, RenderBundle},
    device::{queue::Queue, Device},
    id::markers,
    instance::Adapter,
    memory::HostMemory,
    pipeline::{ComputePipeline, RenderPipeline, ShaderModule},
    registry::{Registry, RegistryReport},
    resource::{Buffer, ExternalTexture, QuerySet, Sampler, Texture, TextureView},
    track::RelationTracker,
};

#[derive(Debug, PartialEq, Eq)]
pub struct HubReport {
    pub adapters: RegistryReport,
    pub devices: RegistryReport,
    pub queues: RegistryReport,
    pub pipeline_layouts: RegistryReport,
    pub shader_modules: RegistryReport,
    pub bind_group_layouts: RegistryReport,
    pub bind_groups: RegistryReport,
    pub command_encoders: RegistryReport,
    pub command_buffers: RegistryReport,
    pub render_bundles: RegistryReport,
    pub render_pipelines: RegistryReport,
    pub compute_pipelines: RegistryReport,
    pub query_sets: RegistryReport,
    pub buffers: RegistryReport,
    pub textures: RegistryReport,
    pub texture_views: RegistryReport,
    pub samplers: RegistryReport,
    pub external_textures: RegistryReport,
    /// Number of texture views whose owning texture is recorded.
    pub view_owners: usize,
    /// Number of textures currently held by a surface cache.
    pub surface_textures: usize,
}

impl HubReport {
    /// Whether no resource of any kind is live.
    pub fn is_empty(&self) -> bool {
        self.registries().iter().all(|(_, report)| report.is_empty())
    }

    /// Every per-kind report, with the kind's name.
    pub fn registries(&self) -> [(&'static str, &RegistryReport); 18] {
        [
            ("adapters", &self.adapters),
            ("devices", &self.devices),
            ("queues", &self.queues),
            ("pipeline_layouts", &self.pipeline_layouts),
            ("shader_modules", &self.shader_modules),
            ("bind_group_layouts", &self.bind_group_layouts),
            ("bind_groups", &self.bind_groups),
            ("command_encoders", &self.command_encoders),
            ("command_buffers", &self.command_buffers),
            ("render_bundles", &self.render_bundles),
            ("render_pipelines", &self.render_pipelines),
            ("compute_pipelines", &self.compute_pipelines),
            ("query_sets", &self.query_sets),
            ("buffers", &self.buffers),
            ("textures", &self.textures),
            ("texture_views", &self.texture_views),
            ("samplers", &self.samplers),
            ("external_textures", &self.external_textures),
        ]
    }
}

pub struct Hub {
    pub(crate) adapters: Registry<Adapter>,
    pub(crate) devices: Registry<Device>,
    pub(crate) queues: Registry<Queue>,
    pub(crate) pipeline_layouts: Registry<PipelineLayout>,
    pub(crate) shader_modules: Registry<ShaderModule>,
    pub(crate) bind_group_layouts: Registry<BindGroupLayout>,
    pub(crate) bind_groups: Registry<BindGroup>,
    pub(crate) command_encoders: Registry<CommandEncoder>,
    pub(crate) command_buffers: Registry<CommandBuffer>,
    pub(crate) render_bundles: Registry<RenderBundle>,
    pub(crate) render_pipelines: Registry<RenderPipeline>,
    pub(crate) compute_pipelines: Registry<ComputePipeline>,
    pub(crate) query_sets: Registry<QuerySet>,
    pub(crate) buffers: Registry<Buffer>,
    pub(crate) textures: Registry<Texture>,
    pub(crate) texture_views: Registry<TextureView>,
    pub(crate) samplers: Registry<Sampler>,
    pub(crate) external_textures: Registry<ExternalTexture>,
    pub(crate) view_owners: RelationTracker<markers::TextureView, markers::Texture>,
    pub(crate) texture_surfaces: RelationTracker<markers::Texture, markers::Surface>,
    pub(crate) memory: HostMemory,
}

impl Hub {
    pub(crate) fn new() -> Self {
        Self {
            adapters: Registry::new(),
            devices: Registry::new(),
            queues: Registry::new(),
            pipeline_layouts: Registry::new(),
            shader_modules: Registry::new(),
            bind_group_layouts: Registry::new(),
            bind_groups: Registry::new(),
            command_encoders: Registry::new(),
            command_buffers: Registry::new(),
            render_bundles: Registry::new(),
            render_pipelines: Registry::new(),
            compute_pipelines: Registry::new(),
            query_sets: Registry::new(),
            buffers: Registry::new(),
            textures: Registry::new(),
            texture_views: Registry::new(),
            samplers: Registry::new(),
            external_textures: Registry::new(),
            view_owners: RelationTracker::new(),
            texture_surfaces: RelationTracker::new(),
            memory: HostMemory::new(),
        }
    }

    pub fn generate_report(&self) -> HubReport {
        HubReport {
            adapters: self.adapters.generate_report(),
            devices: self.devices.generate_report(),
            queues: self.queues.generate_report(),
            pipeline_layouts: self.pipeline_layouts.generate_report(),
            shader_modules: self.shader_modules.generate_report(),
            bind_group_layouts: self.bind_group_layouts.generate_report(),
            bind_groups: self.bind_groups.generate_report(),
            command_encoders: self.command_encoders.generate_report(),
            command_buffers: self.command_buffers.generate_report(),
            render_bundles: self.render_bundles.generate_report(),
            render_pipelines: self.render_pipelines.generate_report(),
            compute_pipelines: self.compute_pipelines.generate_report(),
            query_sets: self.query_sets.generate_report(),
            buffers: self.buffers.generate_report(),
            textures: self.textures.generate_report(),
            texture_views: self.texture_views.generate_report(),
            samplers: self.samplers.generate_report(),
            external_textures: self.external_textures.generate_report(),
            view_owners: self.view_owners.len(),
            surface_textures: self.texture_surfaces.len(),
        }
    }
}
