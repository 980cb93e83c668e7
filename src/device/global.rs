use std::sync::Arc;

use crate::{
    api_log,
    binding_model::{self, BindingResource},
    command::{self, CommandEncoder},
    device::{Device, DeviceLostInfo, DeviceLostReason, SupportedLimits},
    error::{ErrorFilter, GpuError, InvalidResourceError},
    global::Global,
    id::{self, DeviceId, QueueId},
    memory::{MappedRange, TextureContents},
    pipeline::{self, CompilationInfo},
    resource::{self, BufferMapState, Labeled as _, MapMode, ParentDevice as _},
    resource_log, LabelHelpers as _,
};

fn to_usize(value: wgt::BufferAddress) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

impl Global {
    fn get_device(&self, device_id: DeviceId) -> Result<Arc<Device>, InvalidResourceError> {
        self.hub.devices.get(device_id)
    }

    /// Ids of every device not yet destroyed, in index order.
    pub fn live_devices(&self) -> Vec<DeviceId> {
        self.hub.devices.ids()
    }

    pub fn device_features(&self, device_id: DeviceId) -> Result<wgt::Features, InvalidResourceError> {
        Ok(self.get_device(device_id)?.features())
    }

    pub fn device_limits(&self, device_id: DeviceId) -> Result<SupportedLimits, InvalidResourceError> {
        Ok(self.get_device(device_id)?.limits.clone())
    }

    pub fn device_get_queue(&self, device_id: DeviceId) -> Result<QueueId, InvalidResourceError> {
        Ok(self.get_device(device_id)?.queue())
    }

    pub fn device_create_buffer(
        &self,
        device_id: DeviceId,
        desc: &resource::BufferDescriptor,
    ) -> Result<id::BufferId, InvalidResourceError> {
        profiling::scope!("Device::create_buffer");

        self.get_device(device_id)?;
        let map_state = if desc.mapped_at_creation {
            BufferMapState::Mapped
        } else {
            BufferMapState::Unmapped
        };
        let buffer = resource::Buffer {
            device: device_id,
            usage: desc.usage,
            size: desc.size,
            mapped_at_creation: desc.mapped_at_creation,
            map_state: parking_lot::Mutex::new(map_state),
            label: desc.label.to_owned_or_default(),
        };
        let id = self.hub.buffers.register(buffer);
        if desc.mapped_at_creation {
            self.hub.memory.map_buffer(id, 0, to_usize(desc.size));
        }

        api_log!("Device::create_buffer({:?}, {}) -> {id:?}", desc.label, desc.size);
        Ok(id)
    }

    /// Hand out a freshly zeroed region of `size` bytes (the whole buffer by
    /// default), viewed from `offset`.
    ///
    /// The region replaces whatever was recorded for the buffer before. An
    /// offset past the end gives an empty view.
    pub fn buffer_get_mapped_range(
        &self,
        buffer_id: id::BufferId,
        offset: Option<wgt::BufferAddress>,
        size: Option<wgt::BufferAddress>,
    ) -> Result<MappedRange, InvalidResourceError> {
        profiling::scope!("Buffer::get_mapped_range");
        api_log!("Buffer::get_mapped_range {buffer_id:?} offset {offset:?} size {size:?}");

        let buffer = self.hub.buffers.get(buffer_id)?;
        let size = size.unwrap_or(buffer.size);
        let range = self.hub.memory.map_buffer(
            buffer_id,
            to_usize(offset.unwrap_or(0)),
            to_usize(size),
        );
        *buffer.map_state.lock() = BufferMapState::Mapped;
        Ok(range)
    }

    /// Resolves immediately without touching the buffer's content.
    pub async fn buffer_map_async(
        &self,
        buffer_id: id::BufferId,
        mode: MapMode,
        offset: wgt::BufferAddress,
        size: Option<wgt::BufferAddress>,
    ) -> Result<(), InvalidResourceError> {
        api_log!("Buffer::map_async {buffer_id:?} mode={mode:?} offset={offset} size={size:?}");

        self.hub.buffers.get(buffer_id).map(|_| ())
    }

    pub fn buffer_unmap(&self, buffer_id: id::BufferId) -> Result<(), InvalidResourceError> {
        profiling::scope!("unmap", "Buffer");
        api_log!("Buffer::unmap {buffer_id:?}");

        let buffer = self.hub.buffers.get(buffer_id)?;
        *buffer.map_state.lock() = BufferMapState::Unmapped;
        Ok(())
    }

    /// The bytes last recorded for the buffer, by mapping or a queue write.
    pub fn buffer_contents(&self, buffer_id: id::BufferId) -> Option<Vec<u8>> {
        self.hub.memory.buffer_contents(buffer_id)
    }

    /// Destroy the buffer along with its recorded content.
    ///
    /// Destroying a buffer that is not live does nothing.
    pub fn buffer_destroy(&self, buffer_id: id::BufferId) {
        profiling::scope!("Buffer::destroy");
        api_log!("Buffer::destroy {buffer_id:?}");

        if let Some(buffer) = self.hub.buffers.unregister(buffer_id) {
            self.hub.memory.release_buffer(buffer_id);
            resource_log!("Destroyed {}", buffer.error_ident());
        }
    }

    pub fn device_create_texture(
        &self,
        device_id: DeviceId,
        desc: &resource::TextureDescriptor,
    ) -> Result<id::TextureId, InvalidResourceError> {
        profiling::scope!("Device::create_texture");

        self.get_device(device_id)?;
        let id = self
            .hub
            .textures
            .register(resource::Texture::new(device_id, desc));

        api_log!("Device::create_texture({desc:?}) -> {id:?}");
        Ok(id)
    }

    /// Destroy the texture along with its recorded content.
    ///
    /// Views created from the texture stay registered and keep naming it as
    /// their texture. Destroying a texture that is not live does nothing.
    pub fn texture_destroy(&self, texture_id: id::TextureId) {
        profiling::scope!("Texture::destroy");
        api_log!("Texture::destroy {texture_id:?}");

        if let Some(texture) = self.hub.textures.unregister(texture_id) {
            self.hub.memory.release_texture(texture_id);
            self.hub.texture_surfaces.remove(texture_id);
            resource_log!("Destroyed {}", texture.error_ident());
        }
    }

    /// The content last written to the texture by the queue.
    pub fn texture_contents(&self, texture_id: id::TextureId) -> Option<TextureContents> {
        self.hub.memory.texture_contents(texture_id)
    }

    pub fn texture_create_view(
        &self,
        texture_id: id::TextureId,
        desc: &resource::TextureViewDescriptor,
    ) -> Result<id::TextureViewId, InvalidResourceError> {
        profiling::scope!("Texture::create_view");

        let texture = self.hub.textures.get(texture_id)?;
        let view = resource::TextureView::new(texture_id, &texture, desc);
        let id = self.hub.texture_views.register(view);
        self.hub.view_owners.insert(id, texture_id);

        api_log!("Texture::create_view({texture_id:?}) -> {id:?}");
        Ok(id)
    }

    /// The texture `texture_view_id` was created from, while the view is live.
    pub fn texture_view_owner(&self, texture_view_id: id::TextureViewId) -> Option<id::TextureId> {
        self.hub.view_owners.owner_of(texture_view_id)
    }

    /// Live views created from `texture_id`, in id order.
    pub fn texture_views_of(&self, texture_id: id::TextureId) -> Vec<id::TextureViewId> {
        self.hub.view_owners.derived_from(texture_id)
    }

    pub fn texture_view_drop(&self, texture_view_id: id::TextureViewId) {
        profiling::scope!("TextureView::drop");
        api_log!("TextureView::drop {texture_view_id:?}");

        if self.hub.texture_views.unregister(texture_view_id).is_some() {
            self.hub.view_owners.remove(texture_view_id);
        }
    }

    pub fn device_create_sampler(
        &self,
        device_id: DeviceId,
        desc: &resource::SamplerDescriptor,
    ) -> Result<id::SamplerId, InvalidResourceError> {
        profiling::scope!("Device::create_sampler");

        self.get_device(device_id)?;
        let id = self
            .hub
            .samplers
            .register(resource::Sampler::new(device_id, desc));

        api_log!("Device::create_sampler -> {id:?}");
        Ok(id)
    }

    pub fn sampler_drop(&self, sampler_id: id::SamplerId) {
        profiling::scope!("Sampler::drop");
        api_log!("Sampler::drop {sampler_id:?}");

        self.hub.samplers.unregister(sampler_id);
    }

    pub fn device_create_bind_group_layout(
        &self,
        device_id: DeviceId,
        desc: &binding_model::BindGroupLayoutDescriptor,
    ) -> Result<id::BindGroupLayoutId, InvalidResourceError> {
        profiling::scope!("Device::create_bind_group_layout");

        self.get_device(device_id)?;
        let id = self
            .hub
            .bind_group_layouts
            .register(binding_model::BindGroupLayout {
                device: device_id,
                entries: desc.entries.to_vec(),
                label: desc.label.to_owned_or_default(),
            });

        api_log!("Device::create_bind_group_layout -> {id:?}");
        Ok(id)
    }

    pub fn bind_group_layout_drop(&self, bind_group_layout_id: id::BindGroupLayoutId) {
        profiling::scope!("BindGroupLayout::drop");
        api_log!("BindGroupLayout::drop {bind_group_layout_id:?}");

        self.hub.bind_group_layouts.unregister(bind_group_layout_id);
    }

    pub fn device_create_pipeline_layout(
        &self,
        device_id: DeviceId,
        desc: &binding_model::PipelineLayoutDescriptor,
    ) -> Result<id::PipelineLayoutId, InvalidResourceError> {
        profiling::scope!("Device::create_pipeline_layout");

        self.get_device(device_id)?;
        for &bgl_id in desc.bind_group_layouts.iter() {
            self.hub.bind_group_layouts.get(bgl_id)?;
        }
        let id = self
            .hub
            .pipeline_layouts
            .register(binding_model::PipelineLayout {
                device: device_id,
                bind_group_layouts: desc.bind_group_layouts.to_vec(),
                label: desc.label.to_owned_or_default(),
            });

        api_log!("Device::create_pipeline_layout -> {id:?}");
        Ok(id)
    }

    pub fn pipeline_layout_drop(&self, pipeline_layout_id: id::PipelineLayoutId) {
        profiling::scope!("PipelineLayout::drop");
        api_log!("PipelineLayout::drop {pipeline_layout_id:?}");

        self.hub.pipeline_layouts.unregister(pipeline_layout_id);
    }

    /// Create a bind group. The layout and every bound resource must be
    /// live; whether they fit the layout is not checked.
    pub fn device_create_bind_group(
        &self,
        device_id: DeviceId,
        desc: &binding_model::BindGroupDescriptor,
    ) -> Result<id::BindGroupId, InvalidResourceError> {
        profiling::scope!("Device::create_bind_group");

        self.get_device(device_id)?;
        self.hub.bind_group_layouts.get(desc.layout)?;
        for entry in desc.entries.iter() {
            match entry.resource {
                BindingResource::Buffer(ref bb) => {
                    self.hub.buffers.get(bb.buffer_id)?;
                }
                BindingResource::Sampler(sampler_id) => {
                    self.hub.samplers.get(sampler_id)?;
                }
                BindingResource::TextureView(view_id) => {
                    self.hub.texture_views.get(view_id)?;
                }
                BindingResource::ExternalTexture(external_id) => {
                    self.hub.external_textures.get(external_id)?;
                }
            }
        }
        let id = self.hub.bind_groups.register(binding_model::BindGroup {
            device: device_id,
            layout: desc.layout,
            entries: desc.entries.to_vec(),
            label: desc.label.to_owned_or_default(),
        });

        api_log!("Device::create_bind_group -> {id:?}");
        Ok(id)
    }

    pub fn bind_group_drop(&self, bind_group_id: id::BindGroupId) {
        profiling::scope!("BindGroup::drop");
        api_log!("BindGroup::drop {bind_group_id:?}");

        self.hub.bind_groups.unregister(bind_group_id);
    }

    pub fn device_create_shader_module(
        &self,
        device_id: DeviceId,
        desc: &pipeline::ShaderModuleDescriptor,
    ) -> Result<id::ShaderModuleId, InvalidResourceError> {
        profiling::scope!("Device::create_shader_module");

        self.get_device(device_id)?;
        let id = self.hub.shader_modules.register(pipeline::ShaderModule {
            device: device_id,
            code: desc.code.to_string(),
            label: desc.label.to_owned_or_default(),
        });

        api_log!("Device::create_shader_module -> {id:?}");
        Ok(id)
    }

    /// Shader source is never compiled, so there is nothing to report.
    pub async fn shader_module_compilation_info(
        &self,
        shader_module_id: id::ShaderModuleId,
    ) -> Result<CompilationInfo, InvalidResourceError> {
        api_log!("ShaderModule::compilation_info {shader_module_id:?}");

        self.hub.shader_modules.get(shader_module_id)?;
        Ok(CompilationInfo::default())
    }

    pub fn shader_module_drop(&self, shader_module_id: id::ShaderModuleId) {
        profiling::scope!("ShaderModule::drop");
        api_log!("ShaderModule::drop {shader_module_id:?}");

        self.hub.shader_modules.unregister(shader_module_id);
    }

    pub fn device_create_command_encoder(
        &self,
        device_id: DeviceId,
        desc: &command::CommandEncoderDescriptor,
    ) -> Result<id::CommandEncoderId, InvalidResourceError> {
        profiling::scope!("Device::create_command_encoder");

        self.get_device(device_id)?;
        let id = self
            .hub
            .command_encoders
            .register(CommandEncoder::new(device_id, desc));

        api_log!("Device::create_command_encoder -> {id:?}");
        Ok(id)
    }

    pub fn command_encoder_drop(&self, command_encoder_id: id::CommandEncoderId) {
        profiling::scope!("CommandEncoder::drop");
        api_log!("CommandEncoder::drop {command_encoder_id:?}");

        self.hub.command_encoders.unregister(command_encoder_id);
    }

    pub fn command_buffer_drop(&self, command_buffer_id: id::CommandBufferId) {
        profiling::scope!("CommandBuffer::drop");
        api_log!("CommandBuffer::drop {command_buffer_id:?}");

        self.hub.command_buffers.unregister(command_buffer_id);
    }

    pub fn device_create_query_set(
        &self,
        device_id: DeviceId,
        desc: &resource::QuerySetDescriptor,
    ) -> Result<id::QuerySetId, InvalidResourceError> {
        profiling::scope!("Device::create_query_set");

        self.get_device(device_id)?;
        let id = self.hub.query_sets.register(resource::QuerySet {
            device: device_id,
            ty: desc.ty,
            count: desc.count,
            label: desc.label.to_owned_or_default(),
        });

        api_log!("Device::create_query_set -> {id:?}");
        Ok(id)
    }

    pub fn query_set_destroy(&self, query_set_id: id::QuerySetId) {
        profiling::scope!("QuerySet::destroy");
        api_log!("QuerySet::destroy {query_set_id:?}");

        self.hub.query_sets.unregister(query_set_id);
    }

    pub fn device_import_external_texture(
        &self,
        device_id: DeviceId,
        desc: &resource::ExternalTextureDescriptor,
    ) -> Result<id::ExternalTextureId, InvalidResourceError> {
        profiling::scope!("Device::import_external_texture");

        self.get_device(device_id)?;
        let id = self
            .hub
            .external_textures
            .register(resource::ExternalTexture {
                device: device_id,
                source: desc.source.clone(),
                label: desc.label.to_owned_or_default(),
            });

        api_log!("Device::import_external_texture {:?} -> {id:?}", desc.source.size());
        Ok(id)
    }

    pub fn external_texture_drop(&self, external_texture_id: id::ExternalTextureId) {
        profiling::scope!("ExternalTexture::drop");
        api_log!("ExternalTexture::drop {external_texture_id:?}");

        self.hub.external_textures.unregister(external_texture_id);
    }

    fn check_stage(
        &self,
        stage: &pipeline::ProgrammableStageDescriptor,
    ) -> Result<(), InvalidResourceError> {
        self.hub.shader_modules.get(stage.module).map(|_| ())
    }

    pub fn device_create_render_pipeline(
        &self,
        device_id: DeviceId,
        desc: &pipeline::RenderPipelineDescriptor,
    ) -> Result<id::RenderPipelineId, InvalidResourceError> {
        profiling::scope!("Device::create_render_pipeline");

        self.get_device(device_id)?;
        if let Some(layout_id) = desc.layout {
            self.hub.pipeline_layouts.get(layout_id)?;
        }
        self.check_stage(&desc.vertex.stage)?;
        if let Some(ref fragment) = desc.fragment {
            self.check_stage(&fragment.stage)?;
        }
        let id = self
            .hub
            .render_pipelines
            .register(pipeline::RenderPipeline::new(device_id, desc));

        api_log!("Device::create_render_pipeline({:?}) -> {id:?}", desc.label);
        Ok(id)
    }

    /// Resolves immediately to the same pipeline `device_create_render_pipeline`
    /// would have created.
    pub async fn device_create_render_pipeline_async(
        &self,
        device_id: DeviceId,
        desc: &pipeline::RenderPipelineDescriptor<'_>,
    ) -> Result<id::RenderPipelineId, InvalidResourceError> {
        self.device_create_render_pipeline(device_id, desc)
    }

    /// Register a new, empty bind group layout for the pipeline.
    ///
    /// Layouts are not derived from shaders, so every call yields a distinct
    /// layout with no entries, whatever `index` is.
    pub fn render_pipeline_get_bind_group_layout(
        &self,
        pipeline_id: id::RenderPipelineId,
        index: u32,
    ) -> Result<id::BindGroupLayoutId, InvalidResourceError> {
        let pipeline = self.hub.render_pipelines.get(pipeline_id)?;
        let id = self.register_implicit_layout(pipeline.device());

        api_log!("RenderPipeline::get_bind_group_layout({pipeline_id:?}, {index}) -> {id:?}");
        Ok(id)
    }

    pub fn render_pipeline_drop(&self, render_pipeline_id: id::RenderPipelineId) {
        profiling::scope!("RenderPipeline::drop");
        api_log!("RenderPipeline::drop {render_pipeline_id:?}");

        self.hub.render_pipelines.unregister(render_pipeline_id);
    }

    pub fn device_create_compute_pipeline(
        &self,
        device_id: DeviceId,
        desc: &pipeline::ComputePipelineDescriptor,
    ) -> Result<id::ComputePipelineId, InvalidResourceError> {
        profiling::scope!("Device::create_compute_pipeline");

        self.get_device(device_id)?;
        if let Some(layout_id) = desc.layout {
            self.hub.pipeline_layouts.get(layout_id)?;
        }
        self.check_stage(&desc.stage)?;
        let id = self
            .hub
            .compute_pipelines
            .register(pipeline::ComputePipeline {
                device: device_id,
                layout: desc.layout,
                module: desc.stage.module,
                label: desc.label.to_owned_or_default(),
            });

        api_log!("Device::create_compute_pipeline({:?}) -> {id:?}", desc.label);
        Ok(id)
    }

    pub async fn device_create_compute_pipeline_async(
        &self,
        device_id: DeviceId,
        desc: &pipeline::ComputePipelineDescriptor<'_>,
    ) -> Result<id::ComputePipelineId, InvalidResourceError> {
        self.device_create_compute_pipeline(device_id, desc)
    }

    /// See [`Global::render_pipeline_get_bind_group_layout`].
    pub fn compute_pipeline_get_bind_group_layout(
        &self,
        pipeline_id: id::ComputePipelineId,
        index: u32,
    ) -> Result<id::BindGroupLayoutId, InvalidResourceError> {
        let pipeline = self.hub.compute_pipelines.get(pipeline_id)?;
        let id = self.register_implicit_layout(pipeline.device());

        api_log!("ComputePipeline::get_bind_group_layout({pipeline_id:?}, {index}) -> {id:?}");
        Ok(id)
    }

    pub fn compute_pipeline_drop(&self, compute_pipeline_id: id::ComputePipelineId) {
        profiling::scope!("ComputePipeline::drop");
        api_log!("ComputePipeline::drop {compute_pipeline_id:?}");

        self.hub.compute_pipelines.unregister(compute_pipeline_id);
    }

    fn register_implicit_layout(&self, device_id: DeviceId) -> id::BindGroupLayoutId {
        self.hub
            .bind_group_layouts
            .register(binding_model::BindGroupLayout {
                device: device_id,
                entries: Vec::new(),
                label: String::new(),
            })
    }

    pub fn device_push_error_scope(
        &self,
        device_id: DeviceId,
        filter: ErrorFilter,
    ) -> Result<(), InvalidResourceError> {
        api_log!("Device::push_error_scope {device_id:?} {filter:?}");

        self.get_device(device_id)?.error_scopes.lock().push(filter);
        Ok(())
    }

    /// Pop the innermost error scope.
    ///
    /// Nothing is ever validated, so no scope ever captures an error.
    pub async fn device_pop_error_scope(
        &self,
        device_id: DeviceId,
    ) -> Result<Option<GpuError>, InvalidResourceError> {
        api_log!("Device::pop_error_scope {device_id:?}");

        let device = self.get_device(device_id)?;
        if device.error_scopes.lock().pop().is_none() {
            log::warn!("Popped an error scope of {device_id:?} that was never pushed");
        }
        Ok(None)
    }

    /// Resolves immediately.
    ///
    /// A live device reports an unknown reason, as it has not been lost. An
    /// id that is no longer live reports [`DeviceLostReason::Destroyed`].
    pub async fn device_lost(&self, device_id: DeviceId) -> DeviceLostInfo {
        api_log!("Device::lost {device_id:?}");

        let reason = if self.hub.devices.contains(device_id) {
            DeviceLostReason::Unknown
        } else {
            DeviceLostReason::Destroyed
        };
        DeviceLostInfo {
            reason,
            message: String::new(),
        }
    }

    /// Remove the device and its queue from the live set.
    ///
    /// Resources created from the device stay registered until they are
    /// destroyed themselves.
    pub fn device_destroy(&self, device_id: DeviceId) {
        profiling::scope!("Device::destroy");
        api_log!("Device::destroy {device_id:?}");

        if let Some(device) = self.hub.devices.unregister(device_id) {
            self.hub.queues.unregister(device.queue_id);
            resource_log!("Destroyed {device_id:?} and {:?}", device.queue_id);
        }
    }

    pub fn device_drop(&self, device_id: DeviceId) {
        profiling::scope!("Device::drop");
        api_log!("Device::drop {device_id:?}");

        self.device_destroy(device_id);
    }
}
