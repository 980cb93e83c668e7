use std::{borrow::Cow, sync::Arc};

use crate::{
    api_log,
    command::{BasePass, CommandEncoder, CommandEncoderError, StringCursor},
    device::queue::{BufferSlot, PassCommit, PipelineState},
    global::Global,
    id,
    instance::InstanceFlags,
    Label,
};

/// Operation to perform to the output attachment at the start of a renderpass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum LoadOp {
    /// Clear the output attachment with the clear color.
    Clear = 0,
    /// Do not clear output attachment.
    Load = 1,
}

/// Operation to perform to the output attachment at the end of a renderpass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum StoreOp {
    /// Discards the content of the render target.
    Discard = 0,
    /// Store the result of the renderpass.
    Store = 1,
}

/// Describes an individual channel within a render pass, such as color, depth, or stencil.
#[derive(Clone, Debug, PartialEq)]
pub struct PassChannel<V> {
    /// Operation to perform to the output attachment at the start of a
    /// renderpass.
    pub load_op: LoadOp,
    /// Operation to perform to the output attachment at the end of a renderpass.
    pub store_op: StoreOp,
    /// If load_op is [`LoadOp::Clear`], the attachment will be cleared to this
    /// color.
    pub clear_value: V,
    /// If true, the relevant channel is not changed by a renderpass.
    pub read_only: bool,
}

impl<V: Default> Default for PassChannel<V> {
    fn default() -> Self {
        Self {
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            clear_value: V::default(),
            read_only: false,
        }
    }
}

/// Describes a color attachment to a render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPassColorAttachment {
    /// The view to use as an attachment.
    pub view: id::TextureViewId,
    /// The view that will receive the resolved output if multisampling is used.
    pub resolve_target: Option<id::TextureViewId>,
    /// What operations will be performed on this color attachment.
    pub channel: PassChannel<wgt::Color>,
}

/// Describes a depth/stencil attachment to a render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPassDepthStencilAttachment {
    /// The view to use as an attachment.
    pub view: id::TextureViewId,
    /// What operations will be performed on the depth part of the attachment.
    pub depth: PassChannel<f32>,
    /// What operations will be performed on the stencil part of the attachment.
    pub stencil: PassChannel<u32>,
}

/// Describes the writing of timestamp values in a render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderPassTimestampWrites {
    /// The query set to write the timestamp to.
    pub query_set: id::QuerySetId,
    /// The index of the query set at which a start timestamp of this pass is written, if any.
    pub beginning_of_pass_write_index: Option<u32>,
    /// The index of the query set at which an end timestamp of this pass is written, if any.
    pub end_of_pass_write_index: Option<u32>,
}

/// Describes the attachments of a render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPassDescriptor<'a> {
    pub label: Label<'a>,
    /// The color attachments of the render pass.
    pub color_attachments: Cow<'a, [Option<RenderPassColorAttachment>]>,
    /// The depth and stencil attachment of the render pass, if any.
    pub depth_stencil_attachment: Option<&'a RenderPassDepthStencilAttachment>,
    /// Defines where and when timestamp values will be written for this pass.
    pub timestamp_writes: Option<&'a RenderPassTimestampWrites>,
    /// Defines where the occlusion query results will be stored for this pass.
    pub occlusion_query_set: Option<id::QuerySetId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub rect: Rect<f32>,
    pub depth_min: f32,
    pub depth_max: f32,
}

#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderCommand {
    SetBindGroup {
        index: u32,
        bind_group_id: id::BindGroupId,
    },
    SetPipeline(id::RenderPipelineId),
    SetIndexBuffer {
        buffer_id: id::BufferId,
        index_format: wgt::IndexFormat,
        offset: wgt::BufferAddress,
        size: Option<wgt::BufferSize>,
    },
    SetVertexBuffer {
        slot: u32,
        buffer_id: id::BufferId,
        offset: wgt::BufferAddress,
        size: Option<wgt::BufferSize>,
    },
    SetBlendConstant(wgt::Color),
    SetStencilReference(u32),
    SetViewport(Viewport),
    SetScissor(Rect<u32>),
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    },
    DrawIndirect {
        buffer_id: id::BufferId,
        offset: wgt::BufferAddress,
        indexed: bool,
    },
    PushDebugGroup {
        len: usize,
    },
    PopDebugGroup,
    InsertDebugMarker {
        len: usize,
    },
    BeginOcclusionQuery {
        query_index: u32,
    },
    EndOcclusionQuery,
    ExecuteBundle(id::RenderBundleId),
}

/// Commands shared by render passes and render bundle encoders.
///
/// Recording never fails; commands are only interpreted when the pass is
/// ended or the bundle finished.
pub trait RenderEncoder {
    #[doc(hidden)]
    fn base_mut(&mut self) -> &mut BasePass<RenderCommand>;

    /// Bind `pipeline_id`, starting a fresh accumulation of buffers, bind
    /// groups and draw counts.
    fn set_pipeline(&mut self, pipeline_id: id::RenderPipelineId) {
        self.base_mut()
            .commands
            .push(RenderCommand::SetPipeline(pipeline_id));
    }

    /// Dynamic offsets are accepted and ignored.
    fn set_bind_group(
        &mut self,
        index: u32,
        bind_group_id: id::BindGroupId,
        _offsets: &[wgt::DynamicOffset],
    ) {
        self.base_mut().commands.push(RenderCommand::SetBindGroup {
            index,
            bind_group_id,
        });
    }

    fn set_vertex_buffer(
        &mut self,
        slot: u32,
        buffer_id: id::BufferId,
        offset: wgt::BufferAddress,
        size: Option<wgt::BufferSize>,
    ) {
        self.base_mut().commands.push(RenderCommand::SetVertexBuffer {
            slot,
            buffer_id,
            offset,
            size,
        });
    }

    fn set_index_buffer(
        &mut self,
        buffer_id: id::BufferId,
        index_format: wgt::IndexFormat,
        offset: wgt::BufferAddress,
        size: Option<wgt::BufferSize>,
    ) {
        self.base_mut().commands.push(RenderCommand::SetIndexBuffer {
            buffer_id,
            index_format,
            offset,
            size,
        });
    }

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.base_mut().commands.push(RenderCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) {
        self.base_mut().commands.push(RenderCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        });
    }

    fn draw_indirect(&mut self, buffer_id: id::BufferId, offset: wgt::BufferAddress) {
        self.base_mut().commands.push(RenderCommand::DrawIndirect {
            buffer_id,
            offset,
            indexed: false,
        });
    }

    fn draw_indexed_indirect(&mut self, buffer_id: id::BufferId, offset: wgt::BufferAddress) {
        self.base_mut().commands.push(RenderCommand::DrawIndirect {
            buffer_id,
            offset,
            indexed: true,
        });
    }

    fn push_debug_group(&mut self, label: &str) {
        let base = self.base_mut();
        let len = base.push_str(label);
        base.commands.push(RenderCommand::PushDebugGroup { len });
    }

    fn pop_debug_group(&mut self) {
        self.base_mut().commands.push(RenderCommand::PopDebugGroup);
    }

    fn insert_debug_marker(&mut self, label: &str) {
        let base = self.base_mut();
        let len = base.push_str(label);
        base.commands.push(RenderCommand::InsertDebugMarker { len });
    }
}

/// An open render pass.
///
/// Created by [`Global::command_encoder_begin_render_pass`], which locks the
/// parent encoder. [`Global::render_pass_end`] takes the pass by value, so it
/// cannot be used once ended. Dropping a pass without ending it unlocks the
/// encoder and commits nothing.
#[must_use = "a render pass commits nothing until it is ended"]
#[derive(Debug)]
pub struct RenderPass {
    base: BasePass<RenderCommand>,
    parent_id: id::CommandEncoderId,
    parent: Arc<CommandEncoder>,
    ended: bool,
    color_targets: Vec<Option<RenderPassColorAttachment>>,
    depth_stencil_target: Option<RenderPassDepthStencilAttachment>,
    timestamp_writes: Option<RenderPassTimestampWrites>,
    occlusion_query_set_id: Option<id::QuerySetId>,
}

impl RenderPass {
    fn new(
        parent_id: id::CommandEncoderId,
        parent: Arc<CommandEncoder>,
        desc: &RenderPassDescriptor,
    ) -> Self {
        Self {
            base: BasePass::new(&desc.label),
            parent_id,
            parent,
            ended: false,
            color_targets: desc.color_attachments.to_vec(),
            depth_stencil_target: desc.depth_stencil_attachment.cloned(),
            timestamp_writes: desc.timestamp_writes.cloned(),
            occlusion_query_set_id: desc.occlusion_query_set,
        }
    }

    pub fn parent_id(&self) -> id::CommandEncoderId {
        self.parent_id
    }

    pub fn label(&self) -> Option<&str> {
        self.base.label.as_deref()
    }

    pub fn color_attachments(&self) -> &[Option<RenderPassColorAttachment>] {
        &self.color_targets
    }

    pub fn depth_stencil_attachment(&self) -> Option<&RenderPassDepthStencilAttachment> {
        self.depth_stencil_target.as_ref()
    }

    pub fn timestamp_writes(&self) -> Option<&RenderPassTimestampWrites> {
        self.timestamp_writes.as_ref()
    }

    pub fn occlusion_query_set(&self) -> Option<id::QuerySetId> {
        self.occlusion_query_set_id
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, w: f32, h: f32, depth_min: f32, depth_max: f32) {
        self.base.commands.push(RenderCommand::SetViewport(Viewport {
            rect: Rect { x, y, w, h },
            depth_min,
            depth_max,
        }));
    }

    pub fn set_scissor_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        self.base
            .commands
            .push(RenderCommand::SetScissor(Rect { x, y, w, h }));
    }

    pub fn set_blend_constant(&mut self, color: wgt::Color) {
        self.base
            .commands
            .push(RenderCommand::SetBlendConstant(color));
    }

    pub fn set_stencil_reference(&mut self, value: u32) {
        self.base
            .commands
            .push(RenderCommand::SetStencilReference(value));
    }

    pub fn begin_occlusion_query(&mut self, query_index: u32) {
        self.base
            .commands
            .push(RenderCommand::BeginOcclusionQuery { query_index });
    }

    pub fn end_occlusion_query(&mut self) {
        self.base.commands.push(RenderCommand::EndOcclusionQuery);
    }

    pub fn execute_bundles(&mut self, render_bundle_ids: &[id::RenderBundleId]) {
        self.base.commands.extend(
            render_bundle_ids
                .iter()
                .copied()
                .map(RenderCommand::ExecuteBundle),
        );
    }
}

impl RenderEncoder for RenderPass {
    fn base_mut(&mut self) -> &mut BasePass<RenderCommand> {
        &mut self.base
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        if !self.ended {
            self.parent.abandon_pass("Render", self.base.label.as_deref());
        }
    }
}

/// State accumulated while replaying a render pass.
#[derive(Debug, Default)]
struct State {
    pipeline: Option<id::RenderPipelineId>,
    accumulated: PipelineState,
    viewport: Option<Viewport>,
    scissor: Option<Rect<u32>>,
    debug_scope_depth: u32,
}

impl State {
    fn replay(base: &BasePass<RenderCommand>) -> Self {
        let mut state = Self::default();
        let mut strings = StringCursor::new(&base.string_data);

        for &command in base.commands.iter() {
            match command {
                RenderCommand::SetPipeline(pipeline_id) => {
                    state.pipeline = Some(pipeline_id);
                    state.accumulated = PipelineState::default();
                }
                RenderCommand::SetBindGroup {
                    index,
                    bind_group_id,
                } => {
                    state.accumulated.bind_groups.insert(index, bind_group_id);
                }
                RenderCommand::SetVertexBuffer {
                    slot, buffer_id, ..
                } => {
                    state
                        .accumulated
                        .buffers
                        .insert(BufferSlot::Vertex(slot), buffer_id);
                }
                RenderCommand::SetIndexBuffer { buffer_id, .. } => {
                    state
                        .accumulated
                        .buffers
                        .insert(BufferSlot::Index, buffer_id);
                }
                RenderCommand::Draw { vertex_count, .. } => {
                    state.accumulated.vertex_count = vertex_count;
                }
                RenderCommand::DrawIndexed { index_count, .. } => {
                    state.accumulated.index_count = index_count;
                }
                RenderCommand::SetViewport(viewport) => state.viewport = Some(viewport),
                RenderCommand::SetScissor(rect) => state.scissor = Some(rect),
                RenderCommand::PushDebugGroup { len } => {
                    state.debug_scope_depth += 1;
                    log::trace!("Render pass debug group {:?}", strings.next(len));
                }
                RenderCommand::PopDebugGroup => {
                    state.debug_scope_depth = state.debug_scope_depth.saturating_sub(1);
                }
                RenderCommand::InsertDebugMarker { len } => {
                    log::trace!("Render pass debug marker {:?}", strings.next(len));
                }
                RenderCommand::SetBlendConstant(_)
                | RenderCommand::SetStencilReference(_)
                | RenderCommand::DrawIndirect { .. }
                | RenderCommand::BeginOcclusionQuery { .. }
                | RenderCommand::EndOcclusionQuery
                | RenderCommand::ExecuteBundle(_) => {}
            }
        }

        if state.debug_scope_depth != 0 {
            log::debug!(
                "Render pass {:?} ended with {} unbalanced debug group(s)",
                base.label,
                state.debug_scope_depth
            );
        }
        state
    }
}

impl Global {
    /// Begin a render pass, locking `encoder_id` until the pass is ended.
    pub fn command_encoder_begin_render_pass(
        &self,
        encoder_id: id::CommandEncoderId,
        desc: &RenderPassDescriptor,
    ) -> Result<RenderPass, CommandEncoderError> {
        profiling::scope!("CommandEncoder::begin_render_pass");
        api_log!("CommandEncoder::begin_render_pass {encoder_id:?} {:?}", desc.label);

        let encoder = self.get_encoder(encoder_id)?;
        if let Err(err) = encoder.lock_encoder() {
            log::warn!("Cannot begin a render pass on {encoder_id:?}: {err}");
            return Err(err);
        }
        Ok(RenderPass::new(encoder_id, encoder, desc))
    }

    /// End `pass`, committing its accumulated state to the device's queue.
    ///
    /// The state is keyed by the pipeline bound last. A pass that never bound
    /// a pipeline commits nothing.
    pub fn render_pass_end(&self, mut pass: RenderPass) -> Result<(), CommandEncoderError> {
        profiling::scope!("RenderPass::end");
        api_log!(
            "RenderPass::end {:?} ({} commands)",
            pass.base.label,
            pass.base.commands.len()
        );

        let encoder = self.get_encoder(pass.parent_id)?;
        pass.ended = true;
        encoder.unlock_encoder()?;

        let State {
            pipeline,
            accumulated,
            viewport,
            scissor,
            ..
        } = State::replay(&pass.base);

        let Some(pipeline) = pipeline else {
            log::debug!(
                "Render pass {:?} ended with no pipeline bound, nothing committed",
                pass.base.label
            );
            return Ok(());
        };

        let device = self.hub.devices.get(encoder.device)?;
        let queue = self.hub.queues.get(device.queue_id)?;
        let record_pass_log = self
            .instance
            .flags
            .contains(InstanceFlags::RECORD_PASS_LOG);
        let commit = record_pass_log.then(|| PassCommit {
            pipeline,
            state: accumulated.clone(),
            viewport,
            scissor,
            color_targets: pass
                .color_targets
                .iter()
                .flatten()
                .map(|attachment| attachment.view)
                .collect(),
            label: pass.base.label.clone(),
        });
        queue.submission.lock().commit(pipeline, accumulated, commit);
        Ok(())
    }
}
