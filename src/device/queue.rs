/*! The device queue and its submission record.

Render passes commit their accumulated draw state here when they end, not
when their command buffer is submitted. The record is meant for inspection:
it answers "what would the device have drawn, and with what?".

## Submission record

The record is keyed by render pipeline. Each key holds the state committed
by the last pass that ended with that pipeline bound, so two passes drawing
with the same pipeline leave a single entry. The pass log, kept unless
[`InstanceFlags::RECORD_PASS_LOG`] is cleared, additionally keeps one
[`PassCommit`] per ended pass, in order.

[`InstanceFlags::RECORD_PASS_LOG`]: crate::instance::InstanceFlags::RECORD_PASS_LOG
!*/

use std::{
    collections::{btree_map, BTreeMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
    api_log,
    command::{ImageCopyTexture, Rect, Viewport},
    error::InvalidResourceError,
    global::Global,
    id::{BindGroupId, BufferId, CommandBufferId, DeviceId, QueueId, RenderPipelineId, TextureViewId},
    memory::{ExternalImageSource, TextureContents},
    resource::{impl_labeled, impl_parent_device, impl_resource_type, impl_storage_item, TextureSize},
};

/// Where a buffer is bound within a render pass.
///
/// `Index` sorts before every vertex slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BufferSlot {
    /// The slot reserved for the index buffer.
    Index,
    Vertex(u32),
}

/// Draw state committed for one render pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineState {
    pub buffers: BTreeMap<BufferSlot, BufferId>,
    pub bind_groups: BTreeMap<u32, BindGroupId>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl PipelineState {
    pub fn vertex_buffer(&self, slot: u32) -> Option<BufferId> {
        self.buffers.get(&BufferSlot::Vertex(slot)).copied()
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.buffers.get(&BufferSlot::Index).copied()
    }

    pub fn bind_group(&self, index: u32) -> Option<BindGroupId> {
        self.bind_groups.get(&index).copied()
    }
}

/// One ended render pass, as recorded in the pass log.
#[derive(Clone, Debug, PartialEq)]
pub struct PassCommit {
    pub pipeline: RenderPipelineId,
    pub state: PipelineState,
    pub viewport: Option<Viewport>,
    pub scissor: Option<Rect<u32>>,
    /// Views of the pass's color attachments, in attachment order.
    pub color_targets: SmallVec<[TextureViewId; 4]>,
    pub label: Option<String>,
}

#[derive(Debug, Default)]
pub struct SubmissionQueue {
    pipelines: BTreeMap<RenderPipelineId, PipelineState>,
    log: Vec<PassCommit>,
}

impl SubmissionQueue {
    /// Record `state` for `pipeline`, replacing what an earlier pass left.
    pub(crate) fn commit(
        &mut self,
        pipeline: RenderPipelineId,
        state: PipelineState,
        log_entry: Option<PassCommit>,
    ) {
        match self.pipelines.entry(pipeline) {
            btree_map::Entry::Occupied(mut e) => {
                log::trace!("Replacing submitted state of {pipeline:?}");
                e.insert(state);
            }
            btree_map::Entry::Vacant(e) => {
                e.insert(state);
            }
        }
        self.log.extend(log_entry);
    }

    pub fn get(&self, pipeline: RenderPipelineId) -> Option<&PipelineState> {
        self.pipelines.get(&pipeline)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderPipelineId, &PipelineState)> {
        self.pipelines.iter().map(|(&id, state)| (id, state))
    }

    pub fn pass_log(&self) -> &[PassCommit] {
        &self.log
    }

    pub fn clear(&mut self) {
        self.pipelines.clear();
        self.log.clear();
    }
}

#[derive(Debug)]
pub struct Queue {
    pub(crate) device: DeviceId,
    pub(crate) submission: Mutex<SubmissionQueue>,
    pub(crate) submitted_command_buffers: AtomicU64,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl Queue {
    pub(crate) fn new(device: DeviceId, label: String) -> Self {
        Self {
            device,
            submission: Mutex::new(SubmissionQueue::default()),
            submitted_command_buffers: AtomicU64::new(0),
            label,
        }
    }
}

impl_resource_type!(Queue);
impl_labeled!(Queue);
impl_parent_device!(Queue);
impl_storage_item!(Queue);

/// Source of `queue_copy_external_image_to_texture`.
#[derive(Clone, Debug)]
pub struct ImageCopyExternalImage {
    pub source: ExternalImageSource,
    pub origin: wgt::Origin2d,
    pub flip_y: bool,
}

impl Global {
    fn get_queue(&self, queue_id: QueueId) -> Result<Arc<Queue>, InvalidResourceError> {
        self.hub.queues.get(queue_id)
    }

    /// Record `data` as the content of `buffer_id`.
    ///
    /// The offset is accepted but not applied: the recorded content becomes
    /// exactly `data`.
    pub fn queue_write_buffer(
        &self,
        queue_id: QueueId,
        buffer_id: BufferId,
        buffer_offset: wgt::BufferAddress,
        data: &[u8],
    ) -> Result<(), InvalidResourceError> {
        profiling::scope!("Queue::write_buffer");
        api_log!("Queue::write_buffer {buffer_id:?} {}bytes", data.len());

        self.get_queue(queue_id)?;
        self.hub.buffers.get(buffer_id)?;
        if buffer_offset != 0 {
            log::trace!("Ignoring offset {buffer_offset} of write to {buffer_id:?}");
        }
        self.hub.memory.write_buffer(buffer_id, data);
        Ok(())
    }

    pub fn queue_write_texture(
        &self,
        queue_id: QueueId,
        destination: &ImageCopyTexture,
        data: &[u8],
        data_layout: &wgt::ImageDataLayout,
        size: impl Into<TextureSize>,
    ) -> Result<(), InvalidResourceError> {
        profiling::scope!("Queue::write_texture");
        api_log!(
            "Queue::write_texture {:?} {:?} layout {:?}",
            destination.texture,
            size.into().normalize(),
            data_layout
        );

        self.get_queue(queue_id)?;
        self.hub.textures.get(destination.texture)?;
        self.hub
            .memory
            .write_texture(destination.texture, TextureContents::Data(data.into()));
        Ok(())
    }

    pub fn queue_copy_external_image_to_texture(
        &self,
        queue_id: QueueId,
        source: &ImageCopyExternalImage,
        destination: &ImageCopyTexture,
        size: impl Into<TextureSize>,
    ) -> Result<(), InvalidResourceError> {
        profiling::scope!("Queue::copy_external_image_to_texture");
        api_log!(
            "Queue::copy_external_image_to_texture {:?} from {:?} {:?}",
            destination.texture,
            source.source.size(),
            size.into().normalize()
        );

        self.get_queue(queue_id)?;
        self.hub.textures.get(destination.texture)?;
        self.hub.memory.write_texture(
            destination.texture,
            TextureContents::Image(source.source.clone()),
        );
        Ok(())
    }

    /// Submit finished command buffers, consuming them.
    ///
    /// Either every command buffer is consumed or, if any id is invalid,
    /// none is.
    pub fn queue_submit(
        &self,
        queue_id: QueueId,
        command_buffer_ids: &[CommandBufferId],
    ) -> Result<(), InvalidResourceError> {
        profiling::scope!("Queue::submit");
        api_log!("Queue::submit {queue_id:?}");

        let queue = self.get_queue(queue_id)?;
        for (i, &cmb_id) in command_buffer_ids.iter().enumerate() {
            if command_buffer_ids[..i].contains(&cmb_id) {
                // Its first occurrence consumes it.
                return Err(InvalidResourceError::new(cmb_id));
            }
            self.hub.command_buffers.get(cmb_id)?;
        }
        for &cmb_id in command_buffer_ids {
            self.hub.command_buffers.unregister(cmb_id);
        }
        queue
            .submitted_command_buffers
            .fetch_add(command_buffer_ids.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Resolves immediately: there is never outstanding work.
    pub async fn queue_on_submitted_work_done(
        &self,
        queue_id: QueueId,
    ) -> Result<(), InvalidResourceError> {
        api_log!("Queue::on_submitted_work_done {queue_id:?}");
        self.get_queue(queue_id).map(|_| ())
    }

    /// Total number of command buffers submitted to this queue.
    pub fn queue_submitted_count(&self, queue_id: QueueId) -> Result<u64, InvalidResourceError> {
        Ok(self
            .get_queue(queue_id)?
            .submitted_command_buffers
            .load(Ordering::Relaxed))
    }

    /// The state last committed for `pipeline_id`, if any.
    pub fn queue_pipeline_state(
        &self,
        queue_id: QueueId,
        pipeline_id: RenderPipelineId,
    ) -> Result<Option<PipelineState>, InvalidResourceError> {
        let queue = self.get_queue(queue_id)?;
        let submission = queue.submission.lock();
        Ok(submission.get(pipeline_id).cloned())
    }

    /// Every pipeline's committed state, ordered by pipeline id.
    pub fn queue_submissions(
        &self,
        queue_id: QueueId,
    ) -> Result<Vec<(RenderPipelineId, PipelineState)>, InvalidResourceError> {
        let queue = self.get_queue(queue_id)?;
        let submission = queue.submission.lock();
        Ok(submission
            .iter()
            .map(|(id, state)| (id, state.clone()))
            .collect())
    }

    pub fn queue_pass_log(&self, queue_id: QueueId) -> Result<Vec<PassCommit>, InvalidResourceError> {
        let queue = self.get_queue(queue_id)?;
        let submission = queue.submission.lock();
        Ok(submission.pass_log().to_vec())
    }

    /// Forget all committed state and the pass log.
    pub fn queue_clear_submissions(&self, queue_id: QueueId) -> Result<(), InvalidResourceError> {
        api_log!("Queue::clear_submissions {queue_id:?}");
        self.get_queue(queue_id)?.submission.lock().clear();
        Ok(())
    }
}
