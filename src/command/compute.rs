use std::sync::Arc;

use crate::{
    api_log,
    command::{BasePass, CommandEncoder, CommandEncoderError, StringCursor},
    global::Global,
    id, Label,
};

/// Describes a compute pass.
#[derive(Clone, Debug, Default)]
pub struct ComputePassDescriptor<'a> {
    pub label: Label<'a>,
}

#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeCommand {
    SetBindGroup {
        index: u32,
        bind_group_id: id::BindGroupId,
    },
    SetPipeline(id::ComputePipelineId),
    Dispatch([u32; 3]),
    DispatchIndirect {
        buffer_id: id::BufferId,
        offset: wgt::BufferAddress,
    },
    PushDebugGroup {
        len: usize,
    },
    PopDebugGroup,
    InsertDebugMarker {
        len: usize,
    },
}

/// An open compute pass.
///
/// Dispatches are accepted and counted, but a compute pass never touches the
/// queue's submission record. Dropping the pass without ending it unlocks
/// its encoder.
#[must_use = "a compute pass keeps its encoder locked until it is ended"]
#[derive(Debug)]
pub struct ComputePass {
    base: BasePass<ComputeCommand>,
    parent_id: id::CommandEncoderId,
    parent: Arc<CommandEncoder>,
    ended: bool,
}

impl ComputePass {
    fn new(
        parent_id: id::CommandEncoderId,
        parent: Arc<CommandEncoder>,
        desc: &ComputePassDescriptor,
    ) -> Self {
        Self {
            base: BasePass::new(&desc.label),
            parent_id,
            parent,
            ended: false,
        }
    }

    pub fn parent_id(&self) -> id::CommandEncoderId {
        self.parent_id
    }

    pub fn label(&self) -> Option<&str> {
        self.base.label.as_deref()
    }

    pub fn set_pipeline(&mut self, pipeline_id: id::ComputePipelineId) {
        self.base
            .commands
            .push(ComputeCommand::SetPipeline(pipeline_id));
    }

    pub fn set_bind_group(
        &mut self,
        index: u32,
        bind_group_id: id::BindGroupId,
        _offsets: &[wgt::DynamicOffset],
    ) {
        self.base.commands.push(ComputeCommand::SetBindGroup {
            index,
            bind_group_id,
        });
    }

    pub fn dispatch_workgroups(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.base
            .commands
            .push(ComputeCommand::Dispatch([groups_x, groups_y, groups_z]));
    }

    pub fn dispatch_workgroups_indirect(
        &mut self,
        buffer_id: id::BufferId,
        offset: wgt::BufferAddress,
    ) {
        self.base
            .commands
            .push(ComputeCommand::DispatchIndirect { buffer_id, offset });
    }

    pub fn push_debug_group(&mut self, label: &str) {
        let len = self.base.push_str(label);
        self.base.commands.push(ComputeCommand::PushDebugGroup { len });
    }

    pub fn pop_debug_group(&mut self) {
        self.base.commands.push(ComputeCommand::PopDebugGroup);
    }

    pub fn insert_debug_marker(&mut self, label: &str) {
        let len = self.base.push_str(label);
        self.base
            .commands
            .push(ComputeCommand::InsertDebugMarker { len });
    }

    fn dispatch_count(&self) -> usize {
        self.base
            .commands
            .iter()
            .filter(|command| {
                matches!(
                    command,
                    ComputeCommand::Dispatch(_) | ComputeCommand::DispatchIndirect { .. }
                )
            })
            .count()
    }
}

impl Drop for ComputePass {
    fn drop(&mut self) {
        if !self.ended {
            self.parent.abandon_pass("Compute", self.base.label.as_deref());
        }
    }
}

impl Global {
    pub fn command_encoder_begin_compute_pass(
        &self,
        encoder_id: id::CommandEncoderId,
        desc: &ComputePassDescriptor,
    ) -> Result<ComputePass, CommandEncoderError> {
        profiling::scope!("CommandEncoder::begin_compute_pass");
        api_log!("CommandEncoder::begin_compute_pass {encoder_id:?} {:?}", desc.label);

        let encoder = self.get_encoder(encoder_id)?;
        encoder.lock_encoder()?;
        Ok(ComputePass::new(encoder_id, encoder, desc))
    }

    /// End `pass` and unlock its encoder.
    pub fn compute_pass_end(&self, mut pass: ComputePass) -> Result<(), CommandEncoderError> {
        profiling::scope!("ComputePass::end");
        api_log!("ComputePass::end {:?}", pass.base.label);

        let encoder = self.get_encoder(pass.parent_id)?;
        pass.ended = true;
        encoder.unlock_encoder()?;

        let mut strings = StringCursor::new(&pass.base.string_data);
        for command in pass.base.commands.iter() {
            match *command {
                ComputeCommand::PushDebugGroup { len }
                | ComputeCommand::InsertDebugMarker { len } => {
                    log::trace!("Compute pass debug label {:?}", strings.next(len));
                }
                _ => {}
            }
        }
        log::trace!(
            "Compute pass {:?} dropped {} dispatch(es)",
            pass.base.label,
            pass.dispatch_count()
        );
        Ok(())
    }
}
