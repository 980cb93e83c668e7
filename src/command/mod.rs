mod bundle;
mod compute;
mod query;
mod render;
mod transfer;

use std::sync::Arc;

pub use self::bundle::*;
pub use self::compute::*;
pub use self::render::*;
pub use self::transfer::*;

use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    api_log,
    error::InvalidResourceError,
    global::Global,
    id::{self, CommandBufferId, DeviceId},
    resource::{impl_labeled, impl_parent_device, impl_resource_type, impl_storage_item},
    Label, LabelHelpers as _,
};

pub type CommandEncoderDescriptor<'a> = wgt::CommandEncoderDescriptor<Label<'a>>;
pub type CommandBufferDescriptor<'a> = wgt::CommandBufferDescriptor<Label<'a>>;

/// The state of a [`CommandEncoder`].
///
/// `Recording → Locked → Recording → … → Finished`. An encoder is `Locked`
/// while a render or compute pass begun on it is open, and accepts no other
/// commands until that pass ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandEncoderStatus {
    Recording,
    Locked,
    Finished,
}

#[derive(Debug)]
pub struct CommandEncoder {
    pub(crate) device: DeviceId,
    pub(crate) status: Mutex<CommandEncoderStatus>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl CommandEncoder {
    pub(crate) fn new(device: DeviceId, desc: &CommandEncoderDescriptor) -> Self {
        Self {
            device,
            status: Mutex::new(CommandEncoderStatus::Recording),
            label: desc.label.to_owned_or_default(),
        }
    }

    pub fn status(&self) -> CommandEncoderStatus {
        *self.status.lock()
    }

    /// Check that the encoder accepts a new command.
    pub(crate) fn check_recording(&self) -> Result<(), CommandEncoderError> {
        match *self.status.lock() {
            CommandEncoderStatus::Recording => Ok(()),
            CommandEncoderStatus::Locked => Err(CommandEncoderError::Locked),
            CommandEncoderStatus::Finished => Err(CommandEncoderError::NotRecording),
        }
    }

    /// Lock the encoder for the duration of a pass.
    pub(crate) fn lock_encoder(&self) -> Result<(), CommandEncoderError> {
        let mut status = self.status.lock();
        match *status {
            CommandEncoderStatus::Recording => {
                *status = CommandEncoderStatus::Locked;
                Ok(())
            }
            CommandEncoderStatus::Locked => Err(CommandEncoderError::Locked),
            CommandEncoderStatus::Finished => Err(CommandEncoderError::NotRecording),
        }
    }

    /// Unlock the encoder once its pass has ended.
    pub(crate) fn unlock_encoder(&self) -> Result<(), CommandEncoderError> {
        let mut status = self.status.lock();
        match *status {
            CommandEncoderStatus::Locked => {
                *status = CommandEncoderStatus::Recording;
                Ok(())
            }
            CommandEncoderStatus::Recording => Err(CommandEncoderError::NotLocked),
            CommandEncoderStatus::Finished => Err(CommandEncoderError::NotRecording),
        }
    }

    /// Unlock the encoder of a pass that was dropped without being ended.
    ///
    /// Nothing the pass recorded is committed.
    pub(crate) fn abandon_pass(&self, kind: &str, label: Option<&str>) {
        log::debug!("{kind} pass {label:?} dropped without being ended, nothing committed");
        if let Err(err) = self.unlock_encoder() {
            log::warn!("Cannot unlock the encoder of dropped {kind} pass {label:?}: {err}");
        }
    }

    fn finish(&self) -> Result<(), CommandEncoderError> {
        let mut status = self.status.lock();
        match *status {
            CommandEncoderStatus::Recording => {
                *status = CommandEncoderStatus::Finished;
                Ok(())
            }
            CommandEncoderStatus::Locked => Err(CommandEncoderError::Locked),
            CommandEncoderStatus::Finished => Err(CommandEncoderError::NotRecording),
        }
    }
}

impl_resource_type!(CommandEncoder);
impl_labeled!(CommandEncoder);
impl_parent_device!(CommandEncoder);
impl_storage_item!(CommandEncoder);

/// A finished command encoder, waiting to be submitted.
#[derive(Debug)]
pub struct CommandBuffer {
    pub(crate) device: DeviceId,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl_resource_type!(CommandBuffer);
impl_labeled!(CommandBuffer);
impl_parent_device!(CommandBuffer);
impl_storage_item!(CommandBuffer);

/// A stream of commands for a render pass, compute pass or render bundle.
///
/// This also contains the string data referred to by debug commands, like
/// [`RenderCommand::InsertDebugMarker`].
#[doc(hidden)]
#[derive(Debug)]
pub struct BasePass<C> {
    pub label: Option<String>,

    /// The stream of commands.
    pub commands: Vec<C>,

    /// Strings used by debug instructions.
    ///
    /// Each successive `PushDebugGroup` or `InsertDebugMarker`
    /// instruction consumes the next `len` bytes from this vector.
    pub string_data: Vec<u8>,
}

impl<C> BasePass<C> {
    fn new(label: &Label) -> Self {
        Self {
            label: label.as_ref().map(|cow| cow.to_string()),
            commands: Vec::new(),
            string_data: Vec::new(),
        }
    }

    /// Append `label` to the string data and return its length.
    fn push_str(&mut self, label: &str) -> usize {
        self.string_data.extend_from_slice(label.as_bytes());
        label.len()
    }
}

/// Walks the string data of a [`BasePass`] while its commands are replayed.
struct StringCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> StringCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn next(&mut self, len: usize) -> std::borrow::Cow<'a, str> {
        let end = (self.offset + len).min(self.data.len());
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        String::from_utf8_lossy(bytes)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommandEncoderError {
    #[error(transparent)]
    InvalidResource(#[from] InvalidResourceError),
    #[error("Command encoder must be active")]
    NotRecording,
    #[error("Command encoder is locked by a previously created render/compute pass. Before recording any new commands, the pass must be ended.")]
    Locked,
    #[error("Command encoder has no open pass to end")]
    NotLocked,
}

impl Global {
    pub(crate) fn get_encoder(
        &self,
        encoder_id: id::CommandEncoderId,
    ) -> Result<Arc<CommandEncoder>, CommandEncoderError> {
        Ok(self.hub.command_encoders.get(encoder_id)?)
    }

    pub fn command_encoder_status(
        &self,
        encoder_id: id::CommandEncoderId,
    ) -> Result<CommandEncoderStatus, InvalidResourceError> {
        Ok(self.hub.command_encoders.get(encoder_id)?.status())
    }

    /// Finish recording, producing a command buffer ready for `queue_submit`.
    ///
    /// The encoder stays registered in the `Finished` state until it is
    /// dropped, so finishing it again reports [`CommandEncoderError::NotRecording`].
    pub fn command_encoder_finish(
        &self,
        encoder_id: id::CommandEncoderId,
        desc: &CommandBufferDescriptor,
    ) -> Result<CommandBufferId, CommandEncoderError> {
        profiling::scope!("CommandEncoder::finish");
        api_log!("CommandEncoder::finish {encoder_id:?}");

        let encoder = self.get_encoder(encoder_id)?;
        encoder.finish()?;
        log::trace!("Command buffer {:?}", encoder_id);

        let label = match desc.label {
            Some(ref label) => label.to_string(),
            None => encoder.label.clone(),
        };
        Ok(self.hub.command_buffers.register(CommandBuffer {
            device: encoder.device,
            label,
        }))
    }

    pub fn command_encoder_push_debug_group(
        &self,
        encoder_id: id::CommandEncoderId,
        label: &str,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::push_debug_group");
        api_log!("CommandEncoder::push_debug_group {label}");

        self.get_encoder(encoder_id)?.check_recording()
    }

    pub fn command_encoder_insert_debug_marker(
        &self,
        encoder_id: id::CommandEncoderId,
        label: &str,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::insert_debug_marker");
        api_log!("CommandEncoder::insert_debug_marker {label}");

        self.get_encoder(encoder_id)?.check_recording()
    }

    pub fn command_encoder_pop_debug_group(
        &self,
        encoder_id: id::CommandEncoderId,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::pop_debug_marker");
        api_log!("CommandEncoder::pop_debug_group");

        self.get_encoder(encoder_id)?.check_recording()
    }
}
