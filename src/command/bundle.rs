/*! Render bundles.

A render bundle encoder records the same draw commands as a render pass,
through the shared [`RenderEncoder`] trait, but nothing it records reaches
the queue. Executing a finished bundle inside a render pass is accepted with
no observable effect.
!*/

use std::borrow::Cow;

use crate::{
    api_log,
    command::{BasePass, RenderCommand, RenderEncoder},
    error::InvalidResourceError,
    global::Global,
    id::{self, DeviceId},
    resource::{impl_labeled, impl_parent_device, impl_resource_type, impl_storage_item},
    Label,
};

/// Describes a [`RenderBundleEncoder`].
#[derive(Clone, Debug, Default)]
pub struct RenderBundleEncoderDescriptor<'a> {
    /// Debug label of the render bundle encoder.
    pub label: Label<'a>,
    /// The formats of the color attachments that this render bundle is capable
    /// to rendering to.
    pub color_formats: Cow<'a, [Option<wgt::TextureFormat>]>,
    /// Information about the depth attachment that this render bundle is
    /// capable to rendering to.
    pub depth_stencil: Option<wgt::RenderBundleDepthStencil>,
    /// Sample count this render bundle is capable of rendering to. Defaults to 1.
    pub sample_count: Option<u32>,
}

pub type RenderBundleDescriptor<'a> = wgt::RenderBundleDescriptor<Label<'a>>;

#[must_use = "a render bundle encoder does nothing until finished"]
#[derive(Debug)]
pub struct RenderBundleEncoder {
    base: BasePass<RenderCommand>,
    parent_id: DeviceId,
    color_formats: Vec<Option<wgt::TextureFormat>>,
    depth_stencil: Option<wgt::RenderBundleDepthStencil>,
    sample_count: u32,
}

impl RenderBundleEncoder {
    fn new(parent_id: DeviceId, desc: &RenderBundleEncoderDescriptor) -> Self {
        Self {
            base: BasePass::new(&desc.label),
            parent_id,
            color_formats: desc.color_formats.to_vec(),
            depth_stencil: desc.depth_stencil,
            sample_count: desc.sample_count.unwrap_or(1),
        }
    }

    pub fn parent(&self) -> DeviceId {
        self.parent_id
    }
}

impl RenderEncoder for RenderBundleEncoder {
    fn base_mut(&mut self) -> &mut BasePass<RenderCommand> {
        &mut self.base
    }
}

#[derive(Debug)]
pub struct RenderBundle {
    pub(crate) device: DeviceId,
    pub(crate) color_formats: Vec<Option<wgt::TextureFormat>>,
    pub(crate) depth_stencil: Option<wgt::RenderBundleDepthStencil>,
    pub(crate) sample_count: u32,
    pub(crate) command_count: usize,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl RenderBundle {
    pub fn color_formats(&self) -> &[Option<wgt::TextureFormat>] {
        &self.color_formats
    }

    pub fn depth_stencil(&self) -> Option<wgt::RenderBundleDepthStencil> {
        self.depth_stencil
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Number of commands recorded by the encoder that produced this bundle.
    pub fn command_count(&self) -> usize {
        self.command_count
    }
}

impl_resource_type!(RenderBundle);
impl_labeled!(RenderBundle);
impl_parent_device!(RenderBundle);
impl_storage_item!(RenderBundle);

impl Global {
    pub fn device_create_render_bundle_encoder(
        &self,
        device_id: DeviceId,
        desc: &RenderBundleEncoderDescriptor,
    ) -> Result<RenderBundleEncoder, InvalidResourceError> {
        profiling::scope!("Device::create_render_bundle_encoder");
        api_log!("Device::create_render_bundle_encoder {device_id:?} {:?}", desc.label);

        self.hub.devices.get(device_id)?;
        Ok(RenderBundleEncoder::new(device_id, desc))
    }

    pub fn render_bundle_encoder_finish(
        &self,
        bundle_encoder: RenderBundleEncoder,
        desc: &RenderBundleDescriptor,
    ) -> Result<id::RenderBundleId, InvalidResourceError> {
        profiling::scope!("RenderBundleEncoder::finish");
        api_log!("RenderBundleEncoder::finish {:?}", bundle_encoder.base.label);

        self.hub.devices.get(bundle_encoder.parent_id)?;

        let label = match desc.label {
            Some(ref label) => label.to_string(),
            None => bundle_encoder.base.label.unwrap_or_default(),
        };
        Ok(self.hub.render_bundles.register(RenderBundle {
            device: bundle_encoder.parent_id,
            color_formats: bundle_encoder.color_formats,
            depth_stencil: bundle_encoder.depth_stencil,
            sample_count: bundle_encoder.sample_count,
            command_count: bundle_encoder.base.commands.len(),
            label,
        }))
    }

    pub fn render_bundle_drop(&self, render_bundle_id: id::RenderBundleId) {
        profiling::scope!("RenderBundle::drop");
        api_log!("RenderBundle::drop {render_bundle_id:?}");

        self.hub.render_bundles.unregister(render_bundle_id);
    }
}
