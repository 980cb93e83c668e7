use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    api_log,
    device::{queue::Queue, Device, DeviceDescriptor, SupportedLimits},
    error::InvalidResourceError,
    global::Global,
    id::{AdapterId, DeviceId, QueueId, SurfaceId},
    resource::{impl_resource_type, impl_storage_item},
    LabelHelpers as _,
};

pub type RequestAdapterOptions = wgt::RequestAdapterOptions<SurfaceId>;

bitflags::bitflags! {
    /// Instance debugging flags.
    ///
    /// These are not part of the WebGPU standard.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InstanceFlags: u32 {
        /// When the [`Global`] is dropped, log every resource the caller
        /// never destroyed.
        const DEBUG = 1 << 0;
        /// Keep one record per ended render pass on the queue, in addition
        /// to the per-pipeline state.
        const RECORD_PASS_LOG = 1 << 1;
    }
}

impl Default for InstanceFlags {
    fn default() -> Self {
        Self::RECORD_PASS_LOG
    }
}

impl InstanceFlags {
    /// Enable recommended debugging and validation flags.
    #[must_use]
    pub fn debugging() -> Self {
        Self::DEBUG | Self::RECORD_PASS_LOG
    }

    /// Infer good defaults from the build type.
    ///
    /// Returns the default flags and add debugging flags if the build
    /// configuration has `debug_assertions`.
    #[must_use]
    pub fn from_build_config() -> Self {
        if cfg!(debug_assertions) {
            return Self::debugging();
        }

        Self::default()
    }

    /// Returns this set of flags, affected by environment variables.
    ///
    /// The presence of an environment variable implies that the corresponding
    /// flag should be set unless the value is "0" in which case the flag is
    /// unset. If the environment variable is not present, then the flag
    /// is unaffected.
    ///
    /// * `WGPU_EMU_DEBUG`
    /// * `WGPU_EMU_PASS_LOG`
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(bit) = env_flag("WGPU_EMU_DEBUG") {
            self.set(Self::DEBUG, bit);
        }
        if let Some(bit) = env_flag("WGPU_EMU_PASS_LOG") {
            self.set(Self::RECORD_PASS_LOG, bit);
        }
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|value| parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    value.trim() != "0"
}

/// Options passed to [`Global::new`].
#[derive(Clone, Debug)]
pub struct InstanceDescriptor {
    /// Name reported in logs.
    pub name: String,
    /// What `get_preferred_canvas_format` returns, and the format of
    /// surfaces that were never configured.
    pub preferred_canvas_format: wgt::TextureFormat,
    pub flags: InstanceFlags,
}

impl Default for InstanceDescriptor {
    fn default() -> Self {
        Self {
            name: "wgpu-emu".to_string(),
            preferred_canvas_format: wgt::TextureFormat::Bgra8Unorm,
            flags: InstanceFlags::default(),
        }
    }
}

#[derive(Debug)]
pub struct Instance {
    pub name: String,
    pub preferred_canvas_format: wgt::TextureFormat,
    pub flags: InstanceFlags,
}

impl Instance {
    pub fn new(desc: &InstanceDescriptor) -> Self {
        log::debug!("Instance {:?} with flags {:?}", desc.name, desc.flags);
        Self {
            name: desc.name.clone(),
            preferred_canvas_format: desc.preferred_canvas_format,
            flags: desc.flags,
        }
    }
}

/// What `adapter_request_info` resolves to. Every field is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AdapterInfo {
    pub vendor: String,
    pub architecture: String,
    pub device: String,
    pub description: String,
}

#[derive(Debug)]
pub struct Adapter {
    pub(crate) features: wgt::Features,
    pub(crate) limits: SupportedLimits,
    pub(crate) info: AdapterInfo,
}

impl Adapter {
    fn new() -> Self {
        Self {
            features: wgt::Features::empty(),
            limits: SupportedLimits::default(),
            info: AdapterInfo::default(),
        }
    }

    /// The emulated adapter is the only one there is; it is never a fallback.
    pub fn is_fallback_adapter(&self) -> bool {
        false
    }

    pub fn features(&self) -> wgt::Features {
        self.features
    }

    pub fn limits(&self) -> &SupportedLimits {
        &self.limits
    }
}

impl_resource_type!(Adapter);
impl_storage_item!(Adapter);

impl Global {
    /// Resolve to a new adapter.
    ///
    /// Power preference and fallback requests are ignored. A compatible
    /// surface, if given, must be live.
    pub async fn request_adapter(
        &self,
        options: &RequestAdapterOptions,
    ) -> Result<AdapterId, InvalidResourceError> {
        profiling::scope!("Instance::request_adapter");
        api_log!("Instance::request_adapter {options:?}");

        if let Some(surface_id) = options.compatible_surface {
            self.surfaces.get(surface_id)?;
        }
        Ok(self.hub.adapters.register(Adapter::new()))
    }

    pub fn get_preferred_canvas_format(&self) -> wgt::TextureFormat {
        self.instance.preferred_canvas_format
    }

    /// Resolve to a new device and its queue.
    ///
    /// The requested features and limits are not negotiated: the device
    /// reports the same empty features and zero limits as its adapter.
    pub async fn adapter_request_device(
        &self,
        adapter_id: AdapterId,
        desc: &DeviceDescriptor<'_>,
    ) -> Result<(DeviceId, QueueId), InvalidResourceError> {
        profiling::scope!("Adapter::request_device");
        api_log!("Adapter::request_device {adapter_id:?} {:?}", desc.label);

        let adapter = self.hub.adapters.get(adapter_id)?;
        if !desc.required_features.is_empty() {
            log::debug!(
                "Ignoring required features {:?}; the emulated device has none",
                desc.required_features
            );
        }

        let fid = self.hub.devices.prepare();
        let device_id = fid.id();
        let queue_id = self.hub.queues.register(Queue::new(
            device_id,
            desc.default_queue.label.to_owned_or_default(),
        ));
        let device = Device {
            adapter: adapter_id,
            queue_id,
            features: adapter.features,
            limits: adapter.limits.clone(),
            error_scopes: Mutex::new(Vec::new()),
            label: desc.label.to_owned_or_default(),
        };
        let device_id = fid.assign(Arc::new(device));
        log::debug!("Created {device_id:?} with {queue_id:?}");
        Ok((device_id, queue_id))
    }

    pub async fn adapter_request_info(
        &self,
        adapter_id: AdapterId,
    ) -> Result<AdapterInfo, InvalidResourceError> {
        api_log!("Adapter::request_info {adapter_id:?}");
        Ok(self.hub.adapters.get(adapter_id)?.info.clone())
    }

    pub fn adapter_is_fallback(&self, adapter_id: AdapterId) -> Result<bool, InvalidResourceError> {
        Ok(self.hub.adapters.get(adapter_id)?.is_fallback_adapter())
    }

    pub fn adapter_features(
        &self,
        adapter_id: AdapterId,
    ) -> Result<wgt::Features, InvalidResourceError> {
        Ok(self.hub.adapters.get(adapter_id)?.features())
    }

    pub fn adapter_limits(
        &self,
        adapter_id: AdapterId,
    ) -> Result<SupportedLimits, InvalidResourceError> {
        Ok(self.hub.adapters.get(adapter_id)?.limits.clone())
    }

    pub fn adapter_drop(&self, adapter_id: AdapterId) {
        profiling::scope!("Adapter::drop");
        api_log!("Adapter::drop {adapter_id:?}");

        self.hub.adapters.unregister(adapter_id);
    }
}
