//! Test utilities for the wgpu-emu repository.

use std::borrow::Cow;

use wgpu_emu::{
    device::DeviceDescriptor,
    global::Global,
    id::{AdapterId, BufferId, DeviceId, QueueId, RenderPipelineId, ShaderModuleId},
    instance::{InstanceDescriptor, InstanceFlags, RequestAdapterOptions},
    pipeline::{ProgrammableStageDescriptor, RenderPipelineDescriptor, ShaderModuleDescriptor, VertexState},
    resource::BufferDescriptor,
};

pub const TRIANGLE_WGSL: &str = "
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
";

/// Parameters and resources handed to a test function.
#[derive(Clone, Debug)]
pub struct TestParameters {
    pub flags: InstanceFlags,
    pub preferred_canvas_format: wgt::TextureFormat,
}

impl Default for TestParameters {
    fn default() -> Self {
        Self {
            flags: InstanceFlags::default(),
            preferred_canvas_format: wgt::TextureFormat::Bgra8Unorm,
        }
    }
}

impl TestParameters {
    pub fn flags(mut self, flags: InstanceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn preferred_canvas_format(mut self, format: wgt::TextureFormat) -> Self {
        self.preferred_canvas_format = format;
        self
    }
}

pub struct TestingContext {
    pub global: Global,
    pub adapter: AdapterId,
    pub device: DeviceId,
    pub queue: QueueId,
}

impl TestingContext {
    pub fn create_buffer(&self, size: u64, usage: wgt::BufferUsages) -> BufferId {
        self.global
            .device_create_buffer(
                self.device,
                &BufferDescriptor {
                    label: None,
                    size,
                    usage,
                    mapped_at_creation: false,
                },
            )
            .unwrap()
    }

    pub fn create_shader_module(&self) -> ShaderModuleId {
        self.global
            .device_create_shader_module(
                self.device,
                &ShaderModuleDescriptor {
                    label: Some("triangle".into()),
                    code: Cow::Borrowed(TRIANGLE_WGSL),
                },
            )
            .unwrap()
    }

    /// A render pipeline with no vertex buffer layouts and no fragment stage.
    pub fn create_render_pipeline(&self, label: &str) -> RenderPipelineId {
        let module = self.create_shader_module();
        self.global
            .device_create_render_pipeline(
                self.device,
                &RenderPipelineDescriptor {
                    label: Some(label.into()),
                    layout: None,
                    vertex: VertexState {
                        stage: ProgrammableStageDescriptor {
                            module,
                            entry_point: Some("vs_main".into()),
                        },
                        buffers: Cow::Borrowed(&[]),
                    },
                    primitive: wgt::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgt::MultisampleState::default(),
                    fragment: None,
                },
            )
            .unwrap()
    }
}

pub fn initialize_test(parameters: TestParameters, test_function: impl FnOnce(&TestingContext)) {
    // We don't actually care if it fails
    let _ = env_logger::try_init();

    let global = Global::new(&InstanceDescriptor {
        name: "wgpu-emu-test".to_string(),
        preferred_canvas_format: parameters.preferred_canvas_format,
        flags: parameters.flags,
    });

    let adapter = pollster::block_on(global.request_adapter(&RequestAdapterOptions::default()))
        .expect("Adapter request failed");
    let (device, queue) = pollster::block_on(
        global.adapter_request_device(adapter, &DeviceDescriptor::default()),
    )
    .expect("Device request failed");

    let context = TestingContext {
        global,
        adapter,
        device,
        queue,
    };

    test_function(&context);
}
