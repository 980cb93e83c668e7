use std::borrow::Cow;

use crate::{
    id::{DeviceId, PipelineLayoutId, ShaderModuleId},
    resource::{impl_labeled, impl_parent_device, impl_resource_type, impl_storage_item},
    Label, LabelHelpers as _,
};

#[derive(Clone, Debug)]
pub struct ShaderModuleDescriptor<'a> {
    pub label: Label<'a>,
    /// WGSL source. Kept for inspection, never parsed.
    pub code: Cow<'a, str>,
}

#[derive(Debug)]
pub struct ShaderModule {
    pub(crate) device: DeviceId,
    pub(crate) code: String,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl ShaderModule {
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl_resource_type!(ShaderModule);
impl_labeled!(ShaderModule);
impl_parent_device!(ShaderModule);
impl_storage_item!(ShaderModule);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompilationMessageType {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationMessage {
    pub message: String,
    pub message_type: CompilationMessageType,
    pub line_num: u64,
    pub line_pos: u64,
    pub offset: u64,
    pub length: u64,
}

/// Result of `shader_module_compilation_info`.
///
/// Shaders are never compiled, so this is always empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilationInfo {
    pub messages: Vec<CompilationMessage>,
}

/// Describes a programmable pipeline stage.
#[derive(Clone, Debug)]
pub struct ProgrammableStageDescriptor<'a> {
    /// The compiled shader module for this stage.
    pub module: ShaderModuleId,
    /// The name of the entry point in the compiled shader. `None` selects
    /// the module's only entry point for this stage.
    pub entry_point: Option<Cow<'a, str>>,
}

/// Describes a compute pipeline.
#[derive(Clone, Debug)]
pub struct ComputePipelineDescriptor<'a> {
    pub label: Label<'a>,
    /// The layout of bind groups for this pipeline, or `None` for an implicit one.
    pub layout: Option<PipelineLayoutId>,
    /// The compiled compute stage and its entry point.
    pub stage: ProgrammableStageDescriptor<'a>,
}

#[derive(Debug)]
pub struct ComputePipeline {
    pub(crate) device: DeviceId,
    pub(crate) layout: Option<PipelineLayoutId>,
    pub(crate) module: ShaderModuleId,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl ComputePipeline {
    pub fn layout(&self) -> Option<PipelineLayoutId> {
        self.layout
    }

    pub fn module(&self) -> ShaderModuleId {
        self.module
    }
}

impl_resource_type!(ComputePipeline);
impl_labeled!(ComputePipeline);
impl_parent_device!(ComputePipeline);
impl_storage_item!(ComputePipeline);

/// Describes how the vertex buffer is interpreted.
#[derive(Clone, Debug)]
pub struct VertexBufferLayout<'a> {
    /// The stride, in bytes, between elements of this buffer.
    pub array_stride: wgt::BufferAddress,
    /// How often this vertex buffer is "stepped" forward.
    pub step_mode: wgt::VertexStepMode,
    /// The list of attributes which comprise a single vertex.
    pub attributes: Cow<'a, [wgt::VertexAttribute]>,
}

/// Describes the vertex process in a render pipeline.
#[derive(Clone, Debug)]
pub struct VertexState<'a> {
    /// The compiled vertex stage and its entry point.
    pub stage: ProgrammableStageDescriptor<'a>,
    /// The format of any vertex buffers used with this pipeline.
    pub buffers: Cow<'a, [VertexBufferLayout<'a>]>,
}

/// Describes fragment processing in a render pipeline.
#[derive(Clone, Debug)]
pub struct FragmentState<'a> {
    /// The compiled fragment stage and its entry point.
    pub stage: ProgrammableStageDescriptor<'a>,
    /// The effect of draw calls on the color aspect of the output target.
    pub targets: Cow<'a, [Option<wgt::ColorTargetState>]>,
}

/// Describes a render (graphics) pipeline.
#[derive(Clone, Debug)]
pub struct RenderPipelineDescriptor<'a> {
    pub label: Label<'a>,
    /// The layout of bind groups for this pipeline, or `None` for an implicit one.
    pub layout: Option<PipelineLayoutId>,
    /// The vertex processing state for this pipeline.
    pub vertex: VertexState<'a>,
    /// The properties of the pipeline at the primitive assembly and rasterization level.
    pub primitive: wgt::PrimitiveState,
    /// The effect of draw calls on the depth and stencil aspects of the output target, if any.
    pub depth_stencil: Option<wgt::DepthStencilState>,
    /// The multi-sampling properties of the pipeline.
    pub multisample: wgt::MultisampleState,
    /// The fragment processing state for this pipeline.
    pub fragment: Option<FragmentState<'a>>,
}

/// Per-buffer vertex step, as seen by draw calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexStep {
    /// The byte stride in the buffer between one attribute value and the next.
    pub stride: wgt::BufferAddress,
    /// The byte size required to fit the last vertex in the stream.
    pub last_stride: wgt::BufferAddress,
    /// Whether the buffer is indexed by vertex number or instance number.
    pub mode: wgt::VertexStepMode,
}

#[derive(Debug)]
pub struct RenderPipeline {
    pub(crate) device: DeviceId,
    pub(crate) layout: Option<PipelineLayoutId>,
    pub(crate) topology: wgt::PrimitiveTopology,
    pub(crate) vertex_steps: Vec<VertexStep>,
    pub(crate) color_targets: Vec<Option<wgt::ColorTargetState>>,
    /// The `label` from the descriptor used to create the resource.
    pub(crate) label: String,
}

impl RenderPipeline {
    pub(crate) fn new(device: DeviceId, desc: &RenderPipelineDescriptor) -> Self {
        let vertex_steps = desc
            .vertex
            .buffers
            .iter()
            .map(|vb| {
                let last_stride = vb
                    .attributes
                    .iter()
                    .map(|attr| attr.offset + attr.format.size())
                    .max()
                    .unwrap_or(0);
                VertexStep {
                    stride: vb.array_stride,
                    last_stride,
                    mode: vb.step_mode,
                }
            })
            .collect();
        Self {
            device,
            layout: desc.layout,
            topology: desc.primitive.topology,
            vertex_steps,
            color_targets: desc
                .fragment
                .as_ref()
                .map(|fragment| fragment.targets.to_vec())
                .unwrap_or_default(),
            label: desc.label.to_owned_or_default(),
        }
    }

    pub fn layout(&self) -> Option<PipelineLayoutId> {
        self.layout
    }

    pub fn topology(&self) -> wgt::PrimitiveTopology {
        self.topology
    }

    pub fn vertex_steps(&self) -> &[VertexStep] {
        &self.vertex_steps
    }

    pub fn color_targets(&self) -> &[Option<wgt::ColorTargetState>] {
        &self.color_targets
    }
}

impl_resource_type!(RenderPipeline);
impl_labeled!(RenderPipeline);
impl_parent_device!(RenderPipeline);
impl_storage_item!(RenderPipeline);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;

    #[test]
    fn vertex_steps_from_layout() {
        let attributes = [
            wgt::VertexAttribute {
                format: wgt::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            },
            wgt::VertexAttribute {
                format: wgt::VertexFormat::Float32,
                offset: 8,
                shader_location: 1,
            },
        ];
        let desc = RenderPipelineDescriptor {
            label: Some("tri".into()),
            layout: None,
            vertex: VertexState {
                stage: ProgrammableStageDescriptor {
                    module: Id::zip(0, 1),
                    entry_point: Some("vs_main".into()),
                },
                buffers: Cow::Owned(vec![VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgt::VertexStepMode::Vertex,
                    attributes: Cow::Borrowed(&attributes),
                }]),
            },
            primitive: wgt::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgt::MultisampleState::default(),
            fragment: None,
        };

        let pipeline = RenderPipeline::new(Id::zip(0, 1), &desc);
        assert_eq!(
            pipeline.vertex_steps(),
            &[VertexStep {
                stride: 12,
                last_stride: 12,
                mode: wgt::VertexStepMode::Vertex,
            }]
        );
        assert_eq!(pipeline.topology(), wgt::PrimitiveTopology::TriangleList);
        assert!(pipeline.color_targets().is_empty());
    }
}
