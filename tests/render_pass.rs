use std::borrow::Cow;

use wgpu_emu::{
    command::{
        CommandEncoderDescriptor, PassChannel, Rect, RenderBundleDescriptor,
        RenderBundleEncoderDescriptor, RenderEncoder as _, RenderPassColorAttachment,
        RenderPassDescriptor,
    },
    id::{CommandEncoderId, TextureViewId},
    instance::InstanceFlags,
    pipeline::{
        ProgrammableStageDescriptor, RenderPipelineDescriptor, VertexBufferLayout, VertexState,
    },
    resource::{TextureDescriptor, TextureViewDescriptor},
};

use crate::common::{initialize_test, TestParameters, TestingContext};

fn create_encoder(ctx: &TestingContext) -> CommandEncoderId {
    ctx.global
        .device_create_command_encoder(ctx.device, &CommandEncoderDescriptor::default())
        .unwrap()
}

fn create_target(ctx: &TestingContext) -> TextureViewId {
    let texture = ctx
        .global
        .device_create_texture(
            ctx.device,
            &TextureDescriptor::new(
                [64, 64],
                wgt::TextureFormat::Bgra8Unorm,
                wgt::TextureUsages::RENDER_ATTACHMENT,
            ),
        )
        .unwrap();
    ctx.global
        .texture_create_view(texture, &TextureViewDescriptor::default())
        .unwrap()
}

fn color_attachment(view: TextureViewId) -> Option<RenderPassColorAttachment> {
    Some(RenderPassColorAttachment {
        view,
        resolve_target: None,
        channel: PassChannel::default(),
    })
}

#[test]
fn draw_triangle() {
    initialize_test(TestParameters::default(), |ctx| {
        let vertices = ctx.create_buffer(12, wgt::BufferUsages::VERTEX);
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
        let pipeline = ctx
            .global
            .device_create_render_pipeline(
                ctx.device,
                &RenderPipelineDescriptor {
                    label: Some("triangle".into()),
                    layout: None,
                    vertex: VertexState {
                        stage: ProgrammableStageDescriptor {
                            module: ctx.create_shader_module(),
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
                },
            )
            .unwrap();
        assert_eq!(
            ctx.global.render_pipeline(pipeline).unwrap().vertex_steps()[0].last_stride,
            12
        );
        let encoder = create_encoder(ctx);

        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, vertices, 0, None);
        pass.draw(3, 1, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        let submissions = ctx.global.queue_submissions(ctx.queue).unwrap();
        assert_eq!(submissions.len(), 1);
        let (committed, state) = &submissions[0];
        assert_eq!(*committed, pipeline);
        assert_eq!(state.vertex_count, 3);
        assert_eq!(state.index_count, 0);
        assert_eq!(state.vertex_buffer(0), Some(vertices));
        assert_eq!(state.buffers.len(), 1);
    })
}

#[test]
fn same_pipeline_keeps_last_pass() {
    initialize_test(TestParameters::default(), |ctx| {
        let first = ctx.create_buffer(12, wgt::BufferUsages::VERTEX);
        let second = ctx.create_buffer(24, wgt::BufferUsages::VERTEX);
        let pipeline = ctx.create_render_pipeline("shared");
        let encoder = create_encoder(ctx);

        for (buffer, count) in [(first, 3), (second, 6)] {
            let mut pass = ctx
                .global
                .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
                .unwrap();
            pass.set_pipeline(pipeline);
            pass.set_vertex_buffer(0, buffer, 0, None);
            pass.draw(count, 1, 0, 0);
            ctx.global.render_pass_end(pass).unwrap();
        }

        let submissions = ctx.global.queue_submissions(ctx.queue).unwrap();
        assert_eq!(submissions.len(), 1);
        let state = ctx
            .global
            .queue_pipeline_state(ctx.queue, pipeline)
            .unwrap()
            .unwrap();
        assert_eq!(state.vertex_count, 6);
        assert_eq!(state.vertex_buffer(0), Some(second));

        let log = ctx.global.queue_pass_log(ctx.queue).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].state.vertex_count, 3);
        assert_eq!(log[1].state.vertex_count, 6);
    })
}

#[test]
fn distinct_pipelines_get_distinct_entries() {
    initialize_test(TestParameters::default(), |ctx| {
        let opaque = ctx.create_render_pipeline("opaque");
        let transparent = ctx.create_render_pipeline("transparent");
        let indices = ctx.create_buffer(72, wgt::BufferUsages::INDEX);
        let encoder = create_encoder(ctx);

        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.set_pipeline(opaque);
        pass.draw(3, 1, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.set_pipeline(transparent);
        pass.set_index_buffer(indices, wgt::IndexFormat::Uint16, 0, None);
        pass.draw_indexed(36, 1, 0, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        let submissions = ctx.global.queue_submissions(ctx.queue).unwrap();
        let pipelines = submissions.iter().map(|&(id, _)| id).collect::<Vec<_>>();
        assert_eq!(pipelines, vec![opaque, transparent]);

        let state = &submissions[1].1;
        assert_eq!(state.index_buffer(), Some(indices));
        assert_eq!(state.index_count, 36);
    })
}

#[test]
fn only_last_pipeline_in_a_pass_is_committed() {
    initialize_test(TestParameters::default(), |ctx| {
        let shadow = ctx.create_render_pipeline("shadow");
        let main = ctx.create_render_pipeline("main");
        let encoder = create_encoder(ctx);

        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.set_pipeline(shadow);
        pass.draw(6, 1, 0, 0);
        pass.set_pipeline(main);
        pass.draw(3, 1, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        assert_eq!(ctx.global.queue_pipeline_state(ctx.queue, shadow).unwrap(), None);
        let state = ctx
            .global
            .queue_pipeline_state(ctx.queue, main)
            .unwrap()
            .unwrap();
        assert_eq!(state.vertex_count, 3);
    })
}

#[test]
fn pass_without_pipeline_commits_nothing() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(12, wgt::BufferUsages::VERTEX);
        let encoder = create_encoder(ctx);

        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.set_vertex_buffer(0, buffer, 0, None);
        pass.draw(3, 1, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        assert!(ctx.global.queue_submissions(ctx.queue).unwrap().is_empty());
        assert!(ctx.global.queue_pass_log(ctx.queue).unwrap().is_empty());
    })
}

#[test]
fn pass_log_records_attachments_and_viewport() {
    initialize_test(TestParameters::default(), |ctx| {
        let pipeline = ctx.create_render_pipeline("lit");
        let target = create_target(ctx);
        let encoder = create_encoder(ctx);

        let attachments = [color_attachment(target), None];
        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(
                encoder,
                &RenderPassDescriptor {
                    label: Some("frame".into()),
                    color_attachments: Cow::Borrowed(&attachments),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(pass.label(), Some("frame"));
        assert_eq!(pass.color_attachments().len(), 2);
        pass.set_pipeline(pipeline);
        pass.set_viewport(0.0, 0.0, 64.0, 64.0, 0.0, 1.0);
        pass.set_scissor_rect(8, 8, 48, 48);
        pass.draw(3, 1, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        let log = ctx.global.queue_pass_log(ctx.queue).unwrap();
        assert_eq!(log.len(), 1);
        let commit = &log[0];
        assert_eq!(commit.pipeline, pipeline);
        assert_eq!(commit.label.as_deref(), Some("frame"));
        assert_eq!(commit.color_targets.as_slice(), &[target]);
        assert_eq!(commit.viewport.map(|v| v.rect.w), Some(64.0));
        assert_eq!(
            commit.scissor,
            Some(Rect {
                x: 8,
                y: 8,
                w: 48,
                h: 48,
            })
        );
    })
}

#[test]
fn pass_log_can_be_disabled() {
    initialize_test(
        TestParameters::default().flags(InstanceFlags::empty()),
        |ctx| {
            let pipeline = ctx.create_render_pipeline("quiet");
            let encoder = create_encoder(ctx);

            let mut pass = ctx
                .global
                .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
                .unwrap();
            pass.set_pipeline(pipeline);
            pass.draw(3, 1, 0, 0);
            ctx.global.render_pass_end(pass).unwrap();

            assert_eq!(ctx.global.queue_submissions(ctx.queue).unwrap().len(), 1);
            assert!(ctx.global.queue_pass_log(ctx.queue).unwrap().is_empty());
        },
    )
}

#[test]
fn bind_groups_are_committed() {
    initialize_test(TestParameters::default(), |ctx| {
        let uniforms = ctx.create_buffer(64, wgt::BufferUsages::UNIFORM);
        let layout = ctx
            .global
            .device_create_bind_group_layout(
                ctx.device,
                &wgpu_emu::binding_model::BindGroupLayoutDescriptor {
                    label: None,
                    entries: Cow::Owned(vec![wgt::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgt::ShaderStages::VERTEX,
                        ty: wgt::BindingType::Buffer {
                            ty: wgt::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }]),
                },
            )
            .unwrap();
        let bind_group = ctx
            .global
            .device_create_bind_group(
                ctx.device,
                &wgpu_emu::binding_model::BindGroupDescriptor {
                    label: Some("camera".into()),
                    layout,
                    entries: Cow::Owned(vec![wgpu_emu::binding_model::BindGroupEntry {
                        binding: 0,
                        resource: wgpu_emu::binding_model::BindingResource::Buffer(
                            wgpu_emu::binding_model::BufferBinding {
                                buffer_id: uniforms,
                                offset: 0,
                                size: None,
                            },
                        ),
                    }]),
                },
            )
            .unwrap();
        let pipeline = ctx.create_render_pipeline("camera");
        let encoder = create_encoder(ctx);

        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[256]);
        pass.draw(3, 1, 0, 0);
        ctx.global.render_pass_end(pass).unwrap();

        let state = ctx
            .global
            .queue_pipeline_state(ctx.queue, pipeline)
            .unwrap()
            .unwrap();
        assert_eq!(state.bind_group(0), Some(bind_group));
        assert_eq!(state.bind_group(1), None);
    })
}

#[test]
fn bundles_have_no_effect() {
    initialize_test(TestParameters::default(), |ctx| {
        let pipeline = ctx.create_render_pipeline("bundled");
        let buffer = ctx.create_buffer(12, wgt::BufferUsages::VERTEX);

        let mut bundle_encoder = ctx
            .global
            .device_create_render_bundle_encoder(
                ctx.device,
                &RenderBundleEncoderDescriptor {
                    label: Some("static geometry".into()),
                    color_formats: Cow::Borrowed(&[Some(wgt::TextureFormat::Bgra8Unorm)]),
                    ..Default::default()
                },
            )
            .unwrap();
        bundle_encoder.set_pipeline(pipeline);
        bundle_encoder.set_vertex_buffer(0, buffer, 0, None);
        bundle_encoder.draw(3, 1, 0, 0);
        let bundle = ctx
            .global
            .render_bundle_encoder_finish(bundle_encoder, &RenderBundleDescriptor::default())
            .unwrap();

        let resource = ctx.global.render_bundle(bundle).unwrap();
        assert_eq!(resource.command_count(), 3);
        assert_eq!(resource.sample_count(), 1);
        assert_eq!(
            resource.color_formats(),
            &[Some(wgt::TextureFormat::Bgra8Unorm)]
        );

        let encoder = create_encoder(ctx);
        let mut pass = ctx
            .global
            .command_encoder_begin_render_pass(encoder, &RenderPassDescriptor::default())
            .unwrap();
        pass.execute_bundles(&[bundle]);
        ctx.global.render_pass_end(pass).unwrap();

        assert!(ctx.global.queue_submissions(ctx.queue).unwrap().is_empty());

        ctx.global.render_bundle_drop(bundle);
        assert!(ctx.global.render_bundle(bundle).is_err());
    })
}
