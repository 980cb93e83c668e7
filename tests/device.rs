use std::{borrow::Cow, sync::Arc};

use wgpu_emu::{
    device::{DeviceDescriptor, DeviceLostReason, SupportedLimits},
    error::ErrorFilter,
    global::Global,
    instance::{AdapterInfo, InstanceDescriptor, RequestAdapterOptions},
    memory::{ExternalImageSource, ImageBitmap},
    pipeline::{CompilationInfo, ComputePipelineDescriptor, ProgrammableStageDescriptor},
    resource::ExternalTextureDescriptor,
};

use crate::common::{initialize_test, TestParameters};

#[test]
fn adapter_reports_nothing() {
    initialize_test(TestParameters::default(), |ctx| {
        let info = pollster::block_on(ctx.global.adapter_request_info(ctx.adapter)).unwrap();
        assert_eq!(info, AdapterInfo::default());
        assert!(info.vendor.is_empty());
        assert_eq!(ctx.global.adapter_is_fallback(ctx.adapter), Ok(false));
        assert_eq!(ctx.global.adapter_features(ctx.adapter), Ok(wgt::Features::empty()));
        assert_eq!(ctx.global.adapter_limits(ctx.adapter), Ok(SupportedLimits::default()));
    })
}

#[test]
fn device_reports_no_capabilities() {
    initialize_test(TestParameters::default(), |ctx| {
        let limits = ctx.global.device_limits(ctx.device).unwrap();
        assert_eq!(limits, SupportedLimits::default());
        assert_eq!(limits.max_bind_groups, 0);
        assert_eq!(ctx.global.device_features(ctx.device), Ok(wgt::Features::empty()));

        let device = ctx.global.device(ctx.device).unwrap();
        assert_eq!(device.adapter(), ctx.adapter);
        assert_eq!(device.queue(), ctx.queue);
    })
}

#[test]
fn required_features_are_ignored() {
    initialize_test(TestParameters::default(), |ctx| {
        let (device, _queue) = pollster::block_on(ctx.global.adapter_request_device(
            ctx.adapter,
            &DeviceDescriptor {
                label: Some("demanding".into()),
                required_features: wgt::Features::DEPTH_CLIP_CONTROL,
                ..Default::default()
            },
        ))
        .unwrap();
        assert_eq!(ctx.global.device_features(device), Ok(wgt::Features::empty()));
    })
}

#[test]
fn lost_reason_follows_liveness() {
    initialize_test(TestParameters::default(), |ctx| {
        let info = pollster::block_on(ctx.global.device_lost(ctx.device));
        assert_eq!(info.reason, DeviceLostReason::Unknown);
        assert!(info.message.is_empty());

        ctx.global.device_destroy(ctx.device);
        let info = pollster::block_on(ctx.global.device_lost(ctx.device));
        assert_eq!(info.reason, DeviceLostReason::Destroyed);
    })
}

#[test]
fn destroy_removes_device_and_queue() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(4, wgt::BufferUsages::UNIFORM);
        let (second, second_queue) = pollster::block_on(
            ctx.global
                .adapter_request_device(ctx.adapter, &DeviceDescriptor::default()),
        )
        .unwrap();
        assert_eq!(ctx.global.live_devices(), vec![ctx.device, second]);

        ctx.global.device_destroy(ctx.device);
        assert_eq!(ctx.global.live_devices(), vec![second]);
        assert!(ctx.global.queue(ctx.queue).is_err());
        assert!(ctx.global.queue(second_queue).is_ok());
        // Resources outlive their device until destroyed themselves.
        assert!(ctx.global.buffer(buffer).is_ok());

        let err = ctx
            .global
            .device_create_buffer(
                ctx.device,
                &wgpu_emu::resource::BufferDescriptor {
                    label: None,
                    size: 4,
                    usage: wgt::BufferUsages::UNIFORM,
                    mapped_at_creation: false,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind, "Device");

        ctx.global.device_drop(second);
        assert!(ctx.global.live_devices().is_empty());
    })
}

#[test]
fn error_scopes_never_capture() {
    initialize_test(TestParameters::default(), |ctx| {
        ctx.global
            .device_push_error_scope(ctx.device, ErrorFilter::Validation)
            .unwrap();
        ctx.global
            .device_push_error_scope(ctx.device, ErrorFilter::OutOfMemory)
            .unwrap();

        // A failing operation inside the scopes is still not captured.
        let buffer = ctx.create_buffer(4, wgt::BufferUsages::COPY_DST);
        ctx.global.buffer_destroy(buffer);
        assert!(ctx.global.queue_write_buffer(ctx.queue, buffer, 0, &[0; 4]).is_err());

        for _ in 0..2 {
            let popped = pollster::block_on(ctx.global.device_pop_error_scope(ctx.device));
            assert_eq!(popped, Ok(None));
        }
        // Popping an empty stack is tolerated.
        let popped = pollster::block_on(ctx.global.device_pop_error_scope(ctx.device));
        assert_eq!(popped, Ok(None));
    })
}

#[test]
fn compilation_info_is_empty() {
    initialize_test(TestParameters::default(), |ctx| {
        let module = ctx.create_shader_module();
        let info = pollster::block_on(ctx.global.shader_module_compilation_info(module)).unwrap();
        assert_eq!(info, CompilationInfo::default());
        assert!(info.messages.is_empty());
    })
}

#[test]
fn async_pipeline_creation() {
    initialize_test(TestParameters::default(), |ctx| {
        let module = ctx.create_shader_module();
        let compute = pollster::block_on(ctx.global.device_create_compute_pipeline_async(
            ctx.device,
            &ComputePipelineDescriptor {
                label: Some("async".into()),
                layout: None,
                stage: ProgrammableStageDescriptor {
                    module,
                    entry_point: None,
                },
            },
        ))
        .unwrap();
        assert!(ctx.global.compute_pipeline(compute).is_ok());

        let render = ctx.create_render_pipeline("sync");
        let desc = wgpu_emu::pipeline::RenderPipelineDescriptor {
            label: Some("async".into()),
            layout: None,
            vertex: wgpu_emu::pipeline::VertexState {
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
        };
        let render_async =
            pollster::block_on(ctx.global.device_create_render_pipeline_async(ctx.device, &desc))
                .unwrap();
        assert_ne!(render, render_async);
        assert!(ctx.global.render_pipeline(render_async).is_ok());
    })
}

#[test]
fn implicit_bind_group_layouts_are_distinct() {
    initialize_test(TestParameters::default(), |ctx| {
        let pipeline = ctx.create_render_pipeline("implicit");
        let first = ctx
            .global
            .render_pipeline_get_bind_group_layout(pipeline, 0)
            .unwrap();
        let again = ctx
            .global
            .render_pipeline_get_bind_group_layout(pipeline, 0)
            .unwrap();
        assert_ne!(first, again);
        assert!(ctx.global.bind_group_layout(first).unwrap().entries().is_empty());

        ctx.global.render_pipeline_drop(pipeline);
        assert!(ctx
            .global
            .render_pipeline_get_bind_group_layout(pipeline, 0)
            .is_err());
    })
}

#[test]
fn external_textures_never_expire() {
    initialize_test(TestParameters::default(), |ctx| {
        let frame = ExternalImageSource::ImageBitmap(Arc::new(ImageBitmap {
            width: 4,
            height: 2,
            pixels: vec![0; 32],
        }));
        let external = ctx
            .global
            .device_import_external_texture(
                ctx.device,
                &ExternalTextureDescriptor {
                    label: Some("video frame".into()),
                    source: frame,
                },
            )
            .unwrap();

        let texture = ctx.global.external_texture(external).unwrap();
        assert!(!texture.expired());
        assert_eq!(texture.source().size(), (4, 2));

        ctx.global.external_texture_drop(external);
        assert!(ctx.global.external_texture(external).is_err());
    })
}

#[test]
fn preferred_canvas_format() {
    initialize_test(
        TestParameters::default().preferred_canvas_format(wgt::TextureFormat::Rgba8Unorm),
        |ctx| {
            assert_eq!(
                ctx.global.get_preferred_canvas_format(),
                wgt::TextureFormat::Rgba8Unorm
            );
        },
    )
}

#[test]
fn report_tracks_live_resources() {
    let _ = env_logger::try_init();

    let global = Global::new(&InstanceDescriptor::default());
    assert!(global.generate_report().hub.is_empty());

    let adapter =
        pollster::block_on(global.request_adapter(&RequestAdapterOptions::default())).unwrap();
    let (device, _queue) = pollster::block_on(
        global.adapter_request_device(adapter, &DeviceDescriptor::default()),
    )
    .unwrap();
    let texture = global
        .device_create_texture(
            device,
            &wgpu_emu::resource::TextureDescriptor::new(
                [4, 4],
                wgt::TextureFormat::Rgba8Unorm,
                wgt::TextureUsages::TEXTURE_BINDING,
            ),
        )
        .unwrap();
    global
        .texture_create_view(texture, &Default::default())
        .unwrap();

    let report = global.generate_report();
    assert_eq!(report.hub.adapters.num_kept_from_user, 1);
    assert_eq!(report.hub.devices.num_kept_from_user, 1);
    assert_eq!(report.hub.queues.num_kept_from_user, 1);
    assert_eq!(report.hub.textures.num_kept_from_user, 1);
    assert_eq!(report.hub.view_owners, 1);
    assert_eq!(report.hub.surface_textures, 0);
    assert!(report.surfaces.is_empty());

    global.texture_destroy(texture);
    global.device_destroy(device);
    global.adapter_drop(adapter);
    let report = global.generate_report();
    assert_eq!(report.hub.textures.num_kept_from_user, 0);
    assert_eq!(report.hub.devices.num_kept_from_user, 0);
    // The view is still live.
    assert_eq!(report.hub.texture_views.num_kept_from_user, 1);
}
