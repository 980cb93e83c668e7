use wgpu_emu::resource::{BufferDescriptor, BufferMapState, MapMode};

use crate::common::{initialize_test, TestParameters};

#[test]
fn mapped_range_defaults_to_whole_buffer() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(16, wgt::BufferUsages::MAP_WRITE);

        let range = ctx
            .global
            .buffer_get_mapped_range(buffer, None, None)
            .unwrap();
        assert_eq!(range.len(), 16);
        assert_eq!(range.offset(), 0);
        assert!(range.to_vec().iter().all(|&b| b == 0));
    })
}

#[test]
fn mapped_range_writes_are_recorded() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(12, wgt::BufferUsages::MAP_WRITE);

        let range = ctx
            .global
            .buffer_get_mapped_range(buffer, Some(4), None)
            .unwrap();
        assert_eq!(range.len(), 8);
        range.write(0, &[1, 2, 3, 4]);

        assert_eq!(
            ctx.global.buffer_contents(buffer),
            Some(vec![0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0])
        );
    })
}

#[test]
fn mapped_range_offset_past_end_is_empty() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(8, wgt::BufferUsages::MAP_READ);

        let range = ctx
            .global
            .buffer_get_mapped_range(buffer, Some(32), None)
            .unwrap();
        assert!(range.is_empty());
    })
}

#[test]
fn each_mapping_allocates_fresh_zeroed_region() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(4, wgt::BufferUsages::MAP_WRITE);

        let first = ctx
            .global
            .buffer_get_mapped_range(buffer, None, None)
            .unwrap();
        first.write(0, &[9, 9, 9, 9]);

        let second = ctx
            .global
            .buffer_get_mapped_range(buffer, None, Some(2))
            .unwrap();
        assert_eq!(second.to_vec(), vec![0, 0]);
        assert_eq!(ctx.global.buffer_contents(buffer), Some(vec![0, 0]));
    })
}

#[test]
fn mapped_at_creation() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx
            .global
            .device_create_buffer(
                ctx.device,
                &BufferDescriptor {
                    label: Some("staging".into()),
                    size: 6,
                    usage: wgt::BufferUsages::COPY_SRC,
                    mapped_at_creation: true,
                },
            )
            .unwrap();

        let resource = ctx.global.buffer(buffer).unwrap();
        assert!(resource.mapped_at_creation());
        assert_eq!(resource.map_state(), BufferMapState::Mapped);
        assert_eq!(ctx.global.buffer_contents(buffer), Some(vec![0; 6]));

        ctx.global.buffer_unmap(buffer).unwrap();
        assert_eq!(resource.map_state(), BufferMapState::Unmapped);
        // Unmapping keeps the recorded content.
        assert_eq!(ctx.global.buffer_contents(buffer), Some(vec![0; 6]));
    })
}

#[test]
fn map_async_resolves_immediately() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(4, wgt::BufferUsages::MAP_READ);
        ctx.global
            .queue_write_buffer(ctx.queue, buffer, 0, &[1, 2, 3, 4])
            .unwrap();

        pollster::block_on(ctx.global.buffer_map_async(buffer, MapMode::READ, 0, None)).unwrap();

        assert_eq!(ctx.global.buffer_contents(buffer), Some(vec![1, 2, 3, 4]));
        assert_eq!(
            ctx.global.buffer(buffer).unwrap().map_state(),
            BufferMapState::Unmapped
        );
    })
}

#[test]
fn buffer_stays_live_until_destroyed() {
    initialize_test(TestParameters::default(), |ctx| {
        let buffer = ctx.create_buffer(16, wgt::BufferUsages::VERTEX);

        let _ = ctx.global.buffer_get_mapped_range(buffer, None, None).unwrap();
        ctx.global.buffer_unmap(buffer).unwrap();
        assert!(ctx.global.buffer(buffer).is_ok());

        ctx.global.buffer_destroy(buffer);
        let err = ctx.global.buffer(buffer).unwrap_err();
        assert_eq!(err.kind, "Buffer");
        assert_eq!(ctx.global.buffer_contents(buffer), None);
        assert!(ctx.global.buffer_unmap(buffer).is_err());

        // A second destroy is a no-op.
        ctx.global.buffer_destroy(buffer);
    })
}

#[test]
fn destroyed_ids_are_not_reissued() {
    initialize_test(TestParameters::default(), |ctx| {
        let first = ctx.create_buffer(4, wgt::BufferUsages::UNIFORM);
        ctx.global.buffer_destroy(first);

        let second = ctx.create_buffer(4, wgt::BufferUsages::UNIFORM);
        assert_ne!(first, second);
        assert_eq!(first.unzip().0, second.unzip().0);
        assert!(ctx.global.buffer(first).is_err());
        assert!(ctx.global.buffer(second).is_ok());
    })
}

#[test]
fn buffer_descriptor_is_kept() {
    initialize_test(TestParameters::default(), |ctx| {
        let usage = wgt::BufferUsages::VERTEX | wgt::BufferUsages::COPY_DST;
        let buffer = ctx
            .global
            .device_create_buffer(
                ctx.device,
                &BufferDescriptor {
                    label: Some("vertices".into()),
                    size: 48,
                    usage,
                    mapped_at_creation: false,
                },
            )
            .unwrap();

        let resource = ctx.global.buffer(buffer).unwrap();
        assert_eq!(resource.size(), 48);
        assert_eq!(resource.usage(), usage);
        assert_eq!(resource.map_state(), BufferMapState::Unmapped);
        assert_eq!(ctx.global.buffer_contents(buffer), None);
    })
}
