//! Resource lifecycle integration tests.
//!
//! These tests exercise whole resource lifecycles against the software
//! driver rather than single methods: allocation, upload, readback,
//! residency, framebuffer composition and container loading.
//!
//! # Test Categories
//!
//! - **Buffer Tests**: Allocation discipline, round trips, growth
//! - **Texture Tests**: Storage, mip chains, residency, duplication
//! - **Framebuffer Tests**: Composition, clears, extraction, resolve
//! - **Loader Tests**: DDS containers and image decoding
//!
//! ```bash
//! cargo test --test resource_tests
//! ```

use rstest::rstest;

use vermilion_graphics::{
    load_dds, AttachmentSlot, BlitMask, BufferRead, BufferWrite, CompressedFormat, DecodedImage,
    Dispose, Driver, Extent3d, Framebuffer, GpuResource, GrowthBuffer, ImmutableBuffer, InternalFormat,
    MutableBuffer, NullDriver, PersistentBuffer, Program, RenderState, RenderTarget,
    TextureStorage, TextureTarget, Texture, UsageHint,
};
use vermilion_graphics::error::GraphicsError;
use vermilion_graphics::types::ShaderStage;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
    vermilion_graphics::init();
}

// ============================================================================
// Buffer Tests
// ============================================================================

/// Both buffer variants honor the same clamped sub-range contract: an
/// overlong write at a valid index truncates instead of failing.
#[rstest]
#[case::at_start(0, 16)]
#[case::in_middle(10, 6)]
#[case::overlong(14, 2)]
fn test_buffer_write_clamps_to_capacity(#[case] index: usize, #[case] expected: usize) {
    let mut driver = NullDriver::new();
    let mut buffer = MutableBuffer::<u64>::new(&mut driver, UsageHint::DynamicDraw);
    buffer.reserve(&mut driver, 16).unwrap();

    let written = buffer.write(&mut driver, index, &[7u64; 16]).unwrap();
    assert_eq!(written, expected);
    assert_eq!(
        buffer.read(&mut driver, index, expected).unwrap(),
        vec![7u64; expected]
    );
}

/// One immutable allocation per handle, ever. The mutable variant accepts
/// repeated reservations on the same handle.
#[test]
fn test_allocation_discipline() {
    let mut driver = NullDriver::new();

    let mut immutable = ImmutableBuffer::<u32>::new(&mut driver);
    immutable.reserve(&mut driver, 8).unwrap();
    assert_eq!(
        immutable.reserve(&mut driver, 8),
        Err(GraphicsError::StaticReallocation)
    );

    let mut mutable = MutableBuffer::<u32>::new(&mut driver, UsageHint::StreamDraw);
    mutable.reserve(&mut driver, 8).unwrap();
    mutable.reserve(&mut driver, 32).unwrap();
    assert_eq!(mutable.count(), 32);
}

/// A persistent mapping is host-visible immediately but device-visible only
/// after an explicit flush.
#[test]
fn test_persistent_buffer_flush_discipline() {
    let mut driver = NullDriver::new();
    let mut buffer = PersistentBuffer::<f32>::new(&mut driver, 64).unwrap();

    buffer.write(0, &[1.5f32; 64]).unwrap();
    assert_eq!(buffer.get(63).unwrap(), 1.5);
    let raw = driver.read_buffer_sub_data(buffer.raw_handle(), 0, 4);
    assert_eq!(raw, vec![0u8; 4]);

    buffer.force_sync(&mut driver);
    let raw = driver.read_buffer_sub_data(buffer.raw_handle(), 0, 4);
    assert_eq!(raw, 1.5f32.to_ne_bytes());

    buffer.dispose(&mut driver);
    assert_eq!(driver.buffer_count(), 0);
}

/// A growth buffer survives several frames of uneven load, growing by half
/// whenever a frame fills it exactly.
#[test]
fn test_growth_buffer_frame_loop() {
    let mut driver = NullDriver::new();
    let mut buffer = GrowthBuffer::<u32>::new(&mut driver, 4, UsageHint::StreamDraw).unwrap();

    for frame in 0u32..3 {
        buffer.new_frame(&mut driver).unwrap();
        for i in 0..4 + frame * 2 {
            buffer.push(&mut driver, frame * 100 + i).unwrap();
        }
    }
    assert_eq!(buffer.len(), 8);
    assert_eq!(buffer.capacity(), 9);
    assert_eq!(
        buffer.read(&mut driver),
        (0..8).map(|i| 200 + i).collect::<Vec<u32>>()
    );
    assert_eq!(driver.buffer_count(), 1);
}

// ============================================================================
// Texture Tests
// ============================================================================

/// Requesting the recorded storage again is a silent no-op; requesting
/// different storage replaces the driver object and drops residency.
#[test]
fn test_texture_storage_transitions() {
    init_logs();
    let mut driver = NullDriver::new();
    let mut texture = Texture::new(&mut driver, TextureTarget::Two);
    let storage = TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(32, 32), 6);

    texture.storage(&mut driver, storage).unwrap();
    let bindless = texture.bindless_handle(&mut driver).unwrap();
    let handle = texture.raw_handle();

    texture.storage(&mut driver, storage).unwrap();
    assert_eq!(texture.raw_handle(), handle);
    assert_eq!(texture.bindless_handle(&mut driver).unwrap(), bindless);

    let smaller = TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(16, 16), 5);
    texture.storage(&mut driver, smaller).unwrap();
    assert_ne!(texture.raw_handle(), handle);
    assert!(!texture.is_resident());
    assert_eq!(driver.residency_violations(), 0);

    // The new object derives a fresh bindless handle.
    let rebound = texture.bindless_handle(&mut driver).unwrap();
    assert_ne!(rebound, bindless);
}

/// Mip extents halve down to 1x1 and the level count derives from the
/// largest axis.
#[rstest]
#[case::square(256, 256, 9)]
#[case::wide(512, 64, 10)]
#[case::single_pixel(1, 1, 1)]
fn test_full_mip_chain_storage(#[case] width: u32, #[case] height: u32, #[case] levels: u32) {
    let mut driver = NullDriver::new();
    let mut texture = Texture::new(&mut driver, TextureTarget::Two);
    let storage = TextureStorage::new(
        InternalFormat::Rgba8,
        Extent3d::new_2d(width, height),
        vermilion_graphics::types::max_mip_levels(width, height, 1),
    );
    texture.storage(&mut driver, storage).unwrap();

    let recorded = texture.allocation().unwrap();
    assert_eq!(recorded.levels, levels);
    assert_eq!(
        recorded.extent.mip_level(levels - 1),
        Extent3d::new_2d(1, 1)
    );
}

/// Duplication allocates an independent texture with identical contents;
/// writes to the copy leave the original untouched.
#[test]
fn test_duplicate_is_independent() {
    let mut driver = NullDriver::new();
    let mut original = Texture::new(&mut driver, TextureTarget::Two);
    original
        .storage(
            &mut driver,
            TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(2, 2), 1),
        )
        .unwrap();
    let pixels: Vec<u8> = (0u8..16).collect();
    original.image_data(&mut driver, 0, &pixels).unwrap();

    let mut copy = original.duplicate(&mut driver).unwrap();
    copy.image_data(&mut driver, 0, &[0xffu8; 16]).unwrap();

    assert_eq!(original.read_level(&mut driver, 0).unwrap(), pixels);
    assert_eq!(copy.read_level(&mut driver, 0).unwrap(), vec![0xffu8; 16]);
}

/// Disposing a texture with live bindless handles releases them exactly
/// once; disposing again is a no-op.
#[test]
fn test_dispose_protocol() {
    let mut driver = NullDriver::new();
    let mut texture = Texture::new(&mut driver, TextureTarget::Two);
    texture
        .storage(
            &mut driver,
            TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(4, 4), 1),
        )
        .unwrap();
    texture.bindless_handle(&mut driver).unwrap();

    texture.dispose(&mut driver);
    texture.dispose(&mut driver);
    assert_eq!(driver.texture_count(), 0);
    assert_eq!(driver.non_resident_calls(), 1);
    assert_eq!(driver.residency_violations(), 0);
}

// ============================================================================
// Framebuffer Tests
// ============================================================================

/// Clear state set through the cache reaches the attachment, and extraction
/// captures the cleared pixels into a fresh texture.
#[test]
fn test_clear_and_extract() {
    let mut driver = NullDriver::new();
    let mut color = Texture::new(&mut driver, TextureTarget::Two);
    color
        .storage(
            &mut driver,
            TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(4, 4), 1),
        )
        .unwrap();
    let mut framebuffer = Framebuffer::new(&mut driver);
    framebuffer
        .set_texture(&mut driver, AttachmentSlot::Color(0), &color, 0)
        .unwrap();
    assert!(framebuffer.status(&mut driver).is_complete());

    let mut state = RenderState::new();
    state.set_clear_color(&mut driver, [0.0, 0.0, 1.0, 1.0]);
    framebuffer.clear(&mut driver, BlitMask::COLOR);

    let extracted = framebuffer.extract_color(&mut driver, 0).unwrap();
    let pixels = extracted.read_level(&mut driver, 0).unwrap();
    assert!(pixels.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
}

/// A multisample render target resolves on first read and serves the cached
/// resolve for the rest of the frame.
#[test]
fn test_render_target_frame_cycle() {
    init_logs();
    let mut driver = NullDriver::new();
    let mut state = RenderState::new();
    let mut target = RenderTarget::new(&mut driver, 8, 8, 4, InternalFormat::Rgba8).unwrap();
    assert!(target.status(&mut driver).is_complete());

    for frame in 0..2u8 {
        target.new_frame();
        let channel = frame as f32;
        state.set_clear_color(&mut driver, [channel, 1.0 - channel, 0.0, 1.0]);
        target.clear(&mut driver);

        let expected = [frame * 255, 255 - frame * 255, 0, 255];
        let pixels = target
            .frame_result(&mut driver)
            .read_level(&mut driver, 0)
            .unwrap();
        assert_eq!(&pixels[..4], &expected);
    }
}

// ============================================================================
// Loader Tests
// ============================================================================

/// A DDS chain uploads one compressed payload per level and the recorded
/// storage reflects the container's format.
#[test]
fn test_dds_end_to_end() {
    let mut driver = NullDriver::new();
    let bytes = dxt1_fixture(64, 64, 3);
    let texture = load_dds(&mut driver, &bytes).unwrap();

    let storage = texture.allocation().unwrap();
    assert_eq!(storage.format, InternalFormat::CompressedDxt1);
    assert_eq!(storage.levels, 3);
    // 16x16 blocks of 8 bytes.
    assert_eq!(storage.level_byte_size(0), 2048);
    assert_eq!(texture.read_level(&mut driver, 2).unwrap(), vec![2u8; 128]);
}

/// An encoded image decodes back to RGBA8 and lands in a texture with a
/// full mip chain.
#[test]
fn test_image_decode_to_texture() {
    let mut driver = NullDriver::new();
    let image = DecodedImage {
        width: 8,
        height: 8,
        pixels: (0..8 * 8 * 4).map(|i| (i % 251) as u8).collect(),
    };
    let encoded = image.encode_png().unwrap();

    let decoded = DecodedImage::decode(&encoded, true).unwrap();
    let texture = decoded.clone().into_texture(&mut driver).unwrap();
    assert_eq!(texture.allocation().unwrap().levels, 4);
    assert_eq!(texture.read_level(&mut driver, 0).unwrap(), decoded.pixels);
}

/// Program construction cleans up its stage shaders whether linking
/// succeeds or fails.
#[test]
fn test_program_build_cycle() {
    let mut driver = NullDriver::new();
    let vertex = "#version 450\nvoid main() {}";
    let fragment = "#version 450\nvoid main() {}";

    let mut program = Program::build(
        &mut driver,
        &[(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)],
    )
    .unwrap();
    assert!(program.raw_handle().is_valid());
    program.dispose(&mut driver);

    let failed = Program::build(&mut driver, &[(ShaderStage::Compute, "#error nope")]);
    assert!(matches!(
        failed,
        Err(GraphicsError::ShaderCompilation {
            stage: ShaderStage::Compute,
            ..
        })
    ));
}

fn dxt1_fixture(width: u32, height: u32, mip_count: u32) -> Vec<u8> {
    let format = CompressedFormat::Dxt1;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"DDS ");
    let mut header = [0u8; 124];
    header[0..4].copy_from_slice(&124u32.to_le_bytes());
    header[8..12].copy_from_slice(&height.to_le_bytes());
    header[12..16].copy_from_slice(&width.to_le_bytes());
    header[16..20].copy_from_slice(&(format.level_size(width, height) as u32).to_le_bytes());
    header[24..28].copy_from_slice(&mip_count.to_le_bytes());
    header[80..84].copy_from_slice(b"DXT1");
    bytes.extend_from_slice(&header);

    let (mut w, mut h) = (width, height);
    for level in 0..mip_count {
        bytes.extend(std::iter::repeat(level as u8).take(format.level_size(w, h)));
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    bytes
}
