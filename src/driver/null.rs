//! Software driver for testing and development.
//!
//! Unlike a no-op stub, this driver keeps byte-accurate storage for buffers
//! and textures so that update/extract round-trips, device-side copies and
//! blits behave observably. It also tracks bindless residency and exposes a
//! few inspection counters for tests.
//!
//! Rendering-only operations (draws, barriers) are accepted and logged.

use std::collections::{HashMap, HashSet};

use crate::error::GraphicsError;
use crate::handle::RawHandle;
use crate::types::{
    transfer_pixel_size, AttachmentSlot, BarrierFlags, BlitFilter, BlitMask, CompressedFormat,
    Dimension, Extent3d, FramebufferStatus, ImageAccess, InternalFormat, MapFlags, Offset3d,
    PixelFormat, PixelType, Region, SamplingParameter, ShaderStage, StorageFlags, TextureStorage,
    TextureTarget, UsageHint,
};

use super::Driver;

struct Mapping {
    data: Box<[u8]>,
    offset: usize,
    flags: MapFlags,
}

#[derive(Default)]
struct BufferSlot {
    device: Vec<u8>,
    immutable: bool,
    allocated: bool,
    mapping: Option<Mapping>,
}

struct TextureSlot {
    target: TextureTarget,
    storage: Option<TextureStorage>,
    /// One byte vector per mip level, laid out row-major in the format's
    /// preferred transfer layout.
    levels: Vec<Vec<u8>>,
}

struct RenderbufferSlot {
    storage: Option<(InternalFormat, u32, u32, u32)>,
}

#[derive(Clone, Copy)]
enum FbAttachment {
    Texture { texture: RawHandle, level: u32 },
    TextureLayer { texture: RawHandle, level: u32 },
    Renderbuffer(RawHandle),
}

#[derive(Default)]
struct FramebufferSlot {
    attachments: HashMap<AttachmentSlot, FbAttachment>,
}

struct ShaderSlot {
    stage: ShaderStage,
    compiled: bool,
}

#[derive(Default)]
struct ProgramSlot {
    shaders: Vec<RawHandle>,
}

/// Software driver with byte-accurate resource storage.
pub struct NullDriver {
    next_handle: u32,
    next_bindless: u64,
    buffers: HashMap<u32, BufferSlot>,
    textures: HashMap<u32, TextureSlot>,
    samplers: HashSet<u32>,
    renderbuffers: HashMap<u32, RenderbufferSlot>,
    framebuffers: HashMap<u32, FramebufferSlot>,
    shaders: HashMap<u32, ShaderSlot>,
    programs: HashMap<u32, ProgramSlot>,
    bindless: HashMap<(u32, u32), u64>,
    resident: HashSet<u64>,
    non_resident_calls: u32,
    residency_violations: u32,
    clear_color: [f32; 4],
    clear_depth: f32,
    clear_stencil: i32,
    max_samples: u32,
}

impl NullDriver {
    /// Create a new software driver.
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_bindless: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashSet::new(),
            renderbuffers: HashMap::new(),
            framebuffers: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            bindless: HashMap::new(),
            resident: HashSet::new(),
            non_resident_calls: 0,
            residency_violations: 0,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            max_samples: 8,
        }
    }

    /// Override the reported maximum sample count.
    pub fn set_max_samples(&mut self, samples: u32) {
        self.max_samples = samples.max(1);
    }

    // ------------------------------------------------------------------
    // Inspection (tests and diagnostics)
    // ------------------------------------------------------------------

    /// Number of live buffer objects.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live texture objects.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of currently resident bindless handles.
    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Total number of `make_handle_non_resident` calls issued.
    pub fn non_resident_calls(&self) -> u32 {
        self.non_resident_calls
    }

    /// Residency protocol violations observed (double resident/release).
    pub fn residency_violations(&self) -> u32 {
        self.residency_violations
    }

    fn alloc_handle(&mut self) -> RawHandle {
        let handle = RawHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn resolve_color_texture(&self, framebuffer: RawHandle) -> Option<(RawHandle, u32)> {
        let slot = self.framebuffers.get(&framebuffer.get())?;
        match slot.attachments.get(&AttachmentSlot::Color(0))? {
            FbAttachment::Texture { texture, level }
            | FbAttachment::TextureLayer { texture, level } => Some((*texture, *level)),
            FbAttachment::Renderbuffer(_) => None,
        }
    }

    /// Level extent and per-pixel size, or `None` for unallocated storage.
    fn level_layout(&self, texture: RawHandle, level: u32) -> Option<(Extent3d, usize)> {
        let slot = self.textures.get(&texture.get())?;
        let storage = slot.storage?;
        let extent = storage.extent.mip_level(level);
        Some((extent, storage.format.bytes_per_pixel()))
    }
}

impl Default for NullDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for NullDriver {
    fn name(&self) -> &'static str {
        "Null Driver"
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    fn create_buffer(&mut self) -> RawHandle {
        let handle = self.alloc_handle();
        self.buffers.insert(handle.get(), BufferSlot::default());
        log::trace!("NullDriver: created buffer {handle}");
        handle
    }

    fn delete_buffer(&mut self, buffer: RawHandle) {
        self.buffers.remove(&buffer.get());
    }

    fn buffer_storage(
        &mut self,
        buffer: RawHandle,
        size: usize,
        data: Option<&[u8]>,
        _flags: StorageFlags,
    ) -> Result<(), GraphicsError> {
        let slot = self
            .buffers
            .get_mut(&buffer.get())
            .ok_or_else(|| GraphicsError::ResourceCreationFailed(format!("buffer {buffer}")))?;
        if slot.allocated && slot.immutable {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "buffer {buffer} already has immutable storage"
            )));
        }
        slot.device = match data {
            Some(bytes) => bytes[..size.min(bytes.len())].to_vec(),
            None => vec![0; size],
        };
        slot.device.resize(size, 0);
        slot.immutable = true;
        slot.allocated = true;
        log::trace!("NullDriver: immutable storage for buffer {buffer}, size={size}");
        Ok(())
    }

    fn buffer_data(
        &mut self,
        buffer: RawHandle,
        size: usize,
        data: Option<&[u8]>,
        _usage: UsageHint,
    ) -> Result<(), GraphicsError> {
        let slot = self
            .buffers
            .get_mut(&buffer.get())
            .ok_or_else(|| GraphicsError::ResourceCreationFailed(format!("buffer {buffer}")))?;
        if slot.immutable {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "buffer {buffer} has immutable storage"
            )));
        }
        slot.device = match data {
            Some(bytes) => bytes[..size.min(bytes.len())].to_vec(),
            None => vec![0; size],
        };
        slot.device.resize(size, 0);
        slot.allocated = true;
        log::trace!("NullDriver: mutable storage for buffer {buffer}, size={size}");
        Ok(())
    }

    fn buffer_sub_data(&mut self, buffer: RawHandle, offset: usize, data: &[u8]) {
        if let Some(slot) = self.buffers.get_mut(&buffer.get()) {
            let end = (offset + data.len()).min(slot.device.len());
            if end > offset {
                slot.device[offset..end].copy_from_slice(&data[..end - offset]);
            }
        }
    }

    fn read_buffer_sub_data(&mut self, buffer: RawHandle, offset: usize, size: usize) -> Vec<u8> {
        match self.buffers.get(&buffer.get()) {
            Some(slot) => {
                let end = (offset + size).min(slot.device.len());
                let mut out = slot.device.get(offset..end).unwrap_or(&[]).to_vec();
                out.resize(size, 0);
                out
            }
            None => vec![0; size],
        }
    }

    fn clear_buffer_sub_data(&mut self, buffer: RawHandle, offset: usize, size: usize) {
        if let Some(slot) = self.buffers.get_mut(&buffer.get()) {
            let end = (offset + size).min(slot.device.len());
            if end > offset {
                slot.device[offset..end].fill(0);
            }
        }
    }

    fn copy_buffer_sub_data(
        &mut self,
        src: RawHandle,
        dst: RawHandle,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    ) {
        let bytes = self.read_buffer_sub_data(src, src_offset, size);
        self.buffer_sub_data(dst, dst_offset, &bytes);
    }

    fn map_buffer_range(
        &mut self,
        buffer: RawHandle,
        offset: usize,
        size: usize,
        flags: MapFlags,
    ) -> Result<*mut u8, GraphicsError> {
        let slot = self
            .buffers
            .get_mut(&buffer.get())
            .ok_or_else(|| GraphicsError::ResourceCreationFailed(format!("buffer {buffer}")))?;
        if offset + size > slot.device.len() {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "map range {offset}+{size} exceeds buffer size {}",
                slot.device.len()
            )));
        }
        // The mapping is a separate staging block; flushes copy it into the
        // device bytes, which makes unflushed writes observable as absent.
        let mut staging = vec![0u8; size].into_boxed_slice();
        if flags.contains(MapFlags::READ) {
            staging.copy_from_slice(&slot.device[offset..offset + size]);
        }
        let mapping = Mapping {
            data: staging,
            offset,
            flags,
        };
        let ptr = mapping.data.as_ptr() as *mut u8;
        slot.mapping = Some(mapping);
        log::trace!("NullDriver: mapped buffer {buffer} range {offset}+{size}");
        Ok(ptr)
    }

    fn unmap_buffer(&mut self, buffer: RawHandle) {
        if let Some(slot) = self.buffers.get_mut(&buffer.get()) {
            if let Some(mapping) = slot.mapping.take() {
                // Non-explicit write mappings flush in full on unmap.
                if mapping.flags.contains(MapFlags::WRITE)
                    && !mapping.flags.contains(MapFlags::FLUSH_EXPLICIT)
                {
                    let end = (mapping.offset + mapping.data.len()).min(slot.device.len());
                    slot.device[mapping.offset..end]
                        .copy_from_slice(&mapping.data[..end - mapping.offset]);
                }
            }
        }
    }

    fn flush_mapped_range(&mut self, buffer: RawHandle, offset: usize, size: usize) {
        if let Some(slot) = self.buffers.get_mut(&buffer.get()) {
            if let Some(mapping) = &slot.mapping {
                let end = (offset + size).min(mapping.data.len());
                if end > offset {
                    let dst = mapping.offset + offset;
                    slot.device[dst..dst + (end - offset)]
                        .copy_from_slice(&mapping.data[offset..end]);
                }
            }
        }
    }

    fn invalidate_buffer_data(&mut self, buffer: RawHandle) {
        if let Some(slot) = self.buffers.get_mut(&buffer.get()) {
            slot.device.fill(0);
        }
    }

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    fn create_texture(&mut self, target: TextureTarget) -> RawHandle {
        let handle = self.alloc_handle();
        self.textures.insert(
            handle.get(),
            TextureSlot {
                target,
                storage: None,
                levels: Vec::new(),
            },
        );
        log::trace!("NullDriver: created texture {handle} ({target:?})");
        handle
    }

    fn delete_texture(&mut self, texture: RawHandle) {
        self.textures.remove(&texture.get());
        self.bindless.retain(|(tex, _), _| *tex != texture.get());
    }

    fn texture_storage_1d(
        &mut self,
        texture: RawHandle,
        levels: u32,
        format: InternalFormat,
        width: u32,
    ) -> Result<(), GraphicsError> {
        let storage = TextureStorage::new(format, Extent3d::new_1d(width), levels);
        allocate_texture(&mut self.textures, texture, storage)
    }

    fn texture_storage_2d(
        &mut self,
        texture: RawHandle,
        levels: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError> {
        let storage = TextureStorage::new(format, Extent3d::new_2d(width, height), levels);
        allocate_texture(&mut self.textures, texture, storage)
    }

    fn texture_storage_3d(
        &mut self,
        texture: RawHandle,
        levels: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<(), GraphicsError> {
        let storage = TextureStorage::new(format, Extent3d::new_3d(width, height, depth), levels);
        allocate_texture(&mut self.textures, texture, storage)
    }

    fn texture_storage_2d_multisample(
        &mut self,
        texture: RawHandle,
        samples: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
        fixed_sample_locations: bool,
    ) -> Result<(), GraphicsError> {
        let storage =
            TextureStorage::multisample(format, width, height, samples, fixed_sample_locations);
        allocate_texture(&mut self.textures, texture, storage)
    }

    fn texture_sub_image_1d(
        &mut self,
        texture: RawHandle,
        level: u32,
        x: u32,
        width: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    ) {
        self.texture_sub_image_3d(
            texture,
            level,
            Offset3d::new(x, 0, 0),
            Extent3d::new_1d(width),
            format,
            pixel_type,
            data,
        );
    }

    fn texture_sub_image_2d(
        &mut self,
        texture: RawHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    ) {
        self.texture_sub_image_3d(
            texture,
            level,
            Offset3d::new(x, y, 0),
            Extent3d::new_2d(width, height),
            format,
            pixel_type,
            data,
        );
    }

    fn texture_sub_image_3d(
        &mut self,
        texture: RawHandle,
        level: u32,
        offset: Offset3d,
        extent: Extent3d,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    ) {
        let Some((level_extent, _)) = self.level_layout(texture, level) else {
            return;
        };
        let pixel = transfer_pixel_size(format, pixel_type);
        let Some(slot) = self.textures.get_mut(&texture.get()) else {
            return;
        };
        let Some(level_data) = slot.levels.get_mut(level as usize) else {
            return;
        };
        copy_region(
            data,
            extent,
            Offset3d::ZERO,
            level_data,
            level_extent,
            offset,
            extent,
            pixel,
        );
    }

    fn compressed_texture_sub_image_2d(
        &mut self,
        texture: RawHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: CompressedFormat,
        data: &[u8],
    ) {
        let Some((level_extent, _)) = self.level_layout(texture, level) else {
            return;
        };
        let Some(slot) = self.textures.get_mut(&texture.get()) else {
            return;
        };
        let Some(level_data) = slot.levels.get_mut(level as usize) else {
            return;
        };
        // Copy whole 4x4 block rows.
        let block = format.block_size();
        let src_row = width.div_ceil(4) as usize * block;
        let dst_stride = level_extent.width.div_ceil(4) as usize * block;
        let rows = height.div_ceil(4) as usize;
        for row in 0..rows {
            let src_off = row * src_row;
            let dst_off = ((y / 4) as usize + row) * dst_stride + (x / 4) as usize * block;
            let len = src_row
                .min(data.len().saturating_sub(src_off))
                .min(level_data.len().saturating_sub(dst_off));
            if len > 0 {
                level_data[dst_off..dst_off + len].copy_from_slice(&data[src_off..src_off + len]);
            }
        }
    }

    fn read_texture_image(
        &mut self,
        texture: RawHandle,
        level: u32,
        _format: PixelFormat,
        _pixel_type: PixelType,
        size: usize,
    ) -> Vec<u8> {
        let mut out = self
            .textures
            .get(&texture.get())
            .and_then(|slot| slot.levels.get(level as usize))
            .cloned()
            .unwrap_or_default();
        out.resize(size, 0);
        out
    }

    fn copy_image_sub_data(
        &mut self,
        src: RawHandle,
        src_level: u32,
        src_offset: Offset3d,
        dst: RawHandle,
        dst_level: u32,
        dst_offset: Offset3d,
        extent: Extent3d,
    ) {
        let Some((src_extent, pixel)) = self.level_layout(src, src_level) else {
            return;
        };
        let Some((dst_extent, _)) = self.level_layout(dst, dst_level) else {
            return;
        };
        let Some(src_data) = self
            .textures
            .get(&src.get())
            .and_then(|slot| slot.levels.get(src_level as usize))
            .cloned()
        else {
            return;
        };
        let Some(dst_data) = self
            .textures
            .get_mut(&dst.get())
            .and_then(|slot| slot.levels.get_mut(dst_level as usize))
        else {
            return;
        };
        copy_region(
            &src_data, src_extent, src_offset, dst_data, dst_extent, dst_offset, extent, pixel,
        );
    }

    fn generate_mipmaps(&mut self, texture: RawHandle) {
        log::trace!("NullDriver: generate_mipmaps for texture {texture}");
    }

    fn set_texture_parameter(&mut self, texture: RawHandle, parameter: SamplingParameter) {
        log::trace!("NullDriver: texture {texture} parameter {parameter:?}");
    }

    fn bind_image_texture(
        &mut self,
        unit: u32,
        texture: RawHandle,
        level: u32,
        access: ImageAccess,
        _format: InternalFormat,
    ) {
        log::trace!("NullDriver: bind image unit {unit} <- {texture} level {level} ({access:?})");
    }

    fn memory_barrier(&mut self, barriers: BarrierFlags) {
        log::trace!("NullDriver: memory barrier {barriers:?}");
    }

    fn max_samples(&self) -> u32 {
        self.max_samples
    }

    // ------------------------------------------------------------------
    // Samplers
    // ------------------------------------------------------------------

    fn create_sampler(&mut self) -> RawHandle {
        let handle = self.alloc_handle();
        self.samplers.insert(handle.get());
        handle
    }

    fn delete_sampler(&mut self, sampler: RawHandle) {
        self.samplers.remove(&sampler.get());
        self.bindless.retain(|(_, smp), _| *smp != sampler.get());
    }

    fn set_sampler_parameter(&mut self, sampler: RawHandle, parameter: SamplingParameter) {
        log::trace!("NullDriver: sampler {sampler} parameter {parameter:?}");
    }

    // ------------------------------------------------------------------
    // Bindless residency
    // ------------------------------------------------------------------

    fn texture_handle(&mut self, texture: RawHandle) -> u64 {
        let next = &mut self.next_bindless;
        *self.bindless.entry((texture.get(), 0)).or_insert_with(|| {
            let handle = *next;
            *next += 1;
            handle
        })
    }

    fn texture_sampler_handle(&mut self, texture: RawHandle, sampler: RawHandle) -> u64 {
        let next = &mut self.next_bindless;
        *self
            .bindless
            .entry((texture.get(), sampler.get()))
            .or_insert_with(|| {
                let handle = *next;
                *next += 1;
                handle
            })
    }

    fn make_handle_resident(&mut self, handle: u64) {
        if !self.resident.insert(handle) {
            log::warn!("NullDriver: bindless handle {handle:#x} already resident");
            self.residency_violations += 1;
        }
    }

    fn make_handle_non_resident(&mut self, handle: u64) {
        self.non_resident_calls += 1;
        if !self.resident.remove(&handle) {
            log::warn!("NullDriver: bindless handle {handle:#x} was not resident");
            self.residency_violations += 1;
        }
    }

    // ------------------------------------------------------------------
    // Renderbuffers
    // ------------------------------------------------------------------

    fn create_renderbuffer(&mut self) -> RawHandle {
        let handle = self.alloc_handle();
        self.renderbuffers
            .insert(handle.get(), RenderbufferSlot { storage: None });
        handle
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RawHandle) {
        self.renderbuffers.remove(&renderbuffer.get());
    }

    fn renderbuffer_storage(
        &mut self,
        renderbuffer: RawHandle,
        samples: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError> {
        let slot = self.renderbuffers.get_mut(&renderbuffer.get()).ok_or_else(|| {
            GraphicsError::ResourceCreationFailed(format!("renderbuffer {renderbuffer}"))
        })?;
        slot.storage = Some((format, width, height, samples));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Framebuffers
    // ------------------------------------------------------------------

    fn create_framebuffer(&mut self) -> RawHandle {
        let handle = self.alloc_handle();
        self.framebuffers
            .insert(handle.get(), FramebufferSlot::default());
        handle
    }

    fn delete_framebuffer(&mut self, framebuffer: RawHandle) {
        self.framebuffers.remove(&framebuffer.get());
    }

    fn framebuffer_texture(
        &mut self,
        framebuffer: RawHandle,
        slot: AttachmentSlot,
        texture: RawHandle,
        level: u32,
    ) {
        if let Some(fb) = self.framebuffers.get_mut(&framebuffer.get()) {
            fb.attachments
                .insert(slot, FbAttachment::Texture { texture, level });
        }
    }

    fn framebuffer_texture_layer(
        &mut self,
        framebuffer: RawHandle,
        slot: AttachmentSlot,
        texture: RawHandle,
        level: u32,
        _layer: u32,
    ) {
        if let Some(fb) = self.framebuffers.get_mut(&framebuffer.get()) {
            fb.attachments
                .insert(slot, FbAttachment::TextureLayer { texture, level });
        }
    }

    fn framebuffer_renderbuffer(
        &mut self,
        framebuffer: RawHandle,
        slot: AttachmentSlot,
        renderbuffer: RawHandle,
    ) {
        if let Some(fb) = self.framebuffers.get_mut(&framebuffer.get()) {
            fb.attachments
                .insert(slot, FbAttachment::Renderbuffer(renderbuffer));
        }
    }

    fn framebuffer_status(&mut self, framebuffer: RawHandle) -> FramebufferStatus {
        let Some(fb) = self.framebuffers.get(&framebuffer.get()) else {
            return FramebufferStatus::Unsupported;
        };
        if fb.attachments.is_empty() {
            return FramebufferStatus::IncompleteMissingAttachment;
        }
        for attachment in fb.attachments.values() {
            let live = match attachment {
                FbAttachment::Texture { texture, .. }
                | FbAttachment::TextureLayer { texture, .. } => {
                    self.textures.contains_key(&texture.get())
                }
                FbAttachment::Renderbuffer(rb) => self.renderbuffers.contains_key(&rb.get()),
            };
            if !live {
                return FramebufferStatus::IncompleteAttachment;
            }
        }
        FramebufferStatus::Complete
    }

    fn blit_framebuffer(
        &mut self,
        src: RawHandle,
        dst: RawHandle,
        src_region: Region,
        dst_region: Region,
        mask: BlitMask,
        _filter: BlitFilter,
    ) {
        // Color aspect only; scaling blits degrade to a trace.
        if !mask.contains(BlitMask::COLOR)
            || src_region.width != dst_region.width
            || src_region.height != dst_region.height
        {
            log::trace!("NullDriver: blit {src} -> {dst} skipped (software limitation)");
            return;
        }
        let Some((src_tex, src_level)) = self.resolve_color_texture(src) else {
            return;
        };
        let Some((dst_tex, dst_level)) = self.resolve_color_texture(dst) else {
            return;
        };
        self.copy_image_sub_data(
            src_tex,
            src_level,
            Offset3d::new(src_region.x, src_region.y, 0),
            dst_tex,
            dst_level,
            Offset3d::new(dst_region.x, dst_region.y, 0),
            Extent3d::new_2d(src_region.width, src_region.height),
        );
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    fn set_clear_stencil(&mut self, stencil: i32) {
        self.clear_stencil = stencil;
    }

    fn clear(&mut self, framebuffer: RawHandle, mask: BlitMask) {
        log::trace!(
            "NullDriver: clear {framebuffer} mask={mask:?} color={:?} depth={} stencil={}",
            self.clear_color,
            self.clear_depth,
            self.clear_stencil
        );
        if !mask.contains(BlitMask::COLOR) {
            return;
        }
        let Some((texture, level)) = self.resolve_color_texture(framebuffer) else {
            return;
        };
        let Some(slot) = self.textures.get_mut(&texture.get()) else {
            return;
        };
        let rgba8 = matches!(slot.storage.map(|s| s.format), Some(InternalFormat::Rgba8));
        if let Some(level_data) = slot.levels.get_mut(level as usize) {
            if rgba8 {
                let pixel: Vec<u8> = self
                    .clear_color
                    .iter()
                    .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
                    .collect();
                for chunk in level_data.chunks_exact_mut(4) {
                    chunk.copy_from_slice(&pixel);
                }
            } else {
                level_data.fill(0);
            }
        }
    }

    // ------------------------------------------------------------------
    // Shaders
    // ------------------------------------------------------------------

    fn create_shader(&mut self, stage: ShaderStage) -> RawHandle {
        let handle = self.alloc_handle();
        self.shaders.insert(
            handle.get(),
            ShaderSlot {
                stage,
                compiled: false,
            },
        );
        handle
    }

    fn delete_shader(&mut self, shader: RawHandle) {
        self.shaders.remove(&shader.get());
    }

    fn compile_shader(&mut self, shader: RawHandle, source: &str) -> Result<(), String> {
        let Some(slot) = self.shaders.get_mut(&shader.get()) else {
            return Err(format!("shader {shader} does not exist"));
        };
        // The software compiler honors #error so failure paths are testable.
        if let Some(line) = source.lines().find(|line| line.trim_start().starts_with("#error")) {
            return Err(format!("{} shader: {}", slot.stage, line.trim()));
        }
        slot.compiled = true;
        Ok(())
    }

    fn create_program(&mut self) -> RawHandle {
        let handle = self.alloc_handle();
        self.programs.insert(handle.get(), ProgramSlot::default());
        handle
    }

    fn delete_program(&mut self, program: RawHandle) {
        self.programs.remove(&program.get());
    }

    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle) {
        if let Some(slot) = self.programs.get_mut(&program.get()) {
            slot.shaders.push(shader);
        }
    }

    fn link_program(&mut self, program: RawHandle) -> Result<(), String> {
        let Some(slot) = self.programs.get(&program.get()) else {
            return Err(format!("program {program} does not exist"));
        };
        if slot.shaders.is_empty() {
            return Err("no shader objects attached".to_string());
        }
        for shader in &slot.shaders {
            match self.shaders.get(&shader.get()) {
                Some(stage) if stage.compiled => {}
                _ => return Err(format!("attached shader {shader} is not compiled")),
            }
        }
        Ok(())
    }
}

fn allocate_texture(
    textures: &mut HashMap<u32, TextureSlot>,
    texture: RawHandle,
    storage: TextureStorage,
) -> Result<(), GraphicsError> {
    let slot = textures
        .get_mut(&texture.get())
        .ok_or_else(|| GraphicsError::ResourceCreationFailed(format!("texture {texture}")))?;
    if slot.storage.is_some() {
        return Err(GraphicsError::ResourceCreationFailed(format!(
            "texture {texture} already has storage"
        )));
    }
    let extent = storage.extent;
    let fits = match slot.target.dimension() {
        Dimension::One => extent.height == 1 && extent.depth == 1,
        Dimension::Two => extent.depth == 1,
        Dimension::Three => true,
    };
    if !fits {
        return Err(GraphicsError::ResourceCreationFailed(format!(
            "texture {texture} extent {extent:?} does not fit target {:?}",
            slot.target
        )));
    }
    slot.levels = (0..storage.levels)
        .map(|level| vec![0u8; storage.level_byte_size(level)])
        .collect();
    slot.storage = Some(storage);
    Ok(())
}

/// Row-by-row copy of a volumetric region between two pixel arrays.
#[allow(clippy::too_many_arguments)]
fn copy_region(
    src: &[u8],
    src_extent: Extent3d,
    src_offset: Offset3d,
    dst: &mut [u8],
    dst_extent: Extent3d,
    dst_offset: Offset3d,
    extent: Extent3d,
    pixel: usize,
) {
    let row_bytes = extent.width as usize * pixel;
    for z in 0..extent.depth as usize {
        for y in 0..extent.height as usize {
            let src_index = ((src_offset.z as usize + z) * src_extent.height as usize
                + src_offset.y as usize
                + y)
                * src_extent.width as usize
                + src_offset.x as usize;
            let dst_index = ((dst_offset.z as usize + z) * dst_extent.height as usize
                + dst_offset.y as usize
                + y)
                * dst_extent.width as usize
                + dst_offset.x as usize;
            let src_off = src_index * pixel;
            let dst_off = dst_index * pixel;
            let len = row_bytes
                .min(src.len().saturating_sub(src_off))
                .min(dst.len().saturating_sub(dst_off));
            if len > 0 {
                dst[dst_off..dst_off + len].copy_from_slice(&src[src_off..src_off + len]);
            }
        }
    }
}
