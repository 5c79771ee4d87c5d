use ash::vk;
use itertools::Itertools;

/// 便捷创建 image memory barrier 的结构体
#[derive(Clone, Copy, Debug)]
pub struct GfxImageBarrier {
    inner: vk::ImageMemoryBarrier2<'static>,
}

impl Default for GfxImageBarrier {
    fn default() -> Self {
        Self {
            inner: vk::ImageMemoryBarrier2 {
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::UNDEFINED,
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_array_layer: 0,
                    layer_count: vk::REMAINING_ARRAY_LAYERS,
                    base_mip_level: 0,
                    level_count: vk::REMAINING_MIP_LEVELS,
                },
                ..Default::default()
            },
        }
    }
}

impl GfxImageBarrier {
    /// 默认覆盖整个 image（所有 mip level 和 array layer）
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &vk::ImageMemoryBarrier2<'static> {
        &self.inner
    }

    /// builder
    #[inline]
    pub fn layout_transfer(mut self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        self.inner.old_layout = old_layout;
        self.inner.new_layout = new_layout;
        self
    }

    /// builder
    #[inline]
    pub fn src_mask(mut self, src_stage_mask: vk::PipelineStageFlags2, src_access_mask: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = src_stage_mask;
        self.inner.src_access_mask = src_access_mask;
        self
    }

    /// builder
    #[inline]
    pub fn dst_mask(mut self, dst_stage_mask: vk::PipelineStageFlags2, dst_access_mask: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = dst_stage_mask;
        self.inner.dst_access_mask = dst_access_mask;
        self
    }

    /// builder
    #[inline]
    pub fn image_aspect_flag(mut self, aspect_mask: vk::ImageAspectFlags) -> Self {
        self.inner.subresource_range.aspect_mask = aspect_mask;
        self
    }

    /// builder
    ///
    /// 只作用于 `[base_mip_level, base_mip_level + level_count)` 这几个 mip level
    #[inline]
    pub fn mip_levels(mut self, base_mip_level: u32, level_count: u32) -> Self {
        self.inner.subresource_range.base_mip_level = base_mip_level;
        self.inner.subresource_range.level_count = level_count;
        self
    }

    /// builder
    #[inline]
    pub fn image(mut self, image: vk::Image) -> Self {
        self.inner.image = image;
        self
    }

    #[inline]
    pub fn vk_image(&self) -> vk::Image {
        self.inner.image
    }

    #[inline]
    pub fn old_layout(&self) -> vk::ImageLayout {
        self.inner.old_layout
    }

    #[inline]
    pub fn new_layout(&self) -> vk::ImageLayout {
        self.inner.new_layout
    }

    #[inline]
    pub fn src_access(&self) -> vk::AccessFlags2 {
        self.inner.src_access_mask
    }

    #[inline]
    pub fn dst_access(&self) -> vk::AccessFlags2 {
        self.inner.dst_access_mask
    }

    #[inline]
    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        self.inner.subresource_range
    }
}

/// 便捷创建 buffer memory barrier 的结构体，默认覆盖整个 buffer
#[derive(Clone, Copy, Debug)]
pub struct GfxBufferBarrier {
    inner: vk::BufferMemoryBarrier2<'static>,
}

impl Default for GfxBufferBarrier {
    fn default() -> Self {
        Self {
            inner: vk::BufferMemoryBarrier2 {
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                offset: 0,
                size: vk::WHOLE_SIZE,
                ..Default::default()
            },
        }
    }
}

impl GfxBufferBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &vk::BufferMemoryBarrier2<'static> {
        &self.inner
    }

    #[inline]
    pub fn src_mask(mut self, src_stage_mask: vk::PipelineStageFlags2, src_access_mask: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = src_stage_mask;
        self.inner.src_access_mask = src_access_mask;
        self
    }

    #[inline]
    pub fn dst_mask(mut self, dst_stage_mask: vk::PipelineStageFlags2, dst_access_mask: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = dst_stage_mask;
        self.inner.dst_access_mask = dst_access_mask;
        self
    }

    #[inline]
    pub fn buffer(mut self, buffer: vk::Buffer, offset: vk::DeviceSize, size: vk::DeviceSize) -> Self {
        self.inner.buffer = buffer;
        self.inner.offset = offset;
        self.inner.size = size;
        self
    }

    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.inner.buffer
    }

    #[inline]
    pub fn src_access(&self) -> vk::AccessFlags2 {
        self.inner.src_access_mask
    }

    #[inline]
    pub fn dst_access(&self) -> vk::AccessFlags2 {
        self.inner.dst_access_mask
    }
}

/// 一次 `vkCmdPipelineBarrier2` 的全部内容
///
/// `src_stage` / `dst_stage` 是所有 barrier 的 stage 的并集，录制时会统一写到每一个 barrier 上：
/// 用更粗粒度的等待换取更少的 barrier 命令。
#[derive(Clone, Debug, Default)]
pub struct GfxDependency {
    pub src_stage: vk::PipelineStageFlags2,
    pub dst_stage: vk::PipelineStageFlags2,
    pub buffer_barriers: Vec<GfxBufferBarrier>,
    pub image_barriers: Vec<GfxImageBarrier>,
}

impl GfxDependency {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个 buffer barrier，同时把它的 stage 合并到整体的 stage mask 中
    pub fn add_buffer_barrier(&mut self, barrier: GfxBufferBarrier) {
        self.src_stage |= barrier.inner.src_stage_mask;
        self.dst_stage |= barrier.inner.dst_stage_mask;
        self.buffer_barriers.push(barrier);
    }

    /// 加入一个 image barrier，同时把它的 stage 合并到整体的 stage mask 中
    pub fn add_image_barrier(&mut self, barrier: GfxImageBarrier) {
        self.src_stage |= barrier.inner.src_stage_mask;
        self.dst_stage |= barrier.inner.dst_stage_mask;
        self.image_barriers.push(barrier);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer_barriers.is_empty() && self.image_barriers.is_empty()
    }

    /// 每个 barrier 的 stage 都替换为合并后的 stage mask
    pub fn vk_buffer_barriers(&self) -> Vec<vk::BufferMemoryBarrier2<'static>> {
        self.buffer_barriers
            .iter()
            .map(|b| {
                let mut barrier = *b.inner();
                barrier.src_stage_mask = self.src_stage;
                barrier.dst_stage_mask = self.dst_stage;
                barrier
            })
            .collect_vec()
    }

    /// 每个 barrier 的 stage 都替换为合并后的 stage mask
    pub fn vk_image_barriers(&self) -> Vec<vk::ImageMemoryBarrier2<'static>> {
        self.image_barriers
            .iter()
            .map(|b| {
                let mut barrier = *b.inner();
                barrier.src_stage_mask = self.src_stage;
                barrier.dst_stage_mask = self.dst_stage;
                barrier
            })
            .collect_vec()
    }
}
