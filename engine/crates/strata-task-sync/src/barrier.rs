//! 一个任务开始之前需要的全部 barrier
//!
//! 每个资源最多产生一个 barrier 描述；同一个资源在任务中以多个用途出现时，
//! 各个用途的 dst 会被合并到同一个描述中。最终所有描述合并为一次 `vkCmdPipelineBarrier2`。

use ash::vk;
use indexmap::IndexMap;
use itertools::Itertools;

use strata_gfx::commands::barrier::{GfxBufferBarrier, GfxDependency, GfxImageBarrier};
use strata_gfx::resources::image::GfxImageInfo;

use crate::ledger::ResourceUsageLedger;
use crate::task::TaskResources;
use crate::usage::{Hazard, HazardKind, SyncInfo, UsageKind, hazard};

/// 单个 buffer 的 barrier 描述
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferBarrierDesc {
    pub buffer: vk::Buffer,
    pub kind: HazardKind,
    pub src: SyncInfo,
    pub dst: SyncInfo,
}

impl BufferBarrierDesc {
    pub fn to_gfx_barrier(&self) -> GfxBufferBarrier {
        GfxBufferBarrier::new()
            .buffer(self.buffer, 0, vk::WHOLE_SIZE)
            .src_mask(self.src.stage, self.src.access)
            .dst_mask(self.dst.stage, self.dst.access)
    }
}

/// 单个 image 的 barrier 描述，覆盖 image 的所有 mip level 和 array layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBarrierDesc {
    pub image: GfxImageInfo,
    pub kind: HazardKind,
    pub src: SyncInfo,
    pub dst: SyncInfo,
}

impl ImageBarrierDesc {
    #[inline]
    pub fn old_layout(&self) -> vk::ImageLayout {
        self.src.layout.unwrap_or(vk::ImageLayout::UNDEFINED)
    }

    #[inline]
    pub fn new_layout(&self) -> vk::ImageLayout {
        self.dst.layout.unwrap_or(vk::ImageLayout::UNDEFINED)
    }

    pub fn to_gfx_barrier(&self) -> GfxImageBarrier {
        GfxImageBarrier::new()
            .image(self.image.image)
            .image_aspect_flag(self.image.aspect())
            .layout_transfer(self.old_layout(), self.new_layout())
            .src_mask(self.src.stage, self.src.access)
            .dst_mask(self.dst.stage, self.dst.access)
    }
}

/// 把同一个资源的第二个 hazard 合并进第一个
///
/// src 来自同一个 last usage，只会因为读用途没有 access 而不同；dst 取并集。
/// 写相关的 hazard 优先于读后读的 layout 转换。
fn merge_hazard(acc: Hazard, next: Hazard) -> Hazard {
    let kind = match (acc.kind, next.kind) {
        (HazardKind::LayoutTransition, other) | (other, HazardKind::LayoutTransition) => other,
        (HazardKind::ReadAfterWrite, other) | (other, HazardKind::ReadAfterWrite) => other,
        (first, _) => first,
    };
    Hazard {
        kind,
        src: SyncInfo {
            access: acc.src.access | next.src.access,
            stage: acc.src.stage | next.src.stage,
            layout: acc.src.layout,
        },
        dst: SyncInfo {
            access: acc.dst.access | next.dst.access,
            stage: acc.dst.stage | next.dst.stage,
            layout: acc.dst.layout,
        },
    }
}

/// 资源在本任务所有用途下的合并 hazard；`None` 表示不需要 barrier
fn resource_hazard<K: UsageKind>(last: Option<K>, kinds: &[K]) -> Option<Hazard> {
    kinds.iter().filter_map(|kind| hazard(last, *kind)).reduce(merge_hazard)
}

/// 一个任务开始前需要的所有 barrier，按资源在任务参数中出现的顺序排列
#[derive(Clone, Debug, Default)]
pub struct TaskBarriers {
    buffers: IndexMap<vk::Buffer, BufferBarrierDesc>,
    images: IndexMap<vk::Image, ImageBarrierDesc>,
}

impl TaskBarriers {
    /// 对照账本分析任务声明的所有资源
    ///
    /// # Panics
    /// 同一个 image 在一个任务中要求了不同的 layout
    pub fn analyze(ledger: &ResourceUsageLedger, resources: &TaskResources) -> Self {
        let mut barriers = Self::default();

        for (buffer, kinds) in &resources.buffers {
            let last = ledger.last_buffer_usage(*buffer);
            if let Some(h) = resource_hazard(last, kinds) {
                barriers.buffers.insert(
                    *buffer,
                    BufferBarrierDesc {
                        buffer: *buffer,
                        kind: h.kind,
                        src: h.src,
                        dst: h.dst,
                    },
                );
            }
        }

        for (image, (info, kinds)) in &resources.images {
            let layouts = kinds.iter().map(|kind| kind.info().layout).unique().collect_vec();
            assert!(
                layouts.len() <= 1,
                "image {:?} is declared with conflicting layouts {:?} in one task",
                image,
                layouts
            );

            let last = ledger.last_image_usage(*image);
            if let Some(h) = resource_hazard(last, kinds) {
                barriers.images.insert(
                    *image,
                    ImageBarrierDesc {
                        image: *info,
                        kind: h.kind,
                        src: h.src,
                        dst: h.dst,
                    },
                );
            }
        }

        barriers
    }

    #[inline]
    pub fn has_barriers(&self) -> bool {
        !self.buffers.is_empty() || !self.images.is_empty()
    }

    #[inline]
    pub fn buffer_barrier_count(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn image_barrier_count(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn buffer_barriers(&self) -> impl Iterator<Item = &BufferBarrierDesc> {
        self.buffers.values()
    }

    #[inline]
    pub fn image_barriers(&self) -> impl Iterator<Item = &ImageBarrierDesc> {
        self.images.values()
    }

    /// 合并为一次 pipeline barrier
    pub fn to_dependency(&self) -> GfxDependency {
        let mut dependency = GfxDependency::new();
        for desc in self.buffers.values() {
            dependency.add_buffer_barrier(desc.to_gfx_barrier());
        }
        for desc in self.images.values() {
            dependency.add_image_barrier(desc.to_gfx_barrier());
        }
        dependency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{BufferUsageKind, ImageUsageKind};
    use ash::vk::Handle;

    fn color_image(raw: u64) -> GfxImageInfo {
        GfxImageInfo::new(vk::Image::from_raw(raw), vk::Format::R8G8B8A8_UNORM, 1)
    }

    #[test]
    fn test_input_output_buffer_merges_into_one_barrier() {
        let buffer = vk::Buffer::from_raw(1);
        let mut ledger = ResourceUsageLedger::new();
        ledger.record_buffer_usage(buffer, BufferUsageKind::ComputeRead);

        let mut resources = TaskResources::default();
        resources.add_buffer(buffer, BufferUsageKind::ComputeRead);
        resources.add_buffer(buffer, BufferUsageKind::ComputeWrite);

        let barriers = TaskBarriers::analyze(&ledger, &resources);
        assert_eq!(barriers.buffer_barrier_count(), 1);

        let desc = barriers.buffer_barriers().next().unwrap();
        assert_eq!(desc.kind, HazardKind::WriteAfterRead);
        assert_eq!(desc.src.access, vk::AccessFlags2::NONE);
        assert_eq!(desc.src.stage, vk::PipelineStageFlags2::COMPUTE_SHADER);
        assert_eq!(desc.dst.access, vk::AccessFlags2::SHADER_WRITE);
    }

    #[test]
    fn test_buffer_in_two_read_roles_after_write() {
        let buffer = vk::Buffer::from_raw(2);
        let mut ledger = ResourceUsageLedger::new();
        ledger.record_buffer_usage(buffer, BufferUsageKind::TransferWrite);

        let mut resources = TaskResources::default();
        resources.add_buffer(buffer, BufferUsageKind::VertexSource);
        resources.add_buffer(buffer, BufferUsageKind::IndexSource);

        let barriers = TaskBarriers::analyze(&ledger, &resources);
        let desc = barriers.buffer_barriers().next().unwrap();
        assert_eq!(desc.kind, HazardKind::ReadAfterWrite);
        assert_eq!(desc.dst.access, vk::AccessFlags2::VERTEX_ATTRIBUTE_READ | vk::AccessFlags2::INDEX_READ);
        assert_eq!(desc.dst.stage, vk::PipelineStageFlags2::VERTEX_INPUT);
    }

    #[test]
    fn test_dependency_carries_layout_transition() {
        let image = color_image(3);
        let mut ledger = ResourceUsageLedger::new();
        ledger.record_image_usage(image.image, ImageUsageKind::TransferDestination);

        let mut resources = TaskResources::default();
        resources.add_image(image, ImageUsageKind::GraphicsSampledRead);

        let dependency = TaskBarriers::analyze(&ledger, &resources).to_dependency();
        assert_eq!(dependency.image_barriers.len(), 1);
        let barrier = dependency.image_barriers[0];
        assert_eq!(barrier.old_layout(), vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(barrier.new_layout(), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(barrier.src_access(), vk::AccessFlags2::TRANSFER_WRITE);
        assert_eq!(dependency.src_stage, vk::PipelineStageFlags2::TRANSFER);
        assert_eq!(dependency.dst_stage, vk::PipelineStageFlags2::VERTEX_SHADER);
    }

    #[test]
    fn test_no_ledger_entries_no_barriers() {
        let mut resources = TaskResources::default();
        resources.add_buffer(vk::Buffer::from_raw(4), BufferUsageKind::ComputeWrite);
        resources.add_image(color_image(5), ImageUsageKind::ComputeReadWrite);

        let barriers = TaskBarriers::analyze(&ResourceUsageLedger::new(), &resources);
        assert!(!barriers.has_barriers());
        assert!(barriers.to_dependency().is_empty());
    }

    #[test]
    #[should_panic(expected = "conflicting layouts")]
    fn test_conflicting_image_layouts_panic() {
        let image = color_image(6);
        let mut resources = TaskResources::default();
        resources.add_image(image, ImageUsageKind::TransferSource);
        resources.add_image(image, ImageUsageKind::TransferDestination);
        TaskBarriers::analyze(&ResourceUsageLedger::new(), &resources);
    }
}
