use std::collections::HashMap;

use ash::vk;

use crate::usage::{BufferUsageKind, ImageUsageKind};

/// 记录每个资源最近一次被使用的方式
///
/// 只保存最后一次用途，不保存历史；一个资源在账本中没有记录，就表示它还没有被同步层使用过，
/// 下一次访问不需要 barrier。
///
/// 由于只保存最后一次用途，连续的不同读取之间不会插入 barrier，之后的写入也只等待最后一次读取的 stage。
/// 例如 `UniformSource` -> `ComputeRead` -> `TransferWrite`：写入前的 barrier 只等待 `COMPUTE_SHADER`，
/// 不等待 uniform 所在的 `FRAGMENT_SHADER`。需要同时覆盖两种读取时，在同一个任务中声明它们。
#[derive(Clone, Debug, Default)]
pub struct ResourceUsageLedger {
    buffers: HashMap<vk::Buffer, BufferUsageKind>,
    images: HashMap<vk::Image, ImageUsageKind>,
}

impl ResourceUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖 buffer 之前的记录
    #[inline]
    pub fn record_buffer_usage(&mut self, buffer: vk::Buffer, usage: BufferUsageKind) {
        self.buffers.insert(buffer, usage);
    }

    /// 覆盖 image 之前的记录
    #[inline]
    pub fn record_image_usage(&mut self, image: vk::Image, usage: ImageUsageKind) {
        self.images.insert(image, usage);
    }

    #[inline]
    pub fn last_buffer_usage(&self, buffer: vk::Buffer) -> Option<BufferUsageKind> {
        self.buffers.get(&buffer).copied()
    }

    #[inline]
    pub fn last_image_usage(&self, image: vk::Image) -> Option<ImageUsageKind> {
        self.images.get(&image).copied()
    }

    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn test_unknown_resource_has_no_usage() {
        let ledger = ResourceUsageLedger::new();
        assert_eq!(ledger.last_buffer_usage(vk::Buffer::from_raw(1)), None);
        assert_eq!(ledger.last_image_usage(vk::Image::from_raw(1)), None);
    }

    #[test]
    fn test_record_overwrites() {
        let mut ledger = ResourceUsageLedger::new();
        let buffer = vk::Buffer::from_raw(9);
        ledger.record_buffer_usage(buffer, BufferUsageKind::ComputeWrite);
        ledger.record_buffer_usage(buffer, BufferUsageKind::VertexSource);
        assert_eq!(ledger.last_buffer_usage(buffer), Some(BufferUsageKind::VertexSource));
        assert_eq!(ledger.buffer_count(), 1);
    }

    #[test]
    fn test_buffer_and_image_tables_are_separate() {
        let mut ledger = ResourceUsageLedger::new();
        ledger.record_buffer_usage(vk::Buffer::from_raw(5), BufferUsageKind::TransferWrite);
        ledger.record_image_usage(vk::Image::from_raw(5), ImageUsageKind::TransferDestination);
        assert_eq!(ledger.buffer_count(), 1);
        assert_eq!(ledger.image_count(), 1);
        assert_eq!(ledger.last_buffer_usage(vk::Buffer::from_raw(5)), Some(BufferUsageKind::TransferWrite));
        assert_eq!(ledger.last_image_usage(vk::Image::from_raw(5)), Some(ImageUsageKind::TransferDestination));
    }
    #[test]
    fn test_only_last_read_is_kept() {
        let mut ledger = ResourceUsageLedger::new();
        let buffer = vk::Buffer::from_raw(11);
        ledger.record_buffer_usage(buffer, BufferUsageKind::UniformSource);
        ledger.record_buffer_usage(buffer, BufferUsageKind::ComputeRead);

        let last = ledger.last_buffer_usage(buffer);
        let h = crate::usage::hazard(last, BufferUsageKind::TransferWrite).unwrap();
        assert_eq!(h.src.stage, vk::PipelineStageFlags2::COMPUTE_SHADER);
    }
}
