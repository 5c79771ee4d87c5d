//! 通过逐级 blit 生成完整的 mip 链

use ash::vk;

use strata_gfx::basic::color::LabelColor;
use strata_gfx::commands::barrier::{GfxDependency, GfxImageBarrier};
use strata_gfx::commands::command_stream::{GfxCommandStream, GfxImageBlit};
use strata_gfx::resources::image::{GfxImageInfo, mip_extent};

use crate::executor::TaskExecutor;
use crate::usage::{ImageUsageKind, SyncInfo, dst_sync_info, hazard};

/// 只包含一个 image barrier 的 dependency
fn single_image_dependency(barrier: GfxImageBarrier) -> GfxDependency {
    let mut dependency = GfxDependency::new();
    dependency.add_image_barrier(barrier);
    dependency
}

/// blit 区域：整个 `mip_level - 1` 级缩放到整个 `mip_level` 级
fn mip_blit_region(image: &GfxImageInfo, base_extent: vk::Extent2D, mip_level: u32) -> vk::ImageBlit {
    let src_extent = mip_extent(base_extent, mip_level - 1);
    let dst_extent = mip_extent(base_extent, mip_level);
    vk::ImageBlit {
        src_subresource: image.mip_subresource_layers(mip_level - 1),
        src_offsets: [
            vk::Offset3D::default(),
            vk::Offset3D {
                x: src_extent.width as i32,
                y: src_extent.height as i32,
                z: 1,
            },
        ],
        dst_subresource: image.mip_subresource_layers(mip_level),
        dst_offsets: [
            vk::Offset3D::default(),
            vk::Offset3D {
                x: dst_extent.width as i32,
                y: dst_extent.height as i32,
                z: 1,
            },
        ],
    }
}

impl<S: GfxCommandStream> TaskExecutor<S> {
    /// 根据第 0 级的内容生成其余所有 mip level
    ///
    /// 结束后整个 image 处于 `TRANSFER_SRC_OPTIMAL`，账本记录为 [`ImageUsageKind::TransferSource`]。
    /// 每一级都依赖上一级的结果，所以各级之间严格串行。
    ///
    /// 第 0 级的内容必须已经登记在账本中：通过 [`TaskExecutor::execute_task`] 完成上传，
    /// 或者在 executor 之外上传后用 [`TaskExecutor::ledger_mut`] 记录。账本中没有记录的 image
    /// 会从 `UNDEFINED` 转换，第 0 级的内容随之丢弃，只会打印一条警告。
    ///
    /// # Panics
    /// 没有绑定命令流
    pub fn generate_image_mips(&mut self, image: &GfxImageInfo, base_extent: vk::Extent2D) {
        let last = self.ledger().last_image_usage(image.image);
        let label = self.label_name("generate_image_mips");
        let stream = self.bound_stream();

        if let Some(label) = label {
            stream.begin_label(label, LabelColor::COLOR_MIPS);
        }

        // 1. 整个 image 转换到 TRANSFER_SRC_OPTIMAL
        let to_src = dst_sync_info(ImageUsageKind::TransferSource);
        let from = match last {
            Some(ImageUsageKind::TransferSource) => None,
            Some(last) => hazard(Some(last), ImageUsageKind::TransferSource).map(|h| h.src),
            None => {
                log::warn!(
                    "image {:?} has no recorded usage before mip generation, its contents are treated as undefined",
                    image.image
                );
                Some(SyncInfo {
                    access: vk::AccessFlags2::NONE,
                    stage: vk::PipelineStageFlags2::TOP_OF_PIPE,
                    layout: Some(vk::ImageLayout::UNDEFINED),
                })
            }
        };
        if let Some(from) = from {
            stream.pipeline_barrier(&single_image_dependency(
                GfxImageBarrier::new()
                    .image(image.image)
                    .image_aspect_flag(image.aspect())
                    .layout_transfer(
                        from.layout.unwrap_or(vk::ImageLayout::UNDEFINED),
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    )
                    .src_mask(from.stage, from.access)
                    .dst_mask(to_src.stage, to_src.access),
            ));
        }

        // 2. 逐级 blit
        for mip_level in 1..image.mip_levels {
            let level_barrier = GfxImageBarrier::new()
                .image(image.image)
                .image_aspect_flag(image.aspect())
                .mip_levels(mip_level, 1);

            // 丢弃当前级的内容；src stage 与上面的整体转换相连
            stream.pipeline_barrier(&single_image_dependency(
                level_barrier
                    .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::NONE)
                    .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE),
            ));

            stream.blit_image(&GfxImageBlit {
                src_image: image.image,
                src_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst_image: image.image,
                dst_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                region: mip_blit_region(image, base_extent, mip_level),
                filter: vk::Filter::LINEAR,
            });

            // 下一级 blit 会读取这一级
            stream.pipeline_barrier(&single_image_dependency(
                level_barrier
                    .layout_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                    .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
                    .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_READ),
            ));
        }

        if label.is_some() {
            stream.end_label();
        }

        // 3. 整个 image 都处于 TRANSFER_SRC_OPTIMAL
        self.ledger_mut().record_image_usage(image.image, ImageUsageKind::TransferSource);
    }
}
