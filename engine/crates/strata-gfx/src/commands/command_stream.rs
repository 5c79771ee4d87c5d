use ash::vk;

use crate::commands::barrier::GfxDependency;

/// `begin_render_pass` 需要的参数
#[derive(Clone, Copy)]
pub struct GfxRenderPassBeginInfo<'a> {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub render_area: vk::Rect2D,
    pub clear_values: &'a [vk::ClearValue],
}

/// 一次 image blit：单个 region，src 和 dst 可以是同一个 image 的不同 mip level
#[derive(Clone, Copy, Debug)]
pub struct GfxImageBlit {
    pub src_image: vk::Image,
    pub src_layout: vk::ImageLayout,
    pub dst_image: vk::Image,
    pub dst_layout: vk::ImageLayout,
    pub region: vk::ImageBlit,
    pub filter: vk::Filter,
}

/// 同步层对命令流的全部需求
///
/// 同步层只会通过这个 trait 录制 barrier、render pass、blit 和 debug label；
/// 真正的 dispatch / draw / copy 由调用方的闭包直接对具体类型录制。
///
/// 所有方法都假设命令流已经处于录制状态。
pub trait GfxCommandStream {
    /// 录制一条合并后的 pipeline barrier
    fn pipeline_barrier(&mut self, dependency: &GfxDependency);

    fn begin_render_pass(&mut self, begin_info: &GfxRenderPassBeginInfo<'_>);

    fn end_render_pass(&mut self);

    fn blit_image(&mut self, blit: &GfxImageBlit);

    fn begin_label(&mut self, label_name: &str, label_color: glam::Vec4);

    fn end_label(&mut self);
}
