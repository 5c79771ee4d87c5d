use std::ffi::CString;

use ash::prelude::VkResult;
use ash::vk;

use crate::basic::color::LabelColor;
use crate::commands::barrier::GfxDependency;
use crate::commands::command_stream::{GfxCommandStream, GfxImageBlit, GfxRenderPassBeginInfo};

/// 命令缓冲封装
///
/// 封装 Vulkan CommandBuffer，提供类型安全的命令录制接口。
/// device 和 command pool 都由调用方创建和销毁，这里只持有 handle。
///
/// # 使用示例
///
/// 同步层只负责 barrier 和 render pass，dispatch / draw / copy 由任务闭包直接录制：
///
/// ```no_run
/// use ash::vk;
/// use strata_gfx::commands::command_buffer::GfxCommandBuffer;
///
/// fn record_cull(cmd: &GfxCommandBuffer, pipeline: vk::Pipeline, layout: vk::PipelineLayout, set: vk::DescriptorSet) {
///     cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, pipeline);
///     cmd.cmd_bind_descriptor_sets(vk::PipelineBindPoint::COMPUTE, layout, 0, &[set], None);
///     cmd.cmd_dispatch(glam::uvec3(64, 1, 1));
/// }
///
/// fn record_draw(cmd: &GfxCommandBuffer, vertices: vk::Buffer, indices: vk::Buffer, indirect: vk::Buffer, draw_count: u32) {
///     cmd.cmd_bind_vertex_buffers(0, &[vertices], &[0]);
///     cmd.cmd_bind_index_buffer(indices, 0, vk::IndexType::UINT32);
///     cmd.cmd_draw_indexed(36, 0, 1, 0, 0);
///     cmd.cmd_draw_indexed_indirect(indirect, 0, draw_count, size_of::<vk::DrawIndexedIndirectCommand>() as u32);
/// }
///
/// fn record_upload(cmd: &GfxCommandBuffer, staging: vk::Buffer, vertices: vk::Buffer, image: vk::Image, extent: vk::Extent3D) {
///     cmd.cmd_copy_buffer(staging, vertices, &[vk::BufferCopy { src_offset: 0, dst_offset: 0, size: 1024 }]);
///     let region = vk::BufferImageCopy::default()
///         .image_subresource(vk::ImageSubresourceLayers {
///             aspect_mask: vk::ImageAspectFlags::COLOR,
///             mip_level: 0,
///             base_array_layer: 0,
///             layer_count: 1,
///         })
///         .image_extent(extent);
///     cmd.cmd_copy_buffer_to_image(staging, image, &[region]);
/// }
/// ```
#[derive(Clone)]
pub struct GfxCommandBuffer {
    vk_handle: vk::CommandBuffer,
    device: ash::Device,
    debug_utils: Option<ash::ext::debug_utils::Device>,

    #[cfg(debug_assertions)]
    name: String,
}
// new & init
impl GfxCommandBuffer {
    /// 从 command pool 中分配一个 primary command buffer
    ///
    /// `debug_utils` 为 `None` 时所有 debug label 命令都会被忽略
    pub fn new(
        device: ash::Device,
        debug_utils: Option<ash::ext::debug_utils::Device>,
        command_pool: vk::CommandPool,
        debug_name: &str,
    ) -> VkResult<Self> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let vk_handle = unsafe { device.allocate_command_buffers(&info)? }[0];
        let cmd_buffer = Self::from_raw(device, debug_utils, vk_handle, debug_name);

        if let (Some(debug_utils), Ok(name)) = (&cmd_buffer.debug_utils, CString::new(debug_name)) {
            let name_info = vk::DebugUtilsObjectNameInfoEXT::default().object_handle(vk_handle).object_name(&name);
            unsafe { debug_utils.set_debug_utils_object_name(&name_info)? };
        }

        Ok(cmd_buffer)
    }

    /// 包装一个已经分配好的 command buffer
    pub fn from_raw(
        device: ash::Device,
        debug_utils: Option<ash::ext::debug_utils::Device>,
        vk_handle: vk::CommandBuffer,
        debug_name: &str,
    ) -> Self {
        #[cfg(not(debug_assertions))]
        let _ = debug_name;

        Self {
            vk_handle,
            device,
            debug_utils,

            #[cfg(debug_assertions)]
            name: debug_name.to_string(),
        }
    }
}
// Basic 命令
impl GfxCommandBuffer {
    /// 开始录制 command
    ///
    /// 自动设置 debug label
    #[inline]
    pub fn begin(&mut self, usage_flag: vk::CommandBufferUsageFlags, debug_label_name: &str) -> VkResult<()> {
        unsafe {
            self.device
                .begin_command_buffer(self.vk_handle, &vk::CommandBufferBeginInfo::default().flags(usage_flag))?;
        }
        self.begin_label(debug_label_name, LabelColor::COLOR_CMD);
        Ok(())
    }

    /// 结束录制 command
    ///
    /// 结束 debug label
    #[inline]
    pub fn end(&mut self) -> VkResult<()> {
        self.end_label();
        unsafe { self.device.end_command_buffer(self.vk_handle) }
    }
}
// getters
impl GfxCommandBuffer {
    /// getter
    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }

    #[cfg(debug_assertions)]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}
// 数据传输类型
impl GfxCommandBuffer {
    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, regions: &[vk::BufferCopy]) {
        unsafe {
            self.device.cmd_copy_buffer(self.vk_handle, src, dst, regions);
        }
    }

    /// dst image 需要处于 `TRANSFER_DST_OPTIMAL`
    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer_to_image(&self, src: vk::Buffer, dst: vk::Image, regions: &[vk::BufferImageCopy]) {
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                self.vk_handle,
                src,
                dst,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                regions,
            );
        }
    }
}
// 绘制类型的命令
impl GfxCommandBuffer {
    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_draw_indexed(
        &self,
        index_cnt: u32,
        first_index: u32,
        instance_cnt: u32,
        first_instance: u32,
        vertex_offset: i32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                self.vk_handle,
                index_cnt,
                instance_cnt,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_draw_indexed_indirect(&self, buffer: vk::Buffer, offset: vk::DeviceSize, draw_count: u32, stride: u32) {
        unsafe {
            self.device.cmd_draw_indexed_indirect(self.vk_handle, buffer, offset, draw_count, stride);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        pipeline_layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: Option<&[u32]>,
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.vk_handle,
                bind_point,
                pipeline_layout,
                first_set,
                descriptor_sets,
                dynamic_offsets.unwrap_or(&[]),
            );
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            self.device.cmd_bind_pipeline(self.vk_handle, bind_point, pipeline);
        }
    }

    /// buffers 每个 vertex buffer 以及 offset
    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_bind_vertex_buffers(&self, first_bind: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        unsafe {
            self.device.cmd_bind_vertex_buffers(self.vk_handle, first_bind, buffers, offsets);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_bind_index_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize, index_type: vk::IndexType) {
        unsafe {
            self.device.cmd_bind_index_buffer(self.vk_handle, buffer, offset, index_type);
        }
    }
}
// 计算着色器相关命令
impl GfxCommandBuffer {
    /// - command type: action
    /// - supported queue types: compute
    #[inline]
    pub fn cmd_dispatch(&self, group_cnt: glam::UVec3) {
        unsafe {
            self.device.cmd_dispatch(self.vk_handle, group_cnt.x, group_cnt.y, group_cnt.z);
        }
    }
}
impl GfxCommandStream for GfxCommandBuffer {
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    fn pipeline_barrier(&mut self, dependency: &GfxDependency) {
        if dependency.is_empty() {
            return;
        }

        let buffer_barriers = dependency.vk_buffer_barriers();
        let image_barriers = dependency.vk_image_barriers();
        let dependency_info = vk::DependencyInfo::default()
            .buffer_memory_barriers(&buffer_barriers)
            .image_memory_barriers(&image_barriers);
        unsafe {
            self.device.cmd_pipeline_barrier2(self.vk_handle, &dependency_info);
        }
    }

    /// - command type: action, state
    /// - supported queue types: graphics
    fn begin_render_pass(&mut self, begin_info: &GfxRenderPassBeginInfo<'_>) {
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(begin_info.render_pass)
            .framebuffer(begin_info.framebuffer)
            .render_area(begin_info.render_area)
            .clear_values(begin_info.clear_values);
        unsafe {
            self.device.cmd_begin_render_pass(self.vk_handle, &info, vk::SubpassContents::INLINE);
        }
    }

    /// - command type: action, state
    /// - supported queue types: graphics
    fn end_render_pass(&mut self) {
        unsafe {
            self.device.cmd_end_render_pass(self.vk_handle);
        }
    }

    /// - command type: action
    /// - supported queue types: graphics
    fn blit_image(&mut self, blit: &GfxImageBlit) {
        unsafe {
            self.device.cmd_blit_image(
                self.vk_handle,
                blit.src_image,
                blit.src_layout,
                blit.dst_image,
                blit.dst_layout,
                std::slice::from_ref(&blit.region),
                blit.filter,
            );
        }
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    fn begin_label(&mut self, label_name: &str, label_color: glam::Vec4) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let Ok(name) = CString::new(label_name) else {
            log::warn!("debug label contains a nul byte, skipped: {label_name:?}");
            return;
        };
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(
                self.vk_handle,
                &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()).color(label_color.into()),
            );
        }
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    fn end_label(&mut self) {
        if let Some(debug_utils) = &self.debug_utils {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.vk_handle);
            }
        }
    }
}
