//! 任务描述：三种任务形态，以及每种形态下资源的角色
//!
//! 任务只描述 "用到了哪些资源、以什么方式用"，真正的命令由调用方在闭包中录制。

use ash::vk;
use indexmap::IndexMap;

use strata_gfx::resources::image::GfxImageInfo;

use crate::usage::{BufferUsageKind, ImageUsageKind, resolve_final_usage};

/// compute dispatch 批次
#[derive(Clone, Debug, Default)]
pub struct ComputeTaskParams {
    pub name: String,
    /// `ComputeRead`
    pub input_buffers: Vec<vk::Buffer>,
    /// `ComputeWrite`
    pub output_buffers: Vec<vk::Buffer>,
    /// 同时读写，等价于同一个 buffer 既是 `ComputeRead` 又是 `ComputeWrite`
    pub input_output_buffers: Vec<vk::Buffer>,
    /// `ComputeReadWrite`，layout 为 `GENERAL`
    pub output_images: Vec<GfxImageInfo>,
}

impl ComputeTaskParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// builder
    pub fn input_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.input_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn output_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.output_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn input_output_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.input_output_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn output_images(mut self, images: impl IntoIterator<Item = GfxImageInfo>) -> Self {
        self.output_images.extend(images);
        self
    }
}

/// 一个 render pass 内的 draw 批次
#[derive(Clone)]
pub struct GraphicsTaskParams {
    pub name: String,
    pub indirect_buffers: Vec<vk::Buffer>,
    pub index_buffers: Vec<vk::Buffer>,
    pub vertex_buffers: Vec<vk::Buffer>,
    pub uniform_buffers: Vec<vk::Buffer>,
    /// 在 shader 中采样，layout 为 `SHADER_READ_ONLY_OPTIMAL`
    pub input_images: Vec<GfxImageInfo>,

    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub render_area: vk::Rect2D,
    pub clear_values: Vec<vk::ClearValue>,
}

impl GraphicsTaskParams {
    pub fn new(
        name: impl Into<String>,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
    ) -> Self {
        Self {
            name: name.into(),
            indirect_buffers: Vec::new(),
            index_buffers: Vec::new(),
            vertex_buffers: Vec::new(),
            uniform_buffers: Vec::new(),
            input_images: Vec::new(),
            render_pass,
            framebuffer,
            render_area,
            clear_values: Vec::new(),
        }
    }

    /// builder
    pub fn indirect_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.indirect_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn index_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.index_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn vertex_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.vertex_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn uniform_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.uniform_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn input_images(mut self, images: impl IntoIterator<Item = GfxImageInfo>) -> Self {
        self.input_images.extend(images);
        self
    }

    /// builder
    pub fn clear_values(mut self, clear_values: impl IntoIterator<Item = vk::ClearValue>) -> Self {
        self.clear_values.extend(clear_values);
        self
    }
}

// vk::ClearValue 是 union，只打印数量
impl std::fmt::Debug for GraphicsTaskParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsTaskParams")
            .field("name", &self.name)
            .field("indirect_buffers", &self.indirect_buffers)
            .field("index_buffers", &self.index_buffers)
            .field("vertex_buffers", &self.vertex_buffers)
            .field("uniform_buffers", &self.uniform_buffers)
            .field("input_images", &self.input_images)
            .field("render_pass", &self.render_pass)
            .field("framebuffer", &self.framebuffer)
            .field("render_area", &self.render_area)
            .field("clear_values", &self.clear_values.len())
            .finish()
    }
}

/// copy / blit 批次
#[derive(Clone, Debug, Default)]
pub struct TransferTaskParams {
    pub name: String,
    pub input_buffers: Vec<vk::Buffer>,
    pub output_buffers: Vec<vk::Buffer>,
    /// `TRANSFER_SRC_OPTIMAL`
    pub input_images: Vec<GfxImageInfo>,
    /// `TRANSFER_DST_OPTIMAL`
    pub output_images: Vec<GfxImageInfo>,
}

impl TransferTaskParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// builder
    pub fn input_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.input_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn output_buffers(mut self, buffers: impl IntoIterator<Item = vk::Buffer>) -> Self {
        self.output_buffers.extend(buffers);
        self
    }

    /// builder
    pub fn input_images(mut self, images: impl IntoIterator<Item = GfxImageInfo>) -> Self {
        self.input_images.extend(images);
        self
    }

    /// builder
    pub fn output_images(mut self, images: impl IntoIterator<Item = GfxImageInfo>) -> Self {
        self.output_images.extend(images);
        self
    }
}

/// 任务的三种形态
#[derive(Clone, Debug)]
pub enum TaskParams {
    Compute(ComputeTaskParams),
    Graphics(GraphicsTaskParams),
    Transfer(TransferTaskParams),
}

impl From<ComputeTaskParams> for TaskParams {
    fn from(params: ComputeTaskParams) -> Self {
        Self::Compute(params)
    }
}

impl From<GraphicsTaskParams> for TaskParams {
    fn from(params: GraphicsTaskParams) -> Self {
        Self::Graphics(params)
    }
}

impl From<TransferTaskParams> for TaskParams {
    fn from(params: TransferTaskParams) -> Self {
        Self::Transfer(params)
    }
}

impl TaskParams {
    pub fn name(&self) -> &str {
        match self {
            Self::Compute(params) => &params.name,
            Self::Graphics(params) => &params.name,
            Self::Transfer(params) => &params.name,
        }
    }

    /// 检查任务参数是否完整
    ///
    /// # Panics
    /// graphics 任务缺少 render pass 或 framebuffer
    pub fn validate(&self) {
        if let Self::Graphics(params) = self {
            assert_ne!(
                params.render_pass,
                vk::RenderPass::null(),
                "graphics task `{}` has no render pass",
                params.name
            );
            assert_ne!(
                params.framebuffer,
                vk::Framebuffer::null(),
                "graphics task `{}` has no framebuffer",
                params.name
            );
        }
    }

    /// 把每个角色展开为资源的用途
    pub fn resources(&self) -> TaskResources {
        let mut resources = TaskResources::default();
        match self {
            Self::Compute(params) => {
                resources.add_buffers(&params.input_buffers, BufferUsageKind::ComputeRead);
                resources.add_buffers(&params.output_buffers, BufferUsageKind::ComputeWrite);
                resources.add_buffers(&params.input_output_buffers, BufferUsageKind::ComputeRead);
                resources.add_buffers(&params.input_output_buffers, BufferUsageKind::ComputeWrite);
                resources.add_images(&params.output_images, ImageUsageKind::ComputeReadWrite);
            }
            Self::Graphics(params) => {
                resources.add_buffers(&params.indirect_buffers, BufferUsageKind::IndirectDrawSource);
                resources.add_buffers(&params.index_buffers, BufferUsageKind::IndexSource);
                resources.add_buffers(&params.vertex_buffers, BufferUsageKind::VertexSource);
                resources.add_buffers(&params.uniform_buffers, BufferUsageKind::UniformSource);
                resources.add_images(&params.input_images, ImageUsageKind::GraphicsSampledRead);
            }
            Self::Transfer(params) => {
                resources.add_buffers(&params.input_buffers, BufferUsageKind::TransferRead);
                resources.add_buffers(&params.output_buffers, BufferUsageKind::TransferWrite);
                resources.add_images(&params.input_images, ImageUsageKind::TransferSource);
                resources.add_images(&params.output_images, ImageUsageKind::TransferDestination);
            }
        }
        resources
    }
}

/// 一个任务用到的所有资源，以及每个资源在任务中的全部用途
///
/// 按资源第一次出现的顺序排列，保证生成的 barrier 顺序稳定。
#[derive(Clone, Debug, Default)]
pub struct TaskResources {
    pub buffers: IndexMap<vk::Buffer, Vec<BufferUsageKind>>,
    pub images: IndexMap<vk::Image, (GfxImageInfo, Vec<ImageUsageKind>)>,
}

impl TaskResources {
    pub fn add_buffer(&mut self, buffer: vk::Buffer, kind: BufferUsageKind) {
        self.buffers.entry(buffer).or_default().push(kind);
    }

    pub fn add_image(&mut self, image: GfxImageInfo, kind: ImageUsageKind) {
        self.images.entry(image.image).or_insert_with(|| (image, Vec::new())).1.push(kind);
    }

    fn add_buffers(&mut self, buffers: &[vk::Buffer], kind: BufferUsageKind) {
        for buffer in buffers {
            self.add_buffer(*buffer, kind);
        }
    }

    fn add_images(&mut self, images: &[GfxImageInfo], kind: ImageUsageKind) {
        for image in images {
            self.add_image(*image, kind);
        }
    }

    /// 任务结束后每个 buffer 应该记录的用途
    pub fn final_buffer_usages(&self) -> impl Iterator<Item = (vk::Buffer, BufferUsageKind)> + '_ {
        self.buffers
            .iter()
            .filter_map(|(buffer, kinds)| resolve_final_usage(kinds).map(|kind| (*buffer, kind)))
    }

    /// 任务结束后每个 image 应该记录的用途
    pub fn final_image_usages(&self) -> impl Iterator<Item = (vk::Image, ImageUsageKind)> + '_ {
        self.images
            .iter()
            .filter_map(|(image, (_, kinds))| resolve_final_usage(kinds).map(|kind| (*image, kind)))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty() && self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn test_compute_roles() {
        let a = vk::Buffer::from_raw(1);
        let b = vk::Buffer::from_raw(2);
        let image = GfxImageInfo::new(vk::Image::from_raw(3), vk::Format::R32_SFLOAT, 1);
        let params: TaskParams = ComputeTaskParams::new("cull")
            .input_buffers([a])
            .input_output_buffers([b])
            .output_images([image])
            .into();

        let resources = params.resources();
        assert_eq!(resources.buffers[&a], vec![BufferUsageKind::ComputeRead]);
        assert_eq!(resources.buffers[&b], vec![BufferUsageKind::ComputeRead, BufferUsageKind::ComputeWrite]);
        assert_eq!(resources.images[&image.image].1, vec![ImageUsageKind::ComputeReadWrite]);

        let finals = resources.final_buffer_usages().collect::<Vec<_>>();
        assert_eq!(finals, vec![(a, BufferUsageKind::ComputeRead), (b, BufferUsageKind::ComputeWrite)]);
        assert_eq!(params.name(), "cull");
    }

    #[test]
    fn test_graphics_roles_keep_declaration_order() {
        let vertex = vk::Buffer::from_raw(10);
        let index = vk::Buffer::from_raw(11);
        let params: TaskParams = GraphicsTaskParams::new(
            "opaque",
            vk::RenderPass::from_raw(1),
            vk::Framebuffer::from_raw(1),
            vk::Rect2D::default(),
        )
        .vertex_buffers([vertex])
        .index_buffers([index])
        .into();

        params.validate();
        // index 角色先于 vertex 角色展开
        let order = params.resources().buffers.keys().copied().collect::<Vec<_>>();
        assert_eq!(order, vec![index, vertex]);
    }

    #[test]
    #[should_panic(expected = "has no framebuffer")]
    fn test_graphics_without_framebuffer_panics() {
        let params: TaskParams = GraphicsTaskParams::new(
            "broken",
            vk::RenderPass::from_raw(1),
            vk::Framebuffer::null(),
            vk::Rect2D::default(),
        )
        .into();
        params.validate();
    }

    #[test]
    fn test_empty_transfer_task() {
        let params: TaskParams = TransferTaskParams::new("noop").into();
        params.validate();
        assert!(params.resources().is_empty());
    }
}
