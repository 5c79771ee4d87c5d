use ash::vk;

use crate::commands::barrier::GfxDependency;
use crate::commands::command_stream::{GfxCommandStream, GfxImageBlit, GfxRenderPassBeginInfo};

/// 被记录下来的一条命令
#[derive(Clone, Debug)]
pub enum GfxRecordedCommand {
    PipelineBarrier(GfxDependency),
    BeginRenderPass {
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_value_count: usize,
    },
    EndRenderPass,
    BlitImage(GfxImageBlit),
    BeginLabel(String),
    EndLabel,
    /// 调用方通过 [`GfxCommandRecorder::mark`] 插入的标记，用来代表 dispatch / draw / copy 等实际工作
    Marker(String),
}

/// 只在内存中记录命令的命令流
///
/// 不依赖任何 Vulkan device，用于检查同步层生成的命令序列，
/// 例如在 CI 中验证 barrier 的数量与顺序，或者把一帧的命令打印到日志中。
#[derive(Clone, Debug, Default)]
pub struct GfxCommandRecorder {
    commands: Vec<GfxRecordedCommand>,
}

impl GfxCommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条标记命令
    #[inline]
    pub fn mark(&mut self, name: impl Into<String>) {
        self.commands.push(GfxRecordedCommand::Marker(name.into()));
    }

    #[inline]
    pub fn commands(&self) -> &[GfxRecordedCommand] {
        &self.commands
    }

    /// 清空已经记录的命令，返回被清空的部分
    pub fn drain(&mut self) -> Vec<GfxRecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// 所有 pipeline barrier，按录制顺序
    pub fn barriers(&self) -> impl Iterator<Item = &GfxDependency> {
        self.commands.iter().filter_map(|cmd| match cmd {
            GfxRecordedCommand::PipelineBarrier(dependency) => Some(dependency),
            _ => None,
        })
    }

    /// 所有 blit，按录制顺序
    pub fn blits(&self) -> impl Iterator<Item = &GfxImageBlit> {
        self.commands.iter().filter_map(|cmd| match cmd {
            GfxRecordedCommand::BlitImage(blit) => Some(blit),
            _ => None,
        })
    }

    /// 所有标记的名字，按录制顺序
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            GfxRecordedCommand::Marker(name) => Some(name.as_str()),
            _ => None,
        })
    }

    #[inline]
    pub fn barrier_count(&self) -> usize {
        self.barriers().count()
    }
}

impl GfxCommandStream for GfxCommandRecorder {
    fn pipeline_barrier(&mut self, dependency: &GfxDependency) {
        if dependency.is_empty() {
            return;
        }
        self.commands.push(GfxRecordedCommand::PipelineBarrier(dependency.clone()));
    }

    fn begin_render_pass(&mut self, begin_info: &GfxRenderPassBeginInfo<'_>) {
        self.commands.push(GfxRecordedCommand::BeginRenderPass {
            render_pass: begin_info.render_pass,
            framebuffer: begin_info.framebuffer,
            render_area: begin_info.render_area,
            clear_value_count: begin_info.clear_values.len(),
        });
    }

    fn end_render_pass(&mut self) {
        self.commands.push(GfxRecordedCommand::EndRenderPass);
    }

    fn blit_image(&mut self, blit: &GfxImageBlit) {
        self.commands.push(GfxRecordedCommand::BlitImage(*blit));
    }

    fn begin_label(&mut self, label_name: &str, _label_color: glam::Vec4) {
        self.commands.push(GfxRecordedCommand::BeginLabel(label_name.to_string()));
    }

    fn end_label(&mut self) {
        self.commands.push(GfxRecordedCommand::EndLabel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::barrier::GfxBufferBarrier;
    use ash::vk::Handle;

    #[test]
    fn test_empty_barrier_is_not_recorded() {
        let mut recorder = GfxCommandRecorder::new();
        recorder.pipeline_barrier(&GfxDependency::new());
        assert_eq!(recorder.barrier_count(), 0);

        let mut dependency = GfxDependency::new();
        dependency.add_buffer_barrier(GfxBufferBarrier::new().buffer(vk::Buffer::from_raw(3), 0, vk::WHOLE_SIZE));
        recorder.pipeline_barrier(&dependency);
        assert_eq!(recorder.barrier_count(), 1);
    }

    #[test]
    fn test_commands_keep_recording_order() {
        let mut recorder = GfxCommandRecorder::new();
        recorder.begin_label("frame", glam::Vec4::ONE);
        recorder.mark("dispatch");
        recorder.end_label();

        let commands = recorder.drain();
        assert!(matches!(&commands[0], GfxRecordedCommand::BeginLabel(name) if name == "frame"));
        assert!(matches!(&commands[1], GfxRecordedCommand::Marker(name) if name == "dispatch"));
        assert!(matches!(commands[2], GfxRecordedCommand::EndLabel));
        assert!(recorder.commands().is_empty());
    }
}
