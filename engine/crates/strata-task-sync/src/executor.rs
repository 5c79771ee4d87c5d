use strata_gfx::basic::color::LabelColor;
use strata_gfx::commands::command_stream::{GfxCommandStream, GfxRenderPassBeginInfo};

use crate::barrier::TaskBarriers;
use crate::ledger::ResourceUsageLedger;
use crate::sync_debug;
use crate::task::TaskParams;

/// executor 的配置
#[derive(Clone, Copy, Debug)]
pub struct TaskExecutorConfig {
    /// 是否为每个任务插入 debug label
    pub debug_labels: bool,
}

impl Default for TaskExecutorConfig {
    fn default() -> Self {
        Self { debug_labels: true }
    }
}

/// 按提交顺序执行任务，并在每个任务之前插入所需的 barrier
///
/// 每个 executor 拥有一个 [`ResourceUsageLedger`]，所有任务都录制到同一条命令流中。
/// 任务之间不会重排，executor 也不会创建或销毁任何资源。
///
/// 一帧的典型用法：
/// 1. [`Self::set_command_stream`] 绑定这一帧的命令流
/// 2. 多次调用 [`Self::execute_task`]
/// 3. [`Self::take_command_stream`] 取回命令流并提交
pub struct TaskExecutor<S: GfxCommandStream> {
    stream: Option<S>,
    ledger: ResourceUsageLedger,
    config: TaskExecutorConfig,
}

impl<S: GfxCommandStream> Default for TaskExecutor<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GfxCommandStream> TaskExecutor<S> {
    pub fn new() -> Self {
        Self::with_config(TaskExecutorConfig::default())
    }

    pub fn with_config(config: TaskExecutorConfig) -> Self {
        Self {
            stream: None,
            ledger: ResourceUsageLedger::new(),
            config,
        }
    }

    /// 使用已有的账本，例如资源在 executor 之外完成了上传
    pub fn with_ledger(mut self, ledger: ResourceUsageLedger) -> Self {
        self.ledger = ledger;
        self
    }

    #[inline]
    pub fn config(&self) -> &TaskExecutorConfig {
        &self.config
    }

    /// 绑定之后任务录制的目标命令流，返回之前绑定的命令流
    pub fn set_command_stream(&mut self, stream: S) -> Option<S> {
        self.stream.replace(stream)
    }

    #[inline]
    pub fn command_stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    #[inline]
    pub fn command_stream_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    /// 解除绑定并取回命令流
    #[inline]
    pub fn take_command_stream(&mut self) -> Option<S> {
        self.stream.take()
    }

    #[inline]
    pub fn ledger(&self) -> &ResourceUsageLedger {
        &self.ledger
    }

    #[inline]
    pub fn ledger_mut(&mut self) -> &mut ResourceUsageLedger {
        &mut self.ledger
    }

    /// 需要 label 时返回 label 的名字
    pub(crate) fn label_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        (self.config.debug_labels && !name.is_empty()).then_some(name)
    }

    /// # Panics
    /// 没有绑定命令流
    pub(crate) fn bound_stream(&mut self) -> &mut S {
        match self.stream.as_mut() {
            Some(stream) => stream,
            None => panic!("no command stream is bound, call set_command_stream first"),
        }
    }

    /// 执行一个任务
    ///
    /// 1. 对照账本分析任务声明的所有资源，合并为一次 barrier
    /// 2. graphics 任务开始 render pass
    /// 3. 调用 `work` 录制真正的 dispatch / draw / copy 命令
    /// 4. graphics 任务结束 render pass
    /// 5. 更新账本
    ///
    /// # Panics
    /// - 没有绑定命令流
    /// - graphics 任务缺少 render pass 或 framebuffer
    /// - 同一个 image 在任务中要求了不同的 layout
    pub fn execute_task<F>(&mut self, params: impl Into<TaskParams>, work: F)
    where
        F: FnOnce(&mut S),
    {
        let params = params.into();
        params.validate();

        let resources = params.resources();
        let barriers = TaskBarriers::analyze(&self.ledger, &resources);
        sync_debug::log_task_barriers(params.name(), &barriers);

        let label = self.label_name(params.name());
        let stream = self.bound_stream();

        if let Some(label) = label {
            stream.begin_label(label, LabelColor::COLOR_TASK);
        }
        if barriers.has_barriers() {
            stream.pipeline_barrier(&barriers.to_dependency());
        }

        match &params {
            TaskParams::Graphics(graphics) => {
                stream.begin_render_pass(&GfxRenderPassBeginInfo {
                    render_pass: graphics.render_pass,
                    framebuffer: graphics.framebuffer,
                    render_area: graphics.render_area,
                    clear_values: &graphics.clear_values,
                });
                work(stream);
                stream.end_render_pass();
            }
            TaskParams::Compute(_) | TaskParams::Transfer(_) => work(stream),
        }

        if label.is_some() {
            stream.end_label();
        }

        for (buffer, usage) in resources.final_buffer_usages() {
            log::trace!("[task \"{}\"] buffer {:?} -> {:?}", params.name(), buffer, usage);
            self.ledger.record_buffer_usage(buffer, usage);
        }
        for (image, usage) in resources.final_image_usages() {
            log::trace!("[task \"{}\"] image {:?} -> {:?}", params.name(), image, usage);
            self.ledger.record_image_usage(image, usage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk;
    use crate::task::{ComputeTaskParams, GraphicsTaskParams, TransferTaskParams};
    use crate::usage::{BufferUsageKind, ImageUsageKind};
    use ash::vk::Handle;
    use strata_gfx::commands::recorder::{GfxCommandRecorder, GfxRecordedCommand};
    use strata_gfx::resources::image::GfxImageInfo;

    fn executor() -> TaskExecutor<GfxCommandRecorder> {
        let mut executor = TaskExecutor::new();
        executor.set_command_stream(GfxCommandRecorder::new());
        executor
    }

    fn recorder(executor: &TaskExecutor<GfxCommandRecorder>) -> &GfxCommandRecorder {
        executor.command_stream().unwrap()
    }

    #[test]
    fn test_set_command_stream_returns_previous() {
        let mut executor = executor();
        executor.command_stream_mut().unwrap().mark("old");
        let previous = executor.set_command_stream(GfxCommandRecorder::new()).unwrap();
        assert_eq!(previous.markers().collect::<Vec<_>>(), vec!["old"]);
        assert!(recorder(&executor).commands().is_empty());
    }

    #[test]
    fn test_task_is_wrapped_in_label() {
        let mut executor = executor();
        executor.execute_task(ComputeTaskParams::new("cull"), |s| s.mark("dispatch"));

        let commands = recorder(&executor).commands();
        assert!(matches!(&commands[0], GfxRecordedCommand::BeginLabel(name) if name == "cull"));
        assert!(matches!(&commands[1], GfxRecordedCommand::Marker(name) if name == "dispatch"));
        assert!(matches!(commands[2], GfxRecordedCommand::EndLabel));
    }

    #[test]
    fn test_labels_can_be_disabled() {
        let mut executor = TaskExecutor::with_config(TaskExecutorConfig { debug_labels: false });
        executor.set_command_stream(GfxCommandRecorder::new());
        executor.execute_task(TransferTaskParams::new("upload"), |s| s.mark("copy"));
        assert_eq!(recorder(&executor).commands().len(), 1);
    }

    #[test]
    fn test_barrier_precedes_work() {
        let buffer = vk::Buffer::from_raw(1);
        let mut executor = executor();
        executor.execute_task(TransferTaskParams::new("upload").output_buffers([buffer]), |s| s.mark("copy"));
        executor.execute_task(ComputeTaskParams::new("consume").input_buffers([buffer]), |s| s.mark("dispatch"));

        let commands = recorder(&executor).commands();
        let barrier_pos = commands.iter().position(|c| matches!(c, GfxRecordedCommand::PipelineBarrier(_))).unwrap();
        let dispatch_pos =
            commands.iter().position(|c| matches!(c, GfxRecordedCommand::Marker(name) if name == "dispatch")).unwrap();
        assert!(barrier_pos < dispatch_pos);
        assert_eq!(recorder(&executor).barrier_count(), 1);
        assert_eq!(executor.ledger().last_buffer_usage(buffer), Some(BufferUsageKind::ComputeRead));
    }

    #[test]
    fn test_graphics_task_render_pass_wraps_work() {
        let mut executor = TaskExecutor::with_config(TaskExecutorConfig { debug_labels: false });
        executor.set_command_stream(GfxCommandRecorder::new());
        let params = GraphicsTaskParams::new(
            "opaque",
            vk::RenderPass::from_raw(7),
            vk::Framebuffer::from_raw(8),
            vk::Rect2D::default(),
        )
        .clear_values([vk::ClearValue::default()]);
        executor.execute_task(params, |s| s.mark("draw"));

        let commands = recorder(&executor).commands();
        assert!(matches!(
            commands[0],
            GfxRecordedCommand::BeginRenderPass { clear_value_count: 1, .. }
        ));
        assert!(matches!(&commands[1], GfxRecordedCommand::Marker(name) if name == "draw"));
        assert!(matches!(commands[2], GfxRecordedCommand::EndRenderPass));
    }

    #[test]
    fn test_compute_output_image_is_recorded_as_general() {
        let image = GfxImageInfo::new(vk::Image::from_raw(3), vk::Format::R8G8B8A8_UNORM, 1);
        let mut executor = executor();
        executor.execute_task(ComputeTaskParams::new("gen").output_images([image]), |_| {});

        assert_eq!(recorder(&executor).barrier_count(), 0);
        assert_eq!(executor.ledger().last_image_usage(image.image), Some(ImageUsageKind::ComputeReadWrite));
    }

    #[test]
    fn test_with_ledger_uses_seeded_usages() {
        let buffer = vk::Buffer::from_raw(9);
        let mut ledger = ResourceUsageLedger::new();
        ledger.record_buffer_usage(buffer, BufferUsageKind::TransferWrite);

        let mut executor = TaskExecutor::with_config(TaskExecutorConfig { debug_labels: false }).with_ledger(ledger);
        assert!(!executor.config().debug_labels);
        executor.set_command_stream(GfxCommandRecorder::new());
        executor.execute_task(ComputeTaskParams::new("read").input_buffers([buffer]), |_| {});

        assert_eq!(recorder(&executor).barrier_count(), 1);
        let barrier = recorder(&executor).barriers().next().unwrap().buffer_barriers[0];
        assert_eq!(barrier.src_access(), vk::AccessFlags2::TRANSFER_WRITE);
        assert_eq!(barrier.dst_access(), vk::AccessFlags2::SHADER_READ);
    }

    #[test]
    #[should_panic(expected = "no command stream is bound")]
    fn test_execute_without_stream_panics() {
        let mut executor = TaskExecutor::<GfxCommandRecorder>::new();
        executor.execute_task(ComputeTaskParams::new("orphan"), |_| {});
    }
}
