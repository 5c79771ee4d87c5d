//! Vulkan 命令录制抽象层
//!
//! 对 `ash` 做一层薄封装：barrier builder、命令流 trait [`commands::command_stream::GfxCommandStream`]、
//! 基于 `ash::Device` 的命令缓冲 [`commands::command_buffer::GfxCommandBuffer`]，
//! 以及只在内存中记录命令的 [`commands::recorder::GfxCommandRecorder`]。
//!
//! 这一层不负责任何资源的创建和销毁，所有 handle 都由调用方持有。

pub mod basic;
pub mod commands;
pub mod resources;
