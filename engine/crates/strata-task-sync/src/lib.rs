//! 任务级的 GPU 资源同步
//!
//! 调用方按顺序提交任务（compute / graphics / transfer），每个任务声明自己以什么方式使用哪些
//! buffer 和 image。[`executor::TaskExecutor`] 根据 [`ledger::ResourceUsageLedger`] 中记录的上一次用途，
//! 在任务之前插入一次合并后的 pipeline barrier（包括 image 的 layout 转换），然后调用
//! 调用方的闭包录制真正的命令，最后更新账本。
//!
//! 模块依赖顺序：
//! - [`usage`]：用途到 access / stage / layout 的映射，以及 hazard 判断
//! - [`ledger`]：每个资源最近一次的用途
//! - [`task`]、[`barrier`]：任务描述，以及一个任务需要的所有 barrier
//! - [`executor`]、[`mips`]：录制命令

pub mod barrier;
pub mod executor;
pub mod ledger;
pub mod mips;
pub mod sync_debug;
pub mod task;
pub mod usage;

pub use executor::{TaskExecutor, TaskExecutorConfig};
pub use ledger::ResourceUsageLedger;
pub use task::{ComputeTaskParams, GraphicsTaskParams, TaskParams, TransferTaskParams};
pub use usage::{BufferUsageKind, ImageUsageKind};
