//! Strata 工具集
//!
//! 目前只提供日志初始化，供各个 crate 的测试与上层应用共用。

pub mod init_log;
