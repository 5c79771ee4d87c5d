use std::io::Write;

use anstyle::{AnsiColor, Color, RgbColor};

/// 初始化全局日志
///
/// 默认等级为 Info，可以通过 `RUST_LOG` 覆盖，例如 `RUST_LOG=strata_task_sync=trace`。
///
/// 可以重复调用：只有第一次调用会生效，之后的调用直接返回，方便每个测试都调用一次。
pub fn init_log() {
    init_log_with_level(log::LevelFilter::Info);
}

/// 以指定的默认等级初始化日志，`RUST_LOG` 依然优先
pub fn init_log_with_level(default_level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            let level_style = match record.level() {
                log::Level::Error => buf.default_level_style(log::Level::Error).fg_color(Some(Color::Ansi(AnsiColor::Red))),
                log::Level::Warn => buf.default_level_style(log::Level::Warn).fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
                log::Level::Info => buf.default_level_style(log::Level::Info).fg_color(Some(Color::Ansi(AnsiColor::Green))),
                level => buf.default_level_style(level),
            };
            let location_style = level_style.fg_color(Some(Color::Rgb(RgbColor(110, 110, 110))));
            let message_style = level_style.fg_color(Some(Color::Rgb(RgbColor(75, 75, 75))));

            let file = record.file().unwrap_or("").rsplit(['/', '\\']).next().unwrap_or("");
            let line = record.line().unwrap_or(!0);
            let time = chrono::Local::now().format("%H:%M:%S%.3f");

            writeln!(
                buf,
                "{level_style}[{time}] {:<5}{level_style:#} {location_style}[{file}:{line}]{location_style:#} \
                 {message_style}{}{message_style:#}",
                record.level(),
                record.args()
            )
        })
        .filter(None, default_level)
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_log_twice() {
        init_log();
        init_log_with_level(log::LevelFilter::Trace);
        log::info!("logger initialised twice without panicking");
    }
}
