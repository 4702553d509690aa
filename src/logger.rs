use std::io::Write;

use chrono::Local;
use log::LevelFilter;

/// 解析日志级别：参数优先，其次 RUST_LOG，默认 Info
pub fn resolve_level(level: Option<&str>) -> LevelFilter {
    level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info)
}

/// 初始化日志，重复调用时保持第一次的设置
pub fn init_logging(level: Option<&str>) {
    let log_level = resolve_level(level);
    let result = env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5}] {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
    if result.is_ok() {
        log::info!("日志已初始化 (级别: {})", log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(resolve_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(resolve_level(Some("WARN")), LevelFilter::Warn);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(Some("error"));
        init_logging(Some("trace"));
    }
}
