//! 日志配置

use crate::errors::{BeanError, BeanResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 自定义过滤指令，优先于 `level` 与 `RUST_LOG`
    pub directives: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
    /// 是否写入测试输出（由 libtest 捕获）
    pub test_writer: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            directives: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
            test_writer: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            ..Self::default()
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            show_target: false,
            json_format: true,
            ..Self::default()
        }
    }

    /// 创建测试日志配置
    pub fn testing() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            test_writer: true,
            ..Self::default()
        }
    }

    /// 设置过滤指令
    #[must_use]
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// 初始化全局日志订阅者
    ///
    /// 全局订阅者只能设置一次，重复调用返回 [`BeanError::Config`]。
    pub fn init(&self) -> BeanResult<()> {
        let filter = match &self.directives {
            Some(directives) => EnvFilter::try_new(directives)
                .map_err(|e| BeanError::config(format!("日志过滤指令无效: {e}")))?,
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.to_string())),
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else if self.test_writer {
            subscriber.with_test_writer().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| BeanError::config(format!("日志初始化失败: {e}")))?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
