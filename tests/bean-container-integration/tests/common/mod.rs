//! 集成测试共用的工具

use bean_container::{BeanCatalog, Container, LoggingConfig};
use std::sync::Once;

/// 初始化测试日志（只执行一次）
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = LoggingConfig::testing().init();
    });
}

/// 使用指定目录创建容器
pub fn container_with(catalog: BeanCatalog) -> Container {
    init_logging();
    Container::builder().oracle(catalog).build().unwrap()
}
