//! # Bean 事务追踪
//!
//! 用 [`Transaction`] 标记方法，由 [`TransactionWrapper`] 在调用前后开始、结束跨度。
//!
//! ```rust
//! use bean_tracing::{SpanHub, TransactionWrapper};
//! use std::sync::Arc;
//!
//! let hub = Arc::new(SpanHub::new());
//! let wrapper = TransactionWrapper::new(Arc::clone(&hub));
//! // container.add_method_wrapper(wrapper);
//! # drop(wrapper);
//! assert!(hub.current().is_none());
//! ```

pub mod configurator;
pub mod marker;
pub mod span;
pub mod wrapper;

pub use configurator::*;
pub use marker::*;
pub use span::*;
pub use wrapper::*;
