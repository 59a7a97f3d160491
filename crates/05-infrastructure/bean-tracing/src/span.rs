//! 跨度与跨度中心
//!
//! 跨度没有父级时就是一个事务。绑定到作用域的跨度压入当前线程的作用域栈，
//! 栈顶即“当前跨度”；结束的跨度统一记录在 [`SpanHub`] 中。

use crate::configurator::SpanOptions;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;
use uuid::Uuid;

/// 跨度结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanStatus {
    /// 调用成功
    Ok,
    /// 调用失败
    InternalError,
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::InternalError => f.write_str("internal_error"),
        }
    }
}

#[derive(Debug, Default)]
struct SpanState {
    finished_at: Option<DateTime<Utc>>,
    status: Option<SpanStatus>,
    failure: Option<String>,
}

/// 跨度
#[derive(Debug)]
pub struct Span {
    id: Uuid,
    trace_id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
    operation: String,
    description: Option<String>,
    tags: BTreeMap<String, String>,
    started_at: DateTime<Utc>,
    state: Mutex<SpanState>,
}

impl Span {
    fn start(
        trace_id: Uuid,
        parent_id: Option<Uuid>,
        name: impl Into<String>,
        operation: impl Into<String>,
        options: &SpanOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            trace_id,
            parent_id,
            name: name.into(),
            operation: operation.into(),
            description: options.description.clone(),
            tags: options.tags.clone(),
            started_at: Utc::now(),
            state: Mutex::new(SpanState::default()),
        })
    }

    /// 开始一个子跨度
    pub fn start_child(
        &self,
        name: impl Into<String>,
        operation: impl Into<String>,
        options: &SpanOptions,
    ) -> Arc<Self> {
        Self::start(self.trace_id, Some(self.id), name, operation, options)
    }

    /// 跨度ID
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// 所属事务的追踪ID
    pub const fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// 父跨度ID
    pub const fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    /// 是否为事务（没有父跨度）
    pub const fn is_transaction(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// 结束时间（未结束时为 `None`）
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().finished_at
    }

    /// 结束状态（未结束时为 `None`）
    pub fn status(&self) -> Option<SpanStatus> {
        self.state.lock().status
    }

    /// 记录的失败信息
    pub fn failure(&self) -> Option<String> {
        self.state.lock().failure.clone()
    }

    /// 记录失败信息
    pub fn set_failure(&self, failure: impl Into<String>) {
        self.state.lock().failure = Some(failure.into());
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished_at.is_some()
    }

    fn finish(&self, status: SpanStatus) -> bool {
        let mut state = self.state.lock();
        if state.finished_at.is_some() {
            return false;
        }
        state.finished_at = Some(Utc::now());
        state.status = Some(status);
        true
    }
}

/// 跨度中心
///
/// 每个线程一个作用域栈；结束的跨度按结束顺序保存，供导出或测试检查。
#[derive(Debug, Default)]
pub struct SpanHub {
    scopes: DashMap<ThreadId, Vec<Arc<Span>>>,
    finished: Mutex<Vec<Arc<Span>>>,
}

impl SpanHub {
    /// 创建跨度中心
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前线程的当前跨度
    pub fn current(&self) -> Option<Arc<Span>> {
        self.scopes
            .get(&thread::current().id())
            .and_then(|stack| stack.last().cloned())
    }

    /// 开始一个新事务
    pub fn start_transaction(
        &self,
        name: impl Into<String>,
        operation: impl Into<String>,
        options: &SpanOptions,
    ) -> Arc<Span> {
        Span::start(Uuid::new_v4(), None, name, operation, options)
    }

    /// 把跨度绑定到当前线程的作用域
    pub fn bind(&self, span: Arc<Span>) {
        self.scopes.entry(thread::current().id()).or_default().push(span);
    }

    /// 取出当前线程作用域中最近绑定的跨度
    pub fn pop_bound(&self) -> Option<Arc<Span>> {
        let id = thread::current().id();
        let span = self.scopes.get_mut(&id).and_then(|mut stack| stack.pop());
        self.scopes.remove_if(&id, |_, stack| stack.is_empty());
        span
    }

    /// 当前线程作用域栈的深度
    pub fn depth(&self) -> usize {
        self.scopes
            .get(&thread::current().id())
            .map_or(0, |stack| stack.len())
    }

    /// 结束跨度；已结束的跨度不会被重复记录
    pub fn finish(&self, span: &Arc<Span>, status: SpanStatus) {
        if span.finish(status) {
            debug!("跨度 {} 结束, 状态: {}", span.name(), status);
            self.finished.lock().push(Arc::clone(span));
        }
    }

    /// 已结束的跨度（按结束顺序）
    pub fn finished(&self) -> Vec<Arc<Span>> {
        self.finished.lock().clone()
    }

    /// 取出并清空已结束的跨度
    pub fn take_finished(&self) -> Vec<Arc<Span>> {
        std::mem::take(&mut *self.finished.lock())
    }
}
