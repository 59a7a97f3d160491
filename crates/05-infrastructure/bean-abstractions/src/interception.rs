//! 方法拦截契约
//!
//! 被拦截的 Bean 通过手写（或宏生成）的 trait 装饰器对外暴露。装饰器持有原始实例与一个
//! [`InvocationHandler`]，在每个方法里调用 [`invoke`](trait.InvocationHandler.html#method.invoke)，
//! 由处理器按标记依次执行 before / after 钩子。

use crate::definition::MarkerValue;
use crate::instance::ViewHandle;
use bean_common::{BeanError, BeanResult, TypeInfo};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// 拦截标记
///
/// 标记值本身就是钩子的配置，可以通过 `#[derive(Marker)]` 实现。
pub trait Marker: Any + Send + Sync + fmt::Debug {}

/// before 钩子产生、交给同一次调用的 after 钩子的状态
pub struct HookState(Box<dyn Any + Send>);

impl HookState {
    /// 包装状态
    pub fn new<S: Any + Send>(state: S) -> Self {
        Self(Box::new(state))
    }

    /// 借用具体状态
    pub fn downcast_ref<S: Any + Send>(&self) -> Option<&S> {
        self.0.downcast_ref::<S>()
    }

    /// 取出具体状态
    pub fn downcast<S: Any + Send>(self) -> Result<S, Self> {
        self.0.downcast::<S>().map(|state| *state).map_err(Self)
    }
}

impl fmt::Debug for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookState").finish_non_exhaustive()
    }
}

/// 一次被拦截的调用
pub struct JoinPoint<'a> {
    /// 原始（未被代理的）实例
    pub target: &'a ViewHandle,
    /// 原始实例的具体类型
    pub target_type: TypeInfo,
    /// 方法名
    pub method: &'a str,
    /// 调用参数
    pub args: &'a [&'a dyn Any],
    /// 代理对象
    pub proxy: &'a dyn Any,
}

impl JoinPoint<'_> {
    /// 取出第 `index` 个参数
    pub fn arg<A: Any>(&self, index: usize) -> Option<&A> {
        self.args.get(index)?.downcast_ref::<A>()
    }

    /// `Type#method()` 形式的调用名称
    pub fn qualified_name(&self) -> String {
        format!("{}#{}()", self.target_type.short_name(), self.method)
    }
}

impl fmt::Debug for JoinPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("target_type", &self.target_type.short_name())
            .field("method", &self.method)
            .field("args", &self.args.len())
            .finish()
    }
}

/// 调用失败的描述
pub trait Failure: fmt::Display + fmt::Debug {}

impl<T: fmt::Display + fmt::Debug + ?Sized> Failure for T {}

/// 调用结果，交给 after 钩子观察
#[derive(Clone, Copy)]
pub struct Outcome<'a> {
    result: Option<&'a dyn Any>,
    failure: Option<&'a dyn Failure>,
}

impl<'a> Outcome<'a> {
    /// 成功
    pub fn success(result: &'a dyn Any) -> Self {
        Self {
            result: Some(result),
            failure: None,
        }
    }

    /// 失败
    pub fn failed(failure: &'a dyn Failure) -> Self {
        Self {
            result: None,
            failure: Some(failure),
        }
    }

    /// 返回值
    pub const fn result(&self) -> Option<&'a dyn Any> {
        self.result
    }

    /// 按类型取出返回值
    pub fn result_as<R: Any>(&self) -> Option<&'a R> {
        self.result?.downcast_ref::<R>()
    }

    /// 失败原因
    pub const fn failure(&self) -> Option<&'a dyn Failure> {
        self.failure
    }

    /// 是否成功
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Debug for Outcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("has_result", &self.result.is_some())
            .field("failure", &self.failure.map(ToString::to_string))
            .finish()
    }
}

/// 方法钩子
///
/// 每个实现对应一种标记类型。before 返回的状态原样交给同一次调用的 after。
pub trait MethodWrapper: Send + Sync + 'static {
    /// 处理的标记类型
    type Marker: Marker;

    /// 调用前
    fn before(&self, point: &JoinPoint<'_>, marker: &Self::Marker) -> BeanResult<Option<HookState>>;

    /// 调用后，无论成功失败都会执行
    fn after(
        &self,
        point: &JoinPoint<'_>,
        marker: &Self::Marker,
        outcome: &Outcome<'_>,
        state: Option<HookState>,
    ) -> BeanResult<()>;
}

/// 擦除了标记类型的钩子
pub trait ErasedWrapper: Send + Sync {
    /// 标记类型
    fn marker_type(&self) -> TypeInfo;

    /// 钩子名称
    fn wrapper_name(&self) -> &'static str;

    /// 调用前
    fn before(&self, point: &JoinPoint<'_>, marker: &MarkerValue) -> BeanResult<Option<HookState>>;

    /// 调用后
    fn after(
        &self,
        point: &JoinPoint<'_>,
        marker: &MarkerValue,
        outcome: &Outcome<'_>,
        state: Option<HookState>,
    ) -> BeanResult<()>;
}

fn typed_marker<M: Marker>(marker: &MarkerValue) -> BeanResult<&M> {
    marker
        .downcast_ref::<M>()
        .ok_or_else(|| BeanError::MarkerMismatch {
            expected: TypeInfo::of::<M>().short_name(),
            actual: marker.info().short_name(),
        })
}

impl<W: MethodWrapper> ErasedWrapper for W {
    fn marker_type(&self) -> TypeInfo {
        TypeInfo::of::<W::Marker>()
    }

    fn wrapper_name(&self) -> &'static str {
        std::any::type_name::<W>()
    }

    fn before(&self, point: &JoinPoint<'_>, marker: &MarkerValue) -> BeanResult<Option<HookState>> {
        MethodWrapper::before(self, point, typed_marker::<W::Marker>(marker)?)
    }

    fn after(
        &self,
        point: &JoinPoint<'_>,
        marker: &MarkerValue,
        outcome: &Outcome<'_>,
        state: Option<HookState>,
    ) -> BeanResult<()> {
        MethodWrapper::after(self, point, typed_marker::<W::Marker>(marker)?, outcome, state)
    }
}

/// 已执行 before 的钩子（钩子序号 + 状态）
#[derive(Debug, Default)]
pub struct ActiveHooks {
    entries: Vec<(usize, Option<HookState>)>,
}

impl ActiveHooks {
    /// 空列表
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 记录一个已执行 before 的钩子
    pub fn push(&mut self, wrapper: usize, state: Option<HookState>) {
        self.entries.push((wrapper, state));
    }

    /// 个数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ActiveHooks {
    type Item = (usize, Option<HookState>);
    type IntoIter = std::vec::IntoIter<(usize, Option<HookState>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// 装饰器发起的一次调用
#[derive(Clone, Copy)]
pub struct Call<'a> {
    /// 代理对象
    pub proxy: &'a dyn Any,
    /// 方法名
    pub method: &'a str,
    /// 调用参数
    pub args: &'a [&'a dyn Any],
}

impl fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("args", &self.args.len())
            .finish()
    }
}

/// 调用处理器，由容器为每个被拦截的 Bean 创建
pub trait InvocationHandler: Send + Sync {
    /// 被拦截 Bean 的具体类型
    fn target_type(&self) -> TypeInfo;

    /// 执行该方法全部标记的 before 钩子
    fn before(&self, call: &Call<'_>) -> BeanResult<ActiveHooks>;

    /// 按相同顺序执行 after 钩子
    fn after(&self, call: &Call<'_>, hooks: ActiveHooks, outcome: &Outcome<'_>) -> BeanResult<()>;
}

impl dyn InvocationHandler {
    /// 在钩子之间执行真实调用
    ///
    /// before 失败时不会执行调用。调用返回 `Err` 或 panic 时，after 钩子先观察到失败，
    /// 之后原样返回错误或继续 panic；此时 after 钩子自身的错误只记录日志。
    pub fn invoke<R, E, F>(&self, proxy: &dyn Any, method: &str, args: &[&dyn Any], call: F) -> Result<R, E>
    where
        R: Any,
        E: From<BeanError> + fmt::Display + fmt::Debug,
        F: FnOnce() -> Result<R, E>,
    {
        let context = Call {
            proxy,
            method,
            args,
        };
        let hooks = self.before(&context)?;
        if hooks.is_empty() {
            return call();
        }

        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(value)) => {
                self.after(&context, hooks, &Outcome::success(&value))?;
                Ok(value)
            }
            Ok(Err(error)) => {
                if let Err(hook_error) = self.after(&context, hooks, &Outcome::failed(&error)) {
                    warn!("方法 {} 的 after 钩子执行失败: {}", method, hook_error);
                }
                Err(error)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if let Err(hook_error) = self.after(&context, hooks, &Outcome::failed(&message)) {
                    warn!("方法 {} 的 after 钩子执行失败: {}", method, hook_error);
                }
                panic::resume_unwind(payload)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
