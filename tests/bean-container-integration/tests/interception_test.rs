//! 方法拦截与代理的集成测试

mod common;

use bean_container::{
    BeanCatalog, BeanError, BeanResult, ClassDef, Container, FieldSlot, HookState, InvocationHandler, JoinPoint,
    MethodWrapper, Outcome, Scope, SelfRef,
};
use bean_macros::Marker;
use common::container_with;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug, Marker)]
struct Audited;

#[derive(Debug, Marker)]
struct Metered;

#[derive(Debug, Marker)]
struct Frozen;

#[derive(Debug, thiserror::Error)]
enum AccountError {
    #[error("余额不足: {0}")]
    Insufficient(u64),
    #[error(transparent)]
    Bean(#[from] BeanError),
}

trait Account: Send + Sync {
    fn deposit(&self, amount: u64) -> Result<u64, AccountError>;
    fn withdraw(&self, amount: u64) -> Result<u64, AccountError>;
    fn balance(&self) -> Result<u64, AccountError>;
    fn deposit_twice(&self, amount: u64) -> Result<u64, AccountError>;
    fn audit_check(&self) -> Result<u64, AccountError>;
}

#[derive(Default)]
struct Bank {
    balance: Mutex<u64>,
    me: SelfRef<dyn Account>,
}

impl Account for Bank {
    fn deposit(&self, amount: u64) -> Result<u64, AccountError> {
        let mut balance = self.balance.lock();
        *balance += amount;
        Ok(*balance)
    }

    fn withdraw(&self, amount: u64) -> Result<u64, AccountError> {
        let mut balance = self.balance.lock();
        if amount > *balance {
            return Err(AccountError::Insufficient(*balance));
        }
        *balance -= amount;
        Ok(*balance)
    }

    fn balance(&self) -> Result<u64, AccountError> {
        Ok(*self.balance.lock())
    }

    fn deposit_twice(&self, amount: u64) -> Result<u64, AccountError> {
        let me = self.me.get()?;
        me.deposit(amount)?;
        me.deposit(amount)
    }

    fn audit_check(&self) -> Result<u64, AccountError> {
        panic!("账本损坏")
    }
}

/// `Account` 的转发装饰器
struct BankProxy {
    target: Arc<Bank>,
    handler: Arc<dyn InvocationHandler>,
}

impl Account for BankProxy {
    fn deposit(&self, amount: u64) -> Result<u64, AccountError> {
        self.handler
            .invoke(self, "deposit", &[&amount as &dyn Any], || self.target.deposit(amount))
    }

    fn withdraw(&self, amount: u64) -> Result<u64, AccountError> {
        self.handler
            .invoke(self, "withdraw", &[&amount as &dyn Any], || self.target.withdraw(amount))
    }

    fn balance(&self) -> Result<u64, AccountError> {
        self.handler.invoke(self, "balance", &[], || self.target.balance())
    }

    fn deposit_twice(&self, amount: u64) -> Result<u64, AccountError> {
        self.handler.invoke(self, "deposit_twice", &[&amount as &dyn Any], || {
            self.target.deposit_twice(amount)
        })
    }

    fn audit_check(&self) -> Result<u64, AccountError> {
        self.handler.invoke(self, "audit_check", &[], || self.target.audit_check())
    }
}

fn bank_class(frozen: bool) -> Arc<ClassDef> {
    let builder = ClassDef::builder::<Bank>()
        .bean()
        .implements::<dyn Account>(|bank| bank as Arc<dyn Account>)
        .constructor([], |_| Ok(Bank::default()))
        .field("me", |bank| FieldSlot::self_ref(&bank.me))
        .methods(["deposit", "withdraw", "balance", "deposit_twice", "audit_check"])
        .method_marker("deposit", Audited)
        .method_marker("deposit", Metered)
        .method_marker("withdraw", Audited)
        .method_marker("audit_check", Audited)
        .proxy::<dyn Account>(|bank, handler| Arc::new(BankProxy { target: bank, handler }) as Arc<dyn Account>);
    if frozen {
        builder.method_marker("deposit", Frozen).build()
    } else {
        builder.build()
    }
}

type Events = Arc<Mutex<Vec<String>>>;

struct AuditWrapper(Events);

impl MethodWrapper for AuditWrapper {
    type Marker = Audited;

    fn before(&self, point: &JoinPoint<'_>, _marker: &Audited) -> BeanResult<Option<HookState>> {
        self.0.lock().push(format!("audit:before:{}", point.method));
        Ok(point.arg::<u64>(0).map(|amount| HookState::new(*amount)))
    }

    fn after(
        &self,
        point: &JoinPoint<'_>,
        _marker: &Audited,
        outcome: &Outcome<'_>,
        state: Option<HookState>,
    ) -> BeanResult<()> {
        let amount = state.and_then(|state| state.downcast::<u64>().ok()).unwrap_or_default();
        let result = outcome
            .failure()
            .map_or_else(|| "ok".to_string(), ToString::to_string);
        self.0
            .lock()
            .push(format!("audit:after:{}:{}:{}", point.method, amount, result));
        Ok(())
    }
}

struct MeterWrapper(Events);

impl MethodWrapper for MeterWrapper {
    type Marker = Metered;

    fn before(&self, point: &JoinPoint<'_>, _marker: &Metered) -> BeanResult<Option<HookState>> {
        self.0.lock().push(format!("meter:before:{}", point.method));
        Ok(None)
    }

    fn after(
        &self,
        point: &JoinPoint<'_>,
        _marker: &Metered,
        outcome: &Outcome<'_>,
        _state: Option<HookState>,
    ) -> BeanResult<()> {
        let value = outcome.result_as::<u64>().copied().unwrap_or_default();
        self.0.lock().push(format!("meter:after:{}:{}", point.method, value));
        Ok(())
    }
}

struct FreezeWrapper;

impl MethodWrapper for FreezeWrapper {
    type Marker = Frozen;

    fn before(&self, point: &JoinPoint<'_>, _marker: &Frozen) -> BeanResult<Option<HookState>> {
        Err(BeanError::config(format!("账户已冻结, 拒绝调用 {}", point.qualified_name())))
    }

    fn after(&self, _: &JoinPoint<'_>, _: &Frozen, _: &Outcome<'_>, _: Option<HookState>) -> BeanResult<()> {
        Ok(())
    }
}

fn bank_container(frozen: bool) -> (Container, Events) {
    let events = Events::default();
    let mut container = container_with(BeanCatalog::new("bank").with("app::bank", bank_class(frozen)));
    container.add_method_wrapper(AuditWrapper(Arc::clone(&events)));
    container.add_method_wrapper(MeterWrapper(Arc::clone(&events)));
    container.add_method_wrapper(FreezeWrapper);
    container.scan(&Scope::new("app")).unwrap();
    (container, events)
}

fn take(events: &Events) -> Vec<String> {
    std::mem::take(&mut *events.lock())
}

#[test]
fn test_marked_method_runs_hooks_in_registration_order() {
    let (container, events) = bank_container(false);
    let account = container.inject::<dyn Account>().unwrap();

    assert_eq!(account.deposit(10).unwrap(), 10);
    assert_eq!(
        take(&events),
        vec![
            "audit:before:deposit",
            "meter:before:deposit",
            "audit:after:deposit:10:ok",
            "meter:after:deposit:10",
        ]
    );

    assert_eq!(account.balance().unwrap(), 10);
    assert!(take(&events).is_empty());
}

#[test]
fn test_concrete_lookup_returns_original() {
    let (container, events) = bank_container(false);

    let bank = container.inject::<Bank>().unwrap();
    bank.deposit(3).unwrap();
    let original = container.original::<dyn Account>(None).unwrap();
    original.deposit(4).unwrap();
    assert!(take(&events).is_empty());

    let account = container.inject::<dyn Account>().unwrap();
    assert_eq!(account.balance().unwrap(), 7);
    assert!(!std::ptr::eq(
        Arc::as_ptr(&account).cast::<()>(),
        Arc::as_ptr(&original).cast::<()>()
    ));
}

#[test]
fn test_self_reference_goes_through_proxy() {
    let (container, events) = bank_container(false);
    let account = container.inject::<dyn Account>().unwrap();
    let bank = container.inject::<Bank>().unwrap();

    let me = bank.me.get().unwrap();
    assert!(std::ptr::eq(
        Arc::as_ptr(&me).cast::<()>(),
        Arc::as_ptr(&account).cast::<()>()
    ));

    assert_eq!(account.deposit_twice(5).unwrap(), 10);
    let events = take(&events);
    assert_eq!(events.len(), 8);
    assert_eq!(events.iter().filter(|e| e.starts_with("audit:before:deposit")).count(), 2);
    assert!(events.iter().all(|e| !e.contains("deposit_twice")));
}

#[test]
fn test_self_reference_does_not_keep_proxy_alive() {
    let (container, _events) = bank_container(false);
    let bank = container.inject::<Bank>().unwrap();
    let account = container.inject::<dyn Account>().unwrap();
    let proxy = Arc::downgrade(&account);

    drop(account);
    drop(container);

    assert!(proxy.upgrade().is_none());
    assert!(matches!(bank.me.get(), Err(BeanError::ContainerDropped { .. })));
}

#[test]
fn test_failure_reaches_after_hooks_and_caller() {
    let (container, events) = bank_container(false);
    let account = container.inject::<dyn Account>().unwrap();

    let error = account.withdraw(100).unwrap_err();
    assert!(matches!(error, AccountError::Insufficient(0)));
    assert_eq!(
        take(&events),
        vec!["audit:before:withdraw", "audit:after:withdraw:100:余额不足: 0"]
    );
}

#[test]
fn test_panic_reaches_after_hooks_and_resumes() {
    let (container, events) = bank_container(false);
    let account = container.inject::<dyn Account>().unwrap();

    let payload = panic::catch_unwind(AssertUnwindSafe(|| account.audit_check())).unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"账本损坏"));
    assert_eq!(
        take(&events),
        vec!["audit:before:audit_check", "audit:after:audit_check:0:账本损坏"]
    );
}

#[test]
fn test_before_hook_error_aborts_call() {
    let (container, events) = bank_container(true);
    let account = container.inject::<dyn Account>().unwrap();

    let error = account.deposit(10).unwrap_err();
    assert!(matches!(error, AccountError::Bean(BeanError::Config { .. })));
    assert!(error.to_string().contains("Bank#deposit()"));
    assert_eq!(account.balance().unwrap(), 0);
    assert_eq!(
        take(&events),
        vec![
            "audit:before:deposit",
            "meter:before:deposit",
            "meter:after:deposit:0",
            "audit:after:deposit:10:配置错误: 账户已冻结, 拒绝调用 Bank#deposit()",
        ]
    );
}

#[test]
fn test_unwrapped_marker_leaves_bean_unproxied() {
    let mut container = container_with(BeanCatalog::new("bank").with("app::bank", bank_class(false)));
    container.add_method_wrapper(FreezeWrapper);
    container.scan(&Scope::new("app")).unwrap();

    let account = container.inject::<dyn Account>().unwrap();
    assert_eq!(account.deposit(1).unwrap(), 1);
    let original = container.original::<dyn Account>(None).unwrap();
    assert!(std::ptr::eq(
        Arc::as_ptr(&account).cast::<()>(),
        Arc::as_ptr(&original).cast::<()>()
    ));
}
