//! # Bean Macros
//!
//! Bean 容器的过程宏。
//!
//! ## 核心宏
//!
//! - [`Marker`](derive@Marker) - 派生拦截标记
//! - [`bean_definitions`] - 在程序启动时把声明登记到全局目录
//!
//! ## 使用示例
//!
//! ```rust
//! use bean_container::{ClassDef, Definition};
//! use bean_macros::{bean_definitions, Marker};
//!
//! #[derive(Debug, Marker)]
//! pub struct Audited;
//!
//! #[derive(Default)]
//! pub struct Clock;
//!
//! #[bean_definitions(scope = "app::time")]
//! fn time_beans() -> Vec<Definition> {
//!     vec![ClassDef::builder::<Clock>().bean().default_constructor().build().into()]
//! }
//! # fn main() {}
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod definitions;
mod marker;

/// 拦截标记派生宏
///
/// 为类型实现 `bean_container::Marker`。类型需要同时实现 `Debug`、`Send` 和 `Sync`。
///
/// # 示例
///
/// ```rust
/// use bean_macros::Marker;
///
/// #[derive(Debug, Marker)]
/// pub struct Cached {
///     pub ttl_seconds: u64,
/// }
/// ```
#[proc_macro_derive(Marker)]
pub fn derive_marker(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    marker::derive_marker_impl(&input)
}

/// 全局目录注册宏
///
/// 放在返回 `Vec<Definition>` 的无参函数上，程序启动时（通过 `ctor`）调用该函数并把结果
/// 登记到 `GlobalCatalog`。使用方需要依赖 `ctor`。
///
/// # 参数
///
/// - `scope = "a::b"` - 声明所在的命名空间，缺省为当前模块路径
///
/// # 示例
///
/// ```rust
/// use bean_container::{ClassDef, Definition};
/// use bean_macros::bean_definitions;
///
/// #[derive(Default)]
/// pub struct Mailer;
///
/// #[bean_definitions]
/// fn mail_beans() -> Vec<Definition> {
///     vec![ClassDef::builder::<Mailer>().bean().default_constructor().build().into()]
/// }
/// # fn main() {}
/// ```
#[proc_macro_attribute]
pub fn bean_definitions(args: TokenStream, input: TokenStream) -> TokenStream {
    definitions::bean_definitions_impl(args, input)
}
