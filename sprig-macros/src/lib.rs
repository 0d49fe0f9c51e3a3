//! Sprig Macros
//!
//! 组件与控制器的过程宏，生成的代码通过 inventory 在编译期注册

mod attribute_helpers;
mod component_impl;
mod route_impl;

use proc_macro::TokenStream;

/// Component派生宏
///
/// 用法：
/// ```ignore
/// #[derive(Component)]
/// #[tag(service)]              // 可选：service / repository / controller，或任意 Tag 常量
/// #[provides(dyn Greeter)]     // 可选：可以按 trait object 注入
/// struct HelloService {
///     #[autowired]
///     repository: Arc<UserRepository>,
///     cache: Mutex<HashMap<String, String>>, // 未标注的字段使用 Default
/// }
/// ```
#[proc_macro_derive(Component, attributes(autowired, provides, tag))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component_impl::derive_component_impl(input)
}

/// Controller 派生宏
///
/// 与 `Component` 相同，但额外带有控制器标记，并支持基础路径
///
/// ```ignore
/// #[derive(Controller)]
/// #[request_mapping("/api/users")]
/// struct UserController {
///     #[autowired]
///     service: Arc<UserService>,
/// }
/// ```
#[proc_macro_derive(Controller, attributes(autowired, provides, tag, request_mapping))]
pub fn derive_controller(input: TokenStream) -> TokenStream {
    component_impl::derive_controller_impl(input)
}

/// 处理控制器实现块，提取路由方法
///
/// 处理方法必须是同步的、只接收 `&self`，返回值实现 `IntoReply`
///
/// ```ignore
/// #[controller]
/// impl UserController {
///     #[get_mapping("/current")]
///     fn current(&self) -> String {
///         self.service.current_user()
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    route_impl::controller_impl(attr, item)
}
