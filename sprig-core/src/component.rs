use crate::candidate::CandidateType;

/// Component注册表 - 用于inventory收集
///
/// `#[derive(Component)]` 和 `#[derive(Controller)]` 会为每个类型提交一条
pub struct ComponentRegistration {
    pub name: &'static str,
    pub candidate: fn() -> CandidateType,
}

inventory::collect!(ComponentRegistration);

/// Component trait - 用于标记可以自动注册到容器的组件
///
/// 通过 #[derive(Component)] 宏自动实现
///
/// # 示例
///
/// ```ignore
/// use sprig_macros::Component;
/// use std::sync::Arc;
///
/// #[derive(Component)]
/// #[provides(dyn UserRepository)]
/// struct UserService {
///     #[autowired]
///     db: Arc<DatabaseService>,
/// }
/// ```
pub trait Component: Sized + Send + Sync + 'static {
    /// 组件描述
    fn candidate() -> CandidateType;
}

/// 自动扫描所有Component
///
/// 返回所有使用 #[derive(Component)] 标记的类型的描述
pub fn scan_components() -> Vec<CandidateType> {
    tracing::info!("Starting component scan for @Component annotated types");

    let registrations: Vec<_> = inventory::iter::<ComponentRegistration>().collect();
    let total = registrations.len();

    if total == 0 {
        tracing::warn!("No @Component annotated types found");
        return Vec::new();
    }

    tracing::info!("Found {} @Component annotated type(s)", total);

    registrations
        .iter()
        .enumerate()
        .map(|(idx, registration)| {
            tracing::debug!(
                "Discovered component [{}/{}]: '{}'",
                idx + 1,
                total,
                registration.name
            );
            (registration.candidate)()
        })
        .collect()
}
