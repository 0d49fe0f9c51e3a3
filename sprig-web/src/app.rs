//! 应用启动
//!
//! 依次完成：配置加载、日志初始化、组件解析与注册、路由表构建，最后启动 Web 服务器

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sprig_core::{
    ApplicationContext, ApplicationError, CandidateType, Component, Environment,
    EnvironmentPropertySource, LoggingConfig, TomlPropertySource, DEFAULT_CONFIG_FILE,
    DEFAULT_ENV_PREFIX, PROFILES_ACTIVE,
};

use crate::controller::{Controller, HandlerCatalog};
use crate::dispatcher::Dispatcher;
use crate::error::{FrameworkError, StartupError};
use crate::response::Response;
use crate::route_table::{RouteTable, RouteTableBuilder};
use crate::server::{ServerProperties, WebServer};

/// Sprig 应用程序
///
/// 提供便捷的应用启动方式
pub struct SprigApplication {
    /// 应用名称
    name: String,

    /// 配置文件路径
    config_files: Vec<String>,

    /// 环境变量前缀
    env_prefix: String,

    /// 激活的 profiles
    profiles: Vec<String>,

    /// 是否显示 banner
    show_banner: bool,

    /// 日志配置
    logging_config: Option<LoggingConfig>,

    /// 显式注册的组件
    candidates: Vec<CandidateType>,

    /// 显式注册的控制器处理方法
    catalog: HandlerCatalog,

    /// 是否扫描通过宏注册的组件和控制器
    scan: bool,
}

impl SprigApplication {
    /// 创建新的应用
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_files: vec![DEFAULT_CONFIG_FILE.to_string()],
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            profiles: Vec::new(),
            show_banner: true,
            logging_config: None,
            candidates: Vec::new(),
            catalog: HandlerCatalog::new(),
            scan: true,
        }
    }

    /// 设置配置文件路径
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_files = vec![path.into()];
        self
    }

    /// 设置多个配置文件
    pub fn config_files(mut self, paths: Vec<String>) -> Self {
        self.config_files = paths;
        self
    }

    /// 设置环境变量前缀
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 设置激活的 profiles
    pub fn profiles(mut self, profiles: Vec<String>) -> Self {
        self.profiles = profiles;
        self
    }

    /// 设置是否显示 banner
    pub fn banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    /// 设置日志配置
    ///
    /// 如果不设置，使用配置项 `logging.*`，并由 `LOG_*` 环境变量覆盖
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 注册组件
    pub fn component<T: Component>(mut self) -> Self {
        self.candidates.push(T::candidate());
        self
    }

    /// 注册控制器（组件描述和处理方法）
    pub fn controller<T: Component + Controller>(mut self) -> Self {
        self.candidates.push(T::candidate());
        self.catalog.register::<T>();
        self
    }

    /// 注册手工构建的组件描述
    pub fn candidate(mut self, candidate: CandidateType) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// 关闭自动扫描，只使用显式注册的组件和控制器
    pub fn disable_scanning(mut self) -> Self {
        self.scan = false;
        self
    }

    /// 启动容器并构建路由表，不启动服务器
    pub fn boot(self) -> Result<BootedApplication, FrameworkError> {
        let (environment, skipped) = self.prepare_environment();
        for error in &skipped {
            tracing::warn!("Skipping configuration source: {}", error);
        }
        self.boot_with(environment)
    }

    /// 运行应用
    ///
    /// 启动失败时记录错误并返回，不会启动服务器
    pub async fn run(self) -> Result<(), StartupError> {
        let (environment, skipped) = self.prepare_environment();

        // 初始化日志系统：配置文件中的 logging.* 先生效，LOG_* 环境变量覆盖它们
        let logging_config = match &self.logging_config {
            Some(config) => config.clone(),
            None => logging_from(&environment),
        };
        logging_config.init()?;

        if self.show_banner {
            print_banner();
        }

        tracing::info!("Starting {} application", self.name);
        for error in &skipped {
            tracing::warn!("Skipping configuration source: {}", error);
        }

        let booted = match self.boot_with(environment) {
            Ok(booted) => booted,
            Err(e) => {
                tracing::error!("Application failed to start: {}", e);
                return Err(e.into());
            }
        };

        tracing::info!(
            "Started {} in {}ms",
            booted.name(),
            booted.started_in().as_millis()
        );

        booted.serve().await
    }

    /// 加载配置
    ///
    /// 加载顺序（优先级从低到高）：
    /// 1. application.toml (default)
    /// 2. application-{profile}.toml (profile specific)
    /// 3. 环境变量
    ///
    /// 无法解析的配置文件会被跳过，错误一并返回
    fn prepare_environment(&self) -> (Environment, Vec<ApplicationError>) {
        let environment = Environment::new();
        let mut skipped = Vec::new();

        for base_config in &self.config_files {
            try_load_config_file(&environment, base_config, 0, &mut skipped);
        }

        environment.add_property_source(Box::new(EnvironmentPropertySource::new(&self.env_prefix)));
        tracing::debug!("Environment variable prefix: {}", self.env_prefix);

        // 优先级：代码设置 > 环境变量 / 配置文件中的 profiles.active
        let profiles = if self.profiles.is_empty() {
            environment.get_string_array(PROFILES_ACTIVE).unwrap_or_default()
        } else {
            self.profiles.clone()
        };

        for (index, profile) in profiles.iter().enumerate() {
            for base_config in &self.config_files {
                let profile_config = profile_config_path(base_config, profile);
                try_load_config_file(&environment, &profile_config, 10 + index as i32, &mut skipped);
            }
        }

        if profiles.is_empty() {
            tracing::debug!("No active profiles set, using default configuration");
        } else {
            tracing::info!("Active profiles: {:?}", profiles);
        }
        environment.set_active_profiles(profiles);

        (environment, skipped)
    }

    fn boot_with(self, environment: Environment) -> Result<BootedApplication, FrameworkError> {
        let start_time = Instant::now();
        let Self {
            name,
            candidates,
            catalog: explicit,
            scan,
            ..
        } = self;

        let context = ApplicationContext::builder()
            .name(name.clone())
            .candidates(candidates)
            .scan_components(scan)
            .environment(environment)
            .build()?;

        let mut catalog = if scan {
            HandlerCatalog::scan()
        } else {
            HandlerCatalog::new()
        };
        catalog.merge(explicit);

        let routes = RouteTableBuilder::new(&context, &catalog).build()?;
        tracing::info!("Route table ready with {} route(s)", routes.len());

        let server = ServerProperties::from_environment(context.environment());
        let routes = Arc::new(routes);

        Ok(BootedApplication {
            name,
            context: Arc::new(context),
            dispatcher: Dispatcher::new(Arc::clone(&routes)),
            routes,
            server,
            started_in: start_time.elapsed(),
        })
    }
}

impl Default for SprigApplication {
    fn default() -> Self {
        Self::new("SprigApplication")
    }
}

/// 启动完成的应用：容器、路由表和分发器都已就绪
pub struct BootedApplication {
    name: String,
    context: Arc<ApplicationContext>,
    routes: Arc<RouteTable>,
    dispatcher: Dispatcher,
    server: ServerProperties,
    started_in: Duration,
}

impl BootedApplication {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &Arc<ApplicationContext> {
        &self.context
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn server_properties(&self) -> &ServerProperties {
        &self.server
    }

    /// 容器解析和路由构建耗时
    pub fn started_in(&self) -> Duration {
        self.started_in
    }

    /// 直接分发一个请求
    pub fn handle(&self, verb: &str, path: &str) -> Response {
        self.dispatcher.handle(verb, path)
    }

    /// 转换为 Web 服务器
    pub fn into_server(self) -> WebServer {
        WebServer::new(self.server, self.dispatcher)
    }

    /// 启动 Web 服务器
    pub async fn serve(self) -> Result<(), StartupError> {
        self.into_server().run().await
    }
}

/// 默认日志配置：`logging.*` 配置项，再由环境变量覆盖
fn logging_from(environment: &Environment) -> LoggingConfig {
    LoggingConfig::default()
        .merge_environment(environment)
        .override_from_env()
}

/// 获取 profile 配置文件路径
///
/// 例如：application.toml -> application-dev.toml
fn profile_config_path(base_path: &str, profile: &str) -> String {
    match base_path.rfind('.') {
        Some(dot_pos) => {
            let (name, ext) = base_path.split_at(dot_pos);
            format!("{}-{}{}", name, profile, ext)
        }
        None => format!("{}-{}", base_path, profile),
    }
}

fn try_load_config_file(
    environment: &Environment,
    config_file: &str,
    priority: i32,
    skipped: &mut Vec<ApplicationError>,
) {
    if !Path::new(config_file).exists() {
        tracing::debug!("Configuration file not found: {}", config_file);
        return;
    }

    match TomlPropertySource::from_file(config_file) {
        Ok(source) => {
            tracing::info!("Loaded configuration from: {} (priority: {})", config_file, priority);
            environment.add_property_source(Box::new(source.with_priority(priority)));
        }
        Err(e) => skipped.push(e),
    }
}

fn print_banner() {
    println!();
    println!(r"  ____             _       ");
    println!(r" / ___| _ __  _ __(_) __ _ ");
    println!(r" \___ \| '_ \| '__| |/ _` |");
    println!(r"  ___) | |_) | |  | | (_| |");
    println!(r" |____/| .__/|_|  |_|\__, |");
    println!(r"       |_|           |___/ ");
    println!();
    println!("  :: Sprig ::        (v{})", env!("CARGO_PKG_VERSION"));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::RequestMapping;
    use crate::error::RoutingError;
    use crate::response::IntoReply;
    use http::StatusCode;
    use sprig_core::{ListableBeanFactory, ResolutionError, CONTROLLER, SERVICE};

    struct GreetingService;

    impl GreetingService {
        fn greet(&self) -> String {
            "Hello from Sprig".to_string()
        }
    }

    impl Component for GreetingService {
        fn candidate() -> CandidateType {
            CandidateType::builder::<Self>()
                .tag(SERVICE)
                .constructor(|_| Ok(GreetingService))
        }
    }

    struct GreetingController {
        service: Arc<GreetingService>,
    }

    impl Component for GreetingController {
        fn candidate() -> CandidateType {
            CandidateType::builder::<Self>()
                .tag(CONTROLLER)
                .depends_on::<GreetingService>()
                .constructor(|args| {
                    Ok(GreetingController {
                        service: args.next()?,
                    })
                })
        }
    }

    impl Controller for GreetingController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new("GET", "/greeting", "greeting", |this: &Self| {
                this.service.greet().into_reply()
            })]
        }
    }

    struct ShadowController;

    impl Component for ShadowController {
        fn candidate() -> CandidateType {
            CandidateType::builder::<Self>()
                .tag(CONTROLLER)
                .constructor(|_| Ok(ShadowController))
        }
    }

    impl Controller for ShadowController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new("GET", "/greeting", "shadow", |_: &Self| {
                "shadow".into_reply()
            })]
        }
    }

    fn application() -> SprigApplication {
        SprigApplication::new("test")
            .config_files(Vec::new())
            .env_prefix(format!("SPRIG_TEST_{}_", uuid::Uuid::new_v4().simple()))
            .banner(false)
            .disable_scanning()
    }

    #[test]
    fn test_boot_and_dispatch() {
        let booted = application()
            .component::<GreetingService>()
            .controller::<GreetingController>()
            .boot()
            .unwrap();

        assert_eq!(booted.name(), "test");
        assert_eq!(booted.context().get_bean_count(), 2);
        assert_eq!(booted.routes().len(), 1);

        let response = booted.handle("GET", "/greeting");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body_text().as_deref(), Some("Hello from Sprig"));
        assert_eq!(booted.handle("GET", "/missing").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_boot_fails_on_missing_dependency() {
        let result = application().controller::<GreetingController>().boot();
        assert!(matches!(
            result,
            Err(FrameworkError::Resolution(ResolutionError::MissingDependency { .. }))
        ));
    }

    #[test]
    fn test_boot_fails_on_route_collision() {
        let result = application()
            .component::<GreetingService>()
            .controller::<GreetingController>()
            .controller::<ShadowController>()
            .boot();

        match result {
            Err(FrameworkError::Routing(RoutingError::RouteCollision { verb, path, .. })) => {
                assert_eq!(verb, "GET");
                assert_eq!(path, "/greeting");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a route collision"),
        }
    }

    #[test]
    fn test_profile_config_path() {
        assert_eq!(profile_config_path("application.toml", "dev"), "application-dev.toml");
        assert_eq!(profile_config_path("config/app.toml", "prod"), "config/app-prod.toml");
        assert_eq!(profile_config_path("settings", "dev"), "settings-dev");
    }

    #[test]
    fn test_profile_configuration_overrides_default() {
        let dir = std::env::temp_dir();
        let id = uuid::Uuid::new_v4().simple().to_string();
        let base = dir.join(format!("sprig-{}.toml", id));
        let profile = dir.join(format!("sprig-{}-dev.toml", id));
        let broken = dir.join(format!("sprig-{}-broken.toml", id));
        std::fs::write(&base, "[profiles]\nactive = \"dev\"\n[server]\nport = 9000\nhost = \"127.0.0.1\"\n").unwrap();
        std::fs::write(&profile, "[server]\nport = 9100\n").unwrap();
        std::fs::write(&broken, "[server\n").unwrap();

        let app = application().config_files(vec![
            base.display().to_string(),
            broken.display().to_string(),
        ]);
        let (environment, skipped) = app.prepare_environment();

        assert_eq!(environment.get_active_profiles(), vec!["dev".to_string()]);
        assert_eq!(skipped.len(), 1);
        let server = ServerProperties::from_environment(&environment);
        assert_eq!(server.address(), "127.0.0.1:9100");

        for path in [base, profile, broken] {
            let _ = std::fs::remove_file(path);
        }
    }
}
