use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;
use sprig_macros::{controller, Component, Controller};
use sprig_web::prelude::*;

// ==================== 服务层 ====================

pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Component)]
#[tag(service)]
#[provides(dyn Greeter)]
struct HelloService {
    greeted: AtomicU64,
}

impl Greeter for HelloService {
    fn greet(&self, name: &str) -> String {
        self.greeted.fetch_add(1, Ordering::Relaxed);
        format!("Hello, {}! Welcome to Sprig.", name)
    }
}

impl HelloService {
    fn greeted(&self) -> u64 {
        self.greeted.load(Ordering::Relaxed)
    }
}

// ==================== 控制器 ====================

#[derive(Controller)]
struct HelloController {
    #[autowired]
    greeter: Arc<dyn Greeter>,
}

#[controller]
impl HelloController {
    #[get_mapping("/hello")]
    fn hello(&self) -> String {
        self.greeter.greet("World")
    }

    #[get_mapping("/ping")]
    fn ping(&self) -> &'static str {
        "pong"
    }
}

#[derive(Controller)]
#[request_mapping("/api")]
struct StatusController {
    #[autowired]
    hello_service: Arc<HelloService>,
}

#[controller]
impl StatusController {
    #[get_mapping("/status")]
    fn status(&self) -> Response {
        Response::ok(json!({
            "status": "UP",
            "greeted": self.hello_service.greeted(),
        }))
    }

    #[post_mapping("/reset")]
    fn reset(&self) -> Response {
        Response::no_content().header("X-Sprig-Action", "reset")
    }

    #[get_mapping("/fail")]
    fn fail(&self) -> anyhow::Result<String> {
        anyhow::bail!("this route always fails")
    }
}

#[tokio::main]
async fn main() {
    let result = SprigApplication::new("hello-demo")
        .config_file(concat!(env!("CARGO_MANIFEST_DIR"), "/application.toml"))
        .run()
        .await;

    if let Err(e) = result {
        eprintln!("hello-demo failed to start: {}", e);
        std::process::exit(1);
    }
}
