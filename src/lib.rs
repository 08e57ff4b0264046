pub mod animation;
pub mod app;
pub mod asset;
pub mod cycle;
pub mod hero;
pub mod io;
pub mod renderer;
pub mod scene;
pub mod schedule;
pub mod settings;
pub mod time;
pub mod ui;

pub use hero::{HeroOrchestrator, MountReport};
pub use schedule::Scheduler;
pub use settings::Settings;

use app::HeroApp;
use winit::event_loop::EventLoop;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    // RUST_LOG overrides the Info default.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run() -> Result<(), winit::error::EventLoopError> {
    init_logging();

    let settings = Settings::load();
    log::info!("Starting hero panel");

    let event_loop = EventLoop::new()?;
    let mut app = HeroApp::new(settings);

    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    init_logging();
    log::info!("Starting hero panel - WebAssembly");

    let event_loop = EventLoop::new().map_err(|err| JsValue::from_str(&err.to_string()))?;
    let app = HeroApp::new(Settings::load());

    event_loop.spawn_app(app);

    Ok(())
}
