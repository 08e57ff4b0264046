#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = hero_panel::run() {
        eprintln!("Application error: {err}");
    }
}

// The wasm entry point is `hero_panel::run`, started by wasm-bindgen.
#[cfg(target_arch = "wasm32")]
fn main() {}
