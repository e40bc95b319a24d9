//! The full anatomy atlas: windowed viewer with the built-in catalog,
//! browser UI and HDR environment lighting. Expects the asset bundle under
//! `assets/` in the working directory.

fn main() {
    env_logger::init();
    vesalius::default().run();
}
