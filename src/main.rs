mod app;
mod capture;
mod commands;
mod config;
mod logging;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
