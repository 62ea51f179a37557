//! Interactive mode for the server.
//!
//! Prompts for the configuration file, bind address and port before
//! starting the server.

use dialoguer::{Confirm, Input};
use landslide_viewer_source::config::{CONFIG_ENV, DEFAULT_CONFIG_PATH};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `LANDSLIDE_CONFIG`, `BIND_ADDR` and `PORT` from the answers and
/// delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Landslide Viewer Server");
    println!();

    let default_config =
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config_path: String = Input::new()
        .with_prompt("Configuration file")
        .default(default_config.clone())
        .interact_text()
        .unwrap_or(default_config);

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(8080)
        .interact_text()
        .unwrap_or(8080);

    // SAFETY: no other threads exist yet; the variables are read once
    // during server initialisation.
    unsafe {
        std::env::set_var(CONFIG_ENV, &config_path);
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", port.to_string());
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
