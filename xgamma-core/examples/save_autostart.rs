//! Example: apply a gamma value to every channel and keep it across logins.
//!
//! Run with: `cargo run --example save_autostart -- 1.2`

use xgamma_core::{GammaController, Settings, detect_limited_gamma_support};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional)
    env_logger::init();

    let value = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<f64>()?,
        None => 1.0,
    };

    if let Some(reason) = detect_limited_gamma_support() {
        eprintln!("Warning: {}", reason);
    }

    // Find xgamma
    let settings = Settings::detect();
    let tool = match settings.locate_tool() {
        Ok(tool) => tool,
        Err(e) => {
            eprintln!("{}", e);
            for (distro, command) in e.install_hints() {
                eprintln!("  {}: {}", distro, command);
            }
            std::process::exit(1);
        }
    };

    let mut controller = GammaController::with_settings(tool, &settings);
    let stored = controller.set_all(value)?;
    println!("Applied gamma {}", stored);

    let path = controller.save()?;
    println!("Saved autostart entry to {}", path.display());

    Ok(())
}
