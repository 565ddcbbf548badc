//! CLI command implementations
//!
//! - `pack` lives in commands/pack.rs
//! - `minify` lives in commands/minify.rs
//! - `version` is small enough to live here

pub mod minify;
pub mod pack;

/// Version command implementation
pub fn version_command(detailed: bool) {
    if detailed {
        println!("{} {}", mdk_core::NAME, mdk_core::VERSION);
        println!("Build information:");
        println!("  Target: {}", std::env::consts::ARCH);
        println!("  OS: {}", std::env::consts::OS);
        if let Ok(profile) = std::env::var("PROFILE") {
            println!("  Profile: {profile}");
        }
    } else {
        println!("{}", mdk_core::VERSION);
    }
}
