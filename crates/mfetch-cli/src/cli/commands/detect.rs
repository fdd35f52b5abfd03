//! `mfetch detect` – show the platform a URL maps to.

use anyhow::Result;
use mfetch_core::platform::{detect_platform, Platform};
use std::process::ExitCode;

pub fn run_detect(url: &str) -> Result<ExitCode> {
    let platform = detect_platform(url);
    if platform == Platform::Unknown {
        println!("unsupported");
        return Ok(ExitCode::FAILURE);
    }
    let note = if platform.is_flaky() {
        " (multi-attempt fallback)"
    } else {
        ""
    };
    println!("{}{}", platform, note);
    Ok(ExitCode::SUCCESS)
}
