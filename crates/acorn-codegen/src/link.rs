//! Object file linking via the system `cc`.
//!
//! The C compiler driver handles platform-specific details (CRT objects,
//! libc, macOS vs Linux linker flags) for us; the emitted code only
//! depends on libc symbols such as `printf`.

use std::path::Path;
use std::process::Command;

/// Link an object file into a native executable.
pub fn link(object_path: &Path, output_path: &Path) -> Result<(), String> {
    let output = Command::new("cc")
        .arg(object_path)
        .arg("-o")
        .arg(output_path)
        .output()
        .map_err(|e| format!("Failed to invoke linker (cc): {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("Linking failed:\n{}", stderr));
    }

    // The intermediate object is no longer needed.
    std::fs::remove_file(object_path).ok();

    Ok(())
}
