//! Startup Banner and User-Friendly Error Formatting
//!
//! Small operational helpers shared by the demo binary: a version banner
//! logged at startup, and an error formatter that turns an [`anyhow::Error`]
//! chain into a message with troubleshooting hints for the common failure
//! scenarios (service socket unreachable, shared memory exhausted, broken
//! configuration file).

use std::fmt::Write;

use tracing::info;

/// Log the version banner at startup
///
/// Build metadata is injected by `build.rs` via `BUILD_DATE` and `GIT_HASH`.
pub fn log_startup_info() {
    info!("════════════════════════════════════════════════════════");
    info!("  freerds-surface v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {}", env!("BUILD_DATE"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!(
        "  Profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );
    info!("════════════════════════════════════════════════════════");
}

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // Analyze error and provide context
    let error_msg = format!("{error:#}");

    if error_msg.contains("Shared memory") || error_msg.contains("shared memory") {
        format_shm_error(&mut output);
    } else if error_msg.contains("service socket") || error_msg.contains("Connection refused") {
        format_service_error(&mut output);
    } else if error_msg.contains("config") {
        format_config_error(&mut output);
    } else {
        format_generic_error(&mut output);
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{error:#}").ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: freerds-surface-demo -vvv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Inspect the session service logs for the matching session id"
    )
    .ok();

    output
}

fn format_service_error(output: &mut String) {
    writeln!(output, "Session Service Connection Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not reach the session service over its Unix socket."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. The session service is not running").ok();
    writeln!(
        output,
        "     → Check that a session with the configured id exists"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Wrong socket path").ok();
    writeln!(
        output,
        "     → The socket is <pipe_dir>/FreeRDS_<session_id>_<endpoint>"
    )
    .ok();
    writeln!(
        output,
        "     → Verify --pipe-dir, --session-id and --endpoint match the service"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  3. Permission denied on the pipe directory").ok();
    writeln!(output, "     → Check ownership and mode of the pipe directory").ok();
}

fn format_shm_error(output: &mut String) {
    writeln!(output, "Shared Memory Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not create or map the shared framebuffer segment."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. /dev/shm is full or too small").ok();
    writeln!(output, "     → Run: df -h /dev/shm").ok();
    writeln!(
        output,
        "     → A 1024x768 32-bit framebuffer needs about 3 MB"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. A stale segment with restrictive permissions").ok();
    writeln!(
        output,
        "     → Remove leftovers: ls /dev/shm/freerds-shm.* and delete as owner"
    )
    .ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "The configuration file could not be loaded.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Syntax error in the TOML file").ok();
    writeln!(output, "     → The location is in the details below").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid value").ok();
    writeln!(
        output,
        "     → Endpoint names must be non-empty and contain no '/'"
    )
    .ok();
    writeln!(
        output,
        "     → Width, height and queue depth must be non-zero"
    )
    .ok();
}

fn format_generic_error(output: &mut String) {
    writeln!(output, "Unexpected Error").ok();
    writeln!(output).ok();
    writeln!(output, "The surface hit an error it could not recover from.").ok();
}

// ============================================================================
// Tests
// ============================================================================
