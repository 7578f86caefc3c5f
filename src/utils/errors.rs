//! User-Friendly Error Formatting
//!
//! Turns startup failures of the `ozone-bridge` binary into a short
//! message with the likely cause and what to check next.

use std::fmt::Write;

/// Format error for user consumption
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(output).ok();
    writeln!(
        output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(output).ok();

    let error_msg = format!("{:#}", error);

    if error_msg.contains("config") {
        format_config_error(&mut output);
    } else if error_msg.contains("trace") {
        format_trace_error(&mut output);
    } else if error_msg.contains("thread") {
        format_thread_error(&mut output);
    } else {
        writeln!(output, "Bridge Error").ok();
        writeln!(output).ok();
        writeln!(output, "An error occurred while running the bridge.").ok();
    }

    writeln!(output).ok();
    writeln!(
        output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(output, "Technical Details:").ok();
    writeln!(output).ok();
    writeln!(output, "{}", error_msg).ok();
    writeln!(output).ok();
    writeln!(
        output,
        "  - Run with --verbose for detailed logs: ozone-bridge -vv"
    )
    .ok();

    output
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Unknown value").ok();
    writeln!(
        output,
        "     → logging.level must be trace|debug|info|warn|error"
    )
    .ok();
    writeln!(
        output,
        "     → input.default_cursor must be a known cursor name"
    )
    .ok();
}

fn format_trace_error(output: &mut String) {
    writeln!(output, "Session Trace Error").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Trace file not found").ok();
    writeln!(output, "     → Pass an existing file with --trace").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Malformed record").ok();
    writeln!(output, "     → Each line must be one JSON object").ok();
    writeln!(
        output,
        "     → Example: {{\"record\":\"channel_established\",\"host_id\":1}}"
    )
    .ok();
}

fn format_thread_error(output: &mut String) {
    writeln!(output, "Task Runner Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not start the UI or channel-send thread."
    )
    .ok();
    writeln!(output, "     → Check the process thread limit: ulimit -u").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_config_error() {
        let error = anyhow::anyhow!("Failed to parse config file");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("Configuration Error"));
    }

    #[test]
    fn test_format_trace_error_includes_context() {
        let error = anyhow::anyhow!("line 3: expected value").context("Failed to read trace");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("Session Trace Error"));
        assert!(formatted.contains("line 3"));
    }
}
