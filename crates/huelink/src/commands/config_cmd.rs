//! Config subcommand handlers.

use std::fmt::Write;

use huelink_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking the credential.
fn format_config_redacted(cfg: &Config) -> String {
    let b = &cfg.bridge;
    let mut out = String::new();

    let _ = writeln!(out, "[bridge]");
    if let Some(ref host) = b.host {
        let _ = writeln!(out, "host = \"{host}\"");
    }
    if let Some(port) = b.port {
        let _ = writeln!(out, "port = {port}");
    }
    let _ = writeln!(out, "protocol = \"{}\"", b.protocol);
    if b.username.is_some() {
        let _ = writeln!(out, "username = \"****\"");
    }
    let _ = writeln!(out, "device_label = \"{}\"", b.device_label);
    let _ = writeln!(out, "insecure = {}", b.insecure);
    if let Some(ref ca) = b.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
    }
    let _ = writeln!(out, "timeout = {}", b.timeout);
    let _ = writeln!(out, "poll_interval = {}", b.poll_interval);
    let _ = writeln!(out, "sensor_poll_interval = {}", b.sensor_poll_interval);
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = write!(out, "output = \"{}\"", cfg.defaults.output);

    out
}

/// Problems that keep the bridge offline or fall back to defaults, as
/// TOML comments so `config show` output stays loadable.
fn format_config_issues(cfg: &Config) -> String {
    let issues = match huelink_config::to_controller_config(cfg) {
        Ok(controller) => controller.config_status(),
        Err(e) => return format!("# error: {e}"),
    };
    let mut out = String::new();
    for issue in issues {
        let level = if issue.is_fatal() { "error" } else { "warning" };
        let _ = writeln!(out, "# {level}: {}", issue.reason());
    }
    out.trim_end().to_owned()
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let (cfg, _) = super::load(global)?;
            let mut text = format_config_redacted(&cfg);
            let issues = format_config_issues(&cfg);
            if !issues.is_empty() {
                text.push_str("\n\n");
                text.push_str(&issues);
            }
            output::print_output(&text, global.quiet);
        }
        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(huelink_config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
        }
    }
    Ok(())
}
