//! Boundary to the host network utilities. The rest of the crate only ever
//! sees a `Capture`: the command name, its stdout as text, and whether the
//! process reported success. Argument forms are platform-specific; the
//! parsers tolerate whatever text comes back.

use anyhow::{Context, Result};

#[cfg(target_os = "windows")]
pub const INTERFACE_CMD: &str = "ipconfig";
#[cfg(not(target_os = "windows"))]
pub const INTERFACE_CMD: &str = "ip";

#[derive(Clone, Debug)]
pub struct Capture {
    pub command: String,
    pub stdout: String,
    pub success: bool,
}

pub fn run_capture(program: &str, args: &[&str]) -> Result<Capture> {
    log::debug!("running {} {}", program, args.join(" "));
    let out = std::process::Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to launch {}", program))?;
    Ok(Capture {
        command: program.to_string(),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        success: out.status.success(),
    })
}

#[cfg(target_os = "windows")]
pub fn ping(host: &str, count: u32) -> Result<Capture> {
    run_capture("ping", &["-n", &count.to_string(), host])
}

#[cfg(not(target_os = "windows"))]
pub fn ping(host: &str, count: u32) -> Result<Capture> {
    run_capture("ping", &["-c", &count.to_string(), host])
}

pub fn nslookup(domain: &str) -> Result<Capture> {
    run_capture("nslookup", &[domain])
}

#[cfg(target_os = "windows")]
pub fn interface_info() -> Result<Capture> {
    run_capture("ipconfig", &["/all"])
}

#[cfg(not(target_os = "windows"))]
pub fn interface_info() -> Result<Capture> {
    run_capture("ip", &["addr"])
}

pub fn arp_table() -> Result<Capture> {
    run_capture("arp", &["-a"])
}

pub fn hostname() -> String {
    run_capture("hostname", &[])
        .map(|c| c.stdout.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
