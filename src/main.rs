use std::io::{BufRead, Write};
use std::sync::OnceLock;
use clap::{ArgAction, ColorChoice, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use comfy_table::{ContentArrangement, Table};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};

mod analyze;
mod parsers;
mod records;
mod runner;
mod store;

use records::{DiagStatus, LogRow};
use store::{RecordStore, StoreError};

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum OutputFmt { Text, Json }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogFormat { Text, Json }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Parser, Debug)]
#[command(
    name = "netdiag",
    about = "Network diagnostics runner and structured logger",
    long_about = "Runs host network utilities (ping, nslookup, interface info, ARP), extracts structured results from their output, and appends them to a CSV log plus a raw-text audit log.",
    after_long_help = "Examples:\n  netdiag                         interactive menu\n  netdiag --ping example.com\n  netdiag --lookup example.com --output json\n  netdiag --arp\n  netdiag --analyze\n  netdiag --view-log --csv-path /var/log/diagnostics.csv",
    color = ColorChoice::Auto
)]
struct Args {
    /// Ping a host once and log the result
    #[arg(long, value_name = "HOST")]
    ping: Option<String>,
    /// Resolve a domain via nslookup and log the result
    #[arg(long, value_name = "DOMAIN")]
    lookup: Option<String>,
    /// Capture local interface info (MAC/IPv4) and log it
    #[arg(long, default_value_t = false)]
    net_info: bool,
    /// Dump the ARP table and log the device count
    #[arg(long, default_value_t = false)]
    arp: bool,
    /// Print every row of the tabular log
    #[arg(long, default_value_t = false)]
    view_log: bool,
    /// Print the raw narrative audit log
    #[arg(long, default_value_t = false)]
    raw_log: bool,
    /// Summarize the tabular log (totals, per-command, per-status)
    #[arg(long, default_value_t = false)]
    analyze: bool,
    #[arg(long, short = 'c', default_value_t = 3, help = "Echo requests per ping")]
    count: u32,
    #[arg(long, default_value = "diagnostics.csv")]
    csv_path: String,
    #[arg(long, default_value = "network_log.txt")]
    narrative_path: String,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFmt,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
    #[arg(long)]
    config: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            ping: None,
            lookup: None,
            net_info: false,
            arp: false,
            view_log: false,
            raw_log: false,
            analyze: false,
            count: 3,
            csv_path: "diagnostics.csv".to_string(),
            narrative_path: "network_log.txt".to_string(),
            output: OutputFmt::Text,
            no_color: false,
            force_color: false,
            log_level: None,
            log_format: None,
            log_path: None,
            verbose: 0,
            quiet: false,
            completions: None,
            completions_out: None,
            config: None,
        }
    }
}

#[derive(Deserialize)]
struct AppConfig {
    csv_path: Option<String>,
    narrative_path: Option<String>,
    ping_count: Option<u32>,
    output: Option<OutputFmt>,
    force_color: Option<bool>,
    log_format: Option<LogFormat>,
    log_path: Option<String>,
}

fn main() {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            if let Ok(mut f) = std::fs::File::create(path) { clap_complete::generate(sh, &mut cmd, "netdiag", &mut f); } else { clap_complete::generate(sh, &mut cmd, "netdiag", &mut std::io::stdout()); }
        } else {
            clap_complete::generate(sh, &mut cmd, "netdiag", &mut std::io::stdout());
        }
        return;
    }
    if let Some(p) = args.config.as_ref()
        && let Ok(s) = std::fs::read_to_string(p)
        && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    else {
        let def = "netdiag.toml";
        if let Ok(s) = std::fs::read_to_string(def)
            && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    }
    {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if args.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if let Some(lvl) = args.log_level {
            let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
            builder.filter_level(f);
        } else if args.verbose > 0 {
            let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            builder.filter_level(f);
        }
        if let Some(fmt) = args.log_format {
            match fmt {
                LogFormat::Json => {
                    builder.format(|buf, record| {
                        let ts = chrono::Local::now().to_rfc3339();
                        let obj = serde_json::json!({
                            "ts": ts,
                            "level": record.level().to_string(),
                            "target": record.target(),
                            "msg": record.args().to_string(),
                        });
                        writeln!(buf, "{}", obj)
                    });
                }
                LogFormat::Text => {
                    builder.format(|buf, record| {
                        let ts = chrono::Local::now().format("%H:%M:%S");
                        writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                    });
                }
            }
        }
        if let Some(path) = args.log_path.as_ref() {
            match std::fs::File::create(path) {
                Ok(f) => { builder.target(env_logger::Target::Pipe(Box::new(f))); }
                Err(e) => { eprintln!("Failed to open log file {}: {}", path, e); }
            }
        }
        builder.init();
    }
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    let _ = ENABLE_COLOR.set(enable_color);

    let store = RecordStore::new(&args.csv_path, &args.narrative_path);
    let one_shot = args.ping.is_some() || args.lookup.is_some() || args.net_info || args.arp
        || args.view_log || args.raw_log || args.analyze;
    if one_shot {
        if let Some(host) = args.ping.clone() { do_ping(&args, &store, &host); }
        if let Some(domain) = args.lookup.clone() { do_lookup(&args, &store, &domain); }
        if args.net_info { do_net_info(&args, &store); }
        if args.arp { do_arp_table(&args, &store); }
        if args.view_log { do_view_log(&args, &store); }
        if args.raw_log { do_view_narrative(&store); }
        if args.analyze { do_analyze(&args, &store); }
        return;
    }
    run_menu(&args, &store);
}

fn apply_config(args: &mut Args, cfg: AppConfig) {
    if args.csv_path == "diagnostics.csv" && let Some(v) = cfg.csv_path { args.csv_path = v; }
    if args.narrative_path == "network_log.txt" && let Some(v) = cfg.narrative_path { args.narrative_path = v; }
    if args.count == 3 && let Some(v) = cfg.ping_count { args.count = v; }
    if let Some(v) = cfg.output { args.output = v; }
    if let Some(v) = cfg.force_color { args.force_color = v; }
    if args.log_format.is_none() && let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
}

fn run_menu(args: &Args, store: &RecordStore) {
    println!("Welcome to the Network Diagnostic Logger!");
    println!("Running on: {}", runner::hostname());
    loop {
        display_menu();
        let choice = match get_valid_input("Enter your choice (1-7): ", &["1", "2", "3", "4", "5", "6", "7"]) {
            Some(c) => c,
            None => break,
        };
        match choice.as_str() {
            "1" => {
                if let Some(host) = prompt("Enter hostname to ping: ") { do_ping(args, store, &host); }
            }
            "2" => {
                if let Some(domain) = prompt("Enter domain to lookup: ") { do_lookup(args, store, &domain); }
            }
            "3" => do_net_info(args, store),
            "4" => do_arp_table(args, store),
            "5" => do_view_log(args, store),
            "6" => do_analyze(args, store),
            _ => {
                println!("Goodbye! Your log is saved in {}", store.csv_path().display());
                break;
            }
        }
    }
}

fn display_menu() {
    let rule = "=".repeat(34);
    println!("\n{}", paint(&rule, "1;36"));
    println!("{}", paint("   NETWORK DIAGNOSTIC LOGGER", "1;36"));
    println!("{}", paint(&rule, "1;36"));
    println!("1. Ping a host");
    println!("2. DNS Lookup (nslookup)");
    println!("3. Show Network Info (MAC/IP)");
    println!("4. Show ARP Table (local devices)");
    println!("5. View full log");
    println!("6. Analyze log (summary)");
    println!("7. Quit");
    println!("{}", paint(&rule, "1;36"));
}

/// Re-prompts until the input is one of `valid`. `None` means stdin closed,
/// which the menu treats as quit.
fn get_valid_input(prompt_text: &str, valid: &[&str]) -> Option<String> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("{}", prompt_text);
        let _ = std::io::stdout().flush();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        let choice = line.trim();
        if valid.contains(&choice) { return Some(choice.to_string()); }
        println!("Invalid input. Please enter one of: {}", valid.join(", "));
    }
}

fn prompt(prompt_text: &str) -> Option<String> {
    print!("{}", prompt_text);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let s = line.trim().to_string();
            if s.is_empty() { None } else { Some(s) }
        }
    }
}

fn with_spinner<T>(msg: &str, f: impl FnOnce() -> T) -> T {
    if std::io::stderr().is_terminal() {
        let sp = indicatif::ProgressBar::new_spinner();
        sp.set_message(msg.to_string());
        sp.enable_steady_tick(std::time::Duration::from_millis(80));
        let out = f();
        sp.finish_and_clear();
        out
    } else {
        f()
    }
}

fn do_ping(args: &Args, store: &RecordStore, host: &str) {
    println!("Running ping on {}...", host);
    let cap = match with_spinner("pinging", || runner::ping(host, args.count)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("ping failed to launch: {}", e);
            println!("  Error: {}", e);
            log_row(store, &LogRow::new("ping", host, "Error", DiagStatus::Failed.as_str()));
            return;
        }
    };
    if !cap.success { log::warn!("ping exited with a failure status"); }
    let stats = parsers::parse_ping(&cap.stdout);
    if let OutputFmt::Json = args.output {
        if let Ok(s) = serde_json::to_string_pretty(&stats) { println!("{}", s); }
    } else {
        println!("  Status:      {}", paint(stats.status.as_str(), status_code(stats.status.as_str())));
        println!("  Packets:     {} sent, {} received", stats.transmitted, stats.received);
        println!("  Packet Loss: {}", stats.loss);
        println!("  Avg Latency: {} ms", stats.avg_ms);
    }
    log_row(store, &LogRow::new("ping", host, &stats.avg_ms, stats.status.as_str()));
    log_narrative(store, "PING", host, &cap.stdout);
    println!("Result logged.");
}

fn do_lookup(args: &Args, store: &RecordStore, domain: &str) {
    println!("Running nslookup on {}...", domain);
    let cap = match with_spinner("resolving", || runner::nslookup(domain)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("nslookup failed to launch: {}", e);
            println!("  Error: {}", e);
            log_row(store, &LogRow::new("nslookup", domain, "Error", DiagStatus::Failed.as_str()));
            return;
        }
    };
    if !cap.success { log::warn!("nslookup exited with a failure status"); }
    let result = parsers::parse_lookup(&cap.stdout);
    if let OutputFmt::Json = args.output {
        if let Ok(s) = serde_json::to_string_pretty(&result) { println!("{}", s); }
    } else {
        println!("  Status:  {}", paint(result.status.as_str(), status_code(result.status.as_str())));
        println!("  Domain:  {}", domain);
        println!("  IP:      {}", result.address);
    }
    log_row(store, &LogRow::new("nslookup", domain, &result.address, result.status.as_str()));
    log_narrative(store, "NSLOOKUP", domain, &cap.stdout);
    println!("Result logged.");
}

fn do_net_info(args: &Args, store: &RecordStore) {
    println!("Fetching network info...");
    let hostname = runner::hostname();
    let cap = match with_spinner("collecting", runner::interface_info) {
        Ok(c) => c,
        Err(e) => {
            log::error!("interface info failed to launch: {}", e);
            println!("  Error: {}", e);
            log_row(store, &LogRow::new(runner::INTERFACE_CMD, "all", "Error", DiagStatus::Failed.as_str()));
            return;
        }
    };
    let info = parsers::parse_interface_info(&cap.stdout);
    if let OutputFmt::Json = args.output {
        if let Ok(s) = serde_json::to_string_pretty(&info) { println!("{}", s); }
    } else {
        println!("  Hostname:    {}", hostname);
        println!("  MAC Address: {}", info.mac);
        println!("  IP Address:  {}", info.ipv4);
    }
    let summary = format!("{} / {}", info.mac, info.ipv4);
    log_row(store, &LogRow::new(&cap.command, "all", &summary, DiagStatus::Captured.as_str()));
    log_narrative(store, "NETINFO", "all", &cap.stdout);
    println!("Result logged.");
}

fn do_arp_table(args: &Args, store: &RecordStore) {
    println!("Scanning local network (ARP table)...");
    let cap = match with_spinner("reading ARP table", runner::arp_table) {
        Ok(c) => c,
        Err(e) => {
            log::error!("arp failed to launch: {}", e);
            println!("  Error: {}", e);
            log_row(store, &LogRow::new("arp", "local", "Error", DiagStatus::Failed.as_str()));
            return;
        }
    };
    let devices = parsers::parse_arp_table(&cap.stdout);
    if let OutputFmt::Json = args.output {
        if let Ok(s) = serde_json::to_string_pretty(&devices) { println!("{}", s); }
    } else if devices.is_empty() {
        println!("  No devices found.");
    } else {
        println!("  Found {} device(s):\n", devices.len());
        for device in &devices {
            println!("    IP: {}  |  MAC: {}", device.ip, device.mac);
        }
    }
    log_row(store, &LogRow::new("arp", "local", &format!("{} devices", devices.len()), DiagStatus::Captured.as_str()));
    log_narrative(store, "ARP", "local", &cap.stdout);
    println!("\nResult logged.");
}

fn do_view_log(args: &Args, store: &RecordStore) {
    println!("\n=== FULL LOG ===");
    let rows = match store.read_rows() {
        Ok(r) => r,
        Err(StoreError::NotFound) => {
            println!("No log file found. Run a diagnostic first.");
            return;
        }
        Err(e) => {
            log::error!("log read failed: {}", e);
            return;
        }
    };
    if let OutputFmt::Json = args.output {
        if let Ok(s) = serde_json::to_string_pretty(&rows) { println!("{}", s); }
    } else {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(["Time", "Command", "Target", "Result", "Status"].map(|h| paint(h, "1")));
        for row in &rows {
            table.add_row([
                row.timestamp.clone(),
                row.command.clone(),
                truncate(&row.target, 30),
                truncate(&row.result, 40),
                paint(&row.status, status_code(&row.status)),
            ]);
        }
        println!("{}", table);
    }
}

fn do_view_narrative(store: &RecordStore) {
    match store.read_narrative() {
        Ok(text) if text.is_empty() => println!("Log file is empty."),
        Ok(text) => print!("{}", text),
        Err(StoreError::NotFound) => println!("No log file found. Run a diagnostic first."),
        Err(e) => log::error!("narrative read failed: {}", e),
    }
}

fn do_analyze(args: &Args, store: &RecordStore) {
    println!("\n=== LOG ANALYSIS ===");
    let rows = match store.read_rows() {
        Ok(r) => r,
        Err(StoreError::NotFound) => {
            println!("No log file found. Run some diagnostics first.");
            return;
        }
        Err(e) => {
            log::error!("log read failed: {}", e);
            return;
        }
    };
    let Some(report) = analyze::analyze(&rows) else {
        println!("Log is empty.");
        return;
    };
    if let OutputFmt::Json = args.output {
        if let Ok(s) = serde_json::to_string_pretty(&report) { println!("{}", s); }
    } else {
        println!("Total entries: {}", report.total);
        println!("\n{}", paint("Commands run:", "1"));
        for (cmd, n) in &report.by_command {
            println!("  {}: {} time(s)", cmd, n);
        }
        println!("\n{}", paint("Results:", "1"));
        for (status, n) in &report.by_status {
            println!("  {}: {}", paint(status, status_code(status)), n);
        }
    }
}

fn log_row(store: &RecordStore, row: &LogRow) {
    if let Err(e) = store.append_row(row) { log::error!("CSV write failed for {}: {}", store.csv_path().display(), e); }
}

fn log_narrative(store: &RecordStore, command: &str, target: &str, raw: &str) {
    if let Err(e) = store.append_narrative(command, target, raw) { log::error!("Narrative write failed: {}", e); }
}

fn truncate(s: &str, n: usize) -> String {
    let mut out: String = s.chars().take(n).collect();
    if s.chars().count() > n { out.push_str("..."); }
    out
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&true) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}

fn status_code(status: &str) -> &'static str {
    match status {
        "Success" => "32",
        "Failed" | "Error" => "31",
        "Captured" => "36",
        _ => "37",
    }
}
