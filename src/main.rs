//! Razer Blade Control CLI
//!
//! Command-line interface for power, fan, boost and lighting control of
//! Razer Blade laptops.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use razer_rust_devices::config::{self, AppConfig};
use razer_rust_devices::device::{BladeLaptop, DeviceState, PowerMode};
use razer_rust_devices::lighting::KeyboardLighting;
use razer_rust_devices::transport::{self, HidTransport};
use razer_rust_devices::utils::parsing::{
    parse_effect, parse_hex_color, parse_logo_state, parse_power_mode, parse_product_id,
    parse_row_colors,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Razer Blade Control Tool
#[derive(Parser, Debug)]
#[command(name = "razer-blade-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Product id of the laptop to open (e.g. 0x0253)
    #[arg(long, global = true)]
    pid: Option<String>,

    /// Path to an alternative config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List connected Razer laptops
    List,

    /// Show model, capabilities and current settings
    Info,

    /// Read or set the power mode
    Power {
        #[command(subcommand)]
        action: PowerAction,
    },

    /// Read or set the manual fan speed
    Fan {
        #[command(subcommand)]
        action: FanAction,
    },

    /// Read or set a boost level (Custom mode)
    Boost {
        /// Boost cluster
        #[arg(value_enum)]
        cluster: ClusterArg,

        #[command(subcommand)]
        action: LevelAction,
    },

    /// Read or set keyboard brightness
    Brightness {
        #[command(subcommand)]
        action: LevelAction,
    },

    /// Read or set the logo LED
    Logo {
        #[command(subcommand)]
        action: LogoAction,
    },

    /// Start a built-in keyboard effect
    Effect {
        /// Effect name: off, wave, reactive, breathing, spectrum, static, starlight
        name: String,

        /// Effect parameters (0-255 each)
        params: Vec<u8>,
    },

    /// Upload per-key colours (rows not given are left black)
    Matrix {
        /// Row to set (0-4)
        #[arg(long, requires = "colors")]
        row: Option<usize>,

        /// One colour for the whole row, or one per key (RRGGBB)
        #[arg(long, num_args = 1..)]
        colors: Vec<String>,

        /// Paint every key with one colour
        #[arg(long, conflicts_with = "row")]
        fill: Option<String>,
    },

    /// Read or set the battery health optimizer
    Battery {
        #[command(subcommand)]
        action: BatteryAction,
    },

    /// Continuously show controller settings
    Monitor {
        /// Update interval in seconds
        #[arg(short, long, default_value = "2")]
        interval: u64,
    },

    /// Show or create the config file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PowerAction {
    Get,
    /// balanced, gaming, creator or custom
    Set { mode: String },
}

#[derive(Subcommand, Debug)]
enum FanAction {
    Get,
    /// Fan speed in RPM, 0 for automatic
    Set { rpm: u16 },
}

#[derive(Subcommand, Debug)]
enum LevelAction {
    Get,
    Set { level: u8 },
}

#[derive(Subcommand, Debug)]
enum LogoAction {
    Get,
    /// off, static or breathing
    Set { state: String },
}

#[derive(Subcommand, Debug)]
enum BatteryAction {
    Get,
    Set {
        /// Charge limit in percent (50-80)
        #[arg(default_value = "80")]
        threshold: u8,

        /// Turn the optimizer off
        #[arg(long)]
        off: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClusterArg {
    Cpu,
    Gpu,
}

/// Options shared by every command.
struct Settings {
    config: AppConfig,
    config_path: Option<PathBuf>,
    pid: Option<u16>,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config.log_filter);

    let pid = match args.pid.as_deref() {
        Some(value) => Some(parse_product_id(value)?),
        None => config.default_pid,
    };
    let settings = Settings {
        config,
        config_path: args.config,
        pid,
    };

    match args.command {
        Command::List => cmd_list(),
        Command::Info => cmd_info(&settings),
        Command::Power { action } => cmd_power(&settings, action),
        Command::Fan { action } => cmd_fan(&settings, action),
        Command::Boost { cluster, action } => cmd_boost(&settings, cluster, action),
        Command::Brightness { action } => cmd_brightness(&settings, action),
        Command::Logo { action } => cmd_logo(&settings, action),
        Command::Effect { name, params } => cmd_effect(&settings, &name, &params),
        Command::Matrix { row, colors, fill } => cmd_matrix(&settings, row, &colors, fill),
        Command::Battery { action } => cmd_battery(&settings, action),
        Command::Monitor { interval } => cmd_monitor(&settings, interval),
        Command::Config { init } => cmd_config(&settings, init),
    }
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn open_laptop(settings: &Settings) -> Result<BladeLaptop<HidTransport>> {
    BladeLaptop::open(settings.pid, settings.config.timing())
        .context("Failed to open Razer laptop")
}

/// Open the laptop and load its current mode, fan flag and boost levels.
fn open_synced(settings: &Settings) -> Result<BladeLaptop<HidTransport>> {
    let laptop = open_laptop(settings)?;
    laptop
        .sync_state()
        .context("Failed to read controller state")?;
    Ok(laptop)
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_list() -> Result<()> {
    let devices = transport::hid::list_devices().context("Failed to enumerate devices")?;

    if devices.is_empty() {
        println!("❌ No supported Razer laptops found.");
        return Ok(());
    }

    println!("🔍 Found {} device(s):\n", devices.len());
    for (i, device) in devices.iter().enumerate() {
        let serial = device.serial.as_deref().unwrap_or("unknown");
        println!("  {}. {} ({:#06x})", i + 1, device.name, device.product_id);
        println!("     Serial: {}", serial);
        println!("     Path: {}", device.path);
    }

    Ok(())
}

fn cmd_info(settings: &Settings) -> Result<()> {
    let laptop = open_synced(settings)?;
    let caps = laptop.capabilities();
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("💻 Model:        {}", caps.name);
    println!("🆔 Product id:   {:#06x}", laptop.product_id());
    println!("🌀 Fan range:    {}-{} RPM", caps.min_fan_rpm, caps.max_fan_rpm);
    println!("🎨 Creator mode: {}", yes_no(caps.creator_mode_allowed));
    println!("🚀 Boost mode:   {}", yes_no(caps.boost_mode_allowed));
    println!("🔋 Battery opt.: {}", yes_no(caps.battery_health_allowed));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let state = laptop.state();
    println!("⚡ Power mode:   {}", state.power_mode);
    println!("🌀 Fan:          {}", fan_label(&state));
    if state.power_mode == PowerMode::Custom {
        println!("🚀 CPU boost:    {}", state.cpu_boost);
        println!("🚀 GPU boost:    {}", state.gpu_boost);
    } else {
        println!("🚀 Boost:        inactive outside Custom mode");
    }

    if caps.battery_health_allowed {
        let health = laptop.get_battery_health().context("Failed to read battery health")?;
        println!("🔋 Battery:      {}", health);
    }

    Ok(())
}

fn cmd_power(settings: &Settings, action: PowerAction) -> Result<()> {
    let laptop = open_synced(settings)?;

    match action {
        PowerAction::Get => {
            let mode = laptop.get_power_mode().context("Failed to read power mode")?;
            println!("⚡ Power mode: {}", mode);
        }
        PowerAction::Set { mode } => {
            let requested = parse_power_mode(&mode)?;
            let applied = laptop
                .set_power_mode(requested)
                .context("Failed to set power mode")?;
            if applied != requested {
                println!("⚠️  {} not available on this model", requested);
            }
            println!("✅ Power mode set to {}", applied);
        }
    }

    Ok(())
}

fn cmd_fan(settings: &Settings, action: FanAction) -> Result<()> {
    let laptop = open_synced(settings)?;

    match action {
        FanAction::Get => println!("🌀 Fan: {}", fan_label(&laptop.state())),
        FanAction::Set { rpm } => {
            let mode = laptop.state().power_mode;
            let applied = laptop.set_fan_rpm(rpm).context("Failed to set fan speed")?;
            match applied {
                0 if rpm != 0 => println!("⚠️  Fan control unavailable in {} mode", mode),
                0 => println!("✅ Fan set to automatic"),
                rpm => println!("✅ Fan set to {} RPM", rpm),
            }
        }
    }

    Ok(())
}

fn cmd_boost(settings: &Settings, cluster: ClusterArg, action: LevelAction) -> Result<()> {
    let laptop = open_synced(settings)?;
    let custom = laptop.state().power_mode == PowerMode::Custom;

    match (cluster, action) {
        (ClusterArg::Cpu, LevelAction::Get) => {
            println!("🚀 CPU boost: {}", laptop.get_cpu_boost_mode()?);
        }
        (ClusterArg::Gpu, LevelAction::Get) => {
            println!("🚀 GPU boost: {}", laptop.get_gpu_boost_mode()?);
        }
        (ClusterArg::Cpu, LevelAction::Set { level }) => {
            let applied = laptop
                .set_cpu_boost_mode(level)
                .context("Failed to set CPU boost")?;
            report_boost("CPU", applied, custom);
        }
        (ClusterArg::Gpu, LevelAction::Set { level }) => {
            let applied = laptop
                .set_gpu_boost_mode(level)
                .context("Failed to set GPU boost")?;
            report_boost("GPU", applied, custom);
        }
    }

    Ok(())
}

fn report_boost(cluster: &str, level: u8, written: bool) {
    if written {
        println!("✅ {} boost set to {}", cluster, level);
    } else {
        println!(
            "⚠️  Not in Custom mode, {} boost {} was not written. Run `power set custom` first.",
            cluster, level
        );
    }
}

fn fan_label(state: &DeviceState) -> String {
    match (state.manual_fan, state.fan_rpm) {
        (false, _) => "automatic".to_string(),
        (true, 0) => "manual".to_string(),
        (true, rpm) => format!("{} RPM", rpm),
    }
}

fn cmd_brightness(settings: &Settings, action: LevelAction) -> Result<()> {
    let laptop = open_laptop(settings)?;
    let lighting = KeyboardLighting::new();

    match action {
        LevelAction::Get => {
            let level = lighting.get_brightness(laptop.session())?;
            println!("💡 Brightness: {}", level);
        }
        LevelAction::Set { level } => {
            lighting
                .set_brightness(laptop.session(), level)
                .context("Failed to set brightness")?;
            println!("✅ Brightness set to {}", level);
        }
    }

    Ok(())
}

fn cmd_logo(settings: &Settings, action: LogoAction) -> Result<()> {
    let laptop = open_laptop(settings)?;
    let lighting = KeyboardLighting::new();

    match action {
        LogoAction::Get => {
            let lit = lighting.get_logo_state(laptop.session())?;
            println!("🟢 Logo: {}", if lit { "on" } else { "off" });
        }
        LogoAction::Set { state } => {
            let state = parse_logo_state(&state)?;
            lighting
                .set_logo_state(laptop.session(), state)
                .context("Failed to set logo")?;
            println!("✅ Logo set to {:?}", state);
        }
    }

    Ok(())
}

fn cmd_effect(settings: &Settings, name: &str, params: &[u8]) -> Result<()> {
    let effect = parse_effect(name, params)?;
    let laptop = open_laptop(settings)?;

    KeyboardLighting::new()
        .set_effect(laptop.session(), effect)
        .context("Failed to set effect")?;
    println!("✅ Effect '{}' applied", effect.name());
    Ok(())
}

fn cmd_matrix(
    settings: &Settings,
    row: Option<usize>,
    colors: &[String],
    fill: Option<String>,
) -> Result<()> {
    let mut lighting = KeyboardLighting::new();

    match (row, fill) {
        (_, Some(color)) => lighting.matrix_mut().fill(parse_hex_color(&color)?),
        (Some(row), None) => lighting.set_row(row, parse_row_colors(colors)?)?,
        (None, None) => anyhow::bail!("Give either --row with --colors, or --fill"),
    }

    let laptop = open_laptop(settings)?;
    lighting
        .flush(laptop.session())
        .context("Failed to upload frame")?;
    println!("✅ Keyboard frame uploaded");
    Ok(())
}

fn cmd_battery(settings: &Settings, action: BatteryAction) -> Result<()> {
    let laptop = open_laptop(settings)?;

    match action {
        BatteryAction::Get => {
            let health = laptop.get_battery_health()?;
            println!("🔋 Battery health optimizer: {}", health);
        }
        BatteryAction::Set { threshold, off } => {
            laptop
                .set_battery_health(!off, threshold)
                .context("Failed to set battery health")?;
            println!("✅ Battery health optimizer updated");
        }
    }

    Ok(())
}

fn cmd_monitor(settings: &Settings, interval_secs: u64) -> Result<()> {
    let laptop = open_laptop(settings)?;
    let lighting = KeyboardLighting::new();

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("🌡️  Monitoring {} (Ctrl+C to stop)...\n", laptop.capabilities().name);

    while running.load(Ordering::SeqCst) {
        match laptop.get_power_mode() {
            Ok(mode) => {
                // Clear screen and move cursor to top
                print!("\x1B[2J\x1B[1;1H");
                println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
                println!("⚡ Power mode:  {}", mode);

                let cpu = laptop.get_cpu_boost_mode().unwrap_or(0);
                let gpu = laptop.get_gpu_boost_mode().unwrap_or(0);
                println!("🚀 Boost:       CPU {} | GPU {}", cpu, gpu);

                if let Ok(level) = lighting.get_brightness(laptop.session()) {
                    println!("💡 Brightness:  {}", level);
                }
                if let Ok(health) = laptop.get_battery_health() {
                    println!("🔋 Battery:     {}", health);
                }
                println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            }
            Err(e) => {
                eprintln!("⚠️  Read error: {}", e);
            }
        }

        std::thread::sleep(Duration::from_secs(interval_secs));
    }

    println!("\n👋 Monitoring stopped.");
    Ok(())
}

fn cmd_config(settings: &Settings, init: bool) -> Result<()> {
    let path = match &settings.config_path {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };

    if init && !path.exists() {
        let written = config::save_config(&AppConfig::default(), Some(&path))
            .context("Failed to write config")?;
        println!("✅ Default config written to {}", written.display());
    }

    println!("📁 Config: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings.config)?);
    Ok(())
}
