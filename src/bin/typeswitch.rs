// Typeswitch CLI
// Watches physical keyboards and retypes the last word on the next layout

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use typeswitch_core::config::default_config_content;
use typeswitch_core::{
    ensure_root, Config, EventLoop, Key, RunError, RunLoop, Switcher, VirtualDevice,
    EXIT_NOT_PRIVILEGED, VIRTUAL_DEVICE_NAME,
};

/// Retype what you just typed under the next keyboard layout
#[derive(Parser, Debug)]
#[command(name = "typeswitch")]
#[command(version)]
#[command(about = "Retype the last typed word under the next keyboard layout", long_about = None)]
struct Args {
    /// TOML configuration file (default: ~/.config/typeswitch/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only listen on these devices, by path or name (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Key whose release starts a retype, overrides the config file
    #[arg(short, long, value_name = "KEY")]
    trigger_key: Option<Key>,

    /// List input devices with keys or buttons
    #[arg(long)]
    list_devices: bool,

    /// Validate config, print the resolved values and exit
    #[arg(long)]
    check_config: bool,

    /// Print a commented default config file and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Load the config file and apply command line overrides on top
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default config".to_string(),
    })?;

    // CLI --devices > config [devices].only > every key-capable device
    if !args.devices.is_empty() {
        config.device_filter = args.devices.clone();
    }
    if let Some(key) = args.trigger_key {
        config.trigger_key = key;
    }
    config.verbose |= args.verbose;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn list_devices() -> anyhow::Result<()> {
    let devices = EventLoop::list_devices(VIRTUAL_DEVICE_NAME)?;
    println!("Found {} input device(s) with keys:", devices.len());
    for device in &devices {
        let kind = if device.is_keyboard { "keyboard" } else { "other" };
        let skipped = if device.listened { "" } else { ", skipped" };
        match &device.path {
            Some(path) => println!(
                "  {}: {} ({}) [{}{}]",
                device.index, device.name, path, kind, skipped
            ),
            None => println!("  {}: {} [{}{}]", device.index, device.name, kind, skipped),
        }
    }
    Ok(())
}

/// Spawn a thread that clears `running` on SIGINT or SIGTERM
fn install_signal_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handler")?;

    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            log::info!("Received signal {}, shutting down", signal);
            running.store(false, Ordering::SeqCst);
        }
    });
    Ok(())
}

fn run(config: Config) -> anyhow::Result<()> {
    // The virtual device must exist before enumeration so it can be skipped
    let output = VirtualDevice::with_name(VIRTUAL_DEVICE_NAME)?;
    let input = EventLoop::open(&config.device_filter, VIRTUAL_DEVICE_NAME)
        .context("Failed to open input devices")?;

    log::info!("Listening on {} device(s)", input.device_count());
    for name in input.device_names() {
        log::debug!("  {}", name);
    }

    let running = Arc::new(AtomicBool::new(true));
    install_signal_handler(running.clone())?;

    let switcher = Switcher::new(&config, output);
    let mut run_loop = RunLoop::new(input, switcher);

    log::info!(
        "typeswitch is running, release {} to retype. Press Ctrl+C to exit.",
        config.trigger_key
    );
    let result = run_loop.run(&running);

    let (_input, switcher) = run_loop.into_parts();
    let closed = switcher.into_emitter().close();

    match result {
        Ok(stats) => {
            log::info!(
                "Stopped after {} event(s), {} retype(s), {} reset(s)",
                stats.events,
                stats.retypes,
                stats.resets
            );
        }
        Err(RunError::InputExhausted) => bail!("All input devices were removed"),
        Err(e) => return Err(e.into()),
    }

    closed.context("Failed to release virtual device")?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_content());
        return ExitCode::SUCCESS;
    }

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        println!("Configuration is valid");
        println!("{}", config.summary());
        return ExitCode::SUCCESS;
    }

    init_logging(config.verbose);

    if let Err(e) = ensure_root() {
        eprintln!("{}", e);
        return ExitCode::from(EXIT_NOT_PRIVILEGED as u8);
    }

    let result = if args.list_devices {
        list_devices()
    } else {
        run(config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
