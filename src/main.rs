/*
 * This file is part of acer4736-bl.
 *
 * Copyright (C) 2025 acer4736-bl contributors
 *
 * acer4736-bl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * acer4736-bl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with acer4736-bl. If not, see <https://www.gnu.org/licenses/>.
 */

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde_json::json;

use acer4736_bl::backlight::BacklightRegistry;
use acer4736_bl::config::{config_path, load_config, DriverConfig};
use acer4736_bl::constants::{hw, names, paths};
use acer4736_bl::dmi::{DmiField, DmiSource, SysfsDmi};
use acer4736_bl::driver::{match_platform, Acer4736Backlight, LBB_DEVICE};
use acer4736_bl::logger;
use acer4736_bl::pci::{PciBus, SysfsPci};
use acer4736_bl::BacklightError;

const USAGE: &str = "\
usage: acer4736-bl [--logging] [--config PATH] [COMMAND]

commands:
  status        show the backlight (default)
  get           print the raw brightness (0-255)
  set VALUE     write a brightness between 0 and 255
  info          show platform and device detection without touching the register";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Status,
    Get,
    Set(u32),
    Info,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct Options {
    logging: bool,
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut logging = false;
    let mut config = None;
    let mut positional: Vec<&str> = Vec::new();

    let mut it = args.iter().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--logging" => logging = true,
            "--config" => {
                let p = it.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(p));
            }
            "-h" | "--help" => positional = vec!["help"],
            s if s.starts_with('-') && s.parse::<i64>().is_err() => {
                return Err(format!("unknown option {}", s));
            }
            s => positional.push(s),
        }
    }

    let command = match positional.as_slice() {
        [] | ["status"] => Command::Status,
        ["get"] => Command::Get,
        ["set", value] => Command::Set(
            value
                .parse::<u32>()
                .map_err(|_| format!("invalid brightness {:?}", value))?,
        ),
        ["set"] => return Err("set needs a value".to_string()),
        ["info"] => Command::Info,
        ["help"] => Command::Help,
        other => return Err(format!("unexpected arguments: {}", other.join(" "))),
    };

    Ok(Options { logging, config, command })
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let opts = match parse_args(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    if opts.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let cfg_path = config_path(opts.config.as_deref());
    let cfg = load_config(&cfg_path)
        .with_context(|| format!("loading config {}", cfg_path.display()))?;

    logger::init_tracing(&cfg.log_level);
    if opts.logging {
        logger::init_logging(cfg.log_path.as_deref());
        logger::log_event("startup", json!({ "args": args }));
    }

    if let Err(err) = run(&opts.command, &cfg) {
        eprintln!("error: {:#}", err);
        if opts.logging {
            let errno = err.downcast_ref::<BacklightError>().map(BacklightError::errno);
            logger::log_event(
                "fatal_error",
                json!({ "error": format!("{:#}", err), "errno": errno }),
            );
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: &Command, cfg: &DriverConfig) -> anyhow::Result<()> {
    let dmi = SysfsDmi::new(cfg.dmi_dir());
    let bus = SysfsPci::new(cfg.pci_devices_dir());

    if *command == Command::Info {
        return print_info(&dmi, &bus);
    }

    // Bytes past the first 64 of a config file are root-only.
    if cfg.sysfs_root == Path::new(paths::SYSFS_ROOT) && unsafe { libc::geteuid() } != 0 {
        return Err(anyhow!(
            "reading the LBB register needs root privileges; run with: sudo {}",
            std::env::args().next().unwrap_or_else(|| "acer4736-bl".to_string())
        ));
    }

    let mut registry = BacklightRegistry::new();
    let driver = Acer4736Backlight::init(&dmi, &bus, &mut registry)
        .context("activating backlight")?;

    let result = match command {
        Command::Status => print_status(&driver, &registry),
        Command::Get => driver
            .brightness(&registry)
            .map(|v| println!("{}", v))
            .map_err(anyhow::Error::from),
        Command::Set(value) => driver
            .set_brightness(&mut registry, *value)
            .with_context(|| format!("setting brightness to {}", value)),
        Command::Info | Command::Help => Ok(()),
    };

    driver.shutdown(&mut registry).context("shutting down backlight")?;
    result
}

fn print_status(driver: &Acer4736Backlight, registry: &BacklightRegistry) -> anyhow::Result<()> {
    println!("name:              {}", driver.name());
    println!("machine:           {}", driver.ident());
    for attr in ["type", "brightness", "actual_brightness", "max_brightness"] {
        println!("{:<18} {}", format!("{}:", attr), registry.show(driver.name(), attr)?);
    }
    Ok(())
}

fn print_info<B: PciBus>(dmi: &SysfsDmi, bus: &B) -> anyhow::Result<()> {
    println!("DMI ({}):", dmi.dir().display());
    for field in DmiField::ALL {
        let value = dmi.field(field).unwrap_or_else(|| "<unavailable>".to_string());
        println!("  {:<16} {}", field.file_name(), value);
    }

    match match_platform(dmi) {
        Some(id) => println!("platform:          {} (supported)", id.ident),
        None => println!("platform:          not supported by {}", names::DRIVER_NAME),
    }

    match bus.get_device(LBB_DEVICE)? {
        Some(_) => println!("LBB device:        {} found", LBB_DEVICE),
        None => println!("LBB device:        {} not found", LBB_DEVICE),
    }
    println!("LBB register:      offset 0x{:02x}, max {}", hw::LBB_OFFSET, hw::MAX_BRIGHTNESS);
    Ok(())
}
