// PP1-MONITOR main entry point
// Listens on a serial port and shows the live register table

use pp1_monitor::serial::list_ports;
use pp1_monitor::{MemoryView, MonitorConfig, SerialPoller, SerialPort, Snapshot};
use std::env;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Args {
    list: bool,
    json: bool,
    config: Option<String>,
    port: Option<String>,
    baud_rate: Option<u32>,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} [--config FILE] [--json] <port> [baud]", program);
    eprintln!("       {} --list", program);
    eprintln!("\nExamples:");
    eprintln!("  {} /dev/rfcomm0             # Watch registers at 9600 baud", program);
    eprintln!("  {} COM5 115200 --json       # Print snapshots as JSON", program);
    eprintln!("  {} --config pp1.json        # Port and timings from a file", program);
    std::process::exit(1);
}

fn parse_args(program: &str, args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args;

    while let Some(arg) = args.next() {
        if !arg.starts_with('-') {
            if parsed.port.is_none() {
                parsed.port = Some(arg);
            } else if parsed.baud_rate.is_none() {
                parsed.baud_rate = Some(arg.parse()?);
            } else {
                anyhow::bail!("Unexpected argument {}", arg);
            }
            continue;
        }

        match arg.as_str() {
            "--list" | "-l" => parsed.list = true,
            "--json" => parsed.json = true,
            "--config" | "-c" => {
                parsed.config = Some(args.next().ok_or_else(|| {
                    anyhow::anyhow!("--config requires a file argument")
                })?);
            }
            "--help" | "-h" => usage(program),
            flag => anyhow::bail!("Unknown option {}", flag),
        }
    }

    Ok(parsed)
}

fn render(port_name: &str, snapshot: &Snapshot, updates: u64, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        // clear screen and home the cursor
        print!("\x1B[2J\x1B[H");
        println!("PP-1 registers on {} ({} updates)\n", port_name, updates);
        print!("{}", snapshot);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pp1_monitor::init_tracing();

    let mut argv = env::args();
    let program = argv.next().unwrap_or_else(|| "pp1-monitor".to_string());
    let args = match parse_args(&program, argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n", e);
            usage(&program);
        }
    };

    if args.list {
        let ports = list_ports()?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{}", port);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(baud_rate) = args.baud_rate {
        config.baud_rate = baud_rate;
    }
    config.validate()?;

    let Some(port_name) = config.port.clone() else {
        eprintln!("No serial port given\n");
        usage(&program);
    };

    let port = SerialPort::open(&port_name, config.serial_config())?;
    let view = Arc::new(MemoryView::new());
    let handle = SerialPoller::new(port, Arc::clone(&view))
        .with_config(config.poller.clone())
        .spawn();

    tracing::info!("Listening on {}, press Ctrl-C to stop", port_name);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(config.refresh_interval());
    let mut rendered: Option<u64> = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                let stats = handle.shutdown().await?;
                tracing::info!(
                    "Stopped after {} frames ({} malformed)",
                    stats.frames_decoded,
                    stats.frames_dropped
                );
                break;
            }
            _ = ticker.tick() => {
                if handle.is_finished() {
                    return match handle.join().await {
                        Ok(_) => Ok(()),
                        Err(e) => {
                            tracing::error!("{}", e);
                            Err(e.into())
                        }
                    };
                }

                let updates = view.update_count();
                if rendered != Some(updates) {
                    render(&port_name, &view.snapshot(), updates, args.json)?;
                    rendered = Some(updates);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        parse_args("pp1-monitor", args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let args = parse(&["/dev/rfcomm0", "115200", "--json"]).unwrap();
        assert_eq!(args.port.as_deref(), Some("/dev/rfcomm0"));
        assert_eq!(args.baud_rate, Some(115200));
        assert!(args.json);
        assert!(!args.list);

        let args = parse(&["--config", "pp1.json"]).unwrap();
        assert_eq!(args.config.as_deref(), Some("pp1.json"));
        assert_eq!(args.port, None);

        assert!(parse(&["--list"]).unwrap().list);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["COM5", "fast"]).is_err());
        assert!(parse(&["COM5", "9600", "extra"]).is_err());
    }
}
