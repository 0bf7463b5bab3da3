use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use gamepad_emulator::config::Config;
use gamepad_emulator::gamepad::descriptor::REPORT_ID;
use gamepad_emulator::gamepad::{Gamepad, HatDirection, LayoutKind};
use gamepad_emulator::rpc::{ClientError, Dispatcher, JoystickClient, RpcServer, SerialConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gamepad-emulator", version, about = "Virtual HID gamepad driven over JSON-RPC")]
struct Cli {
    /// Config file, defaults to <config_dir>/gamepad-emulator/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve JSON-RPC on stdio, or on a TCP listener one connection at a time
    Serve {
        #[arg(long)]
        tcp: Option<SocketAddr>,
        #[arg(long, value_enum)]
        layout: Option<LayoutKind>,
    },
    /// Print the HID report descriptor and device identity, or write the raw descriptor
    Descriptor {
        #[arg(long, value_enum)]
        layout: Option<LayoutKind>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Perform one call against a device on a serial port
    Call {
        #[arg(long)]
        port: String,
        #[command(subcommand)]
        op: CallOp,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CallOp {
    Button {
        index: usize,
    },
    SetButton {
        index: usize,
        #[arg(action = clap::ArgAction::Set)]
        push: bool,
    },
    Hat {
        index: usize,
    },
    SetHat {
        index: usize,
        /// 0 = up, clockwise to 7 = up-left, anything else centers
        dir: u8,
    },
    Axis {
        index: usize,
    },
    SetAxis {
        index: usize,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    SendState,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let config = Config::load(cli.config.as_deref())
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;
    debug!("Effective config: {:?}", config);

    match cli.command {
        Command::Serve { tcp, layout } => {
            serve(&config, layout.unwrap_or(config.layout), tcp).await
        }
        Command::Descriptor { layout, out } => {
            descriptor(&config, layout.unwrap_or(config.layout), out).await
        }
        Command::Call { port, op } => call(config.serial.clone(), port, op).await,
    }
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(if verbose { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging_env(level: Level) {
    // stdout may carry the RPC stream, logs go to stderr
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

async fn serve(config: &Config, layout: LayoutKind, tcp: Option<SocketAddr>) -> Result<()> {
    info!("Initializing gamepad with {} layout", layout);
    let sink = config
        .sink
        .build()
        .map_err(|e| eyre!("Failed to open HID sink {:?}: {}", config.sink, e))?;
    let gamepad =
        Gamepad::with_kind(layout, sink).map_err(|e| eyre!("Failed to build gamepad: {}", e))?;
    let mut server = RpcServer::new(Dispatcher::new(gamepad))
        .with_max_line_length(config.server.max_line_length);

    let Some(addr) = tcp else {
        info!("Serving JSON-RPC on stdio");
        let stream = tokio::io::join(tokio::io::stdin(), tokio::io::stdout());
        let answered = server
            .run(stream)
            .await
            .map_err(|e| eyre!("Connection failed: {}", e))?;
        info!("Stdio closed after {} requests", answered);
        return Ok(());
    };

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;
    info!("Listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Serving {}", peer);
        match server.run(stream).await {
            Ok(answered) => info!("{} disconnected after {} requests", peer, answered),
            Err(e) => warn!("Dropped connection to {}: {}", peer, e),
        }
    }
}

async fn descriptor(config: &Config, layout: LayoutKind, out: Option<PathBuf>) -> Result<()> {
    let report_layout = layout.build();
    let bytes = report_layout.descriptor();

    if let Some(path) = out {
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| eyre!("Failed to write descriptor to {}: {}", path.display(), e))?;
        info!("Wrote {} byte {} descriptor to {}", bytes.len(), layout, path.display());
        return Ok(());
    }

    let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    println!("layout:        {}", layout);
    println!("vendor_id:     {:#06x}", config.device.vendor_id);
    println!("product_id:    {:#06x}", config.device.product_id);
    println!("manufacturer:  {}", config.device.manufacturer);
    println!("product:       {}", config.device.product);
    println!("report_id:     {}", REPORT_ID);
    // report id byte included, as the gadget's report_length expects
    println!("report_length: {}", report_layout.report_len() + 1);
    println!("descriptor:    {}", hex.join(" "));
    Ok(())
}

async fn call(serial: SerialConfig, port: String, op: CallOp) -> Result<()> {
    let output = tokio::task::spawn_blocking(move || -> Result<String, ClientError> {
        let mut client = JoystickClient::open(&port, &serial)?;
        let output = match op {
            CallOp::Button { index } => client.button(index)?.to_string(),
            CallOp::SetButton { index, push } => {
                client.set_button(index, push)?;
                "ok".to_string()
            }
            CallOp::Hat { index } => {
                let hat = client.hat(index)?;
                format!("{} ({})", hat.code(), hat)
            }
            CallOp::SetHat { index, dir } => {
                client.set_hat(index, HatDirection::from_code(i64::from(dir)))?;
                "ok".to_string()
            }
            CallOp::Axis { index } => client.axis(index)?.to_string(),
            CallOp::SetAxis { index, value } => {
                client.set_axis(index, value)?;
                "ok".to_string()
            }
            CallOp::SendState => {
                client.send_state()?;
                "ok".to_string()
            }
        };
        Ok(output)
    })
    .await
    .map_err(|e| eyre!("Client task failed: {}", e))?
    .map_err(|e| eyre!("Call failed: {}", e))?;

    println!("{output}");
    Ok(())
}
