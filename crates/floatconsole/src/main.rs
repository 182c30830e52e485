//! Float Console - runs a scripted page through the console overlay and
//! prints the rendered panel.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bridge::{CommandBus, DockPosition};
use capture::{ErrorEvent, MemoryConsole, PageContext};
use common::{JsObject, LogType, Value};
use floatconsole::background::TOGGLE_DOCK_SHORTCUT;
use floatconsole::{
    Background, ConsoleEngine, FloatConsoleConfig, InstallReason, PopupController, VERSION,
};
use ui::debounce::FILTER_DEBOUNCE;
use ui::MemorySettingsStore;

/// Float Console - in-page console overlay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dock corner
    #[arg(long, default_value = "bottom-right")]
    position: DockPosition,

    /// Use the dark theme
    #[arg(long)]
    dark: bool,

    /// Log font size (8-24)
    #[arg(long)]
    font_size: Option<u32>,

    /// Enabled log types, comma separated
    #[arg(long, value_delimiter = ',')]
    types: Vec<LogType>,

    /// Text filter applied to the panel
    #[arg(long)]
    filter: Option<String>,

    /// Buffer capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Open the dock through the keyboard shortcut instead of the popup
    #[arg(long)]
    shortcut: bool,

    /// Do not echo captured calls to this process's console
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Float Console v{}", VERSION);

    let mut config = if args.quiet {
        FloatConsoleConfig::headless()
    } else {
        FloatConsoleConfig::default()
    };
    if let Some(capacity) = args.capacity {
        config = config.with_buffer_capacity(capacity);
    }

    let page = if config.echo_native {
        PageContext::with_std_console()
    } else {
        PageContext::new(Arc::new(MemoryConsole::new()))
    };
    let store = Arc::new(MemorySettingsStore::new());
    let bus = CommandBus::new(config.retry);
    let background = Background::new(bus.clone(), store.clone(), config.tab);
    background.on_installed(InstallReason::Install).await?;
    let engine = ConsoleEngine::start(config.clone(), page, store.clone(), bus.clone()).await?;

    let popup = PopupController::new(bus, store, config.tab);
    popup.load().await;
    if args.shortcut {
        // The shortcut toggles the tab without touching stored settings.
        background.on_shortcut(TOGGLE_DOCK_SHORTCUT).await;
    } else if !popup.settings().dock_visible {
        popup.toggle_dock().await;
    }
    popup.change_position(args.position).await;
    if args.dark {
        popup.set_dark_mode(true).await;
    }
    if args.font_size.is_some() {
        popup.set_log_font(None, args.font_size).await;
    }
    if !args.types.is_empty() {
        popup.set_log_types(&args.types).await;
    }

    run_script(engine.page());
    engine.settle().await?;

    if let Some(text) = &args.filter {
        let now = Instant::now();
        engine.panel().input_filter_text(text, now);
        engine.panel().tick(now + FILTER_DEBOUNCE);
    }

    match engine.render(true) {
        Some(frame) => {
            println!("{}", frame.html);
            info!(
                rows = frame.visible_rows,
                hidden = frame.hidden_rows,
                buffered = engine.buffer_len(),
                "panel rendered"
            );
        }
        None => warn!("panel is hidden"),
    }

    for notice in popup.notices(Instant::now()) {
        warn!("{}", notice.text);
    }

    engine.shutdown().await;
    Ok(())
}

/// A page that exercises every capture path.
fn run_script(page: &PageContext) {
    let console = page.console();

    console.log(&[
        Value::from("%cFloat Console%c demo"),
        Value::from("color: #4285f4; font-weight: bold"),
        Value::from(""),
    ]);
    console.info(&[Value::from("user"), Value::object([("id", 7), ("active", 1)])]);
    console.warn(&[Value::from("deprecated API:"), Value::from("fetchAll")]);
    console.debug(&[Value::array([1, 2, 3])]);

    console.table(&[Value::array([
        Value::object([("name", Value::from("alpha")), ("size", Value::from(3))]),
        Value::object([("name", Value::from("beta")), ("size", Value::from(12))]),
    ])]);

    console.group(&[Value::from("request")]);
    console.log(&[Value::from("GET /api/items")]);
    console.group_collapsed(&[Value::from("headers")]);
    console.log(&[Value::from("accept: application/json")]);
    console.group_end();
    console.group_end();

    let cyclic = JsObject::new();
    cyclic.set("name", "loop");
    cyclic.set("self", cyclic.clone());
    console.log(&[Value::from("cyclic"), Value::Object(cyclic)]);

    console.error(&[Value::error(
        "TypeError",
        "cannot read properties of undefined",
        Some("at render (app.js:10:5)"),
    )]);
    page.report_error(
        &ErrorEvent::script("Uncaught ReferenceError: missing is not defined", None)
            .with_location("app.js", 42, 13),
    );
    page.report_error(&ErrorEvent::resource("IMG", "https://example.com/logo.png"));
    page.report_unhandled_rejection(&Value::from("timeout"));
}
