//! extsurface - per-extension capability surfaces.
//!
//! Usage:
//!   extsurface demo              Run two extensions against in-memory hosts
//!   extsurface config            Show the effective configuration
//!   extsurface --help            Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use itertools::Itertools;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use extsurface_api::{ExtensionSurface, TeardownReport};
use extsurface_core::{ContentKind, ExtensionIdentity, SurfaceConfig, Value};
use extsurface_host::memory::MemoryHost;
use extsurface_host::{CompileOptions, ModalSpec, SettingsRef};
use extsurface_patch::{Module, ModuleRef, PatchRegistry, PatchTarget};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "EXTSURFACE_LOG";

#[derive(Parser)]
#[command(
    name = "extsurface",
    version,
    about = "Per-extension capability surfaces with scoped patching and teardown",
    long_about = "extsurface gives every loaded extension a revocable view onto host \
                  services and tears everything it registered down in one call.\n\n\
                  Use `extsurface demo` to watch two extensions share a patched module."
)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scripted session with two extensions
    Demo {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(SurfaceConfig::default_path);
    let config = SurfaceConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    init_tracing(&config.log_filter);

    match cli.command {
        Command::Demo { format } => run_demo(config, format).await?,
        Command::Config { format } => show_config(&config, &config_path, format)?,
    }

    Ok(())
}

/// Install a fmt subscriber filtered by `EXTSURFACE_LOG`, falling back to `default`.
fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn show_config(config: &SurfaceConfig, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(config)?);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "path": path,
                    "config": config,
                }))?
            );
        }
    }
    Ok(())
}

/// A host module with a single `greet(name)` method.
fn greeter() -> ModuleRef {
    Module::new("greeter")
        .with_method("greet", |args: &[Value]| {
            let name = args.first().and_then(Value::as_str).unwrap_or("world");
            Value::from(format!("Hello, {name}"))
        })
        .into_ref()
}

/// Load a plugin into the directory and bind a surface to it.
fn load_plugin(
    host: &MemoryHost,
    registry: &Arc<PatchRegistry>,
    config: &Arc<SurfaceConfig>,
    id: &str,
    name: &str,
    bridge: Value,
) -> ExtensionSurface {
    let path = PathBuf::from(format!("/plugins/{id}"));
    host.directory.load(
        ContentKind::Plugin,
        ExtensionIdentity::new(id, name, path.clone()),
        bridge,
    );
    ExtensionSurface::new(path, Arc::clone(registry), host.bridge(), Arc::clone(config))
}

fn greet(module: &ModuleRef, name: &str) -> Result<String> {
    let value = module.call("greet", &[Value::from(name)])?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

fn teardown_json(report: &TeardownReport) -> serde_json::Value {
    json!({
        "unpatched": report.unpatched,
        "events": report.events,
        "menu_items": report.menu_items,
        "styles": report.styles,
        "modals": report.modals,
        "failures": report
            .failures
            .iter()
            .map(|(kind, err)| json!({ "kind": kind.to_string(), "error": err.to_string() }))
            .collect::<Vec<_>>(),
    })
}

async fn run_demo(config: SurfaceConfig, format: OutputFormat) -> Result<()> {
    let config = Arc::new(config);
    let host = MemoryHost::new();
    let registry = Arc::new(PatchRegistry::new());
    let module = host.modules.register(greeter());

    let clock = load_plugin(&host, &registry, &config, "clock", "Clock", Value::from("tick"));
    let shouty = load_plugin(&host, &registry, &config, "shouty", "Shouty", Value::Null);

    let original = greet(&module, "Ada")?;

    // clock: decorate the argument, add UI and listen for theme changes.
    clock.logger().info("starting")?;
    let target = clock
        .modules()
        .by_name("greeter")?
        .ok_or_else(|| color_eyre::eyre::eyre!("greeter module is not registered"))?;
    clock.patcher().before(PatchTarget::new(target.clone(), "greet"), |args| {
        if let Some(Value::String(name)) = args.first_mut() {
            name.push_str(" (on time)");
        }
        Ok(())
    })?;
    clock
        .styles()
        .inject_compiled(
            None,
            ".clock {\n  color: $accent;\n}\n",
            &CompileOptions::default().with_variable("accent", "teal").minified(),
        )
        .await?;
    clock
        .menu()
        .add_bound(SettingsRef::new("clock"), "Clock settings")?;
    let notice = clock.modals().basic("Clock", "The clock plugin is running")?;
    clock
        .modals()
        .add(ModalSpec::basic("Alarm", "Wake up").sticky(), clock.modals().base_component())?;
    clock.events().on("theme_changed", |theme| {
        tracing::info!(target: "extsurface::ext", theme = ?theme, "Theme changed");
    })?;

    // shouty: upper-case whatever greet returns.
    shouty
        .patcher()
        .after(PatchTarget::new(target.clone(), "greet"), |_, ret| {
            Ok(ret.as_str().map(|s| Value::from(s.to_uppercase())))
        })?;
    let clock_bridge = shouty.bridge("clock").await?;

    let patched = greet(&module, "Ada")?;
    let delivered = host.events.emit("theme_changed", &Value::from("dark"));

    // The user closes the notice before teardown.
    host.modals.dismiss(notice.id());

    let styles = clock.styles().list();
    let menu = host.menu.labels(&config.menu_category);
    let modals_before = clock.modals().stack().len();
    let report = clock.teardown().await;
    let after_teardown = greet(&module, "Ada")?;

    match format {
        OutputFormat::Text => {
            println!("{}", "─".repeat(60));
            println!(" extsurface demo");
            println!("{}", "─".repeat(60));
            println!(" original        : {original}");
            println!(" patched         : {patched}");
            println!(" after teardown  : {after_teardown}");
            println!(
                " styles          : {}",
                styles.iter().map(|s| &s.style_id).join(", ")
            );
            println!(" menu            : {}", menu.iter().join(", "));
            println!(" open modals     : {modals_before}");
            println!(" events delivered: {delivered}");
            println!(" clock bridge    : {clock_bridge:?}");
            println!("{}", "─".repeat(60));
            println!(
                " teardown released {} item(s): {} patch(es), {} event(s), {} menu item(s), {} style(s), {} modal(s)",
                report.released(),
                report.unpatched,
                report.events,
                report.menu_items,
                report.styles,
                report.modals
            );
            for (kind, err) in &report.failures {
                println!("   {kind}: {err}");
            }
            println!(
                " patches left    : {}",
                registry
                    .owners()
                    .iter()
                    .sorted()
                    .map(|owner| owner.to_string())
                    .join(", ")
            );
        }
        OutputFormat::Json => {
            let output = json!({
                "original": original,
                "patched": patched,
                "after_teardown": after_teardown,
                "styles": styles,
                "menu": menu,
                "open_modals": modals_before,
                "events_delivered": delivered,
                "clock_bridge": clock_bridge,
                "teardown": teardown_json(&report),
                "remaining_owners": registry.owners(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    shouty.teardown().await;
    Ok(())
}
