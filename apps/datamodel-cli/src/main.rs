use clap::{Parser, Subcommand, ValueEnum};
use datamodel_kernel::{Clock, DataModelStore, RegisterOptions, SystemClock, Value};
use datamodel_tools::{AuditTrail, StoreInspector};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datamodel-cli", about = "CLI tool for data model store operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run a usage scenario against a fresh store
    Demo {
        #[arg(value_enum, default_value = "all")]
        scenario: Scenario,
    },
    /// Run the undo scenario and print the patch log as JSON
    History,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    User,
    Listen,
    History,
    Undo,
    Session,
    Multi,
    Overwrite,
    All,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("datamodel-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("value: {}", datamodel_value::crate_info());
            println!("common: {}", datamodel_common::crate_info());
            println!("kernel: {}", datamodel_kernel::crate_info());
            println!("tools: {}", datamodel_tools::crate_info());
        }
        Commands::Demo { scenario } => {
            let mut store = DataModelStore::new();
            let trail = AuditTrail::new();
            store.on_store_change(trail.listener());

            let scenarios: &[Scenario] = match scenario {
                Scenario::All => &[
                    Scenario::User,
                    Scenario::Listen,
                    Scenario::History,
                    Scenario::Undo,
                    Scenario::Session,
                    Scenario::Multi,
                    Scenario::Overwrite,
                ],
                ref one => std::slice::from_ref(one),
            };
            for scenario in scenarios {
                tracing::info!(?scenario, "running demo scenario");
                run_scenario(&mut store, *scenario)?;
            }

            println!("\n{}", StoreInspector::summary(&store));
            println!("Audit records: {}", trail.len());
        }
        Commands::History => {
            let mut store = DataModelStore::new();
            undo_scenario(&mut store)?;
            tracing::info!(patches = store.get_store_changes().len(), "exporting history");
            println!("{}", serde_json::to_string_pretty(store.get_store_changes())?);
        }
    }

    Ok(())
}

fn run_scenario(store: &mut DataModelStore, scenario: Scenario) -> anyhow::Result<()> {
    match scenario {
        Scenario::User => user_scenario(store),
        Scenario::Listen => listen_scenario(store),
        Scenario::History => history_scenario(store),
        Scenario::Undo => undo_scenario(store),
        Scenario::Session => session_scenario(store),
        Scenario::Multi => multi_scenario(store),
        Scenario::Overwrite => overwrite_scenario(store),
        Scenario::All => Ok(()),
    }
}

fn show(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_owned(), Value::to_string)
}

fn user_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== User data model ===");
    store.register_data_model(
        "user",
        Value::from(json!({
            "id": "user-123",
            "profile": {"name": "John Doe", "email": "john@example.com"}
        })),
        RegisterOptions::default(),
    )?;

    store.set_in("user", "profile.age", 30)?;
    store.set_in("user", ["profile", "address", "city"], "New York")?;

    println!("User name: {}", show(store.get_in("user", "profile.name")));
    println!("User age: {}", show(store.get_in("user", "profile.age")));
    println!("Full user: {}", show(store.get_by_id("user")));
    Ok(())
}

fn listen_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== Listen to changes ===");
    let handle = store.on_store_change(|change| {
        let patch = change.patch;
        println!(
            "Store changed: store={} op={} path={} new={} previous={}",
            patch.store_id,
            patch.operation.as_str(),
            patch.patched_path.as_deref().unwrap_or("-"),
            show(patch.patched_value.as_ref()),
            show(patch.previous_value.as_ref()),
        );
    });

    store.register_data_model(
        "settings",
        Value::from(json!({"theme": "light", "language": "en"})),
        RegisterOptions::default(),
    )?;
    store.set_in("settings", "theme", "dark")?;
    store.set_in("settings", "language", "fr")?;

    store.off_store_change(handle);
    Ok(())
}

fn history_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== Existence checks and history ===");
    store.register_data_model(
        "config",
        Value::from(json!({"api": {"baseUrl": "https://api.example.com"}})),
        RegisterOptions::default(),
    )?;

    println!("Has config: {}", store.has("config"));
    println!("Has unknown: {}", store.has("unknown"));
    println!("Has api.baseUrl: {}", store.has_in("config", "api.baseUrl"));
    println!("Has api.timeout: {}", store.has_in("config", "api.timeout"));

    store.set_in("config", "api.timeout", 5000)?;
    store.set_in("config", "api.retries", 3)?;

    for patch in StoreInspector::history_for(store, "config") {
        println!(
            "  {} {} {} at {}",
            patch.store_id,
            patch.operation.as_str(),
            patch.patched_path.as_deref().unwrap_or("-"),
            patch
                .recorded_at()
                .map_or_else(|| patch.timestamp.to_string(), |t| t.to_rfc3339()),
        );
    }
    Ok(())
}

fn undo_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== Apply patches (undo) ===");
    store.register_data_model("counter", Value::from(json!({"value": 0})), RegisterOptions::default())?;
    println!("Initial: {}", show(store.get_by_id("counter")));

    store.set_in("counter", "value", 10)?;
    println!("After set to 10: {}", show(store.get_by_id("counter")));
    store.set_in("counter", "value", 20)?;
    println!("After set to 20: {}", show(store.get_by_id("counter")));

    let last = store
        .get_store_changes()
        .last()
        .ok_or_else(|| anyhow::anyhow!("no patch recorded"))?;
    println!(
        "Last patch: id={} previous={} patched={}",
        last.patch_id,
        show(last.previous_value.as_ref()),
        show(last.patched_value.as_ref()),
    );
    let last_id = last.patch_id;

    store.apply_patch(&last_id)?;
    println!("After undo: {}", show(store.get_by_id("counter")));
    Ok(())
}

fn session_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== Session management ===");
    store.register_data_model("session", Value::object(), RegisterOptions::default())?;

    let now = SystemClock.now_millis();
    store.set_in("session", "userId", "user-456")?;
    store.set_in("session", "token", "jwt-token-xyz")?;
    store.set_in("session", "expiresAt", now + 3_600_000)?;
    store.set_in("session", ["user", "email"], "user@example.com")?;
    store.set_in("session", ["user", "role"], "admin")?;

    println!("Session data: {}", show(store.get_by_id("session")));

    let valid = store
        .get_in("session", "expiresAt")
        .and_then(Value::as_f64)
        .is_some_and(|expires| expires > SystemClock.now_millis() as f64);
    println!("Session is valid: {valid}");

    store.deregister_data_model("session")?;
    println!("Session cleared");
    Ok(())
}

fn multi_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== Multiple models ===");
    store.register_data_model("cart", Value::from(json!({"items": [], "total": 0})), RegisterOptions::default())?;
    store.register_data_model("wishlist", Value::from(json!({"items": []})), RegisterOptions::default())?;
    store.register_data_model("orders", Value::from(json!({"history": []})), RegisterOptions::default())?;

    store.set_in(
        "cart",
        "items",
        Value::from(json!([
            {"id": 1, "name": "Product A", "price": 10},
            {"id": 2, "name": "Product B", "price": 20}
        ])),
    )?;
    store.set_in("cart", "total", 30)?;
    store.set_in(
        "wishlist",
        "items",
        Value::from(json!([{"id": 3, "name": "Product C", "price": 15}])),
    )?;

    let ids = store.get_all_data_model_ids();
    println!("Registered models: {ids:?}");
    for id in &ids {
        println!("{id}: {}", show(store.get_by_id(id)));
    }
    Ok(())
}

fn overwrite_scenario(store: &mut DataModelStore) -> anyhow::Result<()> {
    println!("\n=== Overwrite and mutable ===");
    store.register_data_model("immutable", Value::from(json!({"value": 100})), RegisterOptions::default())?;

    if let Err(err) =
        store.register_data_model("immutable", Value::from(json!({"value": 200})), RegisterOptions::default())
    {
        println!("Error (expected): {err}");
    }

    store.register_data_model("immutable", Value::from(json!({"value": 200})), RegisterOptions::overwrite())?;
    println!("After overwrite: {}", show(store.get_by_id("immutable")));

    let shared = Value::from(json!({"nested": {"value": "original"}}));
    store.register_data_model("mutable", shared.clone(), RegisterOptions::mutable())?;
    let adopted = store.get_by_id("mutable").is_some_and(|doc| doc.same_node(&shared));
    println!("Mutable model adopts caller nodes: {adopted}");

    store.set_in("mutable", "nested.value", "modified")?;
    println!("Mutable model after write: {}", show(store.get_by_id("mutable")));
    if let Some(info) = StoreInspector::inspect_entry(store, "mutable") {
        println!("{info}");
    }
    Ok(())
}
