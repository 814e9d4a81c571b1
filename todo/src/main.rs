//! Demo for the Todo client.
//!
//! Wires the mock server, query client, store and list reducer together and
//! walks through load, create, toggle, delete, filter, search and select,
//! printing what a list view would show after each step.
//!
//! Environment:
//! - `RUST_LOG`: tracing filter
//! - `TODO_FETCH_POLICY`: `cache-first` (default) or `network-only`
//! - `TODO_MOCK_LATENCY_MS`: artificial latency of the mock server

use anyhow::Context;
use graphql_todo::{
    validate_title, MockTodoServer, TodoApi, TodoEnvironment, TodoFilter, TodoId, TodoListAction, TodoListReducer,
    TodoListState,
};
use graphql_todo_core::{environment::SystemClock, ClientConfig, InMemoryCache, QueryClient};
use graphql_todo_runtime::metrics::MetricsRecorder;
use graphql_todo_runtime::{Store, StoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type TodoStore = Store<TodoListState, TodoListAction, TodoEnvironment, TodoListReducer>;

const LATENCY_ENV: &str = "TODO_MOCK_LATENCY_MS";
const EFFECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "graphql_todo=info,graphql_todo_core=info".into()))
        .with(fmt::layer())
        .init();

    let recorder = MetricsRecorder::install()?;

    let config = ClientConfig::from_env()?;
    let latency = match std::env::var(LATENCY_ENV) {
        Ok(value) => Some(Duration::from_millis(
            value.trim().parse().with_context(|| format!("{LATENCY_ENV} must be milliseconds"))?,
        )),
        Err(_) => None,
    };

    let mut server = MockTodoServer::seeded(SystemClock);
    if let Some(latency) = latency {
        server = server.with_latency(latency);
    }
    let server = Arc::new(server);

    let client = QueryClient::with_config(server.clone(), Arc::new(InMemoryCache::new()), config);
    let api = TodoApi::new(client);
    let env = TodoEnvironment::new(api.clone(), Arc::new(SystemClock));
    let store = Store::with_config(
        TodoListState::new(),
        TodoListReducer::new(),
        env,
        StoreConfig::default().with_shutdown_timeout(EFFECT_TIMEOUT),
    );

    println!("=== GraphQL Todo ===\n");

    dispatch(&store, TodoListAction::LoadTodos).await?;
    print_list(&store, "Loaded").await;

    let title = "Buy milk";
    validate_title(title)?;
    dispatch(&store, TodoListAction::AddTodo { title: title.into() }).await?;
    print_list(&store, "After adding \"Buy milk\"").await;

    dispatch(&store, TodoListAction::ToggleTodo { id: TodoId::from("1") }).await?;
    print_list(&store, "After toggling \"Learn GraphQL\"").await;

    dispatch(&store, TodoListAction::DeleteTodo { id: TodoId::from("3") }).await?;
    print_list(&store, "After deleting \"Setup MSW\"").await;

    dispatch(&store, TodoListAction::SetFilter(TodoFilter::Active)).await?;
    print_list(&store, "Active only").await;

    dispatch(&store, TodoListAction::SetSearchKeyword("MILK".into())).await?;
    print_list(&store, "Searching").await;

    dispatch(&store, TodoListAction::SetSearchKeyword(String::new())).await?;
    dispatch(&store, TodoListAction::SetFilter(TodoFilter::All)).await?;
    dispatch(&store, TodoListAction::SelectTodo(TodoId::from("2"))).await?;
    if let Some(todo) = store.state(|s| s.selected().cloned()).await {
        println!("Selected: {}", todo.title);
        if let Some(details) = api.todo(&todo.id).await? {
            println!(
                "  created {}, updated {}\n",
                details.created_at.map_or_else(|| "-".into(), |t| t.to_rfc3339()),
                details.updated_at.map_or_else(|| "-".into(), |t| t.to_rfc3339()),
            );
        }
    }

    server.set_online(false);
    dispatch(&store, TodoListAction::ToggleTodo { id: TodoId::from("2") }).await?;
    if let Some(error) = store.state(|s| s.last_error.clone()).await {
        println!("While offline: {error}\n");
    }
    server.set_online(true);
    dispatch(&store, TodoListAction::DismissError).await?;

    dispatch(&store, TodoListAction::DeleteTodo { id: TodoId::from("42") }).await?;
    if let Some(error) = store.state(|s| s.last_error.clone()).await {
        println!("Unknown id: {error}\n");
    }

    store.shutdown_default().await?;

    if let Some(snapshot) = recorder.render() {
        println!("=== Metrics ===\n{snapshot}");
    }

    println!("=== Demo Complete ===");
    Ok(())
}

/// Send an action and wait for its effects, including the result action
async fn dispatch(store: &TodoStore, action: TodoListAction) -> anyhow::Result<()> {
    let mut handle = store.send(action).await?;
    handle
        .wait_with_timeout(EFFECT_TIMEOUT)
        .await
        .context("effects did not settle")?;
    Ok(())
}

async fn print_list(store: &TodoStore, heading: &str) {
    let (stats, visible) = store
        .state(|s| (s.ui.filter_stats.clone(), s.visible()))
        .await;

    println!("{heading}: {} ({}/{})", stats.display_text, visible.filtered_count, visible.total_count);
    for todo in &visible.filtered {
        let status = if todo.completed { "✓" } else { " " };
        println!("  [{status}] {} {}", todo.id, todo.title);
    }
    println!();
}
