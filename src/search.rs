//! Catalog search from the command line, plus the debounced search task.
//!
//! [`spawn_debounced_search`] turns a stream of raw input values into
//! search runs that only happen once the input has been stable for the
//! configured quiet period.

use shivaya_catalog_core::debounce::Debouncer;
use shivaya_catalog_core::images::ImageResolver;
use shivaya_catalog_core::models::Catalog;
use shivaya_catalog_core::navigation::Navigator;
use shivaya_catalog_core::search::{search, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::browse::print_view;
use crate::config::Config;
use crate::loader::load_catalog;

/// Results for one settled query.
#[derive(Debug, Clone)]
pub struct SearchUpdate {
    pub query: String,
    pub results: Vec<SearchResult>,
}

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let resolver = ImageResolver::default();
    let load = load_catalog(config, &resolver).await?;
    if let Some(error) = load.error {
        anyhow::bail!(error);
    }

    let limit = limit.unwrap_or(config.search.max_results);
    let results = search(&load.catalog, query, limit);
    print_results(&results);
    Ok(())
}

pub fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, result) in results.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, result.kind.as_str(), result.name);
        match (&result.category, &result.subcategory) {
            (Some(c), Some(s)) => println!("    in: {} / {}", c, s),
            (Some(c), None) if c != &result.name => println!("    in: {}", c),
            _ => {}
        }
        if let Some(description) = result.description.as_deref().filter(|d| !d.is_empty()) {
            println!("    {}", description.replace('\n', " ").trim());
        }
        println!("    id: {}", result.id);
    }
}

/// Spawns a task that searches `catalog` for each input value once no
/// newer value has arrived for `quiet`. Repeated identical queries are
/// searched once. When the input sender is dropped, a pending value is
/// still flushed after its quiet period before the task ends.
pub fn spawn_debounced_search(
    catalog: Arc<Catalog>,
    quiet: Duration,
    limit: usize,
    mut input: watch::Receiver<String>,
) -> (mpsc::UnboundedReceiver<SearchUpdate>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut debouncer = Debouncer::new(quiet);
        let mut last_query: Option<String> = None;
        let mut input_open = true;

        loop {
            let deadline = debouncer.deadline();
            if !input_open && deadline.is_none() {
                break;
            }

            tokio::select! {
                changed = input.changed(), if input_open => {
                    if changed.is_err() {
                        input_open = false;
                        continue;
                    }
                    let value = input.borrow_and_update().clone();
                    debouncer.input(value, Instant::now().into_std());
                }
                _ = wait_for(deadline) => {
                    let Some(query) = debouncer.poll(Instant::now().into_std()) else {
                        continue;
                    };
                    if last_query.as_deref() == Some(query.as_str()) {
                        continue;
                    }
                    let results = search(&catalog, &query, limit);
                    debug!(query = %query, results = results.len(), "debounced search");
                    last_query = Some(query.clone());
                    if tx.send(SearchUpdate { query, results }).is_err() {
                        break;
                    }
                }
            }
        }
    });

    (rx, handle)
}

async fn wait_for(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => sleep_until(Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// `shivaya interactive`: each stdin line is the current search box
/// content. `:open N` drills into result N of the latest search, `:back`
/// steps up a level, `:quit` exits.
pub async fn run_interactive(config: &Config) -> anyhow::Result<()> {
    let resolver = ImageResolver::default();
    let load = load_catalog(config, &resolver).await?;
    if let Some(error) = load.error {
        anyhow::bail!(error);
    }
    let catalog = Arc::new(load.catalog);
    let mut navigator = Navigator::new(catalog.clone());

    let (input_tx, input_rx) = watch::channel(String::new());
    let (mut updates, handle) = spawn_debounced_search(
        catalog,
        config.search.debounce(),
        config.search.max_results,
        input_rx,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest: Vec<SearchResult> = Vec::new();
    let mut input_tx = Some(input_tx);

    loop {
        tokio::select! {
            line = lines.next_line(), if input_tx.is_some() => {
                let Some(line) = line? else {
                    input_tx = None;
                    continue;
                };
                let trimmed = line.trim();
                if trimmed == ":quit" {
                    input_tx = None;
                } else if trimmed == ":back" {
                    navigator.go_back();
                    println!("{}", navigator.path());
                } else if let Some(n) = trimmed.strip_prefix(":open ") {
                    let picked = n
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| latest.get(i));
                    match picked {
                        Some(result) => match navigator.select_result(result) {
                            Ok(_) => {
                                println!("{}", navigator.path());
                                print_view(&navigator.view());
                            }
                            Err(e) => println!("error: {}", e),
                        },
                        None => println!("error: no result {}", n.trim()),
                    }
                } else if let Some(tx) = &input_tx {
                    if !forward_input(tx, line) {
                        input_tx = None;
                    }
                }
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                println!("> {}", update.query);
                print_results(&update.results);
                latest = update.results;
            }
        }
    }

    handle.await?;
    Ok(())
}

/// Hands the current search text to the debounced task. False when the
/// task is gone and no further input can be searched.
fn forward_input(tx: &watch::Sender<String>, line: String) -> bool {
    match tx.send(line) {
        Ok(()) => true,
        Err(watch::error::SendError(line)) => {
            warn!(input = %line, "debounced search task has stopped; input ignored");
            false
        }
    }
}
