use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use assistant::{AssistantClient, Notification};
use catalog::{FileStore, SavedLayerStore, saved_layer_for};
use session::{QueryUpdate, Session, standard_adapters};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let base_url =
        env::var("ASSISTANT_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let author = env::var("RAZORBILL_AUTHOR").unwrap_or_else(|_| "anonymous".to_string());
    let catalog_path = env::var("RAZORBILL_CATALOG_PATH")
        .unwrap_or_else(|_| "community_layers.json".to_string());

    let client = match AssistantClient::new(&base_url) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("failed to create assistant client: {err}");
            return;
        }
    };
    let mut store = FileStore::new(&catalog_path);
    let mut session = Session::new(standard_adapters());

    info!(%base_url, "chat driver ready");
    println!("Ask about any location (try: earthquakes in Japan, weather in London).");
    println!("Commands: /save <name>, /layers, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/layers" => {
                list_layers(&store);
                continue;
            }
            _ => {}
        }

        if let Some(name) = line.strip_prefix("/save") {
            save_current(&mut store, &session, name.trim(), &author);
            continue;
        }

        match client.ask(line).await {
            Ok(reply) => {
                println!("{}", reply.message);
                if let Some(note) = Notification::for_reply(&reply) {
                    println!("[{}]", note.message);
                }
                let now = now_ms();
                session.apply_update(
                    QueryUpdate {
                        collection: reply.collection,
                        view_position: reply.view_position,
                    },
                    now,
                );
                session.tick(now);
                for (adapter, count) in session.primitive_counts() {
                    info!(adapter, primitives = count, "surface updated");
                }
            }
            Err(err) => {
                // The prior layer stays visible; only the user hears
                // about the failure.
                let note = Notification::for_error(&err);
                println!("[{}]", note.message);
            }
        }
    }

    session.teardown();
}

fn list_layers(store: &FileStore) {
    match store.list() {
        Ok(layers) if layers.is_empty() => println!("No saved layers."),
        Ok(layers) => {
            for layer in layers {
                println!(
                    "{}  {} ({})  by {}  likes {}",
                    &layer.id[..8],
                    layer.name,
                    layer.location,
                    layer.author,
                    layer.likes
                );
            }
        }
        Err(err) => warn!(%err, "failed to read saved layers"),
    }
}

fn save_current(store: &mut FileStore, session: &Session, name: &str, author: &str) {
    let Some(collection) = session.collection() else {
        println!("Nothing to save yet; run a query first.");
        return;
    };
    let name = if name.is_empty() { "Untitled layer" } else { name };
    let layer = saved_layer_for(collection, name, author, now_ms());
    let id = layer.id.clone();
    match store.upsert(layer) {
        Ok(()) => println!("Saved {name} ({})", &id[..8]),
        Err(err) => warn!(%err, "failed to save layer"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
