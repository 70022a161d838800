//! Storefront simulation against the in-memory backend.
//!
//! Seeds a small catalog and an operator account, then walks a shopper through browsing,
//! an anonymous cart, account creation and sign-out while a scripted "UI" answers prompts.

use std::time::Duration;

use anyhow::Context;
use serde_json::{Value, json};

use storefront_auth::Role;
use storefront_backend::{InMemoryBackend, Record, server_timestamp};
use storefront_catalog::NewProduct;
use storefront_core::{ProductId, StoreConfig};
use storefront_session::{InputRequest, Session, SessionChannels};

fn record(value: Value) -> anyhow::Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected an object, got {other}"),
    }
}

fn seed(backend: &InMemoryBackend) -> anyhow::Result<()> {
    for (id, name, price) in [
        ("tea", "Herbal Tea", "9.99"),
        ("jam", "Fig Jam", "4.50"),
        ("honey", "Wild Honey", "12.00"),
    ] {
        let mut body = record(json!({"name": name, "price": price, "img": "", "desc": ""}))?;
        body.insert("createdAt".into(), server_timestamp());
        backend
            .documents
            .seed("products", id, body)
            .with_context(|| format!("seeding product {id}"))?;
    }
    backend
        .identity
        .register("ops@example.com", "operator", vec![Role::admin()])
        .context("registering operator")?;
    Ok(())
}

/// Scripted answers for whatever the session asks.
fn answer(request: InputRequest) {
    tracing::info!(title = %request.title, "prompt");
    match request.title.as_str() {
        "Create account" => request.submit([
            ("username", "ana"),
            ("email", "ana@example.com"),
            ("password", "s3cret!"),
            ("pet", "rex"),
        ]),
        "Sign in" => request.submit([("email", "ops@example.com"), ("password", "operator")]),
        _ => request.cancel(),
    }
}

fn spawn_ui(channels: SessionChannels) {
    let SessionChannels {
        mut requests,
        mut notices,
        mut views,
    } = channels;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(request) = requests.recv() => answer(request),
                Some(notice) = notices.recv() => {
                    tracing::info!(level = ?notice.level, message = %notice.message, "notice");
                }
                Some(view) = views.recv() => {
                    let names: Vec<_> = view.products.iter().map(|p| p.name.as_str()).collect();
                    tracing::info!(revision = view.revision, query = %view.query, ?names, "render");
                }
                else => break,
            }
        }
    });
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let mut config = StoreConfig::from_env();
    config.search_debounce_ms = config.search_debounce_ms.min(200);

    let backend = InMemoryBackend::new();
    seed(&backend)?;

    let (session, channels) = Session::start(backend.context(config.clone()));
    spawn_ui(channels);
    settle().await;

    session.add_to_cart(&ProductId::from("tea")).await;
    session.add_to_cart(&ProductId::from("missing")).await;
    tracing::info!(count = session.cart_count(), scope = %session.cart_scope(), "anonymous cart");

    session.search("hon");
    tokio::time::sleep(config.search_debounce() + Duration::from_millis(50)).await;

    session.create_account().await;
    settle().await;
    session.add_to_cart(&ProductId::from("jam")).await;
    tracing::info!(count = session.cart_count(), scope = %session.cart_scope(), "identified cart");

    session.sign_out().await;
    settle().await;
    tracing::info!(count = session.cart_count(), scope = %session.cart_scope(), "back to anonymous");

    session.sign_in().await;
    settle().await;
    session
        .add_product(NewProduct::new("Lavender Soap", "6.00").with_description("handmade"))
        .await;
    settle().await;
    tracing::info!(products = session.catalog().len(), "catalog after admin add");

    session.shutdown().await;
    Ok(())
}
