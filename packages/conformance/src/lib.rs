//! Shared helpers for the Yatube conformance test suite.
//!
//! Provides [`spawn_server`], which binds a `TcpListener` on an ephemeral
//! port, wires up an in-process server backed by `MemoryStorage`, and returns
//! both the local URL and the underlying storage so tests can create accounts
//! and groups without an HTTP route for them, the same way the admin CLI does.

use std::sync::Arc;

use yatube::{Group, User};
use yatube_server::{
    build_router, password::hash_password, storage::NewGroup, MemoryStorage, ServerConfig,
    Storage,
};

/// Start an ephemeral in-process server and return `(base_url, storage)`.
///
/// The server runs in a background `tokio` task bound to an OS-assigned port
/// on `127.0.0.1`. The returned `String` is the origin, e.g.
/// `http://127.0.0.1:51234`; API paths start with `/api/v1/`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails to start.
pub async fn spawn_server() -> (String, Arc<MemoryStorage>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let mem_storage = Arc::new(MemoryStorage::new());
    let storage: Arc<dyn Storage> = Arc::clone(&mem_storage) as Arc<dyn Storage>;

    let router = build_router(storage, ServerConfig::local(addr));

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance server error");
    });

    (base_url, mem_storage)
}

/// Create an account directly in storage.
///
/// # Panics
///
/// Panics if hashing fails or the username is taken.
pub async fn seed_user(storage: &MemoryStorage, username: &str, password: &str) -> User {
    let hash = hash_password(password).expect("hash password");
    storage
        .create_user(username, &hash)
        .await
        .expect("create user")
}

/// Create a group directly in storage.
///
/// # Panics
///
/// Panics if the slug is taken.
pub async fn seed_group(storage: &MemoryStorage, title: &str, slug: &str) -> Group {
    storage
        .create_group(&NewGroup {
            title: title.into(),
            slug: slug.into(),
            description: String::new(),
        })
        .await
        .expect("create group")
}
