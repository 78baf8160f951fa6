// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push binding example.
//!
//! This example demonstrates:
//! - Declaring field and listener bindings for a bean type
//! - Binding initial values from the config service
//! - Receiving pushed changes as fields, values and change events
//! - Refreshing a remote property source after the application is ready
//!
//! To run this example:
//! ```bash
//! cargo run --example push_binding
//! ```

use nacos_binder::ports::LoggingRefresher;
use nacos_binder::prelude::*;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Server {
    timeout: i32,
    host: String,
}

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    println!("=== nacos-binder: Push Binding Example ===\n");

    let client = Arc::new(MemoryConfigClient::new());
    client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=30\nhost=localhost")?;

    let manager = Arc::new(ConfigManager::builder().with_client(client.clone()).build()?);
    let binder = ConfigBinder::new(Arc::clone(&manager));

    binder.register_bindings(
        BeanBindings::new()
            .field(ConfigBinding::new(
                "timeout",
                "app.properties",
                |s: &mut Server, v: i32| s.timeout = v,
            ))
            .field(
                ConfigBinding::new("host", "app.properties", |s: &mut Server, v: String| s.host = v)
                    .key("host")
                    .default_value("127.0.0.1"),
            )
            .listener(
                ListenerBinding::new("on_timeout", "app.properties", |_: &mut Server, v: i32| {
                    println!("  on_timeout({})", v)
                })
                .key("timeout"),
            )
            .keys_listener(
                KeysListenerBinding::new("on_change", "app.properties", |_: &mut Server, e: &ChangeEvent| {
                    for item in e.items() {
                        println!("  {} {}", item.kind(), item.key());
                    }
                }),
            ),
    );

    let server = Arc::new(RwLock::new(Server::default()));
    binder.post_process_after_initialization(&server, "server")?;
    println!("Bound: {:?}\n", server.read());

    println!("Pushing timeout=60 ...");
    client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=60\nhost=localhost")?;
    println!("Now: {:?}\n", server.read());

    println!("Pushing a document without host ...");
    client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=60")?;
    println!("Now: {:?}\n", server.read());

    // Property source refresh
    let env = Arc::new(Environment::new());
    let document = DocumentKey::new("app.properties", "DEFAULT_GROUP");
    env.add_last(PropertySource::remote(&document, true, FlatProperties::new()));

    let coordinator = Arc::new(PropertySourceRefreshCoordinator::new(
        manager,
        Arc::clone(&env),
        Arc::new(LoggingRefresher),
    ));
    coordinator.subscribe_sources()?;
    coordinator.on_application_ready();

    client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=90")?;
    println!(
        "Environment timeout after push: {:?}",
        env.get_property("timeout")
    );

    Ok(())
}
