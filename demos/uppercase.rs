//! # Example: Uppercase worker pool
//!
//! Four workers consume JSON greetings from an in-memory broker, uppercase them
//! and publish the result. One malformed payload and one rejected greeting show
//! the failure paths in the logs.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example uppercase
//! ```
//! Stop with Ctrl-C; the pool finishes in-flight messages before exiting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use workvisor::{Config, JobError, JobFn, JsonCodec, MemoryBroker, Pool};

// Missing fields decode to their defaults instead of failing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Greeting {
    from: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct Shout {
    from: String,
    text: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let broker = Arc::new(MemoryBroker::default());
    for payload in [
        r#"{"from":"ann","text":"hello"}"#,
        r#"{"from":"bob","text":"good morning"}"#,
        r#"{"from":"eve","text":""}"#,
        r#"{"text":"anonymous hi"}"#,
        r#"{"from":"#,
    ] {
        broker.push(payload).await?;
    }

    let job = JobFn::arc(|g: Greeting| async move {
        if g.text.is_empty() {
            return Err(JobError::fail(format!("empty greeting from {}", g.from)));
        }
        Ok(Shout {
            from: g.from,
            text: g.text.to_uppercase(),
        })
    });

    let pool = Pool::new(Config::with_concurrency(4), broker.clone(), job, Arc::new(JsonCodec));
    if let Err(e) = pool.run().await {
        workvisor::exit("worker pool", &e);
    }

    for out in broker.published() {
        println!("published: {}", String::from_utf8_lossy(&out));
    }
    Ok(())
}
