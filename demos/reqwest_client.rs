//! Fetches a URL twice with a reqwest client whose cookies are persisted.
//!
//! ```text
//! RUST_LOG=debug cargo run --example reqwest_client -- https://httpbin.org/cookies/set?demo=1 ./cookies
//! ```
use std::sync::Arc;

use persistent_cookie_jar::{DefaultCookieJar, JarConfig, PersistentCookieJar};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://httpbin.org/cookies/set?demo=1".to_string());
    let folder = args.next().unwrap_or_else(|| "cookies".to_string());

    let jar = Arc::new(PersistentCookieJar::with_config(
        Arc::new(DefaultCookieJar::new()),
        JarConfig::with_folder(&folder),
    ));

    let client = reqwest::Client::builder()
        .cookie_provider(jar.clone())
        .build()?;

    let resp = client.get(&url).send().await?;
    log::info!("{} -> {}", url, resp.status());

    let parsed = url::Url::parse(&url)?;
    for cookie in jar.cookies(&parsed) {
        let scope = if cookie.domain.is_empty() {
            "(host-only)"
        } else {
            cookie.domain.as_str()
        };
        println!("{}\t{}", cookie.pair(), scope);
    }
    println!("cookie files are in {}", jar.folder().display());

    Ok(())
}
