//! Interactive notification drawer.
//!
//! Connects to the push source from `COOPWATCH_PUSH_URL`, keeps received
//! notifications in a store and reads drawer commands from stdin.

use coopwatch_lib::config::Config;
use coopwatch_lib::drawer::{self, HELP};
use coopwatch_lib::notifications::NotificationCenter;
use coopwatch_lib::transport::{ClientConfig, PushClient};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    coopwatch_lib::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let center = NotificationCenter::new(config.max_notifications);
    let client = PushClient::spawn(
        ClientConfig::new(config.push_url.clone()).with_reconnect(config.reconnect.clone()),
        center.clone(),
    );
    println!("{HELP}");
    let exit = drawer::run_session(
        &center,
        client.watch_state(),
        BufReader::new(tokio::io::stdin()),
        coopwatch_lib::shutdown_signal(),
    )
    .await;
    tracing::debug!(?exit, "drawer session ended");

    client.close().await;
}
