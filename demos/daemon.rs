//! A long-running daemon that restarts itself whenever it is rebuilt.
//!
//! Run with: cargo run --example daemon -- --greeting hello
//!
//! While it is running, edit this file and run `cargo build --example daemon`
//! in another terminal. The running process replaces itself with the new
//! binary, keeping its arguments. Files written to `demos/static` trigger a
//! reload callback instead of a restart.

use hotswap_exec::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let greeting = std::env::args()
        .skip_while(|a| a != "--greeting")
        .nth(1)
        .unwrap_or_else(|| "hi".to_string());

    std::fs::create_dir_all("demos/static")?;
    let reloads = Arc::new(AtomicUsize::new(0));
    let reloads_clone = Arc::clone(&reloads);

    let handle = Reloader::builder()
        .log(|args| println!("[reload] {args}"))
        .dir("demos/static", move || {
            let n = reloads_clone.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[reload] static assets changed (reload #{n})");
        })
        .pre_exec(|| println!("[reload] binary changed, restarting"))
        .spawn()?;

    println!("pid {} says {greeting}", std::process::id());

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            println!(
                "still running (static reloads: {})",
                reloads.load(Ordering::SeqCst)
            );
        }
    });

    handle.join().await;
    println!("watcher stopped");

    Ok(())
}
