use clap::Parser;
use std::sync::Arc;
use glowlens::PhotoStore;
use glowlens::config::Args;
use glowlens::server::{shutdown_signal, GalleryServer};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    let workers = args.worker_threads();

    println!("--- [GlowLens Gallery] ---");
    println!("Address:        {}", args.addr);
    println!("Worker Threads: {}", workers);
    match &args.static_dir {
        Some(dir) => println!("UI Directory:   {}", dir.display()),
        None => println!("UI Directory:   (API only)"),
    }
    println!("--------------------------");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
    .worker_threads(workers)
    .enable_all()
    .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(async_main(args));
}

async fn async_main(args: Args) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,glowlens=info");
    }
    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_target(false)
    .with_level(true)
    .init();

    // In-memory only: a restart starts from an empty gallery
    let store = Arc::new(PhotoStore::new());
    let server = GalleryServer::new(store, args.static_dir.clone());

    if let Err(e) = server.run(args.addr, shutdown_signal()).await {
        error!("Could not bind to {}: {}", args.addr, e);
        std::process::exit(1);
    }
    println!("Shutting down.");
}
