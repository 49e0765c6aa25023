use std::net::SocketAddr;
use std::path::PathBuf;
use std::thread;

use clap::Parser;

/// Server settings. Every flag can also come from the environment.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "GlowLens photo gallery server", long_about = None)]
pub struct Args {
    #[clap(long, env = "GALLERY_ADDR", default_value = "0.0.0.0:5000")]
    pub addr: SocketAddr,

    /// Tokio worker threads (defaults to the core count)
    #[clap(long, env = "GALLERY_WORKERS")]
    pub workers: Option<usize>,

    /// Built browser UI to serve next to the API
    #[clap(long, env = "GALLERY_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Args {
    pub fn worker_threads(&self) -> usize {
        match self.workers {
            Some(n) if n > 0 => n,
            _ => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}
