//! voxclone server binary.
//!
//! Loads the synthesis engine once (preferred backend, then CPU fallback)
//! before binding the listener, so no request ever observes a half-loaded
//! model.

use std::path::PathBuf;

use clap::Parser;

use voxclone::engine::EngineHandle;
use voxclone::server::{router, AppState};
use voxclone::voices::VoiceStore;

#[derive(Parser, Debug)]
#[command(name = "voxclone")]
#[command(about = "Voice-cloning TTS server")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "VOXCLONE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "VOXCLONE_PORT")]
    port: u16,

    /// Directory holding stored voice assets
    #[arg(long, default_value = "./voices", env = "VOXCLONE_VOICES_DIR")]
    voices_dir: PathBuf,

    /// Directory holding the synthesis model
    #[arg(long, default_value = "models/chatterbox", env = "VOXCLONE_MODEL_DIR")]
    model_dir: PathBuf,

    /// Inference threads (default: runtime decides)
    #[arg(long, env = "VOXCLONE_THREADS")]
    threads: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let voices = VoiceStore::new(&args.voices_dir)?;
    log::info!("Voice catalog at {}", args.voices_dir.display());

    let engine = load_engine(&args);
    if !engine.is_ready() {
        log::warn!("Synthesis engine unavailable; /generate will return 503");
    }

    let app = router(AppState::new(engine, voices));
    let addr = format!("{}:{}", args.host, args.port);
    log::info!("voxclone listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "chatterbox")]
fn load_engine(args: &Args) -> EngineHandle {
    use voxclone::engine::chatterbox::ChatterboxLoader;
    let loader = ChatterboxLoader::new(&args.model_dir, args.threads);
    EngineHandle::initialize(&loader)
}

#[cfg(not(feature = "chatterbox"))]
fn load_engine(_args: &Args) -> EngineHandle {
    log::warn!("Built without the `chatterbox` feature; no synthesis backend available");
    EngineHandle::unloaded()
}
