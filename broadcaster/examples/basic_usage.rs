//! Basic broadcaster usage
//!
//! Registers a few listeners on the process-wide broadcaster, emits events
//! with typed arguments, and shows once-listeners and caps.
//!
//! Run: BROADCASTER_LOG_MODE=debug cargo run -p broadcaster --example basic_usage

use broadcaster::logging::init_logging_from_env;
use broadcaster::{args, Args, Broadcaster, Listener, ListenerLimit};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let broadcaster = Broadcaster::global();

    let logger = broadcaster.on(
        "download",
        Listener::new(|args: &Args| {
            let file = args.get::<&str>(0).copied().unwrap_or("?");
            let bytes = args.get::<u64>(1).copied().unwrap_or(0);
            println!("downloaded {} ({} bytes)", file, bytes);
        }),
    )?;

    broadcaster.once(
        "download",
        Listener::new(|_| println!("first download finished")),
    )?;

    broadcaster.emit("download", args!["index.html", 5_120_u64])?;
    broadcaster.emit("download", args!["style.css", 2_048_u64])?;

    // Only one listener may watch shutdown
    broadcaster.set_max_listeners("shutdown", ListenerLimit::Bounded(1))?;
    broadcaster.on("shutdown", Listener::new(|_| println!("shutting down")))?;
    if let Err(e) = broadcaster.on("shutdown", Listener::new(|_| {})) {
        println!("rejected: {}", e);
    }

    println!("events: {:?}", broadcaster.events());

    broadcaster.off(&logger);
    broadcaster.emit("download", args!["ignored.txt", 1_u64])?;
    broadcaster.emit("shutdown", args![])?;

    Ok(())
}
