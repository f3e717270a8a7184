//! Movie-night server: a ready-to-run cinerate deployment.
//!
//! Binds to `0.0.0.0:$PORT` (default 3001) and serves the game with a
//! bundled quote list. Point a browser client at it and play.

use cinerate::{CinerateServer, JsonCodec, StaticQuotes};

fn bundled_quotes() -> StaticQuotes {
    StaticQuotes(
        [
            "I'll be back.",
            "Here's looking at you, kid.",
            "May the Force be with you.",
            "You're gonna need a bigger boat.",
            "I'm gonna make him an offer he can't refuse.",
            "Why so serious?",
            "Houston, we have a problem.",
            "Nobody puts Baby in a corner.",
        ]
        .map(str::to_owned)
        .to_vec(),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".into());
    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "starting movie-night server");

    let server = CinerateServer::<JsonCodec>::builder()
        .bind(&addr)
        .build(bundled_quotes())
        .await?;

    server.run().await?;
    Ok(())
}
