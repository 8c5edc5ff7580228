//! Live editing example - joins a page's edit session, types a line, and
//! prints every event the relay sends.
//!
//! Usage:
//!   cargo run -p wiki-otsync --example live_edit

use anyhow::Result;
use wiki_otsync::{PageSession, ServerMessage, SessionConfig};

const WIKI_URL: &str = "http://localhost:8080";
const PAGE: &str = "Sandbox";

#[tokio::main]
async fn main() -> Result<()> {
    println!("Connecting to {}/{}", WIKI_URL, PAGE);

    let config = SessionConfig::new(WIKI_URL, PAGE);
    let mut session = PageSession::connect(config).await?;

    println!(
        "Connected as participant {:?} at seq {}",
        session.participant_id(),
        session.seq()
    );
    println!("--- current page ---\n{}\n--------------------", session.content());

    // Type a greeting at the top of the page and send it.
    session.insert(0, "Hello from wiki-otsync!\n")?;
    session.flush().await?;
    println!("Edit sent; watching for events (ctrl-c to stop)");

    while let Some(msg) = session.next_event().await? {
        match msg {
            ServerMessage::Event(event) => {
                println!(
                    "seq {} (acked client_seq {}): {:?}",
                    event.seq, event.client_seq, event.event
                );
                println!("page is now: {:?}", session.content());
            }
            ServerMessage::Connected(_) => {}
        }
    }

    println!("Relay closed the stream");
    session.close().await?;
    Ok(())
}
