//! Signs in, prints your boards and the first board's tasks, and asks
//! for a few suggestions.
//!
//! ```text
//! TASKBOARD_API_URL=http://localhost:5000/api \
//! RUST_LOG=taskboard=debug,taskboard_dispatch=debug \
//!     cargo run -p board-cli -- ada@example.com secret "launch the beta"
//! ```

use taskboard::prelude::*;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: board-cli <email> <password> [prompt]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let prompt = args.next();

    let client = TaskboardClient::new(ClientConfig::from_env()?)?;
    let _sub = client.subscribe(|event| {
        tracing::info!(authenticated = event.authenticated, "session changed");
    });

    let session = client.login(Credentials::new(email, password)).await?;
    let name = session
        .user()
        .and_then(|u| u.name.clone())
        .unwrap_or_else(|| "you".to_string());
    println!("signed in as {name}");

    let boards = client.list_boards().await?;
    if boards.is_empty() {
        println!("no boards yet");
    }
    for board in &boards {
        println!("[{}] {}", board.id, board.title);
    }

    if let Some(first) = boards.first() {
        let page = client.list_tasks(&first.id, Page::default()).await?;
        for task in &page.tasks {
            let status = task.status.as_deref().unwrap_or("-");
            println!("  {:<12} {}", status, task.title);
        }
    }

    if let Some(prompt) = prompt {
        for s in client.suggestions(&prompt).await {
            println!("* {}", s.suggestion);
        }
    }

    client.logout().await;
    Ok(())
}
