use anyhow::bail;
use loudwhispers::object::format_timestamp;
use loudwhispers::session::username;
use loudwhispers::{Client, DEFAULT_LOBBY, LocalStore, Session};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let lobby = dotenv::var("LOBBY_CHANNEL").unwrap_or_else(|_| DEFAULT_LOBBY.to_owned());
    let alice_id = "https://pods.example/u/alice";
    let bob_id = "https://pods.example/u/bob";

    let store = LocalStore::new();

    let mut alice = Client::new(store.clone(), lobby.clone());
    alice.set_session(Session::new(alice_id));
    alice.save_profile("Alice", "they/them").await?;

    let group = alice.create_group("Team A").await?;
    alice.send_message("kickoff at noon").await?;
    alice.rename_group(&group, "Team Alpha").await?;

    let mut bob = Client::new(store.clone(), lobby);
    bob.set_session(Session::new(bob_id));
    bob.refresh_groups().await?;

    let listing = bob.groups();
    let Some(seen) = listing.first() else {
        bail!("the lobby shows no groups");
    };
    println!("before reading the timeline: {}", bob.display_name(seen));
    bob.enter_group(seen).await?;
    println!("after reading the timeline:  {}", bob.display_name(seen));

    let row = bob.send_message("here!").await?;
    bob.toggle_like(&row.object).await?;

    if let Some(profile) = bob.fetch_profile(alice_id).await? {
        println!("talking to {}", profile.name);
    }

    alice.refresh_timeline().await?;
    for message in alice.messages() {
        println!(
            "[{}] {}: {}",
            format_timestamp(message.body.published),
            username(message.sender()),
            message.body.content.as_deref().unwrap_or(""),
        );
    }

    let liked = bob.liked_messages(bob_id).await?;
    println!("{} message(s) liked by {}", liked.len(), username(bob_id));

    alice.exit_group().await?;
    for group in alice.groups() {
        println!("# {}", alice.display_name(&group));
    }

    Ok(())
}
