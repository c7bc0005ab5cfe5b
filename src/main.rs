use chatcall::config::Config;
use chatcall::domain::call::{CallControl, FriendCallState};
use chatcall::domain::chat::Chat;
use chatcall::domain::shared::events::DomainEvent;
use chatcall::domain::shared::value_objects::FriendId;
use chatcall::infrastructure::persistence::InMemoryCallRepository;
use chatcall::{CallUpdate, CallsManager};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting chatcall");
    info!("Configuration loaded: {:?}", config);

    let manager = Arc::new(CallsManager::new(
        Arc::new(InMemoryCallRepository::new()),
        config.calls.clone(),
    ));

    let mut events = manager.subscribe();
    let listener = tokio::spawn(async move {
        let mut count = 0usize;
        while let Ok(event) = events.recv().await {
            info!("Event {} for call {}", event.event_type(), event.call_id());
            count += 1;
        }
        count
    });

    demo_call_lifecycle(&manager).await?;

    // Closing the channel ends the listener
    drop(manager);
    let count = listener.await?;
    info!("Observed {} call events", count);

    Ok(())
}

/// Walk one outgoing and one incoming call through their lifecycle
async fn demo_call_lifecycle(manager: &CallsManager) -> anyhow::Result<()> {
    info!("=== Call Lifecycle Demo ===");

    let alice = FriendId::new();
    let mut chat = Chat::with_friend(alice);

    let call = manager.call_to_chat(&chat, true, false).await?;
    info!("Dialing chat {}: status {}", call.chat(), call.status());

    let update = manager
        .handle_friend_call_state(call.id(), FriendCallState::audio())
        .await?;
    if let Some(call) = update.call() {
        info!("Friend picked up: status {}", call.status());
    }

    manager.send_call_control(call.id(), CallControl::Pause).await?;
    manager.send_call_control(call.id(), CallControl::Resume).await?;

    if let CallUpdate::Ended(record) = manager
        .send_call_control(call.id(), CallControl::Cancel)
        .await?
    {
        record.apply_to(&mut chat)?;
        info!("Call record: {}", serde_json::to_string(&record)?);
        info!("Chat {} last active at {:?}", chat.id(), chat.last_activity());
    }

    let bob = FriendId::new();
    let chat = Chat::with_friend(bob);
    let call = manager
        .handle_incoming_call(&chat, bob, FriendCallState::audio_video())
        .await?;
    info!("Incoming call from {}: status {}", bob, call.status());

    let call = manager.answer_call(call.id(), true, true).await?;
    info!("Answered: status {}", call.status());

    if let CallUpdate::Ended(record) = manager
        .handle_friend_call_state(call.id(), FriendCallState::finished())
        .await?
    {
        info!("Call record: {}", serde_json::to_string(&record)?);
    }

    info!("=== Call Lifecycle Demo Complete ===");

    Ok(())
}
