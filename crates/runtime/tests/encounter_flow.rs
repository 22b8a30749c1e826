use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use expedition_content::{ContentFactory, ContentPack};
use expedition_core::{
    Attributes, CharacterClass, CombatEvent, ConfirmRejection, Difficulty, EncounterPhase,
    EncounterSummary, JoinRejection, ParticipantId, QueueRejection, Side,
};
use expedition_runtime::{
    EncounterHandle, InMemoryProfileStore, ProfileStore, RejectionReason, Runtime, RuntimeConfig,
    RuntimeError, SequencedEvent, StoredProfile, Topic,
};
use tokio::sync::broadcast;
use tokio::time;

fn pack(max_party_size: usize) -> ContentPack {
    let mut pack = ContentFactory::embedded().expect("embedded content loads");
    pack.config.max_party_size = max_party_size;
    pack
}

fn runtime(pack: ContentPack, store: Arc<InMemoryProfileStore>) -> Runtime {
    Runtime::builder()
        .config(RuntimeConfig {
            seed: Some(7),
            ..RuntimeConfig::default()
        })
        .content(pack)
        .store(store)
        .build()
        .expect("runtime builds")
}

fn champion(id: &str, name: &str) -> StoredProfile {
    let mut stored = StoredProfile::fresh(id, name, CharacterClass::Fighter);
    stored.profile.attributes = Attributes::uniform(50);
    stored
}

/// Receives until `pick` matches, skipping over lagged gaps. Time is paused,
/// so the hour-long guard only trips if the encounter stalls.
async fn wait_for<T>(
    rx: &mut broadcast::Receiver<SequencedEvent>,
    mut pick: impl FnMut(&CombatEvent) -> Option<T>,
) -> T {
    time::timeout(Duration::from_secs(3600), async {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(found) = pick(&event.event) {
                        return found;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("expected event never arrived")
}

async fn wait_for_summary(rx: &mut broadcast::Receiver<SequencedEvent>) -> EncounterSummary {
    wait_for(rx, |event| match event {
        CombatEvent::EncounterCompleted { summary } => Some(summary.clone()),
        _ => None,
    })
    .await
}

/// Round-trips a command so everything the worker flushed before it has
/// been persisted.
async fn settle(handle: &EncounterHandle) {
    handle.snapshot().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn strong_party_clears_every_wave_and_is_rewarded() {
    let store = Arc::new(InMemoryProfileStore::with_profiles([champion("u1", "Ash")]));
    let runtime = runtime(pack(1), store.clone());
    let handle = runtime.handle();
    let mut waves = handle.subscribe(Topic::Wave);

    handle.start_encounter(Difficulty::Easy).await.unwrap();
    let receipt = handle.join("u1", "Ash", None, None).await.unwrap();
    assert_eq!(receipt.position, 1);
    assert!(!receipt.late);

    let summary = wait_for_summary(&mut waves).await;
    assert!(summary.victory);
    assert_eq!(summary.waves_cleared, 2);
    assert_eq!(summary.participants.len(), 1);

    settle(&handle).await;
    let stored = store.load(&ParticipantId::new("u1")).await.unwrap().unwrap();
    assert!(stored.coins >= 10);
    assert!(stored.experience > 0);
    assert!(stored.locked_until.is_none());
    assert!(stored.profile.health.is_some());

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rewards_accumulate_across_host_restarts() {
    let store = Arc::new(InMemoryProfileStore::with_profiles([champion("u1", "Ash")]));
    let mut earned = (0u64, 0u64);

    for _ in 0..2 {
        let runtime = runtime(pack(1), store.clone());
        let handle = runtime.handle();
        let mut waves = handle.subscribe(Topic::Wave);

        handle.start_encounter(Difficulty::Easy).await.unwrap();
        handle.join("u1", "Ash", None, None).await.unwrap();
        let summary = wait_for_summary(&mut waves).await;
        assert!(summary.victory);
        let reward = summary.participants[0].reward;
        earned.0 += u64::from(reward.coins);
        earned.1 += u64::from(reward.experience);

        settle(&handle).await;
        runtime.shutdown().await.unwrap();
    }

    let stored = store.load(&ParticipantId::new("u1")).await.unwrap().unwrap();
    assert_eq!((stored.coins, stored.experience), earned);
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_wave_keeps_survivor_state() {
    let store = Arc::new(InMemoryProfileStore::with_profiles([champion("u1", "Ash")]));
    let runtime = runtime(pack(1), store.clone());
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);

    handle.start_encounter(Difficulty::Hard).await.unwrap();
    handle.join("u1", "Ash", None, None).await.unwrap();
    wait_for(&mut turns, |event| match event {
        CombatEvent::TurnOpened { turn: 2, .. } => Some(()),
        _ => None,
    })
    .await;

    let snapshot = handle.snapshot().await.unwrap();
    let health = snapshot
        .combatants
        .iter()
        .find(|c| c.side == Side::Player)
        .map(|c| c.health);
    assert!(health.is_some());

    runtime.shutdown().await.unwrap();

    let stored = store.load(&ParticipantId::new("u1")).await.unwrap().unwrap();
    assert_eq!(stored.profile.health, health);
    assert!(stored.locked_until.is_none());
    assert_eq!(stored.coins, 0);
}

#[tokio::test(start_paused = true)]
async fn last_confirmation_closes_the_turn() {
    let store = Arc::new(InMemoryProfileStore::new());
    let runtime = runtime(pack(2), store);
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);

    handle.start_encounter(Difficulty::Easy).await.unwrap();
    handle
        .join("u1", "Ash", Some(CharacterClass::Fighter), None)
        .await
        .unwrap();
    handle
        .join("u2", "Bree", Some(CharacterClass::Cleric), None)
        .await
        .unwrap();

    wait_for(&mut turns, |event| {
        matches!(event, CombatEvent::TurnOpened { turn: 1, .. }).then_some(())
    })
    .await;

    let queued = handle.queue_action("u1", "strike", None).await.unwrap();
    assert_eq!(queued.ability, "Strike");
    handle.queue_action("u2", "crush", None).await.unwrap();

    let first = handle.confirm_action("u1").await.unwrap();
    assert!(!first.all_confirmed);
    // Confirming twice is harmless.
    assert!(!handle.confirm_action("u1").await.unwrap().all_confirmed);
    let err = handle.confirm_action("u3").await.unwrap_err();
    assert!(matches!(
        err.rejection().map(|r| &r.reason),
        Some(RejectionReason::Confirm(ConfirmRejection::NotParticipant))
    ));
    let last = handle.confirm_action("u2").await.unwrap();
    assert!(last.all_confirmed);

    let actions = wait_for(&mut turns, |event| match event {
        CombatEvent::TurnClosed { turn: 1, actions } => Some(*actions),
        _ => None,
    })
    .await;
    assert_eq!(actions, 2);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejections_name_the_participant() {
    let runtime = runtime(pack(4), Arc::new(InMemoryProfileStore::new()));
    let handle = runtime.handle();

    handle.start_encounter(Difficulty::Easy).await.unwrap();

    let err = handle.join("u9", "Zed", None, None).await.unwrap_err();
    let rejection = err.rejection().expect("join is rejected");
    assert_eq!(rejection.participant, "Zed");
    assert_eq!(rejection.reason, RejectionReason::Join(JoinRejection::NoClass));
    assert!(err.to_string().starts_with("@Zed:"));

    let err = handle.queue_action("u5", "strike", None).await.unwrap_err();
    let rejection = err.rejection().expect("queue is rejected");
    assert_eq!(rejection.participant, "u5");
    assert_eq!(
        rejection.reason,
        RejectionReason::Queue(QueueRejection::NotParticipant)
    );

    assert!(matches!(
        handle.start_encounter(Difficulty::Hard).await,
        Err(RuntimeError::Start(_))
    ));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn nobody_joining_cancels_the_encounter() {
    let runtime = runtime(pack(4), Arc::new(InMemoryProfileStore::new()));
    let handle = runtime.handle();
    let mut waves = handle.subscribe(Topic::Wave);

    handle.start_encounter(Difficulty::Medium).await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, EncounterPhase::AwaitingPlayers);
    assert_eq!(snapshot.total_waves, 3);

    wait_for(&mut waves, |event| {
        matches!(event, CombatEvent::EncounterCancelled { .. }).then_some(())
    })
    .await;
    assert_eq!(handle.snapshot().await.unwrap().phase, EncounterPhase::Idle);

    // The board is free again.
    handle.start_encounter(Difficulty::Easy).await.unwrap();

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn fallen_participant_is_locked_out_of_the_next_encounter() {
    let mut frail = StoredProfile::fresh("u1", "Ash", CharacterClass::Mage);
    frail.profile.attributes = Attributes {
        dexterity: 0,
        ..Attributes::uniform(1)
    };
    frail.profile.health = Some(1);
    let store = Arc::new(InMemoryProfileStore::with_profiles([frail]));
    let runtime = runtime(pack(1), store.clone());
    let handle = runtime.handle();
    let mut waves = handle.subscribe(Topic::Wave);

    handle.start_encounter(Difficulty::Hard).await.unwrap();
    handle.join("u1", "Ash", None, None).await.unwrap();

    let summary = wait_for_summary(&mut waves).await;
    assert!(!summary.victory);
    assert!(summary.participants[0].died);

    settle(&handle).await;
    let stored = store.load(&ParticipantId::new("u1")).await.unwrap().unwrap();
    assert!(stored.lockout_remaining(Utc::now()).is_some());
    assert_eq!(stored.profile.health, None);

    handle.start_encounter(Difficulty::Easy).await.unwrap();
    let err = handle.join("u1", "Ash", None, None).await.unwrap_err();
    assert!(matches!(
        err.rejection().map(|r| &r.reason),
        Some(RejectionReason::Join(JoinRejection::LockedOut { minutes: 30 }))
    ));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn active_lockout_reports_minutes_left() {
    let mut stored = StoredProfile::fresh("u1", "Ash", CharacterClass::Rogue);
    stored.locked_until = Some(Utc::now() + chrono::Duration::minutes(10));
    let runtime = runtime(pack(4), Arc::new(InMemoryProfileStore::with_profiles([stored])));
    let handle = runtime.handle();

    handle.start_encounter(Difficulty::Easy).await.unwrap();
    let err = handle.join("u1", "Ash", None, None).await.unwrap_err();
    assert!(matches!(
        err.rejection().map(|r| &r.reason),
        Some(RejectionReason::Join(JoinRejection::LockedOut { minutes: 10 }))
    ));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn concurrent_joins_get_distinct_positions() {
    let store = Arc::new(InMemoryProfileStore::new());
    let runtime = runtime(pack(4), store.clone());
    let handle = runtime.handle();
    handle.start_encounter(Difficulty::Easy).await.unwrap();

    let classes = [
        CharacterClass::Rogue,
        CharacterClass::Fighter,
        CharacterClass::Mage,
        CharacterClass::Ranger,
    ];
    let joins: Vec<_> = classes
        .into_iter()
        .enumerate()
        .map(|(i, class)| {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .join(format!("u{i}"), format!("Player {i}"), Some(class), Some(1))
                    .await
            })
        })
        .collect();
    for join in joins {
        join.await.unwrap().unwrap();
    }

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.participants, 4);
    let mut positions: Vec<u8> = snapshot
        .combatants
        .iter()
        .filter(|c| c.side == Side::Player)
        .map(|c| c.position)
        .collect();
    positions.sort_unstable();
    assert_eq!(positions, vec![1, 2, 3, 4]);
    assert_eq!(store.count().await.unwrap(), 4);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_closes_every_handle() {
    let runtime = runtime(pack(4), Arc::new(InMemoryProfileStore::new()));
    let handle = runtime.handle();

    runtime.shutdown().await.unwrap();

    assert!(matches!(
        handle.snapshot().await,
        Err(RuntimeError::CommandChannelClosed)
    ));
}

#[tokio::test]
async fn builder_requires_content() {
    assert!(matches!(
        Runtime::builder().build(),
        Err(RuntimeError::MissingContent)
    ));
}
