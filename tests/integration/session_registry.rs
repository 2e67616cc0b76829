use std::sync::Arc;

use crate::common::fixtures::{OTHER_CHANNEL_ID, guild, track};
use crate::common::mocks::FakePanel;
use crate::common::{Harness, settle};
use crate::{assert_eq, assert_matches};
use serenity::all::GuildId;
use songbird::Songbird;
use tokio_test::assert_ok;
use tunedeck::commands::music::utils::{
    music_manager::MusicError,
    playback_session::{EnqueueOutcome, PlayerStatus},
};

#[tokio::test]
async fn one_session_per_guild() {
    let h = Harness::new();
    assert_ok!(h.play("Alpha").await);
    let first = h.session();
    assert_ok!(h.play("Bravo").await);

    assert!(Arc::ptr_eq(&first, &h.session()));
    assert_eq!(h.registry.len(), 1);

    let other = GuildId::new(42);
    assert_ok!(
        h.registry
            .enqueue(other, h.voice.clone(), h.panel.clone(), track("Elsewhere"))
            .await
    );
    assert_eq!(h.registry.len(), 2);
    assert_eq!(h.registry.get(other).unwrap().guild_id(), other);
}

#[tokio::test]
async fn stop_removes_the_session() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();

    assert!(h.registry.stop(guild()).await);
    assert!(h.registry.get(guild()).is_none());
    assert_eq!(h.voice.releases(), 1);

    // Nothing left to stop
    assert!(!h.registry.stop(guild()).await);
    assert_eq!(h.voice.releases(), 1);
}

#[tokio::test]
async fn play_after_stop_starts_a_fresh_session() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();
    let old = h.session();
    h.registry.stop(guild()).await;

    assert_eq!(h.play("Bravo").await.unwrap(), EnqueueOutcome::Started);
    let fresh = h.session();
    assert!(!Arc::ptr_eq(&old, &fresh));
    assert_eq!(old.status().await, PlayerStatus::Terminated);
    assert_eq!(h.current_title().await.as_deref(), Some("Bravo"));
}

#[tokio::test]
async fn stopped_session_is_replaced_on_enqueue() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();
    let old = h.session();

    // Stopped directly while a caller still holds it
    old.stop().await;
    assert!(h.registry.is_empty());
    assert_matches!(
        old.enqueue(track("Bravo")).await,
        Err(MusicError::SessionClosed)
    );

    h.play("Bravo").await.unwrap();
    assert!(!Arc::ptr_eq(&old, &h.session()));
}

#[tokio::test]
async fn removing_a_stale_session_keeps_the_current_one() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();
    let old = h.session();
    h.registry.remove(guild());

    h.play("Bravo").await.unwrap();
    let current = h.session();

    // The old session shutting down must not unregister its replacement
    old.stop().await;
    assert!(Arc::ptr_eq(&current, &h.session()));
    assert_eq!(current.status().await, PlayerStatus::Playing);
}

#[tokio::test]
async fn play_from_another_channel_moves_the_panel() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();
    let first_panel = h.panel.sent.lock().unwrap()[0].0;

    let moved = FakePanel::new(OTHER_CHANNEL_ID);
    h.registry
        .enqueue(guild(), h.voice.clone(), moved.clone(), track("Bravo"))
        .await
        .unwrap();

    assert_eq!(h.panel.deleted(), vec![first_panel]);
    assert_eq!(moved.sent_count(), 1);
    assert_eq!(moved.last_panel().unwrap().queue_len, 1);

    // Later transitions render in the new channel only
    h.voice.track(0).finish();
    settle().await;
    assert_eq!(h.panel.render_count(), 1);
    assert_eq!(
        moved.last_panel().unwrap().now_playing.as_deref(),
        Some("Bravo")
    );
}

#[tokio::test]
async fn play_from_the_same_channel_keeps_the_panel() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();

    let same_channel = FakePanel::new(crate::common::fixtures::CHANNEL_ID);
    h.registry
        .enqueue(guild(), h.voice.clone(), same_channel.clone(), track("Bravo"))
        .await
        .unwrap();

    assert!(h.panel.deleted().is_empty());
    // The existing message id is edited through the new handle
    assert_eq!(same_channel.sent_count(), 0);
    assert_eq!(same_channel.edits.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_request_leaves_voice_when_no_session_exists() {
    let h = Harness::new();

    assert!(h.registry.release_if_unused(guild(), h.voice.as_ref()).await);
    assert_eq!(h.voice.releases(), 1);
}

#[tokio::test]
async fn failed_request_keeps_voice_for_a_live_session() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();

    assert!(!h.registry.release_if_unused(guild(), h.voice.as_ref()).await);
    assert_eq!(h.voice.releases(), 0);
    assert_eq!(h.session().status().await, PlayerStatus::Playing);
}

#[tokio::test]
async fn voice_loss_without_a_live_call_stops_the_session() {
    let h = Harness::new();
    h.play("Alpha").await.unwrap();
    let manager = Songbird::serenity();

    assert!(h.registry.voice_lost(&manager, guild()).await);
    assert!(h.registry.is_empty());
    assert_eq!(h.voice.releases(), 1);
}

#[tokio::test]
async fn voice_loss_in_a_guild_without_a_session_is_ignored() {
    let h = Harness::new();
    let manager = Songbird::serenity();

    assert!(!h.registry.voice_lost(&manager, guild()).await);
    assert_eq!(h.voice.releases(), 0);
}
