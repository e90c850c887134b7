//! Construction, staleness, submission and artifact management of jobs.

mod common;

use common::{raster_item, vector_item, Fixture};
use std::collections::HashSet;
use toolpathkit_core::{AppEvent, Error, ItemId, JobError, JobEvent, JobId};
use toolpathkit_toolpath::{
    ConfigBlock, GenerationConfig, JobHandle, JobUpdate, TaskResult, ToolPathJob, ToolPathStatus,
};

fn keys_match(job: &JobHandle) -> bool {
    let guard = job.lock();
    let ids: HashSet<&ItemId> = guard.item_ids().iter().collect();
    ids.len() == guard.item_ids().len()
        && guard.entry_count() == ids.len()
        && ids.iter().all(|id| guard.entry(id).is_some())
}

async fn settle_all(job: &JobHandle, ids: &[&str]) {
    for id in ids {
        job.on_result(TaskResult::success(
            job.id().clone(),
            *id,
            format!("{id}.json"),
        ))
        .await
        .expect("settle");
    }
}

#[test]
fn test_new_job_is_stale() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    let job = fx.job(&["a", "b"]);

    assert_eq!(job.id().as_str(), "job-1");
    assert_eq!(job.status(), ToolPathStatus::Warning);
    assert!(job.lock().fingerprint().is_some());
    assert!(keys_match(&job));
}

#[test]
fn test_supplied_id_is_kept() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = ToolPathJob::new(fx.options(&["a"]).id("mine"), fx.services.clone());
    assert_eq!(job.id(), &JobId::from("mine"));
}

#[test]
fn test_duplicate_item_ids_collapse() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    let job = fx.job(&["a", "b", "a"]);
    assert_eq!(job.lock().item_ids().len(), 2);
    assert!(keys_match(&job));
}

#[test]
fn test_empty_item_set_fails() {
    let fx = Fixture::new();
    let job = fx.job(&["ghost"]);
    assert_eq!(job.status(), ToolPathStatus::Failed);
    assert!(!job.submit());
    assert_eq!(fx.backend.count(), 0);
}

#[test]
fn test_mixed_kinds_fail() {
    let fx = Fixture::new();
    fx.store.upsert(vector_item("a"));
    fx.store.upsert(raster_item("r"));

    let job = fx.job(&["a", "r"]);
    assert_eq!(job.status(), ToolPathStatus::Failed);

    let history = fx.events.history(None);
    assert!(history.iter().any(|e| matches!(
        e,
        AppEvent::Job(JobEvent::StatusChanged { to: ToolPathStatus::Failed, .. })
    )));
}

#[test]
fn test_submit_dispatches_in_item_order() {
    let fx = Fixture::new().with_vector_items(&["b", "a"]);
    let config = GenerationConfig {
        gcode_config: ConfigBlock::new().with("power", 80),
        ..GenerationConfig::default()
    };
    let job = ToolPathJob::new(fx.options(&["a", "b"]).config(config), fx.services.clone());
    let job = JobHandle::new(job);

    assert!(job.submit());
    assert_eq!(fx.backend.dispatched_items(), vec!["a", "b"]);

    let request = &fx.backend.requests()[0];
    assert_eq!(request.job_id, *job.id());
    assert_eq!(request.data.gcode_config.get("power"), Some(&serde_json::json!(80)));

    let guard = job.lock();
    assert!(guard.entries().all(|e| e.status() == ToolPathStatus::Running));
    assert_eq!(guard.status(), ToolPathStatus::Running);
    assert_eq!(guard.in_flight_count(), 2);
}

#[test]
fn test_submit_twice_dispatches_once() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    let job = fx.job(&["a", "b"]);

    assert!(job.submit());
    assert!(!job.submit());
    assert_eq!(fx.backend.count(), 2);
    assert_eq!(job.status(), ToolPathStatus::Running);
}

#[tokio::test]
async fn test_submit_when_up_to_date_is_noop() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    let job = fx.job(&["a", "b"]);
    job.submit();
    settle_all(&job, &["a", "b"]).await;
    assert_eq!(job.status(), ToolPathStatus::Success);

    assert!(!job.submit());
    assert_eq!(fx.backend.count(), 2);
}

#[tokio::test]
async fn test_staleness_round_trip() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);
    job.submit();
    settle_all(&job, &["a"]).await;
    assert_eq!(job.status(), ToolPathStatus::Success);

    let original = job.lock().config().gcode_config.clone();
    job.update(JobUpdate::new().gcode_config(ConfigBlock::new().with("speed", 900)))
        .expect("update");
    assert_eq!(job.status(), ToolPathStatus::Warning);
    assert_eq!(
        job.lock().entry(&ItemId::from("a")).map(|e| e.status()),
        Some(ToolPathStatus::Warning)
    );
    // The stale artifact stays visible until regenerated
    assert_eq!(job.lock().scene().len(), 1);

    job.update(JobUpdate::new().gcode_config(original)).expect("update");
    assert_eq!(job.status(), ToolPathStatus::Warning);

    assert!(job.submit());
    assert_eq!(fx.backend.count(), 2);
}

#[test]
fn test_update_without_config_change_keeps_status() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);
    job.submit();

    job.update(JobUpdate::new().name("Renamed").check(false))
        .expect("update");
    let state = job.state();
    assert_eq!(state.name, "Renamed");
    assert!(!state.check);
    assert_eq!(state.status, ToolPathStatus::Running);
}

#[test]
fn test_config_is_copied_on_update() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);

    let mut block = ConfigBlock::new().with("passes", 1);
    job.update(JobUpdate::new().materials(block.clone()))
        .expect("update");
    block.set("passes", 3);

    assert_eq!(
        job.lock().config().materials.get("passes"),
        Some(&serde_json::json!(1))
    );
}

#[test]
fn test_visibility_mirrors_scene() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);

    job.update(JobUpdate::new().visible(false)).expect("update");
    assert!(!job.lock().scene().is_visible());
    assert!(!job.state().visible);
}

#[test]
fn test_add_and_remove_items_keep_keys_in_sync() {
    let fx = Fixture::new().with_vector_items(&["a", "b", "c"]);
    let job = fx.job(&["a"]);

    job.lock()
        .add_items(vec![ItemId::from("b"), ItemId::from("c"), ItemId::from("a")])
        .expect("add");
    assert_eq!(job.lock().item_ids().len(), 3);
    assert!(keys_match(&job));

    assert!(job.lock().remove_item(&ItemId::from("b")).expect("remove"));
    assert!(!job.lock().remove_item(&ItemId::from("b")).expect("remove"));
    assert!(keys_match(&job));
    assert_eq!(job.state().item_ids, vec![ItemId::from("a"), ItemId::from("c")]);
}

#[test]
fn test_removing_last_item_fails_job() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);

    let err = job.lock().remove_item(&ItemId::from("a")).unwrap_err();
    assert!(matches!(err, Error::Job(JobError::EmptyItemSet { .. })));
    assert_eq!(job.status(), ToolPathStatus::Failed);
    assert!(keys_match(&job));
}

#[tokio::test]
async fn test_failed_job_becomes_eligible_again() {
    let fx = Fixture::new();
    fx.store.upsert(vector_item("a"));
    fx.store.upsert(raster_item("r"));
    fx.fetcher.insert("a.json", common::toolpath_json(0.0));
    let job = fx.job(&["a", "r"]);
    assert_eq!(job.status(), ToolPathStatus::Failed);

    // Still invalid: the reset is followed by another failure
    assert!(!job.submit());
    assert_eq!(job.status(), ToolPathStatus::Idle);
    assert!(!job.submit());
    assert_eq!(job.status(), ToolPathStatus::Failed);

    // The cause is fixed in the item store
    fx.store.upsert(vector_item("r"));
    fx.fetcher.insert("r.json", common::toolpath_json(10.0));
    assert!(!job.submit());
    assert_eq!(job.status(), ToolPathStatus::Idle);
    assert!(job.lock().fingerprint().is_none());

    assert!(job.submit());
    assert_eq!(fx.backend.count(), 2);
    settle_all(&job, &["a", "r"]).await;
    assert_eq!(job.status(), ToolPathStatus::Success);
}

#[tokio::test]
async fn test_remove_artifacts_marks_everything_stale() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    let job = fx.job(&["a", "b"]);
    job.submit();
    settle_all(&job, &["a", "b"]).await;
    assert_eq!(job.lock().scene().len(), 2);

    job.remove_artifacts();
    let guard = job.lock();
    assert!(guard.scene().is_empty());
    assert_eq!(guard.status(), ToolPathStatus::Warning);
    assert!(guard
        .entries()
        .all(|e| e.status() == ToolPathStatus::Warning && e.artifact().is_none()));
    drop(guard);

    assert!(job.submit());
    assert_eq!(fx.backend.count(), 4);
}

#[tokio::test]
async fn test_clear_artifacts_keeps_statuses() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);
    job.submit();
    settle_all(&job, &["a"]).await;

    job.clear_artifacts();
    assert!(job.lock().scene().is_empty());
    assert_eq!(job.status(), ToolPathStatus::Success);
    assert_eq!(job.state().tool_path_files, vec![Some("a.json".to_string())]);
}

#[tokio::test]
async fn test_dispose_detaches_every_artifact() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    let job = fx.job(&["a", "b"]);
    job.submit();
    settle_all(&job, &["a", "b"]).await;
    fx.events.clear_history();

    assert!(job.dispose());

    let history = fx.events.history(None);
    let detached = history
        .iter()
        .filter(|e| matches!(e, AppEvent::Scene(toolpathkit_core::SceneEvent::Detached { .. })))
        .count();
    assert_eq!(detached, 2);
    assert!(matches!(
        history.last(),
        Some(AppEvent::Job(JobEvent::Disposed { .. }))
    ));
}

#[test]
fn test_backend_refusal_fails_only_that_item() {
    let fx = Fixture::new().with_vector_items(&["a", "b"]);
    fx.backend.refuse("b");
    let job = fx.job(&["a", "b"]);

    assert!(job.submit());
    let guard = job.lock();
    assert_eq!(
        guard.entry(&ItemId::from("a")).map(|e| e.status()),
        Some(ToolPathStatus::Running)
    );
    assert_eq!(
        guard.entry(&ItemId::from("b")).map(|e| e.status()),
        Some(ToolPathStatus::Failed)
    );
    assert_eq!(guard.status(), ToolPathStatus::Failed);
}

#[test]
fn test_state_serializes_like_the_wire_format() {
    let fx = Fixture::new().with_vector_items(&["a"]);
    let job = fx.job(&["a"]);
    let json = serde_json::to_value(job.state()).expect("serialize");

    assert_eq!(json["id"], "job-1");
    assert_eq!(json["type"], "vector");
    assert_eq!(json["headType"], "laser");
    assert_eq!(json["status"], "warning");
    assert_eq!(json["modelIDs"], serde_json::json!(["a"]));
    assert!(json["gcodeConfig"].is_object());
}
