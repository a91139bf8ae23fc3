use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use transcribe_core::{
    update, AppState, CategoryFilter, Effect, JobHandle, JobKind, Msg, NavigationMode,
    PersistedSnapshot, SelectedFile, StorageKey, Submission, SubmissionId, UrlState,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn booted() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::Boot {
            persisted: PersistedSnapshot::default(),
            url: UrlState::default(),
        },
    );
    state
}

fn run(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    msgs.into_iter().fold((state, Vec::new()), |(state, _), msg| update(state, msg))
}

/// Drives a full file transcription through to success.
fn complete_job(state: AppState, job_id: &str) -> AppState {
    let handle = JobHandle::new(format!("task-{job_id}"));
    let (state, _) = run(
        state,
        vec![
            Msg::FileSelected(SelectedFile {
                name: format!("{job_id}.mp3"),
                path: PathBuf::from(format!("/tmp/{job_id}.mp3")),
            }),
            Msg::TranscriptionRequested,
        ],
    );
    let request = state
        .awaiting_submission(JobKind::Transcription)
        .expect("submission pending");
    run(
        state,
        vec![
            Msg::Submitted {
                kind: JobKind::Transcription,
                request,
                result: Ok(Submission {
                    handle: handle.clone(),
                    job_id: job_id.to_string(),
                }),
            },
            Msg::JobSucceeded {
                kind: JobKind::Transcription,
                handle,
                result: json!({"job_id": job_id, "text": format!("text of {job_id}")}),
                at: at(0),
            },
        ],
    )
    .0
}

fn create_category(state: AppState, name: &str, secs: i64) -> (AppState, String) {
    let (state, _) = update(
        state,
        Msg::CategoryCreated {
            name: name.to_string(),
            at: at(secs),
        },
    );
    let id = state
        .categories()
        .categories()
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.id.clone())
        .expect("category created");
    (state, id)
}

fn assert_partitions_sum(state: &AppState) {
    let counts = state.counts();
    let live: usize = state
        .categories()
        .categories()
        .iter()
        .map(|c| counts.by_category[&c.id])
        .sum();
    assert_eq!(counts.uncategorized + live, counts.all);
    assert_eq!(counts.all, state.history().len());
}

#[test]
fn job_completed_under_selected_category_is_tagged() {
    init_logging();
    let (state, lectures) = create_category(booted(), "Lectures", 1);
    let (state, _) = update(
        state,
        Msg::CategorySelected(CategoryFilter::Category(lectures.clone())),
    );
    let state = complete_job(state, "abc123");

    let item = state.history().get("abc123").unwrap();
    assert_eq!(item.category_id.as_deref(), Some(lectures.as_str()));
    assert_eq!(state.counts().by_category[&lectures], 1);
    assert_partitions_sum(&state);
}

#[test]
fn pseudo_filters_never_become_item_tags() {
    init_logging();
    let (state, _) = update(booted(), Msg::CategorySelected(CategoryFilter::Uncategorized));
    let state = complete_job(state, "j1");
    assert_eq!(state.history().get("j1").unwrap().category_id, None);
}

#[test]
fn category_deleted_mid_job_leaves_item_uncategorized() {
    init_logging();
    let (state, lectures) = create_category(booted(), "Lectures", 1);
    let (state, _) = run(
        state,
        vec![
            Msg::CategorySelected(CategoryFilter::Category(lectures.clone())),
            Msg::FileSelected(SelectedFile {
                name: "a.mp3".to_string(),
                path: PathBuf::from("/tmp/a.mp3"),
            }),
            Msg::TranscriptionRequested,
            Msg::Submitted {
                kind: JobKind::Transcription,
                request: SubmissionId::new(1),
                result: Ok(Submission {
                    handle: JobHandle::new("t"),
                    job_id: "a".to_string(),
                }),
            },
            Msg::CategoryDeleted {
                id: lectures.clone(),
            },
            Msg::JobSucceeded {
                kind: JobKind::Transcription,
                handle: JobHandle::new("t"),
                result: json!({"job_id": "a", "text": "x"}),
                at: at(2),
            },
        ],
    );
    assert_eq!(state.history().get("a").unwrap().category_id, None);
    assert_partitions_sum(&state);
}

#[test]
fn history_keeps_ten_newest() {
    init_logging();
    let mut state = booted();
    for n in 0..12 {
        let before = state.history().len();
        state = complete_job(state, &format!("job{n}"));
        assert_eq!(state.history().len(), (before + 1).min(10));
        assert_eq!(state.history().items()[0].id, format!("job{n}"));
    }
    assert!(state.history().get("job1").is_none());
}

#[test]
fn deleting_category_cascades_and_keeps_total() {
    init_logging();
    let (state, lectures) = create_category(booted(), "Lectures", 1);
    let (state, talks) = create_category(state, "Talks", 2);
    let state = complete_job(complete_job(complete_job(state, "a"), "b"), "c");
    let (state, _) = run(
        state,
        vec![
            Msg::CategoryAssigned {
                job_id: "a".to_string(),
                category_id: Some(lectures.clone()),
            },
            Msg::CategoryAssigned {
                job_id: "b".to_string(),
                category_id: Some(lectures.clone()),
            },
            Msg::CategoryAssigned {
                job_id: "c".to_string(),
                category_id: Some(talks.clone()),
            },
        ],
    );
    let total_before = state.counts().all;
    assert_partitions_sum(&state);

    let (state, effects) = update(state, Msg::CategoryDeleted { id: lectures.clone() });

    assert!(state
        .history()
        .items()
        .iter()
        .all(|item| item.category_id.as_deref() != Some(lectures.as_str())));
    assert_eq!(state.counts().all, total_before);
    assert_eq!(state.counts().uncategorized, 2);
    assert!(!state.counts().by_category.contains_key(&lectures));
    assert_partitions_sum(&state);

    let persisted: Vec<StorageKey> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Persist { key, .. } => Some(*key),
            _ => None,
        })
        .collect();
    assert!(persisted.contains(&StorageKey::Categories));
    assert!(persisted.contains(&StorageKey::History));
}

#[test]
fn deleting_selected_category_resets_selection_even_with_open_result() {
    init_logging();
    let (state, lectures) = create_category(booted(), "Lectures", 1);
    let (state, _) = update(
        state,
        Msg::CategorySelected(CategoryFilter::Category(lectures.clone())),
    );
    let state = complete_job(state, "a");
    assert_eq!(state.open_result_id(), Some("a"));

    let (state, _) = update(state, Msg::CategoryDeleted { id: lectures });

    assert_eq!(state.selected_category(), &CategoryFilter::All);
    assert_eq!(state.open_result_id(), Some("a"));
    assert_eq!(state.history().get("a").unwrap().category_id, None);
}

#[test]
fn assigning_unknown_category_is_refused() {
    init_logging();
    let state = complete_job(booted(), "a");
    let (state, effects) = update(
        state,
        Msg::CategoryAssigned {
            job_id: "a".to_string(),
            category_id: Some("cat_404".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.history().get("a").unwrap().category_id, None);
}

#[test]
fn assigning_uncategorized_clears_tag() {
    init_logging();
    let (state, lectures) = create_category(booted(), "Lectures", 1);
    let state = complete_job(state, "a");
    let (state, _) = run(
        state,
        vec![
            Msg::CategoryAssigned {
                job_id: "a".to_string(),
                category_id: Some(lectures),
            },
            Msg::CategoryAssigned {
                job_id: "a".to_string(),
                category_id: Some("uncategorized".to_string()),
            },
        ],
    );
    assert_eq!(state.history().get("a").unwrap().category_id, None);
}

#[test]
fn edit_waits_for_remote_confirmation() {
    init_logging();
    let state = complete_job(booted(), "a");
    let (state, effects) = update(
        state,
        Msg::EditRequested {
            job_id: "a".to_string(),
            text: "fixed".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UpdateRemoteText {
            job_id: "a".to_string(),
            text: "fixed".to_string(),
        }]
    );
    assert_eq!(state.history().get("a").unwrap().result.text, "text of a");

    let (state, effects) = update(
        state,
        Msg::EditCompleted {
            job_id: "a".to_string(),
            text: "fixed".to_string(),
            result: Err("disk full".to_string()),
            at: at(5),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.error(), Some("disk full"));
    assert_eq!(state.history().get("a").unwrap().result.text, "text of a");

    let (state, effects) = update(
        state,
        Msg::EditCompleted {
            job_id: "a".to_string(),
            text: "fixed".to_string(),
            result: Ok(()),
            at: at(6),
        },
    );
    let result = &state.history().get("a").unwrap().result;
    assert_eq!(result.text, "fixed");
    assert_eq!(result.edited_at, Some(at(6)));
    assert!(matches!(
        &effects[..],
        [Effect::Persist {
            key: StorageKey::History,
            ..
        }]
    ));
}

#[test]
fn rename_is_local_only() {
    init_logging();
    let state = complete_job(booted(), "a");
    let (state, effects) = update(
        state,
        Msg::RenameRequested {
            job_id: "a".to_string(),
            filename: "Monday lecture".to_string(),
        },
    );
    assert_eq!(state.history().get("a").unwrap().filename, "Monday lecture");
    assert!(matches!(
        &effects[..],
        [Effect::Persist {
            key: StorageKey::History,
            ..
        }]
    ));
}

#[test]
fn delete_proceeds_when_remote_fails_and_closes_open_result() {
    init_logging();
    let state = complete_job(complete_job(booted(), "a"), "b");
    assert_eq!(state.open_result_id(), Some("b"));

    let (state, effects) = update(
        state,
        Msg::DeleteRequested {
            job_id: "b".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::DeleteRemoteJob {
            job_id: "b".to_string()
        }]
    );

    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            job_id: "b".to_string(),
            remote: Err("404".to_string()),
        },
    );
    assert!(state.history().get("b").is_none());
    assert_eq!(state.open_result_id(), None);
    assert_eq!(state.error(), None);
    assert_eq!(state.url().job, None);
    assert!(effects.contains(&Effect::Forget {
        key: StorageKey::OpenResult
    }));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Navigate {
            mode: NavigationMode::Replace,
            ..
        }
    )));
}

#[test]
fn category_rename_and_emoji() {
    init_logging();
    let (state, _) = update(
        booted(),
        Msg::CategoryCreated {
            name: "   ".to_string(),
            at: at(1),
        },
    );
    let category = &state.categories().categories()[0];
    assert_eq!(category.name, transcribe_core::DEFAULT_CATEGORY_NAME);
    let id = category.id.clone();

    let (state, _) = run(
        state,
        vec![
            Msg::CategoryRenamed {
                id: id.clone(),
                name: "Podcasts".to_string(),
            },
            Msg::CategoryEmojiChanged {
                id: id.clone(),
                emoji: "🎙".to_string(),
            },
        ],
    );
    let category = state.categories().get(&id).unwrap();
    assert_eq!(category.name, "Podcasts");
    assert_eq!(category.emoji, "🎙");

    let (_, effects) = update(
        state,
        Msg::CategoryRenamed {
            id: "cat_404".to_string(),
            name: "x".to_string(),
        },
    );
    assert!(effects.is_empty());
}
