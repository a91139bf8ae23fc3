use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use transcribe_core::{
    update, AppState, CategoryFilter, Effect, JobHandle, JobKind, Msg, PersistedSnapshot,
    SelectedFile, Submission, SubmissionId, UrlState,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

/// Applies messages in order, mirroring every storage effect into `storage`.
fn run_persisting(
    mut state: AppState,
    storage: &mut PersistedSnapshot,
    msgs: Vec<Msg>,
) -> AppState {
    for msg in msgs {
        let (next, effects) = update(state, msg);
        for effect in effects {
            match effect {
                Effect::Persist { key, value } => storage.set(key, Some(value)),
                Effect::Forget { key } => storage.set(key, None),
                _ => {}
            }
        }
        state = next;
    }
    state
}

/// `request` is the session's running submission count for this job.
fn job_messages(job_id: &str, request: u64, secs: i64) -> Vec<Msg> {
    let handle = JobHandle::new(format!("task-{job_id}"));
    vec![
        Msg::FileSelected(SelectedFile {
            name: format!("{job_id}.m4a"),
            path: PathBuf::from(format!("/tmp/{job_id}.m4a")),
        }),
        Msg::TranscriptionRequested,
        Msg::Submitted {
            kind: JobKind::Transcription,
            request: SubmissionId::new(request),
            result: Ok(Submission {
                handle: handle.clone(),
                job_id: job_id.to_string(),
            }),
        },
        Msg::JobSucceeded {
            kind: JobKind::Transcription,
            handle,
            result: json!({
                "job_id": job_id,
                "text": format!("words from {job_id}"),
                "srt_file": format!("outputs/{job_id}.srt"),
                "speakers": null,
            }),
            at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        },
    ]
}

#[test]
fn history_and_categories_survive_reload() {
    init_logging();
    let mut storage = PersistedSnapshot::default();
    let boot = Msg::Boot {
        persisted: PersistedSnapshot::default(),
        url: UrlState::default(),
    };
    let state = run_persisting(AppState::new(), &mut storage, vec![boot]);

    let mut msgs = vec![
        Msg::CategoryCreated {
            name: "Lectures".to_string(),
            at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        },
        Msg::CategoryCreated {
            name: "Meetings".to_string(),
            at: Utc.timestamp_opt(1_700_000_001, 0).unwrap(),
        },
    ];
    msgs.extend(job_messages("a", 1, 10));
    msgs.extend(job_messages("b", 2, 20));
    msgs.extend(job_messages("c", 3, 30));
    let state = run_persisting(state, &mut storage, msgs);

    let meetings = state.categories().categories()[1].id.clone();
    let state = run_persisting(
        state,
        &mut storage,
        vec![
            Msg::CategoryAssigned {
                job_id: "b".to_string(),
                category_id: Some(meetings.clone()),
            },
            Msg::RenameRequested {
                job_id: "c".to_string(),
                filename: "Standup".to_string(),
            },
            Msg::CategorySelected(CategoryFilter::Category(meetings.clone())),
        ],
    );

    let (reloaded, _) = update(
        AppState::new(),
        Msg::Boot {
            persisted: storage.clone(),
            url: UrlState::default(),
        },
    );

    assert_eq!(reloaded.history().items(), state.history().items());
    let ids = |s: &AppState| -> BTreeSet<String> {
        s.categories()
            .categories()
            .iter()
            .map(|c| c.id.clone())
            .collect()
    };
    assert_eq!(ids(&reloaded), ids(&state));
    assert_eq!(reloaded.categories(), state.categories());
    assert_eq!(
        reloaded.selected_category(),
        &CategoryFilter::Category(meetings)
    );
    assert_eq!(reloaded.open_result_id(), None);
    assert_eq!(
        reloaded.history().get("a").unwrap().result.extra["srt_file"],
        json!("outputs/a.srt")
    );
}

#[test]
fn open_result_fallback_survives_reload() {
    init_logging();
    let mut storage = PersistedSnapshot::default();
    let mut msgs = vec![Msg::Boot {
        persisted: PersistedSnapshot::default(),
        url: UrlState::default(),
    }];
    msgs.extend(job_messages("a", 1, 1));
    let state = run_persisting(AppState::new(), &mut storage, msgs);
    assert_eq!(state.open_result_id(), Some("a"));

    let (reloaded, _) = update(
        AppState::new(),
        Msg::Boot {
            persisted: storage,
            url: UrlState::default(),
        },
    );
    assert_eq!(reloaded.open_result_id(), Some("a"));
    assert_eq!(reloaded.view().open_result.unwrap().text, "words from a");
}

#[test]
fn corrupt_storage_boots_empty() {
    init_logging();
    let persisted = PersistedSnapshot {
        history: Some("{broken".to_string()),
        categories: Some("42".to_string()),
        selected_category: Some(String::new()),
        open_result: Some("x".to_string()),
    };
    let (state, effects) = update(
        AppState::new(),
        Msg::Boot {
            persisted,
            url: UrlState::default(),
        },
    );
    assert!(state.history().is_empty());
    assert!(state.categories().categories().is_empty());
    assert_eq!(state.selected_category(), &CategoryFilter::All);
    assert!(effects.contains(&Effect::Forget {
        key: transcribe_core::StorageKey::OpenResult
    }));
}

#[test]
fn dangling_category_reference_loads_uncategorized() {
    init_logging();
    let history = json!([{
        "id": "a",
        "filename": "a.mp3",
        "language": "ko",
        "createdAt": "2024-01-01T00:00:00Z",
        "categoryId": "cat_gone",
        "result": {"job_id": "a", "text": "t"}
    }]);
    let persisted = PersistedSnapshot {
        history: Some(history.to_string()),
        ..PersistedSnapshot::default()
    };
    let (state, _) = update(
        AppState::new(),
        Msg::Boot {
            persisted,
            url: UrlState::default(),
        },
    );
    assert_eq!(state.history().get("a").unwrap().category_id, None);
    assert_eq!(state.counts().uncategorized, 1);
}
