use transcribe_core::{AppViewModel, CategoryFilter, OpenResultView, SelectedInputView};

/// One line describing in-flight work or the latest error, if any.
pub(crate) fn status_line(view: &AppViewModel) -> Option<String> {
    if let Some(error) = &view.error {
        return Some(format!("Error: {error}"));
    }
    if view.link_fetching {
        return Some(format!("Fetching link... {}%", view.link_fetch_progress));
    }
    if view.status_message.is_empty() {
        None
    } else {
        Some(view.status_message.clone())
    }
}

pub(crate) fn summary(view: &AppViewModel) -> String {
    let mut lines = Vec::new();

    if view.shared_mode {
        match &view.shared_by {
            Some(by) => lines.push(format!("Shared view (from {by})")),
            None => lines.push("Shared view".to_string()),
        }
    }
    if let Some(error) = &view.error {
        lines.push(format!("Error: {error}"));
    }
    match &view.selected_input {
        Some(SelectedInputView::File { name }) => lines.push(format!("Selected file: {name}")),
        Some(SelectedInputView::Remote { title, size_bytes }) => match size_bytes {
            Some(size) => lines.push(format!("Downloaded media: {title} ({size} bytes)")),
            None => lines.push(format!("Downloaded media: {title}")),
        },
        None => {}
    }

    let mut filters = vec![
        filter_label(view, &CategoryFilter::All, "All".to_string(), view.total_count),
        filter_label(
            view,
            &CategoryFilter::Uncategorized,
            "Uncategorized".to_string(),
            view.uncategorized_count,
        ),
    ];
    for row in &view.categories {
        filters.push(filter_label(
            view,
            &CategoryFilter::Category(row.id.clone()),
            format!("{} {} [{}]", row.emoji, row.name, row.id),
            row.count,
        ));
    }
    lines.push(format!("Categories: {}", filters.join(" | ")));

    if view.history.is_empty() {
        lines.push("No results here yet.".to_string());
    } else {
        for row in &view.history {
            let marker = if row.is_open { '>' } else { ' ' };
            lines.push(format!(
                "{marker} {}  {}  {}  {}",
                row.id,
                row.filename,
                row.language,
                row.created_at.format("%Y-%m-%d %H:%M")
            ));
        }
    }

    if let Some(open) = &view.open_result {
        lines.push(String::new());
        match open.edited_at {
            Some(at) => lines.push(format!(
                "{} ({}), edited {}",
                open.filename,
                open.id,
                at.format("%Y-%m-%d %H:%M")
            )),
            None => lines.push(format!("{} ({})", open.filename, open.id)),
        }
        lines.push(open.text.clone());
        let turns = speaker_lines(open);
        if !turns.is_empty() {
            lines.push(String::new());
            lines.extend(turns);
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Speaker turns as the view options ask for them. Without timestamps,
/// consecutive turns by the same speaker collapse into one line.
fn speaker_lines(open: &OpenResultView) -> Vec<String> {
    let mut lines: Vec<String> = open
        .speaker_turns
        .iter()
        .filter_map(|turn| match (open.show_timestamps, open.show_speakers) {
            (true, true) => Some(format!(
                "[{} - {}] {}",
                clock(turn.start_ms),
                clock(turn.end_ms),
                turn.speaker
            )),
            (true, false) => Some(format!("[{} - {}]", clock(turn.start_ms), clock(turn.end_ms))),
            (false, true) => Some(turn.speaker.clone()),
            (false, false) => None,
        })
        .collect();
    if !open.show_timestamps {
        lines.dedup();
    }
    lines
}

fn clock(millis: u64) -> String {
    let seconds = millis / 1000;
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn filter_label(
    view: &AppViewModel,
    filter: &CategoryFilter,
    label: String,
    count: usize,
) -> String {
    if &view.selected_category == filter {
        format!("*{label} ({count})")
    } else {
        format!("{label} ({count})")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use transcribe_core::{
        update, AppState, JobHandle, JobKind, Msg, PersistedSnapshot, Submission, SubmissionId,
        UrlState,
    };

    use super::*;

    fn booted() -> AppState {
        update(
            AppState::new(),
            Msg::Boot {
                persisted: PersistedSnapshot::default(),
                url: UrlState::default(),
            },
        )
        .0
    }

    #[test]
    fn empty_library_summary() {
        let text = summary(&booted().view());
        assert!(text.contains("*All (0) | Uncategorized (0)"));
        assert!(text.contains("No results here yet."));
    }

    #[test]
    fn open_result_is_marked_and_printed() {
        let handle = JobHandle::new("task-1");
        let mut state = booted();
        for msg in [
            Msg::LinkTranscriptionRequested {
                url: "https://example.com/talk".to_string(),
            },
            Msg::Submitted {
                kind: JobKind::Transcription,
                request: SubmissionId::new(1),
                result: Ok(Submission {
                    handle: handle.clone(),
                    job_id: "abc123".to_string(),
                }),
            },
            Msg::JobSucceeded {
                kind: JobKind::Transcription,
                handle,
                result: json!({"job_id": "abc123", "text": "hello"}),
                at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            },
        ] {
            state = update(state, msg).0;
        }

        let text = summary(&state.view());
        assert!(text.contains("> abc123"));
        assert!(text.contains("2024-03-01 09:30"));
        assert!(text.ends_with("hello\n"));
    }

    fn diarized(show: &[Msg]) -> String {
        let handle = JobHandle::new("task-2");
        let mut state = booted();
        let mut msgs = vec![
            Msg::LinkTranscriptionRequested {
                url: "https://example.com/panel".to_string(),
            },
            Msg::Submitted {
                kind: JobKind::Transcription,
                request: SubmissionId::new(1),
                result: Ok(Submission {
                    handle: handle.clone(),
                    job_id: "panel".to_string(),
                }),
            },
            Msg::JobSucceeded {
                kind: JobKind::Transcription,
                handle,
                result: json!({
                    "job_id": "panel",
                    "text": "welcome everyone",
                    "speakers": [
                        {"start": 0.0, "end": 3.2, "speaker": "SPEAKER_1"},
                        {"start": 3.2, "end": 5.0, "speaker": "SPEAKER_1"},
                        {"start": 65.5, "end": 3700.0, "speaker": "SPEAKER_2"},
                    ],
                }),
                at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            },
        ];
        msgs.extend(show.iter().cloned());
        for msg in msgs {
            state = update(state, msg).0;
        }
        summary(&state.view())
    }

    #[test]
    fn speakers_shown_by_default_without_timestamps() {
        let text = diarized(&[]);
        assert!(text.ends_with("welcome everyone\n\nSPEAKER_1\nSPEAKER_2\n"));
    }

    #[test]
    fn timestamps_toggle_adds_turn_times() {
        let text = diarized(&[Msg::TimestampsToggled]);
        assert!(text.contains("[00:00 - 00:03] SPEAKER_1\n[00:03 - 00:05] SPEAKER_1\n"));
        assert!(text.ends_with("[01:05 - 1:01:40] SPEAKER_2\n"));
    }

    #[test]
    fn hiding_speakers_keeps_only_times_or_nothing() {
        let text = diarized(&[Msg::TimestampsToggled, Msg::SpeakersToggled]);
        assert!(text.ends_with("[01:05 - 1:01:40]\n"));
        assert!(!text.contains("SPEAKER_"));

        let text = diarized(&[Msg::SpeakersToggled]);
        assert!(text.ends_with("welcome everyone\n"));
    }

    #[test]
    fn errors_win_the_status_line() {
        let (state, _) = update(booted(), Msg::TranscriptionRequested);
        let line = status_line(&state.view()).unwrap();
        assert!(line.starts_with("Error: "));
    }
}
