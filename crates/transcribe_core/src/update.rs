use crate::{AppState, Effect, Msg, NavigationMode};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    if matches!(msg, Msg::Tick | Msg::NoOp) {
        return (state, effects);
    }
    state.mark_dirty();

    match msg {
        Msg::Boot { persisted, url } => state.boot(persisted, url, &mut effects),
        Msg::FileSelected(file) => {
            state.selected_file = Some(file);
            state.selected_remote = None;
            state.error = None;
        }
        Msg::LanguageChanged(language) => {
            let language = language.trim();
            if !language.is_empty() {
                state.language = language.to_ascii_lowercase();
            }
        }
        Msg::ModelChanged(model) => state.model = model,
        Msg::DiarizationToggled(enabled) => state.diarize = enabled,
        Msg::TranscriptionRequested => state.request_transcription(&mut effects),
        Msg::LinkTranscriptionRequested { url } => {
            state.request_link_transcription(&url, &mut effects)
        }
        Msg::LinkFetchRequested {
            url,
            auto_transcribe,
        } => state.request_link_fetch(&url, auto_transcribe, &mut effects),
        Msg::Submitted {
            kind,
            request,
            result,
        } => state.on_submitted(kind, request, result, &mut effects),
        Msg::JobProgress {
            kind,
            handle,
            progress,
        } => state.on_progress(kind, &handle, progress),
        Msg::JobSucceeded {
            kind,
            handle,
            result,
            at,
        } => state.on_succeeded(kind, &handle, result, at, &mut effects),
        Msg::JobFailed {
            kind,
            handle,
            error,
        } => state.on_failed(kind, &handle, error),
        Msg::EditRequested { job_id, text } => state.request_edit(job_id, text, &mut effects),
        Msg::EditCompleted {
            job_id,
            text,
            result,
            at,
        } => state.on_edit_completed(&job_id, &text, result, at, &mut effects),
        Msg::RenameRequested { job_id, filename } => {
            state.rename_item(&job_id, &filename, &mut effects)
        }
        Msg::CategoryAssigned {
            job_id,
            category_id,
        } => state.assign_item_category(&job_id, category_id.as_deref(), &mut effects),
        Msg::DeleteRequested { job_id } => state.request_delete(job_id, &mut effects),
        Msg::DeleteCompleted { job_id, remote } => {
            state.on_delete_completed(&job_id, remote, &mut effects)
        }
        Msg::CategoryCreated { name, at } => {
            state.create_category(&name, at, &mut effects);
        }
        Msg::CategoryRenamed { id, name } => state.rename_category(&id, &name, &mut effects),
        Msg::CategoryEmojiChanged { id, emoji } => {
            state.set_category_emoji(&id, &emoji, &mut effects)
        }
        Msg::CategoryDeleted { id } => state.delete_category(&id, &mut effects),
        Msg::CategorySelected(filter) => state.request_category(filter, &mut effects),
        Msg::ResultOpened { job_id } => state.open_result_by_id(&job_id, &mut effects),
        Msg::ResultClosed => {
            state.close_result(&mut effects);
            state.ensure_selected_category_valid(NavigationMode::Push, &mut effects);
        }
        Msg::Navigated(url) => state.apply_navigation(url, &mut effects),
        Msg::TimestampsToggled => state.show_timestamps = !state.show_timestamps,
        Msg::SpeakersToggled => state.show_speakers = !state.show_speakers,
        Msg::ResetRequested => state.reset(&mut effects),
        Msg::Tick | Msg::NoOp => {}
    }

    (state, effects)
}
