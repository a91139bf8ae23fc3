use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use transcribe_core::{CategoryFilter, ModelPreset, Msg, SelectedFile, UrlState};

#[derive(Debug, Parser)]
#[command(name = "transcribe")]
#[command(
    about = "Submit media for transcription and manage the result history",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Service root URL
    #[arg(long, global = true, default_value = "http://localhost:8000/api")]
    pub server: String,

    /// Directory holding the session state file
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Arrive at this address query first, e.g. `cat=all&job=abc123`
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// Print timestamps next to the open result's speaker turns
    #[arg(long, global = true)]
    pub timestamps: bool,

    /// Leave speaker labels out of the open result
    #[arg(long, global = true)]
    pub hide_speakers: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Toggles that move the result view away from its defaults
    /// (timestamps hidden, speakers shown).
    pub fn view_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.timestamps {
            actions.push(Action::Send(Msg::TimestampsToggled));
        }
        if self.hide_speakers {
            actions.push(Action::Send(Msg::SpeakersToggled));
        }
        actions
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct JobOptions {
    /// Spoken language code, or `auto`
    #[arg(short, long)]
    pub language: Option<String>,

    /// Model preset: cheetah, dolphin or whale
    #[arg(short, long)]
    pub model: Option<String>,

    /// Label speakers
    #[arg(long)]
    pub diarize: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the library for the current address
    Show,
    /// Upload a local file and transcribe it
    Transcribe {
        file: PathBuf,
        #[command(flatten)]
        options: JobOptions,
    },
    /// Let the service download a link and transcribe it in one job
    Link {
        url: String,
        #[command(flatten)]
        options: JobOptions,
    },
    /// Download a link first; optionally transcribe it once downloaded
    Fetch {
        url: String,
        /// Start transcription as soon as the download finishes
        #[arg(long)]
        then_transcribe: bool,
        #[command(flatten)]
        options: JobOptions,
    },
    /// Open a result
    Open { job_id: String },
    /// Close the open result
    Close,
    /// Replace a result's text on the service and locally
    Edit { job_id: String, text: String },
    /// Rename a result locally
    Rename { job_id: String, name: String },
    /// Delete a result
    Delete { job_id: String },
    /// Move a result into a category; omit the category to uncategorize
    Move {
        job_id: String,
        category: Option<String>,
    },
    /// Category management
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Go back one address
    Back,
    /// Go forward one address
    Forward,
    /// Clear inputs, errors and the open result
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    Create { name: String },
    Rename { id: String, name: String },
    Emoji { id: String, emoji: String },
    Delete { id: String },
    /// Select `all`, `uncategorized` or a category id
    Select { filter: String },
}

/// What the session should do for one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Send(Msg),
    Back,
    Forward,
}

impl Command {
    pub fn actions(self, now: DateTime<Utc>) -> Vec<Action> {
        let msgs = match self {
            Command::Show => Vec::new(),
            Command::Back => return vec![Action::Back],
            Command::Forward => return vec![Action::Forward],
            Command::Transcribe { file, options } => {
                let name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string());
                let mut msgs = options.msgs();
                msgs.push(Msg::FileSelected(SelectedFile { name, path: file }));
                msgs.push(Msg::TranscriptionRequested);
                msgs
            }
            Command::Link { url, options } => {
                let mut msgs = options.msgs();
                msgs.push(Msg::LinkTranscriptionRequested { url });
                msgs
            }
            Command::Fetch {
                url,
                then_transcribe,
                options,
            } => {
                let mut msgs = options.msgs();
                msgs.push(Msg::LinkFetchRequested {
                    url,
                    auto_transcribe: then_transcribe,
                });
                msgs
            }
            Command::Open { job_id } => vec![Msg::ResultOpened { job_id }],
            Command::Close => vec![Msg::ResultClosed],
            Command::Edit { job_id, text } => vec![Msg::EditRequested { job_id, text }],
            Command::Rename { job_id, name } => vec![Msg::RenameRequested {
                job_id,
                filename: name,
            }],
            Command::Delete { job_id } => vec![Msg::DeleteRequested { job_id }],
            Command::Move { job_id, category } => vec![Msg::CategoryAssigned {
                job_id,
                category_id: category,
            }],
            Command::Category(command) => vec![command.msg(now)],
            Command::Reset => vec![Msg::ResetRequested],
        };
        msgs.into_iter().map(Action::Send).collect()
    }
}

impl CategoryCommand {
    fn msg(self, now: DateTime<Utc>) -> Msg {
        match self {
            CategoryCommand::Create { name } => Msg::CategoryCreated { name, at: now },
            CategoryCommand::Rename { id, name } => Msg::CategoryRenamed { id, name },
            CategoryCommand::Emoji { id, emoji } => Msg::CategoryEmojiChanged { id, emoji },
            CategoryCommand::Delete { id } => Msg::CategoryDeleted { id },
            CategoryCommand::Select { filter } => {
                Msg::CategorySelected(CategoryFilter::parse(&filter))
            }
        }
    }
}

impl JobOptions {
    fn msgs(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        if let Some(language) = &self.language {
            msgs.push(Msg::LanguageChanged(language.clone()));
        }
        if let Some(model) = &self.model {
            msgs.push(Msg::ModelChanged(ModelPreset::from_key(model)));
        }
        msgs.push(Msg::DiarizationToggled(self.diarize));
        msgs
    }
}

/// The address a `--address` argument points at. Accepts a bare query or a
/// full URL.
pub fn parse_address(raw: &str) -> UrlState {
    if raw.contains("://") {
        UrlState::from_url(raw)
    } else {
        UrlState::from_query(raw.trim_start_matches('?'))
    }
}
