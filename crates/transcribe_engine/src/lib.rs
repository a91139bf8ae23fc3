//! Transcribe engine: remote service client, job polling, storage and
//! navigation facilities the app runs effects against.
mod navigation;
mod persist;
mod poll;
mod remote;
mod storage;
mod types;

pub use navigation::SessionHistory;
pub use persist::{ensure_state_dir, PersistError, StateFile};
pub use poll::{
    JobPoller, PollHandle, PollMachine, PollPhase, PollSink, PollStep, STATUS_CHECK_FAILED,
    TASK_FAILED,
};
pub use remote::{HttpRemoteService, RemoteService, RemoteSettings};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
pub use types::{
    RemoteError, RemoteErrorKind, SubmittedJob, TaskState, TaskStatus, TranscriptionInput,
    TranscriptionRequest,
};
