//! wtui-sessions: assistant session detection.
//!
//! Three unreliable inputs are stitched together here: the host process
//! table, plugin-written state files, and the assistant's own transcript
//! logs. Everything is best-effort; unreadable inputs degrade to "nothing
//! detected" rather than errors.

pub mod flash;
pub mod plugin_state;
pub mod process;
pub mod reconcile;
pub mod transcript;

pub use flash::{DEFAULT_FLASH_DURATION, FLASH_INTERVAL, FlashTracker, Indicator};
pub use plugin_state::{STALE_AFTER, load_plugin_states};
pub use process::{
    ProcessClassifier, ProcessInfo, ProcessTable, ProcessTableSource, PsProcessTable,
    is_assistant_command,
};
pub use reconcile::{Detection, SessionReconciler, SessionSources, merge_detections};
pub use transcript::{SUMMARY_MAX_CHARS, TRANSCRIPT_FRESHNESS, summarize_transcripts};
