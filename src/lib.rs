// Library surface for headless/integration tests and reuse.
// The binary in main.rs only parses arguments and wires these together.
pub mod app_dirs;
pub mod config;
pub mod datapipe;
pub mod error;
pub mod export;
pub mod options;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod stimulus;
pub mod timeline;
pub mod trial;
pub mod util;

pub use error::{ConfigError, ExportError, ProfileError, SessionError, UploadError};
pub use options::{TimelineConfig, TimelineOptions};
pub use runtime::{ChannelResponder, Responder, SessionReport, SessionRunner, SimulatedResponder};
pub use session::SessionState;
pub use stats::{summarize, Summary};
pub use timeline::{build_timeline, Timeline, TimelineStep};
pub use trial::{TrialOutcome, TrialResult, TrialSpec};
