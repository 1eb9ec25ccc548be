// Library surface shared by the binary and the integration tests.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod history;
pub mod leaderboard;
pub mod metrics;
pub mod mode;
pub mod record;
pub mod runtime;
pub mod session;
pub mod time_series;
pub mod util;

pub use clock::{Clock, ManualClock, SystemClock};
pub use content::{ContentSource, ContentSupplier, Difficulty};
pub use error::{ContentError, LeaderboardError};
pub use history::SessionHistory;
pub use leaderboard::{Leaderboard, RankedEntry};
pub use metrics::MetricsRecorder;
pub use mode::GameMode;
pub use record::{Grade, SessionRecord};
pub use session::TypingSession;
