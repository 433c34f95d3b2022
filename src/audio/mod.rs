pub mod mic;
pub mod mixer;
pub mod recorder;
pub mod source;
pub mod system;

pub use mic::MicSource;
pub use recorder::{CaptureOptions, MeetingRecorder, RecordingResult, SourceFlags};
pub use source::CaptureSource;
pub use system::SystemSource;
