//! Editing core: selection tracking, AI transformations, undo history and
//! document sessions, driven through an [`EditableSurface`].

pub mod cancel;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod markup;
pub mod remote;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod stats;
pub mod surface;
pub mod transform;

pub use config::EditorConfig;
pub use editor::{Editor, PendingSave};
pub use error::{EditorError, Outcome};
pub use remote::ApiClient;
pub use session::{LoadOutcome, SaveStatus};
pub use surface::{EditableSurface, FormatCommand, MemorySurface, TextRange};
pub use transform::{PendingTransform, TransformScope};
