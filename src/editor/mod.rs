mod buffer;
mod editor;
mod selection;
mod workspace;

pub use buffer::Buffer;
pub use editor::EditorId;
pub use selection::Selection;
pub use workspace::{SharedWorkspace, Workspace, read_workspace, write_workspace};
