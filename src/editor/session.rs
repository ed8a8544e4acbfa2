use anyhow::Result;

/// What one poll of an editing session observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Idle,
    /// The user changed the graph; carries the full encoded graph.
    Edited(String),
    /// The user closed the editor.
    Closed,
}

/// An interactive graph editor driven from the bridge's background thread.
///
/// All methods are called from that thread only.
pub trait EditorSession: Send {
    /// Show the editor with `graph` loaded.
    fn open(&mut self, graph: &str) -> Result<()>;

    /// Replace the graph being edited.
    fn load_graph(&mut self, graph: &str) -> Result<()>;

    /// Must not block longer than a fraction of the poll period.
    fn poll(&mut self) -> Result<SessionEvent>;

    fn close(&mut self);
}
