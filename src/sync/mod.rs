// ==========================================
// PrintFlow APS - Remote mirror layer
// ==========================================
// The only async seam in the system: the recalculator
// pushes the produced plan to a remote mirror after
// the local store is written.
// ==========================================

pub mod remote_mirror;

pub use remote_mirror::{
    InMemoryRemoteMirror, NoopRemoteMirror, RemoteMirror, SyncContext, SyncError,
};
