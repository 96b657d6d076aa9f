//! Project input discovery and the external collaborators jobs depend on.

/// Translation and narration collaborator traits.
pub mod collab;
/// On-disk project and output layout.
pub mod layout;
