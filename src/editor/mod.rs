//! File view/edit/create, in two flavours: proxied through a session's
//! shell (`sessioned`), or resolved directly against a host directory
//! (`nonsessioned`). Both share validation and formatting from `shared`.

pub mod nonsessioned;
pub mod sessioned;
pub mod shared;

pub use nonsessioned::NonSessionedEditor;
