pub mod permissions;

pub use permissions::{
    check_stage_gate, require_document_manager, require_privileged, resolve_target, TargetUser,
    UserDirectory,
};
