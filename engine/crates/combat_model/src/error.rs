use thiserror::Error;

use crate::ids::ActorId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("actor not found: {0}")]
    UnknownActor(ActorId),

    #[error("actor already online: {0}")]
    AlreadyOnline(ActorId),
}
