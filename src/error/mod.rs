use crate::icon::IconError;
use crate::session::SessionError;
use crate::sync::SyncError;
use crate::tree::TreeError;
use thiserror::Error;

pub type AdminResult<T> = std::result::Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Icon(#[from] IconError),
    #[error("page is missing required element `{0}`")]
    MissingPageElement(&'static str),
}
