use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("provider error: {0}")] Provider(String),
    #[error("classification returned neither node nor react: {0:?}")] Classification(String),
    #[error("{0} stage returned an empty or unusable response")] EmptyResponse(&'static str),
}

/// Why a file step could not be folded into the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid path: {0:?}")] InvalidPath(String),
    #[error("{0} is a folder and cannot be replaced by a file")] FolderCollision(String),
    #[error("{0} is a file and cannot hold children")] FileInPath(String),
}
