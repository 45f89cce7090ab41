// Application layer - Use case interactors

pub mod compress_interactor;
pub mod container;
pub mod trim_interactor;
pub mod upload_interactor;

// Re-export interactors
pub use compress_interactor::{CompressInteractor, CompressRequest};
pub use container::{AppContainer, DefaultAppContainer};
pub use trim_interactor::{TrimInteractor, TrimRequest};
pub use upload_interactor::{upload_file_name, UploadInteractor, UploadReceipt};
