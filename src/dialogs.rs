/// Native dialogs
///
/// The planner talks to the OS through the `Dialogs` trait: open a file,
/// save a file, show an alert. The app holds an `Arc<dyn Dialogs>`; the
/// real one is backed by rfd, tests swap in a recording fake.

use iced::futures::future::BoxFuture;
use iced::futures::FutureExt;
use rfd::{AsyncFileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;

/// What an open dialog is allowed to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Json,
}

impl FileKind {
    fn filter(self) -> (&'static str, &'static [&'static str]) {
        match self {
            FileKind::Image => ("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"]),
            FileKind::Json => ("JSON", &["json"]),
        }
    }
}

pub trait Dialogs: Send + Sync {
    /// Let the user pick a file and read it; `None` when cancelled
    fn open(&self, kind: FileKind) -> BoxFuture<'static, Option<Vec<u8>>>;

    /// Offer `bytes` for saving under `file_name`; `Ok(None)` when cancelled
    fn save(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<Option<PathBuf>, String>>;

    /// Blocking message box
    fn alert(&self, message: &str);
}

/// Dialogs backed by the platform's native file pickers
#[derive(Debug, Default)]
pub struct NativeDialogs;

impl Dialogs for NativeDialogs {
    fn open(&self, kind: FileKind) -> BoxFuture<'static, Option<Vec<u8>>> {
        let (name, extensions) = kind.filter();
        async move {
            let handle = AsyncFileDialog::new()
                .set_title("Open")
                .add_filter(name, extensions)
                .pick_file()
                .await?;
            Some(handle.read().await)
        }
        .boxed()
    }

    fn save(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<Option<PathBuf>, String>> {
        async move {
            let Some(handle) = AsyncFileDialog::new()
                .set_title("Save")
                .set_file_name(&file_name)
                .save_file()
                .await
            else {
                return Ok(None);
            };
            let path = handle.path().to_path_buf();
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            Ok(Some(path))
        }
        .boxed()
    }

    fn alert(&self, message: &str) {
        MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title("Wall Planner")
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}
