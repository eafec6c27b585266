//! Cloud drive access used for backups.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{ClientError, ClientResult};

/// MIME type the drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder on the cloud drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub is_folder: bool,
}

/// Account the drive client is signed in as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// File and folder operations on a cloud drive.
///
/// `parent_id` of `None` means the drive root.
pub trait CloudDriveClient: Send + Sync {
    fn list_files(
        &self,
        parent_id: Option<&str>,
    ) -> impl Future<Output = ClientResult<Vec<DriveFile>>> + Send;

    fn create_file(
        &self,
        name: &str,
        content: &[u8],
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> impl Future<Output = ClientResult<DriveFile>> + Send;

    fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> impl Future<Output = ClientResult<DriveFile>> + Send;

    /// Delete a file, or a folder with everything below it.
    fn delete_file(&self, file_id: &str) -> impl Future<Output = ClientResult<()>> + Send;

    fn download_file(&self, file_id: &str) -> impl Future<Output = ClientResult<Vec<u8>>> + Send;

    /// Replace the content of an existing file.
    fn update_file(
        &self,
        file_id: &str,
        content: &[u8],
    ) -> impl Future<Output = ClientResult<DriveFile>> + Send;

    fn is_authorized(&self) -> impl Future<Output = bool> + Send;

    /// Start the sign-in flow. Returns whether the client is now authorized.
    fn authorize(&self) -> impl Future<Output = ClientResult<bool>> + Send;

    fn sign_out(&self) -> impl Future<Output = ClientResult<()>> + Send;

    /// Signed-in account, `None` when signed out.
    fn get_user_info(&self) -> impl Future<Output = ClientResult<Option<UserInfo>>> + Send;
}

#[derive(Debug)]
struct StoredFile {
    file: DriveFile,
    parent_id: Option<String>,
    content: Vec<u8>,
}

#[derive(Debug)]
struct DriveState {
    authorized: bool,
    next_id: u64,
    files: BTreeMap<String, StoredFile>,
}

/// Drive kept in process memory.
///
/// Starts signed out; [`CloudDriveClient::authorize`] always succeeds.
#[derive(Debug)]
pub struct InMemoryCloudDriveClient {
    user: UserInfo,
    state: Mutex<DriveState>,
}

impl InMemoryCloudDriveClient {
    /// Signed-out client for `user`
    pub fn new(user: UserInfo) -> Self {
        Self::with_authorization(user, false)
    }

    /// Client that is already signed in as `user`
    pub fn signed_in(user: UserInfo) -> Self {
        Self::with_authorization(user, true)
    }

    fn with_authorization(user: UserInfo, authorized: bool) -> Self {
        Self {
            user,
            state: Mutex::new(DriveState {
                authorized,
                next_id: 1,
                files: BTreeMap::new(),
            }),
        }
    }
}

impl DriveState {
    fn ensure_authorized(&self) -> ClientResult<()> {
        if self.authorized {
            Ok(())
        } else {
            Err(ClientError::NotAuthorized)
        }
    }

    fn ensure_folder(&self, parent_id: Option<&str>) -> ClientResult<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        match self.files.get(parent_id) {
            Some(stored) if stored.file.is_folder => Ok(()),
            Some(_) => Err(ClientError::Api(format!("{parent_id} is not a folder"))),
            None => Err(ClientError::NotFound(format!("folder {parent_id}"))),
        }
    }

    fn add(
        &mut self,
        name: &str,
        mime_type: &str,
        is_folder: bool,
        content: Vec<u8>,
        parent_id: Option<&str>,
    ) -> DriveFile {
        let id = format!("file-{}", self.next_id);
        self.next_id += 1;
        let file = DriveFile {
            id: id.clone(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            is_folder,
        };
        self.files.insert(
            id,
            StoredFile {
                file: file.clone(),
                parent_id: parent_id.map(ToString::to_string),
                content,
            },
        );
        file
    }

    fn descendants(&self, root: &str) -> Vec<String> {
        let mut found = vec![root.to_string()];
        let mut cursor = 0;
        while cursor < found.len() {
            let current = found[cursor].clone();
            found.extend(
                self.files
                    .iter()
                    .filter(|(_, stored)| stored.parent_id.as_deref() == Some(current.as_str()))
                    .map(|(id, _)| id.clone()),
            );
            cursor += 1;
        }
        found
    }
}

impl CloudDriveClient for InMemoryCloudDriveClient {
    async fn list_files(&self, parent_id: Option<&str>) -> ClientResult<Vec<DriveFile>> {
        let state = self.state.lock().await;
        state.ensure_authorized()?;
        state.ensure_folder(parent_id)?;
        Ok(state
            .files
            .values()
            .filter(|stored| stored.parent_id.as_deref() == parent_id)
            .map(|stored| stored.file.clone())
            .collect())
    }

    async fn create_file(
        &self,
        name: &str,
        content: &[u8],
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> ClientResult<DriveFile> {
        let mut state = self.state.lock().await;
        state.ensure_authorized()?;
        state.ensure_folder(parent_id)?;
        Ok(state.add(name, mime_type, false, content.to_vec(), parent_id))
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> ClientResult<DriveFile> {
        let mut state = self.state.lock().await;
        state.ensure_authorized()?;
        state.ensure_folder(parent_id)?;
        Ok(state.add(name, FOLDER_MIME_TYPE, true, Vec::new(), parent_id))
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_authorized()?;
        if !state.files.contains_key(file_id) {
            return Err(ClientError::NotFound(format!("file {file_id}")));
        }
        for id in state.descendants(file_id) {
            state.files.remove(&id);
        }
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> ClientResult<Vec<u8>> {
        let state = self.state.lock().await;
        state.ensure_authorized()?;
        match state.files.get(file_id) {
            Some(stored) if stored.file.is_folder => {
                Err(ClientError::Api(format!("{file_id} is a folder")))
            }
            Some(stored) => Ok(stored.content.clone()),
            None => Err(ClientError::NotFound(format!("file {file_id}"))),
        }
    }

    async fn update_file(&self, file_id: &str, content: &[u8]) -> ClientResult<DriveFile> {
        let mut state = self.state.lock().await;
        state.ensure_authorized()?;
        match state.files.get_mut(file_id) {
            Some(stored) if stored.file.is_folder => {
                Err(ClientError::Api(format!("{file_id} is a folder")))
            }
            Some(stored) => {
                stored.content = content.to_vec();
                Ok(stored.file.clone())
            }
            None => Err(ClientError::NotFound(format!("file {file_id}"))),
        }
    }

    async fn is_authorized(&self) -> bool {
        self.state.lock().await.authorized
    }

    async fn authorize(&self) -> ClientResult<bool> {
        self.state.lock().await.authorized = true;
        Ok(true)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.state.lock().await.authorized = false;
        Ok(())
    }

    async fn get_user_info(&self) -> ClientResult<Option<UserInfo>> {
        let authorized = self.state.lock().await.authorized;
        Ok(authorized.then(|| self.user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user() -> UserInfo {
        UserInfo {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo_url: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_requires_authorization() {
        let drive = InMemoryCloudDriveClient::new(user());
        assert!(!drive.is_authorized().await);
        assert!(drive.get_user_info().await.unwrap().is_none());

        let err = drive.list_files(None).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthorized));

        assert!(drive.authorize().await.unwrap());
        assert_eq!(drive.get_user_info().await.unwrap(), Some(user()));

        drive.sign_out().await.unwrap();
        assert!(!drive.is_authorized().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_files_live_in_folders() {
        let drive = InMemoryCloudDriveClient::signed_in(user());
        let folder = drive.create_folder("MarkDay", None).await.unwrap();
        assert!(folder.is_folder);
        assert_eq!(folder.mime_type, FOLDER_MIME_TYPE);

        let file = drive
            .create_file("a.json", b"{}", "application/json", Some(&folder.id))
            .await
            .unwrap();

        assert_eq!(drive.list_files(None).await.unwrap(), vec![folder.clone()]);
        assert_eq!(
            drive.list_files(Some(&folder.id)).await.unwrap(),
            vec![file.clone()]
        );

        drive.update_file(&file.id, b"[1]").await.unwrap();
        assert_eq!(drive.download_file(&file.id).await.unwrap(), b"[1]".to_vec());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deleting_folder_removes_children() {
        let drive = InMemoryCloudDriveClient::signed_in(user());
        let folder = drive.create_folder("MarkDay", None).await.unwrap();
        let file = drive
            .create_file("a.json", b"{}", "application/json", Some(&folder.id))
            .await
            .unwrap();

        drive.delete_file(&folder.id).await.unwrap();

        assert!(drive.list_files(None).await.unwrap().is_empty());
        let err = drive.download_file(&file.id).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_parent_is_not_found() {
        let drive = InMemoryCloudDriveClient::signed_in(user());
        let err = drive
            .create_file("a", b"", "text/plain", Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
