//! Google Drive v3 REST client.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::drive::{CloudDriveClient, DriveFile, UserInfo, FOLDER_MIME_TYPE};
use super::{normalize_base_url, ClientError, ClientResult};
use crate::settings::SettingsStore;
use crate::util::compact_text;

/// Metadata endpoint of the Drive v3 API
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";

/// Media upload endpoint of the Drive v3 API
pub const DEFAULT_DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

const FILE_FIELDS: &str = "id,name,mimeType";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";
const USER_FIELDS: &str = "user(displayName,emailAddress,photoLink)";
const PAGE_SIZE: &str = "100";
const ROOT_FOLDER: &str = "root";

/// Drive client authenticated with an OAuth bearer token kept in settings.
///
/// Obtaining the token happens outside the client; [`CloudDriveClient::authorize`]
/// checks that the stored token is accepted by the API.
#[derive(Debug)]
pub struct GoogleDriveClient<S: SettingsStore> {
    settings: Arc<S>,
    api_url: String,
    upload_url: String,
    client: reqwest::Client,
}

impl<S: SettingsStore> GoogleDriveClient<S> {
    /// Client for the production endpoints
    pub fn new(settings: Arc<S>) -> ClientResult<Self> {
        Self::with_base_urls(settings, DEFAULT_DRIVE_API_URL, DEFAULT_DRIVE_UPLOAD_URL)
    }

    /// Client for explicit metadata and upload base URLs
    pub fn with_base_urls(
        settings: Arc<S>,
        api_url: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> ClientResult<Self> {
        Ok(Self {
            settings,
            api_url: normalize_base_url(&api_url.into())?,
            upload_url: normalize_base_url(&upload_url.into())?,
            client: reqwest::Client::builder().build()?,
        })
    }

    async fn access_token(&self) -> ClientResult<String> {
        self.settings
            .drive_access_token()
            .await?
            .ok_or(ClientError::NotAuthorized)
    }

    /// Send `request` with the stored token; error statuses become errors
    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn send_for_file(&self, request: RequestBuilder) -> ClientResult<DriveFile> {
        let body = self.send(request).await?.text().await?;
        parse_file(&body)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{file_id}", self.api_url)
    }

    fn upload_request(&self, file_id: &str) -> RequestBuilder {
        self.client
            .patch(format!("{}/files/{file_id}", self.upload_url))
            .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
    }

    async fn create_metadata(
        &self,
        name: &str,
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> ClientResult<DriveFile> {
        let request = self
            .client
            .post(format!("{}/files", self.api_url))
            .query(&[("fields", FILE_FIELDS)])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": mime_type,
                "parents": [parent_id.unwrap_or(ROOT_FOLDER)],
            }));
        self.send_for_file(request).await
    }
}

impl<S: SettingsStore> CloudDriveClient for GoogleDriveClient<S> {
    async fn list_files(&self, parent_id: Option<&str>) -> ClientResult<Vec<DriveFile>> {
        let children = children_query(parent_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("q", children.clone()),
                ("fields", LIST_FIELDS.to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let request = self
                .client
                .get(format!("{}/files", self.api_url))
                .query(&query);
            let page = parse_file_list(&self.send(request).await?.text().await?)?;
            files.extend(page.files.into_iter().map(ApiFile::into_drive_file));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    async fn create_file(
        &self,
        name: &str,
        content: &[u8],
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> ClientResult<DriveFile> {
        let created = self.create_metadata(name, mime_type, parent_id).await?;
        let request = self
            .upload_request(&created.id)
            .header(CONTENT_TYPE, mime_type)
            .body(content.to_vec());
        let file = self.send_for_file(request).await?;
        tracing::debug!(file_id = %file.id, bytes = content.len(), "Created drive file {name}");
        Ok(file)
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> ClientResult<DriveFile> {
        self.create_metadata(name, FOLDER_MIME_TYPE, parent_id).await
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        self.send(self.client.delete(self.file_url(file_id))).await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> ClientResult<Vec<u8>> {
        let request = self
            .client
            .get(self.file_url(file_id))
            .query(&[("alt", "media")]);
        Ok(self.send(request).await?.bytes().await?.to_vec())
    }

    async fn update_file(&self, file_id: &str, content: &[u8]) -> ClientResult<DriveFile> {
        let request = self.upload_request(file_id).body(content.to_vec());
        self.send_for_file(request).await
    }

    async fn is_authorized(&self) -> bool {
        matches!(self.settings.drive_access_token().await, Ok(Some(_)))
    }

    async fn authorize(&self) -> ClientResult<bool> {
        match self.get_user_info().await {
            Ok(user) => Ok(user.is_some()),
            Err(ClientError::NotAuthorized) => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.settings.set_drive_access_token(None).await?;
        Ok(())
    }

    async fn get_user_info(&self) -> ClientResult<Option<UserInfo>> {
        if self.settings.drive_access_token().await?.is_none() {
            return Ok(None);
        }
        let request = self
            .client
            .get(format!("{}/about", self.api_url))
            .query(&[("fields", USER_FIELDS)]);
        let body = self.send(request).await?.text().await?;
        parse_about(&body).map(Some)
    }
}

fn status_error(status: StatusCode, body: &str) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::NotAuthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound(compact_text(body)),
        _ => ClientError::Api(format!(
            "Drive request failed with HTTP {}: {}",
            status.as_u16(),
            compact_text(body)
        )),
    }
}

/// Search expression for the live children of a folder
fn children_query(parent_id: Option<&str>) -> String {
    let parent = parent_id
        .unwrap_or(ROOT_FOLDER)
        .replace('\\', "\\\\")
        .replace('\'', "\\'");
    format!("'{parent}' in parents and trashed = false")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    id: String,
    name: String,
    mime_type: String,
}

impl ApiFile {
    fn into_drive_file(self) -> DriveFile {
        DriveFile {
            is_folder: self.mime_type == FOLDER_MIME_TYPE,
            id: self.id,
            name: self.name,
            mime_type: self.mime_type,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct About {
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUser {
    display_name: String,
    #[serde(default)]
    email_address: String,
    #[serde(default)]
    photo_link: Option<String>,
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|error| {
        ClientError::InvalidPayload(format!("{error}: {}", compact_text(body)))
    })
}

fn parse_file(body: &str) -> ClientResult<DriveFile> {
    decode::<ApiFile>(body).map(ApiFile::into_drive_file)
}

fn parse_file_list(body: &str) -> ClientResult<FileList> {
    decode(body)
}

fn parse_about(body: &str) -> ClientResult<UserInfo> {
    let about: About = decode(body)?;
    Ok(UserInfo {
        name: about.user.display_name,
        email: about.user.email_address,
        photo_url: about.user.photo_link,
    })
}
