mod client;
mod oauth;
mod query;

pub use client::{DriveClient, DriveError, DriveFile, FOLDER_MIME_TYPE, FileList, FileMetadata};
pub use oauth::{
    AuthError, AuthorizedUser, Credentials, DRIVE_SCOPE, OAuthToken, ServiceAccountKey, TokenClient,
};
pub use query::{QueryKind, escape_literal, name_query};
