use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gdrive_core::{AuthError, Credentials};
use thiserror::Error;
use tracing::{info, warn};

use crate::actions;

const FILENAME_INPUT: &str = "filename";
const NAME_INPUT: &str = "name";
const FOLDER_ID_INPUT: &str = "folderId";
const CREDENTIALS_INPUT: &str = "credentials";
const MIME_TYPE_INPUT: &str = "mimeType";
const OVERWRITE_INPUT: &str = "overwrite";
const COMPLETE_NAME_INPUT: &str = "useCompleteSourceFilenameAsName";
const MIRROR_INPUT: &str = "mirrorDirectoryStructure";
const NAME_PREFIX_INPUT: &str = "namePrefix";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing input '{0}'")]
    MissingInput(&'static str),
    #[error("base64 decoding of 'credentials' failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid credentials: {0}")]
    InvalidCredentials(#[from] AuthError),
}

/// Per-file upload behaviour shared by every matched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder_id: String,
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    pub mime_type: Option<String>,
    pub overwrite: bool,
    pub use_complete_source_name: bool,
    pub mirror_directory_structure: bool,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub pattern: String,
    pub credentials: Credentials,
    pub options: UploadOptions,
}

impl UploadConfig {
    /// Reads `INPUT_*` variables and registers credential material as masked
    /// with the runner.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(
            |name| std::env::var(input_env_name(name)).ok(),
            actions::add_mask,
        )
    }

    /// `lookup` receives input names such as `folderId`. Every secret is passed
    /// to `mask` before it is used.
    pub fn from_lookup<L, M>(lookup: L, mut mask: M) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
        M: FnMut(&str),
    {
        let input = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| input(name).ok_or(ConfigError::MissingInput(name));

        let pattern = required(FILENAME_INPUT)?;
        let folder_id = required(FOLDER_ID_INPUT)?;

        let encoded = required(CREDENTIALS_INPUT)?;
        mask(&encoded);
        let decoded = STANDARD.decode(&encoded)?;
        let json = String::from_utf8_lossy(&decoded);
        let json = json.trim_end_matches(['\r', '\n']);
        mask(json);
        let credentials = Credentials::from_json(json)?;
        for secret in credentials.secret_values() {
            mask_lines(secret, &mut mask);
        }

        let options = UploadOptions {
            folder_id,
            name: input(NAME_INPUT),
            name_prefix: input(NAME_PREFIX_INPUT),
            mime_type: input(MIME_TYPE_INPUT),
            overwrite: bool_input(OVERWRITE_INPUT, input(OVERWRITE_INPUT)),
            use_complete_source_name: bool_input(COMPLETE_NAME_INPUT, input(COMPLETE_NAME_INPUT)),
            mirror_directory_structure: bool_input(MIRROR_INPUT, input(MIRROR_INPUT)),
        };

        Ok(Self {
            pattern,
            credentials,
            options,
        })
    }
}

/// `folderId` becomes `INPUT_FOLDERID`.
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_ascii_uppercase())
}

/// Accepts the same spellings as Go's `strconv.ParseBool`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn bool_input(name: &str, value: Option<String>) -> bool {
    let Some(value) = value else {
        info!(input = name, "input is not set, flag disabled");
        return false;
    };
    parse_bool(&value).unwrap_or_else(|| {
        warn!(input = name, %value, "invalid boolean input, treating as false");
        false
    })
}

// The runner masks line by line, so multi-line keys are registered per line.
fn mask_lines(secret: &str, mask: &mut impl FnMut(&str)) {
    for line in secret.lines().map(str::trim).filter(|line| !line.is_empty()) {
        mask(line);
    }
}
