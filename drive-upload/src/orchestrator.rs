use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::config::UploadOptions;
use crate::engine::{UploadEngine, UploadError, UploadOutcome, UploadTarget};
use crate::resolver::DirectoryResolver;
use crate::store::DriveStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl RunReport {
    fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Created { .. } => self.created += 1,
            UploadOutcome::Updated { .. } => self.updated += 1,
            UploadOutcome::SkippedDirectory => self.skipped += 1,
        }
    }
}

/// Uploads every file in order. The first error aborts the whole run.
pub async fn run(
    store: &dyn DriveStore,
    files: &[PathBuf],
    options: &UploadOptions,
) -> Result<RunReport, UploadError> {
    let resolver = DirectoryResolver::new(store);
    let engine = UploadEngine::new(store);
    let mut report = RunReport::default();

    for file in files {
        let mut folder_id = options.folder_id.clone();
        if options.mirror_directory_structure {
            let segments = mirror_segments(file);
            info!(path = %file.display(), depth = segments.len(), "mirroring directory structure");
            folder_id = resolver.resolve_chain(&folder_id, &segments).await?;
        }

        let target = UploadTarget {
            name: derive_target_name(file, files.len(), options)?,
            folder_id,
            mime_type: options.mime_type.clone(),
            overwrite: options.overwrite,
        };
        let outcome = engine.upload_file(file, &target).await?;
        report.record(&outcome);
    }

    Ok(report)
}

/// Picks the remote name for `file`. The full path flag wins, then an explicit
/// name when exactly one file matched, else the base name. The prefix is added
/// last.
pub fn derive_target_name(
    file: &Path,
    matched: usize,
    options: &UploadOptions,
) -> Result<String, UploadError> {
    let derived = if options.use_complete_source_name {
        file.to_string_lossy().into_owned()
    } else {
        match options.name.as_deref() {
            Some(name) if matched <= 1 => name.to_string(),
            _ => file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    };
    if derived.is_empty() {
        return Err(UploadError::EmptyTargetName(file.to_path_buf()));
    }

    Ok(match options.name_prefix.as_deref() {
        Some(prefix) => format!("{prefix}{derived}"),
        None => derived,
    })
}

/// Directory names between the pattern root and the file. Root, `.` and `..`
/// components are not mirrored.
pub fn mirror_segments(file: &Path) -> Vec<String> {
    let Some(parent) = file.parent() else {
        return Vec::new();
    };
    parent
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
