//! Reading the files named on the command line.

use std::path::{Path, PathBuf};

use assetflow_core::selection::{CandidateFile, RejectedFile, Rejection};

/// Read every path in order. Paths that cannot be read become rejections
/// instead of aborting the batch.
pub async fn read_candidates(paths: &[PathBuf]) -> (Vec<CandidateFile>, Vec<RejectedFile>) {
    let mut candidates = Vec::with_capacity(paths.len());
    let mut rejected = Vec::new();

    for path in paths {
        let name = display_name(path);
        match tokio::fs::read(path).await {
            Ok(bytes) => candidates.push(CandidateFile::new(name, bytes)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read file");
                rejected.push(RejectedFile {
                    name,
                    reason: Rejection::Unreadable(e.to_string()),
                });
            }
        }
    }

    (candidates, rejected)
}

/// File name without its directory, falling back to the full path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
