//! Input list loading
//!
//! Cities and job titles come from delimited files without a header row.
//! Every field of every row is one token.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file {path:?} does not exist")]
    NotFound { path: PathBuf },

    #[error("Could not read input file {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Read all tokens from `path`, trimmed, empty ones dropped, file order kept.
///
/// Ragged rows are fine. A row that is not valid UTF-8 makes the whole file unreadable.
pub async fn load_tokens(path: impl AsRef<Path>) -> Result<Vec<String>, InputError> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InputError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(InputError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let tokens = parse_tokens(&bytes).map_err(|e| InputError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if tokens.is_empty() {
        warn!("Input file {:?} contains no tokens", path);
    } else {
        info!("Loaded {} tokens from {:?}", tokens.len(), path);
    }
    Ok(tokens)
}

fn parse_tokens(bytes: &[u8]) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut tokens = Vec::new();
    for row in reader.records() {
        let row = row?;
        tokens.extend(
            row.iter()
                .filter(|field| !field.is_empty())
                .map(ToString::to_string),
        );
    }
    Ok(tokens)
}
