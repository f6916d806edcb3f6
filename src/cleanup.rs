use std::path::Path;

use crate::message_log::MessageLog;
use crate::messages;

/// Delete the original after a successful compression.
///
/// Best effort: a failure only shows a transient warning. Returns whether the
/// file was removed.
pub async fn remove_input(input_path: &Path, filename: &str, log: &MessageLog) -> bool {
    match tokio::fs::remove_file(input_path).await {
        Ok(()) => {
            tracing::debug!(path = %input_path.display(), "removed original");
            true
        }
        Err(err) => {
            tracing::warn!(path = %input_path.display(), error = %err, "could not remove original");
            log.push_transient(messages::unlink_warning(filename));
            false
        }
    }
}
