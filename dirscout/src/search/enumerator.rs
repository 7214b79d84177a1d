use std::path::PathBuf;
use tracing::{debug, trace};

use super::queue::{QueueReceiver, QueueSender};
use super::StageContext;

/// Lists the files of every directory read from `directories` into `files`.
///
/// Runs until the directory queue is closed and drained, then closes its own
/// handle on the file queue. Directories that cannot be listed are reported
/// and skipped.
pub fn enumerate(
    ctx: &StageContext<'_>,
    directories: QueueReceiver<PathBuf>,
    files: QueueSender<PathBuf>,
) {
    'dirs: for dir in directories.iter() {
        let listing = match ctx.fs.list_files(&dir) {
            Ok(listing) => listing,
            Err(e) => {
                ctx.report_error(e);
                continue;
            }
        };

        trace!("Enumerating {} files in {}", listing.len(), dir.display());
        for file in listing {
            if ctx.filter.is_ignored(&file) {
                trace!("Ignoring file: {}", file.display());
                continue;
            }
            if files.send(file).is_err() {
                debug!("File queue has no readers, stopping enumeration");
                break 'dirs;
            }
            ctx.metrics.record_file_enumerated();
        }
    }

    files.close();
    debug!("File enumeration finished");
}
