use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::queue::QueueSender;
use super::StageContext;
use crate::config::TraversalMode;

/// Emits the directories to search, then closes the directory queue.
///
/// The root is always emitted first. With `AllSubdirectories` every
/// descendant follows in depth-first pre-order, siblings in listing order.
/// A directory that cannot be listed is reported and its subtree skipped.
pub fn discover(
    root: &Path,
    traversal: TraversalMode,
    ctx: &StageContext<'_>,
    directories: QueueSender<PathBuf>,
) {
    debug!("Discovering directories under {}", root.display());

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        trace!("Discovered directory: {}", dir.display());
        if directories.send(dir.clone()).is_err() {
            debug!("Directory queue has no readers, stopping discovery");
            break;
        }
        ctx.metrics.record_directory();

        if traversal == TraversalMode::ThisDirectoryOnly {
            continue;
        }
        let children = match ctx.fs.list_subdirectories(&dir) {
            Ok(children) => children,
            Err(e) => {
                ctx.report_error(e);
                continue;
            }
        };

        // Reversed so the first listed child is popped next
        pending.extend(
            children
                .into_iter()
                .rev()
                .filter(|child| !ctx.filter.is_ignored(child)),
        );
    }

    directories.close();
    debug!("Directory discovery finished");
}
