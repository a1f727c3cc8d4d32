//! Directory-entry shuffling through a disorderfs overlay on tree B.
use super::{Entered, Release, Variation};
use crate::context::BuildContext;
use crate::error::VariationError;
use crate::tool::ToolRunner;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub const MOUNT_TOOL: &str = "disorderfs";
pub const UNMOUNT_TOOL: &str = "fusermount";
const MOUNT_DIR_NAME: &str = "disorderfs";

/// Mounts B's tree through disorderfs and points B at the mount.
///
/// The mount point is created next to B's tree, so B's tree must have a
/// parent directory owned by the current run.
pub struct FileOrdering {
    runner: Arc<dyn ToolRunner>,
}

impl FileOrdering {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }
}

impl Variation for FileOrdering {
    fn name(&self) -> &'static str {
        "fileordering"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        let source = context.b.tree.clone();
        let mount_point = source
            .parent()
            .map(|parent| parent.join(MOUNT_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(MOUNT_DIR_NAME));
        fs::create_dir(&mount_point).map_err(|source| VariationError::Io {
            variation: "fileordering",
            path: mount_point.clone(),
            source,
        })?;

        let args = [
            OsString::from("--shuffle-dirents=yes"),
            source.clone().into_os_string(),
            mount_point.clone().into_os_string(),
        ];
        self.runner
            .run(MOUNT_TOOL, &args)
            .map_err(|source| VariationError::Tool {
                variation: "fileordering",
                source,
            })?;
        tracing::info!(
            source = %source.display(),
            mount_point = %mount_point.display(),
            "mounted disorderfs"
        );

        context.b.tree = mount_point.clone();
        Ok(Entered::with_release(
            context,
            Box::new(Unmount {
                runner: Arc::clone(&self.runner),
                mount_point,
            }),
        ))
    }
}

struct Unmount {
    runner: Arc<dyn ToolRunner>,
    mount_point: PathBuf,
}

impl Release for Unmount {
    fn release(self: Box<Self>) -> Result<(), VariationError> {
        let args = [OsString::from("-u"), self.mount_point.clone().into_os_string()];
        self.runner
            .run(UNMOUNT_TOOL, &args)
            .map_err(|source| VariationError::Tool {
                variation: "fileordering",
                source,
            })?;
        tracing::info!(mount_point = %self.mount_point.display(), "unmounted disorderfs");
        Ok(())
    }
}
