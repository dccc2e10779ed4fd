use std::path::PathBuf;

/// Folder used when none is supplied.
pub const DEFAULT_FOLDER: &str = "cookies";

/// Cookie files can hold session credentials, so only the owner may read them.
const DEFAULT_FILE_MODE: u32 = 0o600;
const DEFAULT_DIR_MODE: u32 = 0o755;
const LEGACY_FILE_MODE: u32 = 0o655;

/// Construction-time configuration for a
/// [`PersistentCookieJar`](crate::cookies::PersistentCookieJar).
///
/// The modes are only applied on Unix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarConfig {
    /// Folder holding one `<host-key>.json` file per host or registrable domain
    pub folder: PathBuf,
    /// Permission bits for newly written cookie files
    pub file_mode: u32,
    /// Permission bits for the folder when it has to be created
    pub dir_mode: u32,
}

impl JarConfig {
    /// Default configuration stored in `folder`.
    pub fn with_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Writes files with the permissive `0655` mode used by earlier deployments.
    pub fn legacy_permissions(mut self) -> Self {
        self.file_mode = LEGACY_FILE_MODE;
        self
    }
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from(DEFAULT_FOLDER),
            file_mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }
}
