use crate::FsError;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use log::debug;
use uefi::proto::media::file::{Directory, File, FileAttribute, FileMode, RegularFile};
use uefi::{CString16, boot};

/// A directory on the volume the running image was loaded from.
pub struct ToolDir {
    dir: Directory,
    /// Volume-relative path without leading or trailing separators.
    path: String,
}

impl ToolDir {
    /// Opens `path`, relative to the root of the image's volume. `.` and
    /// the empty string name the root itself; `/` is accepted as separator.
    ///
    /// # Errors
    /// Returns a [`FsError`] if the volume or the directory cannot be opened.
    pub fn open(path: &str, create: bool) -> Result<Self, FsError> {
        let mut sfs = boot::get_image_file_system(boot::image_handle())
            .map_err(|e| FsError::NoFileSystem(e.status()))?;
        let mut volume = sfs
            .open_volume()
            .map_err(|e| FsError::io("Opening volume for", path, &e))?;

        let relative = volume_path(path);
        if relative.is_empty() {
            return Ok(Self {
                dir: volume,
                path: relative,
            });
        }

        let name =
            CString16::try_from(relative.as_str()).map_err(|_| FsError::InvalidPath(path.into()))?;
        let (mode, attributes) = if create {
            (FileMode::CreateReadWrite, FileAttribute::DIRECTORY)
        } else {
            (FileMode::Read, FileAttribute::empty())
        };
        let display = format!("\\{relative}");
        let handle = volume
            .open(&name, mode, attributes)
            .map_err(|e| FsError::io("Opening", &display, &e))?;
        let dir = handle
            .into_directory()
            .ok_or(FsError::NotADirectory(display))?;

        Ok(Self {
            dir,
            path: relative,
        })
    }

    /// The directory as the shell would print it.
    #[must_use]
    pub fn display(&self) -> String {
        format!("\\{}", self.path)
    }

    fn child(&self, name: &str) -> String {
        if self.path.is_empty() {
            format!("\\{name}")
        } else {
            format!("\\{}\\{name}", self.path)
        }
    }

    /// Writes `bytes` to `name`, replacing any existing file.
    ///
    /// # Errors
    /// Returns a [`FsError`] naming the step that failed.
    pub fn save(&mut self, name: &str, bytes: &[u8]) -> Result<(), FsError> {
        let path = self.child(name);
        let name = CString16::try_from(name).map_err(|_| FsError::InvalidPath(path.clone()))?;

        // Opening with create would keep the old tail of a longer file.
        if let Ok(existing) = self
            .dir
            .open(&name, FileMode::ReadWrite, FileAttribute::empty())
        {
            debug!("Overwriting existing '{path}'");
            existing
                .delete()
                .map_err(|e| FsError::io("Deleting existing", &path, &e))?;
        }

        let handle = self
            .dir
            .open(&name, FileMode::CreateReadWrite, FileAttribute::empty())
            .map_err(|e| FsError::io("Opening", &path, &e))?;
        let mut file = handle
            .into_regular_file()
            .ok_or_else(|| FsError::NotAFile(path.clone()))?;
        file.write(bytes)
            .map_err(|e| FsError::io("Writing", &path, &e))?;
        file.flush().map_err(|e| FsError::io("Flushing", &path, &e))?;
        Ok(())
    }

    /// Names of the regular files in the directory, in directory order.
    ///
    /// # Errors
    /// Returns a [`FsError`] if a directory entry cannot be read.
    pub fn files(&mut self) -> Result<Vec<String>, FsError> {
        let display = self.display();
        self.dir
            .reset_entry_readout()
            .map_err(|e| FsError::io("Rewinding", &display, &e))?;

        let mut names = Vec::new();
        while let Some(info) = self
            .dir
            .read_entry_boxed()
            .map_err(|e| FsError::io("Reading direntry of", &display, &e))?
        {
            if !info.is_directory() {
                names.push(info.file_name().to_string());
            }
        }
        Ok(names)
    }

    /// Reads the whole of `name`.
    ///
    /// # Errors
    /// Returns a [`FsError`] naming the step that failed.
    pub fn load(&mut self, name: &str) -> Result<Vec<u8>, FsError> {
        let path = self.child(name);
        let name = CString16::try_from(name).map_err(|_| FsError::InvalidPath(path.clone()))?;

        let handle = self
            .dir
            .open(&name, FileMode::Read, FileAttribute::empty())
            .map_err(|e| FsError::io("Opening", &path, &e))?;
        let mut file = handle
            .into_regular_file()
            .ok_or_else(|| FsError::NotAFile(path.clone()))?;

        file.set_position(RegularFile::END_OF_FILE)
            .map_err(|e| FsError::io("Seeking in", &path, &e))?;
        let size = file
            .get_position()
            .map_err(|e| FsError::io("Sizing", &path, &e))?;
        file.set_position(0)
            .map_err(|e| FsError::io("Seeking in", &path, &e))?;
        let size = usize::try_from(size).map_err(|_| FsError::InvalidPath(path.clone()))?;

        let mut buf = vec![0u8; size];
        let read = file
            .read(&mut buf)
            .map_err(|e| FsError::io("Reading", &path, &e))?;
        if read != size {
            return Err(FsError::ShortRead { path, read, size });
        }
        Ok(buf)
    }
}

impl FsError {
    pub(crate) fn io<D: Debug>(action: &'static str, path: &str, error: &uefi::Error<D>) -> Self {
        Self::Io {
            action,
            path: path.into(),
            status: error.status(),
        }
    }
}

/// Normalises a shell path to the form `Directory::open` expects.
fn volume_path(path: &str) -> String {
    let path = path.replace('/', "\\");
    let mut parts = path.split('\\').filter(|p| !p.is_empty() && *p != ".");
    let mut out = String::new();
    if let Some(first) = parts.next() {
        out.push_str(first);
        for part in parts {
            out.push('\\');
            out.push_str(part);
        }
    }
    out
}
