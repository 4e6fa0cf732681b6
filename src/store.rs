use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::{Builder, NamedTempFile};

use crate::error::KiraError;

#[derive(Debug, Clone)]
pub struct RawStore {
    root: Utf8PathBuf,
}

impl RawStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), KiraError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }

    pub fn path_for(&self, file_name: &str) -> Result<Utf8PathBuf, KiraError> {
        let is_plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);
        if !is_plain {
            return Err(KiraError::Filesystem(format!(
                "refusing to store file with name {file_name:?}"
            )));
        }
        Ok(self.root.join(file_name))
    }

    pub fn save(&self, file_name: &str, content: &[u8]) -> Result<Utf8PathBuf, KiraError> {
        let path = self.path_for(file_name)?;
        write_bytes_atomic(&path, content)?;
        Ok(path)
    }
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), KiraError> {
    write_atomic(path, |file| {
        file.write_all(content)
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    })
}

pub fn write_atomic<F>(path: &Utf8Path, write: F) -> Result<(), KiraError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), KiraError>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix("kira-cm-file")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    write(&mut temp)?;
    temp.flush()
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    Ok(())
}
