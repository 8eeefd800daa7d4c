use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};

/// Hands a finished file to whoever asked for it.
pub trait Delivery: Send + Sync {
    /// Deliver `bytes` and return the name the file was stored under, which
    /// differs from `suggested_name` when that name is already taken.
    fn deliver(&self, bytes: &[u8], suggested_name: &str) -> Result<String>;
}

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// `n`th alternative for a taken name: "x.pdf" becomes "x (n).pdf".
fn numbered_name(name: &str, n: usize) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &name[..dot], n, &name[dot..]),
        _ => format!("{} ({})", name, n),
    }
}

/// Writes delivered files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryDelivery { dir: dir.into() }
    }
}

impl Delivery for DirectoryDelivery {
    fn deliver(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        fs::create_dir_all(&self.dir)?;
        // Only the final component; a suggested name never escapes the directory.
        let name = Path::new(suggested_name)
            .file_name()
            .unwrap_or_else(|| OsStr::new("output"))
            .to_string_lossy()
            .into_owned();

        // Existing files, sources included, are never overwritten.
        for n in 0..MAX_NAME_ATTEMPTS {
            let candidate = numbered_name(&name, n);
            let path = self.dir.join(&candidate);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            file.write_all(bytes)?;
            info!("wrote {} ({} bytes)", path.display(), bytes.len());
            return Ok(candidate);
        }

        Err(Error::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for {} in {}", name, self.dir.display()),
        )))
    }
}

/// Name for an assembled PDF: the source name with its extension replaced by `.pdf`.
pub fn output_file_name(source_name: &str) -> String {
    match source_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}.pdf", &source_name[..dot]),
        _ => format!("{}.pdf", source_name),
    }
}

#[cfg(test)]
pub(crate) mod capture {
    use std::sync::Mutex;

    use super::{numbered_name, Delivery};
    use crate::error::Result;

    /// Keeps delivered files in memory.
    #[derive(Default)]
    pub struct MemoryDelivery {
        pub delivered: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl MemoryDelivery {
        pub fn names(&self) -> Vec<String> {
            let mut names: Vec<_> = self
                .delivered
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect();
            names.sort();
            names
        }

        pub fn get(&self, name: &str) -> Option<Vec<u8>> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, bytes)| bytes.clone())
        }
    }

    impl Delivery for MemoryDelivery {
        fn deliver(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
            let mut delivered = self.delivered.lock().unwrap();
            let name = (0..)
                .map(|n| numbered_name(suggested_name, n))
                .find(|candidate| delivered.iter().all(|(taken, _)| taken != candidate))
                .unwrap();
            delivered.push((name.clone(), bytes.to_vec()));
            Ok(name)
        }
    }
}
