use std::fs;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use crate::error::{Result, Chainable};

/// A destination for a single produced value of type `T`.
pub trait Sink<T> {
    fn write(&self, value: T) -> Result<()>;
}

/// Writes the bytes to the file, creating parent directories as needed.
impl<T: AsRef<[u8]>> Sink<T> for Path {
    fn write(&self, value: T) -> Result<()> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent).chain_with(|| error! {
                "failed to create output directory",
                "directory" => parent.display(),
            })?;
        }

        fs::write(self, value).chain_with(|| error! {
            "failed to open/create file for writing",
            "file path" => self.display()
        })
    }
}

impl<T: AsRef<[u8]>> Sink<T> for PathBuf {
    fn write(&self, value: T) -> Result<()> {
        self.as_path().write(value)
    }
}

/// Stores the value in the cell. A cell accepts exactly one write.
impl<T> Sink<T> for OnceCell<T> {
    fn write(&self, value: T) -> Result<()> {
        self.set(value).map_err(|_| error!("value was already written to this sink"))
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for &S {
    fn write(&self, value: T) -> Result<()> {
        S::write(self, value)
    }
}

#[cfg(test)]
mod tests {
    use once_cell::unsync::OnceCell;

    use super::Sink;

    #[test]
    fn once_cell_accepts_one_write() {
        let cell = OnceCell::new();
        (&cell).write("first".to_string()).unwrap();
        assert!(cell.write("second".to_string()).is_err());
        assert_eq!(cell.get().map(|s| s.as_str()), Some("first"));
    }
}
