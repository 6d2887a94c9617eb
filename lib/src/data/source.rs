use std::{fs, io};
use std::path::Path;
use std::fmt::Debug;

use either::Either;

use crate::error::{Result, Chainable};
use crate::fstree::Entry;

/// Something that can be read once: a file, a tree entry, or an in-memory
/// string. Contents that aren't valid UTF-8 come back as raw bytes.
pub trait Source: Debug {
    fn read(self) -> Result<Either<String, Vec<u8>>>;

    fn path(&self) -> Option<&Path> {
        None
    }

    /// Reads the source and requires it to be UTF-8 text.
    fn read_text(self) -> Result<String> where Self: Sized {
        let path = self.path().map(|p| p.display().to_string());
        match self.read()? {
            Either::Left(text) => Ok(text),
            Either::Right(bytes) => {
                let utf8_error = std::str::from_utf8(&bytes).err();
                Err(error! {
                    "input is not valid UTF-8",
                    "file path" => path.as_deref().unwrap_or("<memory>"),
                    "problem" => utf8_error.map(|e| e.to_string()).unwrap_or_default(),
                })
            }
        }
    }
}

impl Source for String {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        Ok(Either::Left(self))
    }
}

impl Source for &str {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        Ok(Either::Left(self.to_owned()))
    }
}

impl Source for &Path {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        let mut file = fs::File::open(self).chain(error! {
            "failed to open file for reading",
            "file path" => self.display()
        })?;

        let mut data = Vec::new();
        io::Read::read_to_end(&mut file, &mut data).chain_with(|| error! {
            "failed to read file",
            "file path" => self.display()
        })?;

        Ok(String::from_utf8(data).map_or_else(|e| Either::Right(e.into_bytes()), Either::Left))
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl Source for &Entry {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        (&*self.path).read()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
