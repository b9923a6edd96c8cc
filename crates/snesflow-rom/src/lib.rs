//! ROM images and bank address mapping for 65816 console cartridges.

mod address;
mod image;
mod mapping;

pub use address::*;
pub use image::*;
pub use mapping::*;

use std::path::PathBuf;

use thiserror::Error;

/// ROM loading errors.
#[derive(Error, Debug)]
pub enum RomError {
    #[error("failed to read ROM {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ROM image is empty")]
    Empty,
    #[error("Unknown mapping: {0}")]
    UnknownMapping(String),
}

pub type Result<T> = std::result::Result<T, RomError>;
