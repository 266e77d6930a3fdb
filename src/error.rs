use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tif_parser::error::ParseError;
use tif_render::BasicRendererError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Ledger(#[from] tif_core::Error),
    #[error("could not write the ledger")]
    Render(#[from] BasicRendererError),
}

pub type Result<T> = std::result::Result<T, Error>;
