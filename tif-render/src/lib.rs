use std::{io, io::Write};
use thiserror::Error;
use tif_core::{AccountView, Entry, Ledger};


/// Which side of every account to write out.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Book {
    Credits,
    Debits,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct BasicRenderer {}

impl BasicRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Writes one book of `ledger` in the persisted line format, every account included.
pub fn render<W: Write>(w: &mut W, ledger: &Ledger, book: Book) -> Result<(), BasicRendererError> {
    BasicRenderer::new().render((ledger, book), w)
}

#[derive(Error, Debug)]
pub enum BasicRendererError {
    #[error("an io error occurred")]
    Io(#[from] io::Error),
}

pub trait Renderer<T, W: Write> {
    type Error;
    fn render(&self, renderable: T, write: &mut W) -> Result<(), Self::Error>;
}

impl<'a, W: Write> Renderer<(&'a Ledger, Book), W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, (ledger, book): (&'a Ledger, Book), write: &mut W) -> Result<(), Self::Error> {
        for account in ledger.serialize() {
            self.render((&account, book), write)?;
            writeln!(write)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<(&'a AccountView<'_>, Book), W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(
        &self,
        (account, book): (&'a AccountView<'_>, Book),
        write: &mut W,
    ) -> Result<(), Self::Error> {
        write!(write, "{}", account.id)?;
        match book {
            Book::Credits => {
                for entry in account.credits {
                    write!(write, " ")?;
                    self.render(entry, write)?;
                }
            }
            Book::Debits => {
                for entry in account.debits {
                    write!(write, " ")?;
                    self.render(entry, write)?;
                }
            }
        }
        writeln!(write)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Entry, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, entry: &'a Entry, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{}={}{}", entry.date, entry.amount.get(), entry.flags)?;
        Ok(())
    }
}
