//! Writer for the sectioned CSV layout shared by both sample sheet versions.

use anyhow::Result;
use csv::{Terminator, WriterBuilder};
use std::io::Write;

/// Sections of `[Name]` followed by comma-separated rows and a blank line.
pub(crate) struct SheetWriter<W: Write> {
    out: W,
}

impl<W: Write> SheetWriter<W> {
    pub(crate) fn new(out: W) -> Self {
        SheetWriter { out }
    }

    pub(crate) fn section(&mut self, name: &str) -> Result<()> {
        self.row([format!("[{name}]")])
    }

    /// One CSV record. Rows may differ in width.
    pub(crate) fn row<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut csv = WriterBuilder::new()
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut self.out);
        csv.write_record(fields)?;
        csv.flush()?;
        Ok(())
    }

    pub(crate) fn end_section(&mut self) -> Result<()> {
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sections_and_quoting() -> Result<()> {
        let mut buf = Vec::new();
        let mut sheet = SheetWriter::new(&mut buf);
        sheet.section("Header")?;
        sheet.row(["RunName", "run, with comma"])?;
        sheet.end_section()?;
        sheet.section("Data")?;
        sheet.row(["a", "b", "c"])?;
        sheet.row(["1"])?;
        sheet.end_section()?;
        sheet.finish()?;
        assert_eq!(
            String::from_utf8(buf)?,
            "[Header]\nRunName,\"run, with comma\"\n\n[Data]\na,b,c\n1\n\n"
        );
        Ok(())
    }
}
