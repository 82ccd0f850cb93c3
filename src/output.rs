use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app::ImportReport;
use crate::domain::Oid;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_import(report: &ImportReport) -> io::Result<()> {
        let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    /// One `<path>: <oid>` line per audio file; files without an OID get an
    /// empty value.
    pub fn print_oids<'a, I>(oids: I) -> io::Result<()>
    where
        I: IntoIterator<Item = (&'a PathBuf, &'a Option<Oid>)>,
    {
        let mut stdout = io::stdout().lock();
        for (path, oid) in oids {
            writeln!(stdout, "{}", oid_line(path, oid.as_ref()))?;
        }
        Ok(())
    }
}

pub fn oid_line(path: &Path, oid: Option<&Oid>) -> String {
    format!(
        "{}: {}",
        path.display(),
        oid.map(Oid::as_str).unwrap_or_default()
    )
}
