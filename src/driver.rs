//! Reads source files, runs them through the generators, and writes the
//! results back next to them.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::dyna::ast::Package;
use crate::dyna::layout::Layout;
use crate::dyna::table::{self, CountEncoding};
use crate::dyna::{loader, scanner, DynaError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// prefix of native entry names, the package name when unset
    pub prefix: Option<String>,
    pub count_encoding: CountEncoding,
    /// give native properties a loader arm of their own
    pub dispatch_properties: bool,
}

impl Options {
    pub fn prefix_for<'a>(&'a self, package: &'a Package) -> &'a str {
        self.prefix.as_deref().unwrap_or(&package.name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dyna(#[from] DynaError),
}

/// A failure tied to the file that caused it.
#[derive(Debug, thiserror::Error)]
#[error("{}: {kind}", .path.display())]
pub struct FileError {
    pub path: PathBuf,
    pub kind: ErrorKind,
}

impl FileError {
    fn new(path: &Path, kind: impl Into<ErrorKind>) -> Self {
        FileError { path: path.to_path_buf(), kind: kind.into() }
    }
}

/// Everything generated from one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
    pub package: String,
    pub table: String,
    pub loader: String,
    pub offsets: Option<String>,
    pub id_macros: Option<String>,
    pub register: Option<String>,
}

impl Artifacts {
    pub fn side_file_name(&self) -> String {
        format!("dyna_{}.h", self.package)
    }

    /// The full text of `dyna_<package>.h`.
    pub fn side_file(&self) -> String {
        let guard = format!("DYNA_{}_H", self.package.to_uppercase());
        let mut out = format!("#ifndef {guard}\n#define {guard}\n/* Generated by dynaload. Do not edit. */\n\n");
        for part in [&self.offsets, &self.id_macros].into_iter().flatten() {
            out.push_str(part);
            out.push('\n');
        }
        out.push_str(&self.table);
        out.push('\n');
        out.push_str(&self.loader);
        if let Some(register) = &self.register {
            out.push('\n');
            out.push_str(register);
        }
        out.push_str("\n#endif\n");
        out
    }
}

fn write_register<W: fmt::Write>(w: &mut W, package: &Package, prefix: &str, has_loader: bool) -> fmt::Result {
    writeln!(w, "void {prefix}_register(lily_state *s)")?;
    writeln!(w, "{{")?;
    write!(w, "    lily_register_package(s, \"{}\", {prefix}_dynaload_table, ", package.name)?;
    if has_loader {
        writeln!(w, "{prefix}_loader);")?;
    } else {
        writeln!(w, "NULL);")?;
    }
    writeln!(w, "}}")
}

fn render(emit: impl FnOnce(&mut String) -> fmt::Result) -> Result<String, fmt::Error> {
    let mut out = String::new();
    emit(&mut out)?;
    Ok(out)
}

/// Render every artifact for an already scanned package.
pub fn artifacts(package: &Package, options: &Options) -> Result<Artifacts, DynaError> {
    let prefix = options.prefix_for(package);
    let layout = Layout::of(package);
    let records = table::records(&layout, options.count_encoding)?;
    let arms = loader::arms(&layout, prefix, options.dispatch_properties);
    debug!("'{}': {} table records, {} loader arms", package.name, records.len(), arms.len());

    let offsets = if table::wants_offsets(package) {
        Some(render(|w| table::write_offsets(w, &layout))?)
    } else {
        None
    };
    let id_macros = if table::wants_id_macros(package) {
        Some(render(|w| table::write_id_macros(w, package))?)
    } else {
        None
    };
    let register = if package.is_embedded {
        Some(render(|w| write_register(w, package, prefix, !arms.is_empty()))?)
    } else {
        None
    };

    Ok(Artifacts {
        package: package.name.clone(),
        table: render(|w| table::write_table(w, prefix, &records))?,
        loader: render(|w| loader::write_loader(w, prefix, &arms))?,
        offsets,
        id_macros,
        register,
    })
}

pub fn scan_file(path: &Path) -> Result<Package, FileError> {
    let source = fs::read_to_string(path).map_err(|e| FileError::new(path, e))?;
    scanner::scan(&source).map_err(|e| FileError::new(path, e))
}

/// Scan `path` and render its artifacts. Nothing is returned unless every
/// step succeeds.
pub fn generate(path: &Path, options: &Options) -> Result<Artifacts, FileError> {
    let package = scan_file(path)?;
    artifacts(&package, options).map_err(|e| FileError::new(path, e))
}

/// Write the side file next to `path`, then include it from `path` unless the
/// source already does.
pub fn write_outputs(path: &Path, artifacts: &Artifacts) -> Result<PathBuf, FileError> {
    let name = artifacts.side_file_name();
    let side = path.with_file_name(&name);
    fs::write(&side, artifacts.side_file()).map_err(|e| FileError::new(&side, e))?;
    info!("wrote {}", side.display());

    let mut source = fs::read_to_string(path).map_err(|e| FileError::new(path, e))?;
    if scanner::includes(&source).contains(&name.as_str()) {
        return Ok(side);
    }
    if !source.is_empty() && !source.ends_with('\n') {
        source.push('\n');
    }
    source.push_str(&format!("#include \"{name}\"\n"));
    fs::write(path, source).map_err(|e| FileError::new(path, e))?;
    info!("added an include of {name} to {}", path.display());
    Ok(side)
}
