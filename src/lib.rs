use std::fmt;

pub mod docs;
pub mod driver;
pub mod dyna;

/// Write each item of `ts` with `sep` between them.
pub fn write_separated<T, W>(f: &mut W, sep: &str, ts: impl IntoIterator<Item = T>) -> fmt::Result
    where T: fmt::Display,
          W: fmt::Write,
{
    let mut first = true;
    for t in ts {
        if first {
            write!(f, "{t}")?
        } else {
            write!(f, "{sep}{t}")?
        }
        first = false;
    }
    Ok(())
}
