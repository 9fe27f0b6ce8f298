use std::fmt::{self, Display};

use wasmparser::{BinaryReaderError, Parser, Payload};

/// Size and interface of a compiled module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub bytes: usize,
    pub imports: u32,
    pub exports: u32,
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} KiB, {} imports, {} exports",
            self.bytes as f64 / 1024.0,
            self.imports,
            self.exports,
        )
    }
}

/// Validate a module and count what it imports and exports.
pub fn inspect(source: &[u8]) -> Result<Summary, BinaryReaderError> {
    wasmparser::validate(source)?;

    let mut summary = Summary {
        bytes: source.len(),
        imports: 0,
        exports: 0,
    };

    for payload in Parser::new(0).parse_all(source) {
        match payload? {
            Payload::ImportSection(section) => summary.imports += section.count(),
            Payload::ExportSection(section) => summary.exports += section.count(),
            _ => continue,
        }
    }

    Ok(summary)
}
