/// Archive formats the scanner can descend into. Jars are ordinary zips and
/// classify as [`ArchiveKind::Zip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    Gzip,
}

/// Classify a byte source by its leading bytes. `None` means the entry is a
/// leaf file and recursion stops there.
pub fn detect(header: &[u8]) -> Option<ArchiveKind> {
    if let Some(kind) = infer::get(header) {
        match kind.mime_type() {
            "application/zip" => return Some(ArchiveKind::Zip),
            "application/x-tar" => return Some(ArchiveKind::Tar),
            "application/gzip" => return Some(ArchiveKind::Gzip),
            _ => {}
        }
    }
    // Zip-derived formats (jar, OOXML, apk) get their own infer type but are
    // still plain zips on the wire.
    if header.starts_with(b"PK\x03\x04") {
        return Some(ArchiveKind::Zip);
    }
    None
}
