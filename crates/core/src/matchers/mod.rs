mod class_name;
mod globs;
mod hashes;
mod jar_name;

pub use class_name::ClassNameMatcher;
pub use globs::GlobMatcher;
pub use hashes::HashIndex;
pub use jar_name::JarNameMatcher;
