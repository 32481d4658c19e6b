/// Advisory side channel (visited and skipped paths)
pub mod advisory;
/// Exclusion rules by name, full path and extension
pub mod exclusion;
/// Recursive directory walker producing catalogs
pub mod walker;

pub use advisory::{Advisory, AdvisoryKind};
pub use exclusion::{ExclusionRules, extension_of};
pub use walker::{ScanResult, ScanStats, walk, walk_roots};
