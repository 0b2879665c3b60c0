pub mod boot;
pub mod entries;

pub use boot::Fat16Bpb;
pub use entries::{DirEntry, LfnEntry};
