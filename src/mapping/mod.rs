pub mod table;

pub use table::{MappingTable, Workgroup};
