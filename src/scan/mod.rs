//! Turning a captured item card into a record.

pub mod assemble;
pub mod card;
pub mod field;
pub mod material;

pub use assemble::{scan_card, ItemRecord};
pub use card::{CardCapture, ItemKind, Rarity};
pub use field::{parse_level, FieldResult, Level, ScanContext};
pub use material::{is_enhancement_ore, scan_material_name, MaterialKind};
