pub mod card;
pub mod policy;
pub mod svg;
