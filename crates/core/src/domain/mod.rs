pub mod interaction;
pub mod product;
