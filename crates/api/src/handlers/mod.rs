pub mod parts;
pub mod products;
