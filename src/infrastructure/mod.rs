pub mod github;
pub mod parsers;
pub mod shopify;
