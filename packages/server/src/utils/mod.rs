pub mod edge;
pub mod hash;
pub mod jwt;
pub mod ownership;
