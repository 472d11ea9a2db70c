pub mod acquire;
pub mod assemble;
pub mod check;
pub mod sources;
