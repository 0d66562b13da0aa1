pub mod games;
pub mod pool;
