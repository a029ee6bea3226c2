pub mod aggregator_core;
pub mod config;
pub mod sqlite_pragma;

#[cfg(test)]
mod tests;
