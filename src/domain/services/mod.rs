pub mod aggregate;
pub mod capacity;
pub mod clean;
pub mod columns;
pub mod latest;
pub mod text;
pub mod views;
