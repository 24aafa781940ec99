pub mod coordinates;
pub mod error;
pub mod io;
pub mod merge;
pub mod weather_table;
