pub mod granularity;
pub mod lat_lon;
pub mod observation_columns;
pub mod weather_row;
