pub mod forecast;
pub mod openweather;
pub mod pipeline;
