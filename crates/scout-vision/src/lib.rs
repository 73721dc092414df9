mod elixir_meter;
mod region;

pub use elixir_meter::{
    read_elixir, read_elixir_bar, read_elixir_in, segment_bounds, ElixirReading,
    MeterCalibration, SEGMENT_COUNT,
};
pub use region::{crop_region, regions, ScreenRegion};
