mod chart;
mod layout;

pub use chart::{ChartData, Line, Series};
pub use layout::{Layout, Marker};
