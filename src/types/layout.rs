/// Which fixed line positions hold the axis units and the legend, and which
/// markers each series is drawn with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// Line 2 holds the axis units, line 3 the legend. Average line only.
    #[default]
    Units,
    /// Line 2 holds the legend. Average line plus max/min points.
    Extrema,
}

pub const PAGE_LINE: usize = 0;
pub const TITLE_LINE: usize = 1;

impl Layout {
    pub fn axis_line(self) -> Option<usize> {
        match self {
            Self::Units => Some(2),
            Self::Extrema => None,
        }
    }

    pub fn legend_line(self) -> usize {
        match self {
            Self::Units => 3,
            Self::Extrema => 2,
        }
    }

    pub fn first_value_line(self) -> usize {
        self.legend_line() + 1
    }

    pub fn markers(self) -> &'static [Marker] {
        match self {
            Self::Units => &[Marker::Average],
            Self::Extrema => &[Marker::Average, Marker::Max, Marker::Min],
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Units => write!(f, "units"),
            Self::Extrema => write!(f, "extrema"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Average,
    Max,
    Min,
}

impl Marker {
    /// The ECharts mark type keyword.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Average => "Average",
            Self::Max => "Max",
            Self::Min => "Min",
        }
    }

    /// Averages are drawn as a horizontal line, extrema as a pin on the point.
    pub fn is_line(self) -> bool {
        matches!(self, Self::Average)
    }
}
