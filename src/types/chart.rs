use super::layout::{Layout, PAGE_LINE, TITLE_LINE};
use tracing::{debug, warn};

/// One physical line of the input, split on tabs. `number` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: u64,
    pub fields: Vec<String>,
}

impl Line {
    pub fn new(number: u64, fields: Vec<String>) -> Self {
        Self { number, fields }
    }

    /// 0-based position in the file.
    fn index(&self) -> usize {
        self.number.saturating_sub(1) as usize
    }

    fn text(&self) -> String {
        self.fields.join("\t")
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.trim().is_empty())
    }

    fn field(&self, i: usize) -> String {
        self.fields.get(i).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: String) -> Self {
        Self {
            name,
            values: Vec::new(),
        }
    }

    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

/// Everything the chart template needs, extracted from the fixed line layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub page: String,
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub legend_names: Vec<String>,
    pub x_categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartData {
    /// Interprets `lines` according to `layout`. Lines must be in file order.
    pub fn from_lines<I>(layout: Layout, lines: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = Line>,
    {
        let lines: Vec<Line> = lines.into_iter().collect();

        let page = header(&lines, PAGE_LINE, "page title")?.text();
        let title = header(&lines, TITLE_LINE, "chart title")?.text();

        let (x_axis_label, y_axis_label) = match layout.axis_line() {
            Some(index) => {
                let units = header(&lines, index, "axis units")?;
                (units.field(0), units.field(1))
            }
            None => (String::new(), String::new()),
        };

        let legend_index = layout.legend_line();
        let legend_names: Vec<String> = header(&lines, legend_index, "series names")?
            .fields
            .iter()
            .skip(1)
            .cloned()
            .collect();
        if legend_names.is_empty() {
            return Err(ExtractError::NoSeries {
                line: legend_index as u64 + 1,
            });
        }

        let mut chart = ChartData {
            page,
            title,
            x_axis_label,
            y_axis_label,
            series: legend_names.iter().cloned().map(Series::new).collect(),
            legend_names,
            x_categories: Vec::new(),
        };

        for line in lines
            .iter()
            .filter(|line| line.index() >= layout.first_value_line())
        {
            if line.is_blank() {
                debug!(line = line.number, "skipping blank row");
                continue;
            }
            chart.push_row(line)?;
        }

        Ok(chart)
    }

    fn push_row(&mut self, line: &Line) -> Result<(), ExtractError> {
        let mut fields = line.fields.iter();
        let category = fields.next().cloned().unwrap_or_default();

        // Parse the whole row before touching the series, so they stay aligned.
        let mut values = Vec::with_capacity(self.series.len());
        for (k, series) in self.series.iter().enumerate() {
            let column = k + 2;
            let raw = fields.next().ok_or_else(|| ExtractError::MissingValue {
                line: line.number,
                column,
                series: series.name.clone(),
            })?;
            values.push(parse_value(raw).ok_or_else(|| ExtractError::InvalidNumber {
                line: line.number,
                column,
                value: raw.clone(),
            })?);
        }

        let extra = fields.count();
        if extra > 0 {
            warn!(line = line.number, extra, "ignoring fields beyond the last series");
        }

        self.x_categories.push(category);
        for (series, value) in self.series.iter_mut().zip(values) {
            series.values.push(value);
        }
        Ok(())
    }
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn header<'a>(
    lines: &'a [Line],
    index: usize,
    what: &'static str,
) -> Result<&'a Line, ExtractError> {
    lines
        .iter()
        .find(|line| line.index() == index)
        .ok_or(ExtractError::MissingLine {
            line: index as u64 + 1,
            what,
        })
}

/// Returned when the input doesn't fit the fixed line layout.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("line {line}: expected the {what}, but the input ended")]
    MissingLine { line: u64, what: &'static str },
    #[error("line {line}: no series names after the first column")]
    NoSeries { line: u64 },
    #[error("line {line}, column {column}: missing value for series \"{series}\"")]
    MissingValue {
        line: u64,
        column: usize,
        series: String,
    },
    #[error("line {line}, column {column}: \"{value}\" is not a number")]
    InvalidNumber {
        line: u64,
        column: usize,
        value: String,
    },
}
