use super::types::{ChartData, Layout, Marker};

const TEMPLATE: &str = include_str!("chart.html");

pub const DEFAULT_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/echarts/dist/echarts.min.js";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub layout: Layout,
    pub script_url: String,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            script_url: DEFAULT_SCRIPT_URL.into(),
            width: 900,
            height: 500,
        }
    }
}

/// Renders `chart` into a standalone HTML page.
pub fn render(chart: &ChartData, options: &RenderOptions) -> Result<String, RenderError> {
    let option = option_json(chart, options.layout)?;
    let page = escape_html(&chart.page);
    let script_url = escape_html(&options.script_url);
    let width = options.width.to_string();
    let height = options.height.to_string();
    fill(
        TEMPLATE,
        &[
            ("page", &page),
            ("script_url", &script_url),
            ("width", &width),
            ("height", &height),
            ("option", &option),
        ],
    )
}

/// The ECharts `option` object, ready to be dropped into a `<script>` element.
pub fn option_json(chart: &ChartData, layout: Layout) -> Result<String, RenderError> {
    let option = EChartsOption::new(chart, layout);
    Ok(script_safe_json(&serde_json::to_string_pretty(&option)?))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes the characters that could end a `<script>` element or a JS string
/// literal. Outside of strings, serialised JSON never contains them, so the
/// result is still valid JSON with the same meaning.
pub fn script_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Substitutes `{{key}}` placeholders in a single pass, so substituted text is
/// never scanned again.
fn fill(template: &str, values: &[(&str, &str)]) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or(RenderError::UnterminatedPlaceholder)?;
        let key = &after[..end];
        let value = values
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
            .ok_or_else(|| RenderError::UnknownPlaceholder(key.into()))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct EChartsOption<'a> {
    title: Title<'a>,
    tooltip: Tooltip,
    legend: Legend<'a>,
    toolbox: Toolbox,
    x_axis: Axis<'a>,
    y_axis: Axis<'a>,
    series: Vec<LineSeries<'a>>,
}

impl<'a> EChartsOption<'a> {
    fn new(chart: &'a ChartData, layout: Layout) -> Self {
        let (lines, points): (Vec<Marker>, Vec<Marker>) =
            layout.markers().iter().copied().partition(|marker| marker.is_line());

        Self {
            title: Title { text: &chart.title },
            tooltip: Tooltip { trigger: "axis" },
            legend: Legend {
                data: &chart.legend_names,
            },
            toolbox: Toolbox {
                show: true,
                feature: Feature {
                    data_zoom: DataZoom { y_axis_index: "none" },
                    data_view: DataView { read_only: false },
                    magic_type: MagicType {
                        type_: ["line", "bar"],
                    },
                    restore: Empty {},
                    save_as_image: Empty {},
                },
            },
            x_axis: Axis {
                type_: "category",
                boundary_gap: Some(false),
                data: Some(chart.x_categories.as_slice()),
                axis_label: AxisLabel::with_unit(&chart.x_axis_label),
            },
            y_axis: Axis {
                type_: "value",
                boundary_gap: None,
                data: None,
                axis_label: AxisLabel::with_unit(&chart.y_axis_label),
            },
            series: chart
                .series
                .iter()
                .map(|series| LineSeries {
                    name: &series.name,
                    type_: "line",
                    label: Label { show: true },
                    data: &series.values,
                    mark_line: Marks::from_markers(&lines),
                    mark_point: Marks::from_markers(&points),
                })
                .collect(),
        }
    }
}

#[derive(serde::Serialize)]
struct Title<'a> {
    text: &'a str,
}

#[derive(serde::Serialize)]
struct Tooltip {
    trigger: &'static str,
}

#[derive(serde::Serialize)]
struct Legend<'a> {
    data: &'a [String],
}

/// Field order is the button order ECharts draws.
#[derive(serde::Serialize)]
struct Toolbox {
    show: bool,
    feature: Feature,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    data_zoom: DataZoom,
    data_view: DataView,
    magic_type: MagicType,
    restore: Empty,
    save_as_image: Empty,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DataZoom {
    y_axis_index: &'static str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DataView {
    read_only: bool,
}

#[derive(serde::Serialize)]
struct MagicType {
    #[serde(rename = "type")]
    type_: [&'static str; 2],
}

#[derive(serde::Serialize)]
struct Empty {}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Axis<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    boundary_gap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a [String]>,
    axis_label: AxisLabel,
}

#[derive(serde::Serialize)]
struct AxisLabel {
    formatter: String,
}

impl AxisLabel {
    fn with_unit(unit: &str) -> Self {
        Self {
            formatter: format!("{{value}}{}", unit),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct LineSeries<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_: &'static str,
    label: Label,
    data: &'a [f64],
    #[serde(skip_serializing_if = "Option::is_none")]
    mark_line: Option<Marks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mark_point: Option<Marks>,
}

#[derive(serde::Serialize)]
struct Label {
    show: bool,
}

#[derive(serde::Serialize)]
struct Marks {
    data: Vec<Mark>,
}

impl Marks {
    fn from_markers(markers: &[Marker]) -> Option<Self> {
        if markers.is_empty() {
            return None;
        }
        Some(Self {
            data: markers
                .iter()
                .map(|marker| Mark {
                    type_: marker.kind(),
                    name: marker.label(),
                })
                .collect(),
        })
    }
}

#[derive(serde::Serialize)]
struct Mark {
    #[serde(rename = "type")]
    type_: &'static str,
    name: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot encode chart options")]
    Json(#[from] serde_json::Error),
    #[error("template has an unterminated placeholder")]
    UnterminatedPlaceholder,
    #[error("template refers to unknown placeholder \"{0}\"")]
    UnknownPlaceholder(String),
}

#[cfg(test)]
mod tests {
    use super::{escape_html, fill, option_json, render, script_safe_json, RenderOptions};
    use crate::types::{ChartData, Layout, Series};
    use serde_json::{json, Value};

    fn sample() -> ChartData {
        ChartData {
            page: "Q1 <draft> & \"notes\"".into(),
            title: "Sales</script><script>alert(1)</script>".into(),
            x_axis_label: "月".into(),
            y_axis_label: "k€".into(),
            legend_names: vec!["North".into(), "South".into()],
            x_categories: vec!["Jan".into(), "Feb".into()],
            series: vec![
                Series {
                    name: "North".into(),
                    values: vec![1.5, 2.0],
                },
                Series {
                    name: "South".into(),
                    values: vec![-3.0, 4.25],
                },
            ],
        }
    }

    fn option(chart: &ChartData, layout: Layout) -> Value {
        serde_json::from_str(&option_json(chart, layout).unwrap()).unwrap()
    }

    #[test]
    fn test_option_units() {
        let option = option(&sample(), Layout::Units);

        // Toolbox buttons are drawn in key order.
        let text = option_json(&sample(), Layout::Units).unwrap();
        let positions: Vec<usize> = [
            "\"show\"",
            "\"feature\"",
            "\"dataZoom\"",
            "\"dataView\"",
            "\"magicType\"",
            "\"restore\"",
            "\"saveAsImage\"",
        ]
        .iter()
        .map(|key| text.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        assert_eq!(
            option["title"]["text"],
            "Sales</script><script>alert(1)</script>"
        );
        assert_eq!(option["tooltip"], json!({ "trigger": "axis" }));
        assert_eq!(option["legend"]["data"], json!(["North", "South"]));
        assert_eq!(option["xAxis"]["type"], "category");
        assert_eq!(option["xAxis"]["boundaryGap"], false);
        assert_eq!(option["xAxis"]["data"], json!(["Jan", "Feb"]));
        assert_eq!(option["xAxis"]["axisLabel"]["formatter"], "{value}月");
        assert_eq!(option["yAxis"]["type"], "value");
        assert_eq!(option["yAxis"]["axisLabel"]["formatter"], "{value}k€");
        assert!(option["yAxis"].get("data").is_none());
        assert_eq!(
            option["toolbox"]["feature"]["magicType"]["type"],
            json!(["line", "bar"])
        );

        assert_eq!(
            option["series"][1],
            json!({
                "name": "South",
                "type": "line",
                "label": { "show": true },
                "data": [-3.0, 4.25],
                "markLine": { "data": [{ "type": "average", "name": "Average" }] }
            })
        );
    }

    #[test]
    fn test_option_extrema() {
        let option = option(&sample(), Layout::Extrema);

        for series in option["series"].as_array().unwrap() {
            assert_eq!(
                series["markLine"],
                json!({ "data": [{ "type": "average", "name": "Average" }] })
            );
            assert_eq!(
                series["markPoint"],
                json!({ "data": [
                    { "type": "max", "name": "Max" },
                    { "type": "min", "name": "Min" }
                ] })
            );
        }
    }

    #[test]
    fn test_option_is_script_safe() {
        let text = option_json(&sample(), Layout::Units).unwrap();

        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
        assert!(text.contains("Sales\\u003c/script\\u003e"));
    }

    #[test]
    fn test_render_document() {
        let html = render(&sample(), &RenderOptions::default()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Q1 &lt;draft&gt; &amp; &quot;notes&quot;</title>"));
        assert!(html.contains(
            "<script src=\"https://cdn.jsdelivr.net/npm/echarts/dist/echarts.min.js\"></script>"
        ));
        assert!(html.contains("style=\"width:900px;height:500px;\""));
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_render_options() {
        let options = RenderOptions {
            layout: Layout::Extrema,
            script_url: "echarts.js?v=1&x=\"".into(),
            width: 640,
            height: 480,
        };
        let html = render(&sample(), &options).unwrap();

        assert!(html.contains("<script src=\"echarts.js?v=1&amp;x=&quot;\"></script>"));
        assert!(html.contains("width:640px;height:480px;"));
        assert!(html.contains("\"markPoint\""));
    }

    #[test]
    fn test_placeholders_not_rescanned() {
        let mut chart = sample();
        chart.page = "{{option}}".into();
        let html = render(&chart, &RenderOptions::default()).unwrap();

        assert!(html.contains("<title>{{option}}</title>"));
    }

    #[test]
    fn test_fill_errors() {
        assert_eq!(fill("a{{x}}b", &[("x", "1")]).unwrap(), "a1b");
        assert!(fill("a{{x", &[("x", "1")]).is_err());
        assert!(fill("a{{y}}", &[("x", "1")]).is_err());
    }

    #[test]
    fn test_escapes() {
        assert_eq!(escape_html("a'b"), "a&#39;b");
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(
            script_safe_json("\"<a>&\u{2028}\""),
            "\"\\u003ca\\u003e\\u0026\\u2028\""
        );
    }
}
