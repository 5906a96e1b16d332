//! Recreates plotted series from the measurement file as figure artifacts.
//!
//! The protocol structure embedded in each file records which channels were
//! plotted during the run (`loop_steps[*].plots[*]`). This module walks those
//! definitions, re-reads the named channels from the entry's `data` group,
//! and assembles serializable scatter figures in the plotly JSON shape the
//! browsing application renders. Missing channels degrade to a warning and a
//! skipped figure; series recreation is never fatal.

use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::container::{GroupNode, RawValue};

/// A rendered plot artifact: traces plus minimal layout.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    /// The plotted traces.
    pub data: Vec<Trace>,
    /// Axis titles and figure title.
    pub layout: Layout,
}

/// A single x/y series within a figure.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    /// Plotly trace type; always `scatter`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Draw mode, e.g. `lines+markers`.
    pub mode: String,
    /// Trace label.
    pub name: String,
    /// Independent values.
    pub x: Vec<f64>,
    /// Dependent values.
    pub y: Vec<f64>,
    /// Line styling, used by overlay traces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

impl Trace {
    /// A plain measured-series trace.
    pub fn series(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter".to_owned(),
            mode: "lines+markers".to_owned(),
            name: name.into(),
            x,
            y,
            line: None,
        }
    }

    /// A dashed overlay trace, used for fitted lines.
    pub fn dashed_overlay(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter".to_owned(),
            mode: "lines".to_owned(),
            name: name.into(),
            x,
            y,
            line: Some(LineStyle {
                dash: "dash".to_owned(),
            }),
        }
    }
}

/// Line styling for a trace.
#[derive(Debug, Clone, Serialize)]
pub struct LineStyle {
    /// Dash pattern name.
    pub dash: String,
}

/// Figure layout: title and axis labels.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Figure title.
    pub title: String,
    /// X axis.
    pub xaxis: Axis,
    /// Y axis.
    pub yaxis: Axis,
}

/// An axis with a title.
#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    /// Axis title.
    pub title: String,
}

/// A plot definition pulled out of the protocol structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotDefinition {
    /// Display name of the plot.
    pub name: String,
    /// Channel plotted on the x axis.
    pub x_axis: String,
    /// Channels plotted on the y axis.
    pub y_formulas: Vec<String>,
    /// Optional explicit title.
    pub title: String,
    /// Optional explicit x label.
    pub xlabel: String,
    /// Optional explicit y label.
    pub ylabel: String,
}

/// Collect the plot definitions of every protocol step, recursing into
/// nested child steps.
pub fn plot_definitions(protocol: &Value) -> Vec<PlotDefinition> {
    let mut definitions = Vec::new();
    if let Some(steps) = protocol.get("loop_steps").and_then(Value::as_array) {
        for step in steps {
            collect_step(step, &mut definitions);
        }
    }
    definitions
}

fn collect_step(step: &Value, definitions: &mut Vec<PlotDefinition>) {
    if let Some(plots) = step.get("plots").and_then(Value::as_array) {
        for plot in plots {
            if let Some(definition) = parse_plot(plot) {
                definitions.push(definition);
            }
        }
    }
    if let Some(children) = step.get("children").and_then(Value::as_array) {
        for child in children {
            collect_step(child, definitions);
        }
    }
}

fn parse_plot(plot: &Value) -> Option<PlotDefinition> {
    let x_axis = plot.get("x_axis")?.as_str()?.to_owned();
    if x_axis.is_empty() {
        return None;
    }
    let y_formulas: Vec<String> = plot
        .get("y_axes")
        .and_then(|axes| axes.get("formula"))
        .and_then(Value::as_array)
        .map(|formulas| {
            formulas
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    if y_formulas.is_empty() {
        return None;
    }
    let text = |key: &str| {
        plot.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    Some(PlotDefinition {
        name: text("name"),
        x_axis,
        y_formulas,
        title: text("title"),
        xlabel: text("xlabel"),
        ylabel: text("ylabel"),
    })
}

/// Recreate the protocol's plots from the entry's measured data.
pub fn recreate_figures(entry: &GroupNode, protocol: &Value) -> Vec<Figure> {
    let definitions = plot_definitions(protocol);
    if definitions.is_empty() {
        return Vec::new();
    }
    let Some(data) = entry.group("data") else {
        warn!("Entry {} has no data group, skipping plot recreation", entry.path());
        return Vec::new();
    };

    let mut figures = Vec::new();
    for definition in definitions {
        let Some(x) = read_series(&data, &definition.x_axis) else {
            continue;
        };
        let mut traces = Vec::new();
        for formula in &definition.y_formulas {
            let Some(y) = read_series(&data, formula) else {
                continue;
            };
            traces.push(Trace::series(formula.clone(), x.clone(), y));
        }
        if traces.is_empty() {
            warn!("Plot {:?} has no readable series", definition.name);
            continue;
        }

        let title = if definition.title.is_empty() {
            definition.name.clone()
        } else {
            definition.title.clone()
        };
        let xlabel = if definition.xlabel.is_empty() {
            definition.x_axis.clone()
        } else {
            definition.xlabel.clone()
        };
        let ylabel = if definition.ylabel.is_empty() {
            definition.y_formulas.join(", ")
        } else {
            definition.ylabel.clone()
        };
        figures.push(Figure {
            data: traces,
            layout: Layout {
                title,
                xaxis: Axis { title: xlabel },
                yaxis: Axis { title: ylabel },
            },
        });
    }
    figures
}

// Read a named channel as a numeric series; anything else logs and skips.
fn read_series(data: &GroupNode, channel: &str) -> Option<Vec<f64>> {
    let Some(dataset) = data.dataset(channel) else {
        warn!("Channel {channel:?} not found in {}", data.path());
        return None;
    };
    match dataset.read_raw() {
        Ok(RawValue::FloatList(values)) => Some(values),
        Ok(RawValue::IntList(values)) => Some(values.into_iter().map(|v| v as f64).collect()),
        Ok(RawValue::Float(value)) => Some(vec![value]),
        Ok(RawValue::Int(value)) => Some(vec![value as f64]),
        Ok(_) => {
            warn!("Channel {channel:?} is not numeric");
            None
        }
        Err(error) => {
            warn!("Failed to read channel {channel:?}: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protocol_with_plot() -> Value {
        json!({
            "loop_steps": [{
                "step_type": "Simple Sweep",
                "plots": [{
                    "plt_type": "X-Y plot",
                    "x_axis": "demo_motorX",
                    "y_axes": {"formula": ["demo_detectorX"], "axis": ["left"]},
                    "name": "demo_detectorX vs. demo_motorX",
                    "title": "",
                    "xlabel": "",
                    "ylabel": ""
                }],
                "children": []
            }]
        })
    }

    #[test]
    fn definitions_are_collected_from_loop_steps() {
        let definitions = plot_definitions(&protocol_with_plot());
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].x_axis, "demo_motorX");
        assert_eq!(definitions[0].y_formulas, vec!["demo_detectorX".to_owned()]);
    }

    #[test]
    fn definitions_recurse_into_children() {
        let protocol = json!({
            "loop_steps": [{
                "plots": [],
                "children": [{
                    "plots": [{
                        "x_axis": "outer_x",
                        "y_axes": {"formula": ["inner_y"]},
                        "name": "nested"
                    }]
                }]
            }]
        });
        let definitions = plot_definitions(&protocol);
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "nested");
    }

    #[test]
    fn plots_without_axes_are_ignored() {
        let protocol = json!({
            "loop_steps": [{"plots": [{"x_axis": "", "y_axes": {"formula": []}}]}]
        });
        assert!(plot_definitions(&protocol).is_empty());
    }

    #[test]
    fn overlay_trace_is_dashed() {
        let trace = Trace::dashed_overlay("Fit Line", vec![0.0, 1.0], vec![1.0, 3.0]);
        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value["line"]["dash"], "dash");
        assert_eq!(value["type"], "scatter");
        assert_eq!(value["mode"], "lines");
    }
}
