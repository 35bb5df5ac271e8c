//! HTML rendering of a report
//!
//! Produces one self-contained page: a completeness bar chart drawn by
//! Plotly (loaded from its CDN) and a plain table that still reads when
//! scripts are blocked.

use super::report::{Report, TopValue, NOT_AVAILABLE};
use crate::error::{PipelineError, PipelineResult};
use handlebars::Handlebars;
use serde_json::json;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<script src="{{plotly}}"></script>
</head>
<body>
<h1>{{title}}</h1>
<p>Rows: {{rows}} &middot; Columns: {{columns}}</p>
<div id="completeness"></div>
<script>Plotly.newPlot("completeness", {{{trace}}}, {{{layout}}});</script>
<table>
<thead><tr><th>Column</th><th>Completeness</th><th>Top value</th></tr></thead>
<tbody>
{{#each table}}
<tr><td>{{name}}</td><td>{{completeness}}</td><td>{{top}}</td></tr>
{{/each}}
</tbody>
</table>
</body>
</html>
"#;

pub fn render_html(report: &Report, title: &str) -> PipelineResult<String> {
    let columns: Vec<&String> = report.completeness.keys().collect();
    let ratios: Vec<Option<f64>> = report.completeness.values().copied().collect();
    let trace = json!([{
        "type": "bar",
        "x": columns,
        "y": ratios,
    }]);
    let layout = json!({
        "title": title,
        "xaxis": {"title": "Column"},
        "yaxis": {"title": "Completeness", "range": [0, 1]},
    });

    let table: Vec<_> = report
        .completeness
        .iter()
        .map(|(name, ratio)| {
            let completeness = match ratio {
                Some(r) => format!("{:.1}%", r * 100.0),
                None => NOT_AVAILABLE.to_string(),
            };
            let top = match report.top_values.get(name) {
                Some(TopValue::Number(n)) => n.to_string(),
                Some(TopValue::Text(s)) => s.clone(),
                None => String::new(),
            };
            json!({"name": name, "completeness": completeness, "top": top})
        })
        .collect();

    let data = json!({
        "title": title,
        "plotly": PLOTLY_CDN,
        "rows": report.data_shape[0],
        "columns": report.data_shape[1],
        "trace": script_safe(&serde_json::to_string(&trace).map_err(render_error)?),
        "layout": script_safe(&serde_json::to_string(&layout).map_err(render_error)?),
        "table": table,
    });

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.render_template(PAGE, &data).map_err(render_error)
}

fn render_error(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::ReportRender(err.to_string())
}

/// Keep embedded JSON from closing the surrounding `<script>` element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
