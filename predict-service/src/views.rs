//! Server-rendered HTML for the two interactive modes.

use predict_core::record::{AGE_RANGE, BMI_RANGE, INCOME_RANGE, PHYS_HEALTH_RANGE};
use predict_core::{format_probability, FeatureRecord, FeatureTable, GenHealth, PredictionLabel, Sex};
use serde::Deserialize;
use std::fmt::Display;

use crate::state::SessionId;

/// File name offered for the augmented table.
pub const DOWNLOAD_FILE_NAME: &str = "diabetes_predictions.csv";

/// Mode picked in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    #[default]
    Manual,
    Upload,
}

impl AppMode {
    const fn value(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Upload => "upload",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::Manual => "Manual Input",
            Self::Upload => "Upload CSV",
        }
    }
}

/// Outcome shown under the manual input form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualResult {
    pub label: PredictionLabel,
    pub probability: f64,
}

/// What the upload page currently shows.
pub enum UploadView<'a> {
    /// No file yet: only the file picker.
    Empty,
    /// File parsed, waiting for the predict action.
    Uploaded {
        id: SessionId,
        file_name: &'a str,
        table: &'a FeatureTable,
    },
    /// Predictions appended and ready to download.
    Predicted {
        id: SessionId,
        file_name: &'a str,
        table: &'a FeatureTable,
    },
}

/// Form labels for the binary flags, in [`FeatureRecord::flags`] order.
const FLAG_LABELS: [&str; 9] = [
    "High Blood Pressure",
    "High Cholesterol",
    "Smoker",
    "Stroke",
    "Heart Disease/Attack",
    "Physical Activity",
    "Consumes Fruits",
    "Consumes Vegetables",
    "Heavy Alcohol Consumption",
];

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(mode: AppMode, content: &str) -> String {
    let options: String = [AppMode::Manual, AppMode::Upload]
        .iter()
        .map(|m| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                m.value(),
                selected(*m == mode),
                m.title()
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Diabetes Prediction App</title>
<style>
body{{font-family:sans-serif;margin:0;display:flex;min-height:100vh}}
aside{{background:#f0f2f6;padding:1.5rem;min-width:14rem}}
main{{padding:1.5rem 3rem;flex:1}}
label{{display:block;margin-top:.8rem}}
table{{border-collapse:collapse;margin:1rem 0}}
th,td{{border:1px solid #ddd;padding:.3rem .6rem}}
.result{{font-size:1.3rem;font-weight:bold}}
.error{{color:#b00020}}
</style>
</head>
<body>
<aside>
<form method="get" action="/">
<label for="mode">Choose mode</label>
<select id="mode" name="mode" onchange="this.form.submit()">{options}</select>
<noscript><button type="submit">Go</button></noscript>
</form>
</aside>
<main>
<h1>🩺 Diabetes Prediction App</h1>
<p>This app predicts the likelihood of diabetes based on health and lifestyle features.</p>
{content}
</main>
</body>
</html>
"#
    )
}

const fn selected(yes: bool) -> &'static str {
    if yes {
        " selected"
    } else {
        ""
    }
}

fn select<T: Display + PartialEq>(name: &str, label: &str, choices: &[T], current: &T) -> String {
    let options: String = choices
        .iter()
        .map(|c| {
            let value = escape(&c.to_string());
            format!(
                r#"<option value="{value}"{}>{value}</option>"#,
                selected(c == current)
            )
        })
        .collect();
    format!(r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">{options}</select>"#)
}

fn slider<T: Display>(name: &str, label: &str, range: &std::ops::RangeInclusive<T>, value: T) -> String {
    format!(
        r#"<label for="{name}">{label}: <output id="{name}_out">{value}</output></label><input type="range" id="{name}" name="{name}" min="{}" max="{}" step="1" value="{value}" oninput="{name}_out.value=this.value">"#,
        range.start(),
        range.end()
    )
}

/// Manual input form, with the prediction underneath once submitted.
pub fn manual_page(record: &FeatureRecord, result: Option<&ManualResult>) -> String {
    let mut form = String::new();

    form.push_str(&format!(
        r#"<label for="bmi">BMI</label><input type="number" id="bmi" name="bmi" min="{}" max="{}" step="0.1" value="{:.1}" required>"#,
        BMI_RANGE.start(),
        BMI_RANGE.end(),
        record.bmi
    ));
    form.push_str(&slider(
        "phys_health",
        "Physical Health (days unhealthy in last 30 days)",
        &PHYS_HEALTH_RANGE,
        record.phys_health,
    ));
    for ((name, value), label) in record.flags().iter().zip(FLAG_LABELS) {
        form.push_str(&select(name, label, &[0u8, 1], value));
    }
    form.push_str(&select(
        "gen_health",
        "General Health",
        &GenHealth::ALL,
        &record.gen_health,
    ));
    form.push_str(&select("sex", "Sex", &Sex::ALL, &record.sex));
    form.push_str(&slider(
        "age",
        "Age Category (numeric)",
        &AGE_RANGE,
        record.age,
    ));
    form.push_str(&slider(
        "income",
        "Income (approx bracket code)",
        &INCOME_RANGE,
        record.income,
    ));

    let outcome = result.map_or_else(String::new, |r| {
        format!(
            r#"<p class="result">🔮 Prediction: {}</p><p class="result">Probability of Diabetes: {}</p>"#,
            r.label,
            format_probability(r.probability)
        )
    });

    layout(
        AppMode::Manual,
        &format!(
            r#"<h2>Enter patient information:</h2>
<form method="post" action="/manual/predict">
{form}
<p><button type="submit">Predict</button></p>
</form>
{outcome}"#
        ),
    )
}

/// Render the first `rows` rows of a table.
pub fn table_preview(table: &FeatureTable, rows: usize) -> String {
    let header: String = table
        .headers()
        .iter()
        .map(|h| format!("<th>{}</th>", escape(h)))
        .collect();
    let body: String = table
        .head(rows)
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|c| format!("<td>{}</td>", escape(c)))
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!(
        "<table><thead><tr>{header}</tr></thead><tbody>{body}</tbody></table><p>{} rows total</p>",
        table.len()
    )
}

/// Upload mode page in its current state.
pub fn upload_page(view: &UploadView<'_>, preview_rows: usize) -> String {
    let picker = r#"<form method="post" action="/upload" enctype="multipart/form-data">
<label for="file">Choose a file</label>
<input type="file" id="file" name="file" accept=".csv" required>
<button type="submit">Upload</button>
</form>"#;

    let section = match view {
        UploadView::Empty => String::new(),
        UploadView::Uploaded {
            id,
            file_name,
            table,
        } => format!(
            r#"<p>📊 Preview of uploaded data ({}):</p>
{}
<form method="post" action="/upload/{id}/predict"><button type="submit">Predict for Uploaded Data</button></form>"#,
            escape(file_name),
            table_preview(table, preview_rows)
        ),
        UploadView::Predicted {
            id,
            file_name,
            table,
        } => format!(
            r#"<p>✅ Predictions complete ({}):</p>
{}
<p><a href="/upload/{id}/download" download="{DOWNLOAD_FILE_NAME}">Download Predictions</a></p>"#,
            escape(file_name),
            table_preview(table, preview_rows)
        ),
    };

    layout(
        AppMode::Upload,
        &format!("<h2>Upload your dataset (CSV format)</h2>\n{picker}\n{section}"),
    )
}

pub fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Diabetes Prediction App - Error</title></head>
<body>
<h1>🩺 Diabetes Prediction App</h1>
<p class="error">Error: {}</p>
<p><a href="/">Back</a></p>
</body>
</html>
"#,
        escape(message)
    )
}
