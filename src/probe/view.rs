//! Rendering of the status page. Pure functions of the status value.

use crate::probe::status::ConnectionStatus;

pub const HEADING: &str = "Apex Integration Test";

const FOOTNOTE: &str =
    "If you see the green checkmark, the dev server is successfully talking to the web service through its proxy!";

/// Status page as an HTML document.
pub fn render_html(status: &ConnectionStatus) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{HEADING}</title>
</head>
<body>
<div style="padding: 50px; text-align: center">
<h1>{HEADING}</h1>
<h2>Status: {status}</h2>
<p>{FOOTNOTE}</p>
</div>
</body>
</html>
"#
    )
}

/// Status page as plain text, for terminals.
pub fn render_text(status: &ConnectionStatus) -> String {
    format!("{HEADING}\nStatus: {status}")
}
