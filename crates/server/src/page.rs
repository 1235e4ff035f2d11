//! Server-rendered HTML for the dashboard. Each row carries its own small form
//! so the typed delta only lives for one request.

use shared::{
    domain::{RawRow, RawStatus, RowIssue, RowIssueReason, StatusColor},
    protocol::DashboardView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) kind: NoticeKind,
    pub(crate) text: String,
}

impl Notice {
    pub(crate) fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem; color: #111827; }
table { border-collapse: collapse; }
th, td { padding: 6px 12px; text-align: left; }
.num { font-weight: 700; }
.positive { color: #16a34a; }
.negative { color: #dc2626; }
.neutral { color: #6b7280; }
.track { width: 160px; height: 14px; border: 1px solid #d1d5db; border-radius: 4px; background: #ffffff; }
.fill { height: 100%; border-radius: 4px; }
.fill.positive { background: #22c55e; }
.fill.negative { background: #ef4444; }
.fill.neutral { background: #9ca3af; }
.notice { padding: 8px 12px; border-radius: 4px; margin-bottom: 1rem; }
.notice.warning { background: #fef3c7; }
.notice.error { background: #fee2e2; }
form.inline { display: inline; }
"#;

fn color_class(color: StatusColor) -> &'static str {
    match color {
        StatusColor::Positive => "positive",
        StatusColor::Negative => "negative",
        StatusColor::Neutral => "neutral",
    }
}

pub(crate) fn render_dashboard(view: &DashboardView, notice: Option<&Notice>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str("<title>Dashboard Proporcional</title>");
    html.push_str(&format!("<style>{STYLE}</style></head><body>"));
    html.push_str("<h1>Dashboard Proporcional</h1>");

    if let Some(notice) = notice {
        let class = match notice.kind {
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        };
        html.push_str(&format!(
            "<div class=\"notice {class}\" role=\"status\">{}</div>",
            escape_html(&notice.text)
        ));
    }

    html.push_str(
        "<table><thead><tr><th>Nombre</th><th>Estado</th><th>Barra</th>\
         <th>Sumar / restar</th><th>Acción</th></tr></thead><tbody>",
    );
    for row in &view.rows {
        let name = escape_html(&row.name);
        let class = color_class(row.color);
        html.push_str(&format!(
            "<tr><td>{name}</td>\
             <td><span class=\"num {class}\">{status}</span></td>\
             <td><div class=\"track\"><div class=\"fill {class}\" style=\"width: {width}%\"></div></div></td>\
             <td><form class=\"inline\" method=\"post\" action=\"/adjust\">\
             <input type=\"hidden\" name=\"name\" value=\"{name}\">\
             <input type=\"text\" name=\"delta\" placeholder=\"+0\" size=\"8\">\
             <button type=\"submit\">Aplicar</button></form></td>\
             <td><form class=\"inline\" method=\"post\" action=\"/delete\">\
             <input type=\"hidden\" name=\"name\" value=\"{name}\">\
             <button type=\"submit\">Eliminar</button></form></td></tr>",
            status = escape_html(&row.formatted_status),
            width = row.bar_width_percent,
        ));
    }
    html.push_str("</tbody></table>");

    html.push_str(
        "<h2>Agregar persona</h2>\
         <form method=\"post\" action=\"/add\">\
         <input type=\"text\" name=\"name\" placeholder=\"Ej: Juan\">\
         <input type=\"text\" name=\"status\" placeholder=\"0\" size=\"8\">\
         <button type=\"submit\">Agregar</button></form>",
    );

    html.push_str(
        "<h2>Reiniciar</h2>\
         <form method=\"post\" action=\"/reset\">\
         <button type=\"submit\">Poner todo a cero</button></form>",
    );

    html.push_str(&format!(
        "<h2>Edición masiva</h2>\
         <p>Una fila por línea: <code>nombre; estado</code></p>\
         <form method=\"post\" action=\"/bulk\">\
         <textarea name=\"rows\" rows=\"10\" cols=\"40\">{}</textarea><br>\
         <button type=\"submit\">Reemplazar todo</button></form>",
        escape_html(&bulk_text(view))
    ));

    html.push_str("</body></html>");
    html
}

/// Current snapshot in the format the bulk-edit textarea accepts. Statuses are
/// written at full precision so resubmitting the text leaves them unchanged.
pub(crate) fn bulk_text(view: &DashboardView) -> String {
    view.rows
        .iter()
        .map(|row| format!("{}; {}\n", row.name, row.status))
        .collect()
}

/// Reads the bulk-edit textarea. Blank lines are skipped; a line without a
/// `;` is a name with no status.
pub(crate) fn parse_bulk_text(text: &str) -> Vec<RawRow> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.rsplit_once(';') {
            Some((name, status)) => RawRow {
                name: name.to_string(),
                status: Some(RawStatus::Text(status.to_string())),
            },
            None => RawRow {
                name: line.to_string(),
                status: None,
            },
        })
        .collect()
}

pub(crate) fn describe_issues(issues: &[RowIssue]) -> String {
    let details: Vec<String> = issues
        .iter()
        .map(|issue| {
            let line = issue.row + 1;
            match issue.reason {
                RowIssueReason::EmptyName => format!("row {line}: empty name, dropped"),
                RowIssueReason::InvalidName => {
                    format!("row {line}: name contains a line break, dropped")
                }
                RowIssueReason::InvalidStatus => {
                    format!("row {line} ({}): status is not a number, set to 0", issue.name)
                }
                RowIssueReason::DuplicateName => {
                    format!("row {line} ({}): replaced by a later row", issue.name)
                }
            }
        })
        .collect();
    format!("Saved with {} issue(s): {}", issues.len(), details.join("; "))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
