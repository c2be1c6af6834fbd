//! Server-rendered assessment page.
//!
//! One card per feature group, one widget per feature. The inline script
//! collects every `[data-feature]` input in document order and talks to the
//! JSON endpoints in [`crate::server`].

use std::fmt::Write;

use neuropredict_core::{FeatureGroup, FeatureKind, FeatureSpec, Widget, feature_groups};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f5f6fb; margin: 0; color: #1f2937; }
header { background: #6366f1; color: #fff; padding: 1.2rem 2rem; }
main { max-width: 1100px; margin: 0 auto; padding: 1.5rem; }
.banner { background: #fee2e2; color: #991b1b; border-radius: 12px; padding: 1rem; margin-bottom: 1rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 1rem; }
.card { background: #fff; border-radius: 12px; box-shadow: 0 1px 3px rgba(0,0,0,.1); overflow: hidden; }
.card h2 { margin: 0; padding: .7rem 1rem; font-size: 1.05rem; color: #fff; }
.card .body { padding: 1rem; }
.field { margin-bottom: .8rem; }
.field label { display: block; font-weight: 600; margin-bottom: .25rem; }
.field .unit { color: #6b7280; font-weight: 400; }
.field input[type=number], .field select { width: 100%; padding: .4rem; }
.alert { border-radius: 12px; padding: 1rem; margin: 1rem 0; }
.alert.danger { background: #fee2e2; color: #991b1b; }
.alert.warning { background: #fef3c7; color: #92400e; }
.result.positive { border-left: 6px solid #ef4444; }
.result.negative { border-left: 6px solid #10b981; }
.chip { border: 1.5px solid #6366f1; border-radius: 20px; background: #fff; color: #6366f1; padding: .3rem .9rem; cursor: pointer; }
#chat-log { max-height: 240px; overflow-y: auto; white-space: pre-wrap; }
"#;

const SCRIPT: &str = r#"
function collect() {
  const values = [], fields = [];
  for (const el of document.querySelectorAll('[data-feature]')) {
    if (el.type === 'radio' && !el.checked) continue;
    const raw = el.value.trim();
    fields.push(el.dataset.feature);
    values.push(raw === '' ? null : Number(raw));
  }
  return { values, fields };
}

let lastResult = null;

async function predict() {
  const out = document.getElementById('result');
  const res = await fetch('/api/predict', {
    method: 'POST', headers: { 'content-type': 'application/json' },
    body: JSON.stringify(collect()),
  });
  const outcome = await res.json();
  if (outcome.status === 'ok') {
    const p = outcome.payload;
    lastResult = outcome.result;
    out.className = 'card result ' + (p.positive ? 'positive' : 'negative');
    out.innerHTML = '<div class="body"><h3></h3><p class="pct"></p><p class="desc"></p><p class="rec"></p></div>';
    out.querySelector('h3').textContent = p.title;
    out.querySelector('.pct').textContent = 'Probability: ' + p.probability_text;
    out.querySelector('.desc').textContent = p.description;
    out.querySelector('.rec').textContent = p.recommendation;
    document.getElementById('report').disabled = false;
  } else {
    lastResult = null;
    out.className = 'alert ' + outcome.severity;
    out.textContent = outcome.message;
    document.getElementById('report').disabled = true;
  }
}

async function report() {
  if (!lastResult) return;
  const res = await fetch('/api/report', {
    method: 'POST', headers: { 'content-type': 'application/json' },
    body: JSON.stringify({ ...collect(), result: lastResult }),
  });
  if (!res.ok) return;
  const url = URL.createObjectURL(await res.blob());
  const a = document.createElement('a');
  a.href = url;
  a.download = 'neuropredict_report.pdf';
  a.click();
  URL.revokeObjectURL(url);
}

function suggest(chip) {
  document.getElementById('chat-input').value = chip.dataset.suggestion;
}

async function chat() {
  const input = document.getElementById('chat-input');
  const message = input.value;
  if (!message.trim()) return;
  const log = document.getElementById('chat-log');
  log.textContent += '\nYou: ' + message;
  input.value = '';
  const res = await fetch('/api/chat', {
    method: 'POST', headers: { 'content-type': 'application/json' },
    body: JSON.stringify({ message, ...collect() }),
  });
  const body = await res.json();
  if (body.reply !== null) log.textContent += '\nAssistant: ' + body.reply;
}
"#;

/// Canned questions offered above the chat input.
const SUGGESTIONS: [&str; 3] = ["Analyze my data", "What is LDL?", "Risks of hypertension?"];

/// Escape text for element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Full page. `unavailable` is the load-failure reason when the model could
/// not be loaded; it is shown as a banner above the form.
pub fn render_page(unavailable: Option<&str>) -> String {
    let mut html = String::with_capacity(32 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>NeuroPredict AI - Risk Assessment</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>");
    html.push_str("<header><h1>NeuroPredict AI</h1><p>Alzheimer's disease risk assessment</p></header>\n<main>\n");

    if let Some(reason) = unavailable {
        let _ = writeln!(
            html,
            "<div class=\"banner\" id=\"model-banner\">Model not loaded. Predictions are disabled. ({})</div>",
            escape_html(reason)
        );
    }

    html.push_str("<div class=\"grid\">\n");
    for group in feature_groups() {
        render_group(&mut html, group);
    }
    html.push_str("</div>\n");

    let disabled = if unavailable.is_some() { " disabled" } else { "" };
    let _ = writeln!(
        html,
        "<p><button onclick=\"predict()\"{disabled}>Predict Risk</button> \
         <button id=\"report\" onclick=\"report()\" disabled>Download Report</button></p>"
    );
    html.push_str("<div id=\"result\"></div>\n");

    html.push_str(
        "<section class=\"card\"><h2 style=\"background:#6366f1\">AI Assistant</h2><div class=\"body\">\
         <p class=\"unit\">I can analyze the data you entered or define medical terms.</p><p>",
    );
    for (i, text) in SUGGESTIONS.iter().enumerate() {
        let text = escape_html(text);
        let _ = write!(
            html,
            "<button class=\"chip\" id=\"sugg-{}\" data-suggestion=\"{text}\" \
             onclick=\"suggest(this)\">{text}</button> ",
            i + 1
        );
    }
    html.push_str(
        "</p><div id=\"chat-log\"></div>\
         <input id=\"chat-input\" placeholder=\"Ask about MMSE, ADL, risk factors...\">\
         <button onclick=\"chat()\">Send</button></div></section>\n",
    );

    let _ = writeln!(html, "</main>\n<script>{SCRIPT}</script>\n</body>\n</html>");
    html
}

fn render_group(html: &mut String, group: &FeatureGroup) {
    let _ = writeln!(
        html,
        "<section class=\"card\"><h2 style=\"background:{}\"><i class=\"{}\"></i> {}</h2><div class=\"body\">",
        escape_html(group.color),
        escape_html(group.icon),
        escape_html(group.title)
    );
    for feature in group.features {
        render_feature(html, feature);
    }
    html.push_str("</div></section>\n");
}

fn render_feature(html: &mut String, feature: &FeatureSpec) {
    let name = escape_html(feature.name);
    let unit = feature
        .unit
        .map(|u| format!(" <span class=\"unit\">({})</span>", escape_html(u)))
        .unwrap_or_default();

    let _ = write!(
        html,
        "<div class=\"field\"><label for=\"f-{name}\">{}{unit}</label>",
        escape_html(feature.label)
    );

    match feature.kind {
        FeatureKind::Numeric { min, max, default } => {
            let _ = write!(
                html,
                "<input type=\"number\" id=\"f-{name}\" data-feature=\"{name}\" \
                 min=\"{min}\" max=\"{max}\" step=\"any\" value=\"{default}\">"
            );
        }
        FeatureKind::Categorical {
            options,
            widget: Widget::Dropdown,
            default,
        } => {
            let _ = write!(html, "<select id=\"f-{name}\" data-feature=\"{name}\">");
            for opt in options {
                let selected = if opt.value == default { " selected" } else { "" };
                let _ = write!(
                    html,
                    "<option value=\"{}\"{selected}>{}</option>",
                    opt.value,
                    escape_html(opt.label)
                );
            }
            html.push_str("</select>");
        }
        FeatureKind::Categorical {
            options,
            widget: Widget::Radio,
            default,
        } => {
            for opt in options {
                let checked = if opt.value == default { " checked" } else { "" };
                let _ = write!(
                    html,
                    "<label><input type=\"radio\" name=\"{name}\" data-feature=\"{name}\" \
                     value=\"{}\"{checked}> {}</label> ",
                    opt.value,
                    escape_html(opt.label)
                );
            }
        }
    }

    html.push_str("</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuropredict_core::features;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn one_card_per_group() {
        let html = render_page(None);
        for group in feature_groups() {
            assert!(html.contains(&escape_html(group.title)), "{}", group.title);
        }
        assert!(!html.contains("model-banner"));
    }

    #[test]
    fn every_feature_has_a_widget() {
        let html = render_page(None);
        for f in features() {
            assert!(
                html.contains(&format!("data-feature=\"{}\"", f.name)),
                "missing widget for {}",
                f.name
            );
        }
    }

    #[test]
    fn widgets_follow_feature_kind() {
        let mut html = String::new();
        render_feature(&mut html, neuropredict_core::find("Age").unwrap());
        assert!(html.contains("type=\"number\""));
        assert!(html.contains("min=\"60\" max=\"90\" step=\"any\" value=\"70\""));

        html.clear();
        render_feature(&mut html, neuropredict_core::find("Gender").unwrap());
        assert!(html.contains("<select"));
        assert!(html.contains("<option value=\"0\" selected>Male</option>"));

        html.clear();
        render_feature(&mut html, neuropredict_core::find("Smoking").unwrap());
        assert_eq!(html.matches("type=\"radio\"").count(), 2);
        assert_eq!(html.matches(" checked").count(), 1);
    }

    #[test]
    fn chat_card_offers_suggestions() {
        let html = render_page(None);
        for (id, text) in [
            ("sugg-1", "Analyze my data"),
            ("sugg-2", "What is LDL?"),
            ("sugg-3", "Risks of hypertension?"),
        ] {
            assert!(html.contains(&format!("id=\"{id}\" data-suggestion=\"{text}\"")));
        }
        assert!(html.contains("function suggest(chip)"));
    }

    #[test]
    fn banner_when_model_missing() {
        let html = render_page(Some("model file not found: <models/x.json>"));
        assert!(html.contains("id=\"model-banner\""));
        assert!(html.contains("&lt;models/x.json&gt;"));
        assert!(html.contains("onclick=\"predict()\" disabled"));
    }
}
