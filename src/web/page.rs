// ============================================================
// Layer 1 — Page Rendering
// ============================================================
// The whole UI is one HTML page:
//
//   title + description
//   form: question (2 rows), context (10 rows), submit
//   two output panels (Markdown → HTML)
//   examples table, each row a link that pre-fills the form
//
// User-provided text is always escaped. Markdown is rendered
// with raw HTML turned back into text.

use pulldown_cmark::{html, Event, Parser};

use crate::domain::examples::EXAMPLES;

pub const TITLE: &str = "🤖 Transformer-Based Question Answering System";

const DESCRIPTION: &str = "\
**BERT for Extraction + GPT-2 for Generation** | Trained on SQuAD 2.0

This system uses two transformer models:
- 🎯 **DistilBERT**: Extracts the answer span from the context
- 💡 **DistilGPT-2**: Generates a natural language explanation

Simply enter a question and provide relevant context to get started!
";

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2937; }
label { display: block; font-weight: 600; margin: 1rem 0 .25rem; }
textarea { width: 100%; box-sizing: border-box; font: inherit; padding: .5rem; }
button { margin-top: 1rem; padding: .5rem 1.5rem; font: inherit; }
.panels { display: flex; gap: 1rem; margin-top: 1.5rem; }
.panel { flex: 1; border: 1px solid #d1d5db; border-radius: 8px; padding: .75rem 1rem; min-height: 4rem; }
.panel h2 { font-size: .85rem; color: #6b7280; margin: 0; }
table { border-collapse: collapse; width: 100%; margin-top: .5rem; }
td { border-top: 1px solid #e5e7eb; padding: .4rem; vertical-align: top; }
";

/// Everything a render needs: the form values and both output panels (Markdown).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub question:    String,
    pub context:     String,
    pub answer:      String,
    pub explanation: String,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // A String sink never reports fmt::Error; drop partial output if it does
    if pulldown_cmark_escape::escape_html(&mut out, text).is_err() {
        out.clear();
    }
    out
}

/// CommonMark → HTML. Inline and block HTML are emitted as escaped text.
pub fn markdown_to_html(markdown: &str) -> String {
    let events = Parser::new(markdown).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

fn examples_table() -> String {
    let rows: String = EXAMPLES
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "<tr><td><a href=\"/?example={i}\">{}</a></td><td>{}</td></tr>\n",
                escape_html(e.question),
                escape_html(e.context),
            )
        })
        .collect();
    format!("<table>\n{rows}</table>")
}

pub fn render(state: &PageState) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
{style}</style>
</head>
<body>
<h1>{title}</h1>
<div class="description">
{description}</div>
<form method="post" action="/">
<label for="question">❓ Question</label>
<textarea id="question" name="question" rows="2" placeholder="Enter your question here...">{question}</textarea>
<label for="context">📄 Context/Passage</label>
<textarea id="context" name="context" rows="10" placeholder="Paste the context or passage here...">{context}</textarea>
<button type="submit">Submit</button>
</form>
<div class="panels">
<section class="panel" id="answer"><h2>Extracted Answer</h2>
{answer}</section>
<section class="panel" id="explanation"><h2>Generated Explanation</h2>
{explanation}</section>
</div>
<h3>Examples</h3>
{examples}
</body>
</html>
"#,
        title       = escape_html(TITLE),
        style       = STYLE,
        description = markdown_to_html(DESCRIPTION),
        question    = escape_html(&state.question),
        context     = escape_html(&state.context),
        answer      = markdown_to_html(&state.answer),
        explanation = markdown_to_html(&state.explanation),
        examples    = examples_table(),
    )
}
