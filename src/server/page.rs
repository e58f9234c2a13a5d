//! Server-rendered form page.

use crate::form::{FormView, ResultPanel};
use crate::image::ImageFormat;
use std::fmt::Write;

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; background: #111827; color: #e5e7eb; }
header { padding: 1rem; text-align: center; border-bottom: 1px solid #374151; }
h1 { margin: 0; color: #a5b4fc; }
main { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 2rem; max-width: 80rem; margin: 0 auto; padding: 2rem; }
section { background: #1f2937; border: 1px solid #374151; border-radius: 1rem; padding: 1.5rem; }
label { display: block; font-weight: 600; color: #a5b4fc; margin-bottom: .5rem; }
input[type=text] { width: 100%; box-sizing: border-box; padding: .75rem; border-radius: .5rem; border: 1px solid #4b5563; background: #374151; color: inherit; }
button { padding: .75rem 1rem; border: 0; border-radius: .5rem; background: #4f46e5; color: white; font-weight: 700; cursor: pointer; }
button:disabled { background: #4b5563; cursor: not-allowed; }
img { max-width: 100%; max-height: 600px; border-radius: .5rem; }
.hint { font-size: .8rem; color: #9ca3af; }
.panel { display: flex; align-items: center; justify-content: center; min-height: 400px; text-align: center; }
.error { color: #f87171; }
.muted { color: #6b7280; }
"#;

/// Renders the whole page for a form snapshot.
pub fn render(view: &FormView) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    if matches!(view.panel, ResultPanel::Loading) {
        html.push_str("<meta http-equiv=\"refresh\" content=\"2\">\n");
    }
    let _ = write!(
        html,
        "<title>Vehicle Swap</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1>Swap the Vehicle in Your Photo</h1>\
         <p class=\"hint\">Use AI to change the type of vehicle in your image</p></header>\n<main>\n"
    );

    html.push_str("<section>\n");
    render_upload(&mut html, view);
    render_prompt(&mut html, view);
    html.push_str("</section>\n");

    html.push_str("<section class=\"panel\" id=\"result\">\n");
    render_panel(&mut html, &view.panel);
    html.push_str("</section>\n</main>\n</body>\n</html>\n");
    html
}

fn render_upload(html: &mut String, view: &FormView) {
    html.push_str("<label>1. Upload the original photo</label>\n");
    match (&view.file_name, &view.preview_url) {
        (Some(name), preview) => {
            if let Some(url) = preview {
                let _ = writeln!(
                    html,
                    "<img src=\"{}\" alt=\"Original preview\">",
                    escape_html(url)
                );
            }
            let _ = writeln!(
                html,
                "<p class=\"hint\">{}</p>\n\
                 <form method=\"post\" action=\"/image/clear\">\
                 <button type=\"submit\" aria-label=\"Remove image\">Remove image</button></form>",
                escape_html(name)
            );
        }
        (None, _) => {
            let _ = writeln!(
                html,
                "<form method=\"post\" action=\"/image\" enctype=\"multipart/form-data\">\
                 <input id=\"image-upload\" type=\"file\" name=\"image\" accept=\"{}\" required>\
                 <button type=\"submit\">Upload</button></form>\n\
                 <p class=\"hint\">PNG, JPG, WEBP (up to 5MB)</p>",
                ImageFormat::accept_attribute()
            );
        }
    }
}

fn render_prompt(html: &mut String, view: &FormView) {
    let input_disabled = if view.file_name.is_none() { " disabled" } else { "" };
    let submit_disabled = if view.submit_enabled { "" } else { " disabled" };
    let button_text = if matches!(view.panel, ResultPanel::Loading) {
        "Processing..."
    } else {
        "Generate new image"
    };
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/submit\">\n\
         <label for=\"prompt\">2. Describe the new vehicle</label>\n\
         <input id=\"prompt\" type=\"text\" name=\"prompt\" value=\"{}\" \
         placeholder=\"e.g. a sports motorbike, a steam train...\" required{input_disabled}>\n\
         <p><button type=\"submit\"{submit_disabled}>{button_text}</button></p>\n</form>",
        escape_html(&view.prompt)
    );
}

fn render_panel(html: &mut String, panel: &ResultPanel) {
    match panel {
        ResultPanel::Loading => html.push_str(
            "<div><p><strong>The AI is working...</strong></p>\
             <p class=\"hint\">This can take a little while.</p></div>\n",
        ),
        ResultPanel::Error { message } => {
            let _ = writeln!(
                html,
                "<div class=\"error\"><p><strong>Something went wrong</strong></p><p>{}</p></div>",
                escape_html(message)
            );
        }
        ResultPanel::Result { image_url } => {
            let _ = writeln!(
                html,
                "<img src=\"{}\" alt=\"Generated result\">",
                escape_html(image_url)
            );
        }
        ResultPanel::Empty => html.push_str(
            "<div class=\"muted\"><p><strong>Your new image will appear here</strong></p>\
             <p>Start by uploading an image and describing a vehicle.</p></div>\n",
        ),
    }
}

/// Escapes text for HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
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
