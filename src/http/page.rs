//! HTML rendering for the dashboard page.
//!
//! Every user-supplied value (paths, URLs, git output) goes through
//! [`escape_html`] before it reaches the markup.

use std::fmt::Write as _;

use crate::store::Project;

const SUCCESS_MARK: char = '✅';

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>GitHub Auto Push</title>
  <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100 min-h-screen flex items-center justify-center">
  <div class="w-full max-w-2xl bg-white shadow-lg rounded-2xl p-8">
    <h2 class="text-2xl font-bold text-center text-gray-800 mb-6">🚀 GitHub Auto Push Dashboard</h2>
"#;

const INPUT_CLASS: &str =
    "w-full p-2 border rounded-lg focus:outline-none focus:ring focus:ring-indigo-300";

const BUTTONS: &str = r#"      <div class="flex space-x-2">
        <button type="submit" name="action" value="push"
                class="flex-1 bg-indigo-600 text-white py-2 rounded-lg hover:bg-indigo-700 transition">
          Push to GitHub
        </button>
        <button type="submit" name="action" value="save"
                class="flex-1 bg-green-600 text-white py-2 rounded-lg hover:bg-green-700 transition">
          Save Project
        </button>
      </div>
    </form>
"#;

const TAIL: &str = "  </div>\n</body>\n</html>\n";

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// Everything the page shows for one request.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub projects: &'a [Project],
    pub selected: Option<usize>,
    pub local_path: &'a str,
    pub repo_url: &'a str,
    pub message: Option<String>,
}

/// Messages starting with the check mark are styled as success; everything
/// else is an error.
pub fn is_success_message(message: &str) -> bool {
    message.starts_with(SUCCESS_MARK)
}

pub fn saved_message() -> String {
    format!("{SUCCESS_MARK} Project saved successfully")
}

pub fn push_success_message(output: &str) -> String {
    format!("{SUCCESS_MARK} Success:\n{output}")
}

pub fn push_error_message(step: &str, stderr: &str) -> String {
    format!("❌ Error ({step}):\n{stderr}")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(HEAD);
    html.push_str("\n    <form method=\"post\" action=\"/\" class=\"space-y-4\">\n");

    render_project_select(&mut html, view);
    render_input(
        &mut html,
        "Local Project Path",
        "local_path",
        view.local_path,
        None,
        true,
    );
    render_input(
        &mut html,
        "Repository URL",
        "repo_url",
        view.repo_url,
        Some("Leave blank to reuse the repository's origin"),
        false,
    );
    render_input(
        &mut html,
        "Commit Message",
        "commit_message",
        "",
        Some("Leave blank for auto"),
        false,
    );
    html.push_str(BUTTONS);

    if let Some(message) = view.message.as_deref().filter(|m| !m.is_empty()) {
        let class = if is_success_message(message) {
            "bg-green-100 text-green-700"
        } else {
            "bg-red-100 text-red-700"
        };
        let _ = write!(
            html,
            "\n    <div class=\"mt-6 p-4 rounded-lg {class}\">\n      \
             <pre class=\"whitespace-pre-wrap\">{}</pre>\n    </div>\n",
            escape_html(message),
        );
    }

    html.push_str(TAIL);
    html
}

fn render_project_select(html: &mut String, view: &PageView<'_>) {
    let _ = write!(
        html,
        "      <div>\n        \
         <label class=\"block text-gray-600 font-medium mb-1\">Select Project</label>\n        \
         <select name=\"project\" class=\"{INPUT_CLASS}\" \
         onchange=\"if (this.value !== 'new') window.location = '/?project=' + this.value\">\n          \
         <option value=\"new\">➕ Add New Project</option>\n",
    );

    for (i, project) in view.projects.iter().enumerate() {
        let selected = if view.selected == Some(i) { " selected" } else { "" };
        let _ = writeln!(
            html,
            "          <option value=\"{i}\"{selected}>{} → {}</option>",
            escape_html(&project.local_path),
            escape_html(&project.repo_url),
        );
    }

    html.push_str("        </select>\n      </div>\n\n");
}

fn render_input(
    html: &mut String,
    label: &str,
    name: &str,
    value: &str,
    placeholder: Option<&str>,
    required: bool,
) {
    let placeholder = placeholder
        .map(|p| format!(" placeholder=\"{}\"", escape_html(p)))
        .unwrap_or_default();
    let required = if required { " required" } else { "" };
    let _ = write!(
        html,
        "      <div>\n        \
         <label class=\"block text-gray-600 font-medium mb-1\">{label}</label>\n        \
         <input type=\"text\" name=\"{name}\" value=\"{}\"{placeholder}\n               \
         class=\"{INPUT_CLASS}\"{required}>\n      </div>\n\n",
        escape_html(value),
    );
}

/// Escape text for use in element bodies and double-quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn projects() -> Vec<Project> {
        vec![
            Project {
                local_path: "/srv/site".into(),
                repo_url: "git@github.com:me/site.git".into(),
            },
            Project {
                local_path: "/srv/notes".into(),
                repo_url: "https://github.com/me/notes.git".into(),
            },
        ]
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn classifies_messages() {
        assert!(is_success_message(&saved_message()));
        assert!(is_success_message(&push_success_message("")));
        assert!(!is_success_message(&push_error_message("push", "fatal: x")));
    }

    #[test]
    fn empty_view_has_form_and_no_message() {
        let html = render(&PageView::default());
        assert!(html.contains("<form method=\"post\""));
        assert!(html.contains("<option value=\"new\">"));
        assert!(!html.contains("whitespace-pre-wrap"));
    }

    #[test]
    fn lists_projects_and_marks_selection() {
        let projects = projects();
        let html = render(&PageView {
            projects: &projects,
            selected: Some(1),
            ..PageView::default()
        });
        assert!(html.contains("<option value=\"0\">/srv/site → git@github.com:me/site.git</option>"));
        assert!(html.contains(
            "<option value=\"1\" selected>/srv/notes → https://github.com/me/notes.git</option>"
        ));
    }

    #[test]
    fn echoes_field_values_escaped() {
        let html = render(&PageView {
            local_path: "/tmp/\"quoted\"",
            repo_url: "<script>",
            ..PageView::default()
        });
        assert!(html.contains("value=\"/tmp/&quot;quoted&quot;\""));
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(!html.contains("<script>\""));
    }

    #[test]
    fn error_message_is_styled_red() {
        let html = render(&PageView {
            message: Some(push_error_message("push", "fatal: <denied>")),
            ..PageView::default()
        });
        assert!(html.contains("bg-red-100"));
        assert!(html.contains("fatal: &lt;denied&gt;"));
    }

    #[test]
    fn success_message_is_styled_green() {
        let html = render(&PageView {
            message: Some(saved_message()),
            ..PageView::default()
        });
        assert!(html.contains("bg-green-100 text-green-700"));
        assert!(html.contains("Project saved successfully"));
    }
}
