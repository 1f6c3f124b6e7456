use std::sync::LazyLock;

use eframe::{
    egui::{self, TextEdit, TextFormat},
    epaint::{Color32, text::LayoutJob},
};
use syntect::highlighting::{self, ThemeSet};
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Convert a syntect color to an egui Color32
fn syntect_color_to_egui(c: highlighting::Color) -> Color32 {
    Color32::from_rgba_premultiplied(c.r, c.g, c.b, c.a)
}

/// The editable code pane.
///
/// Highlighting is re-derived per frame from the current language's file
/// extension; unknown extensions fall back to plain text, never an
/// error.
pub struct CodeEditor<'a> {
    content: &'a mut String,
    extension: &'a str,
    is_dark: bool,
}

impl<'a> CodeEditor<'a> {
    pub fn new(content: &'a mut String, extension: &'a str, is_dark: bool) -> Self {
        Self {
            content,
            extension,
            is_dark,
        }
    }
}

impl egui::Widget for CodeEditor<'_> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let syntax = SYNTAX_SET.find_syntax_by_extension(self.extension);
        let theme_name = if self.is_dark {
            "base16-ocean.dark"
        } else {
            "base16-ocean.light"
        };
        let theme = &THEME_SET.themes[theme_name];

        // closure that defines the layout job
        let mut layouter = |ui: &egui::Ui, s: &dyn egui::TextBuffer, wrap_width: f32| {
            let mut layout_job = LayoutJob::default();

            if let Some(syn) = syntax {
                let mut highlight_state = highlighting::HighlightState::new(
                    &highlighting::Highlighter::new(theme),
                    syntect::parsing::ScopeStack::new(),
                );
                let mut parse_state = syntect::parsing::ParseState::new(syn);

                for line in s.as_str().lines() {
                    let line_with_newline = format!("{line}\n");
                    let ops = parse_state
                        .parse_line(&line_with_newline, &SYNTAX_SET)
                        .unwrap_or_default();
                    let regions = highlighting::HighlightIterator::new(
                        &mut highlight_state,
                        &ops,
                        &line_with_newline,
                        &highlighting::Highlighter::new(theme),
                    )
                    .collect::<Vec<_>>();

                    // Append highlighted tokens for the line (not the trailing newline)
                    let mut char_offset = 0;
                    for (style, text) in &regions {
                        if char_offset >= line.len() {
                            break;
                        }
                        let remaining = line.len() - char_offset;
                        let text = if text.len() > remaining {
                            &text[..remaining]
                        } else {
                            text
                        };
                        if text.is_empty() {
                            continue;
                        }

                        layout_job.append(
                            text,
                            0.0,
                            TextFormat {
                                color: syntect_color_to_egui(style.foreground),
                                ..Default::default()
                            },
                        );
                        char_offset += text.len();
                    }

                    layout_job.append("\n", 0.0, TextFormat::default());
                }
            } else {
                // Fallback: no syntax highlighting
                layout_job.append(s.as_str(), 0.0, TextFormat::default());
            }

            layout_job.wrap.max_width = wrap_width;
            ui.fonts_mut(|f| f.layout_job(layout_job))
        };

        let response = egui::ScrollArea::vertical().show(ui, |ui| {
            ui.add_sized(
                ui.available_size(),
                TextEdit::multiline(self.content)
                    .code_editor()
                    .layouter(&mut layouter),
            )
        });

        response.inner
    }
}
