use std::fs;
use std::path::Path;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// One titled block of a [`Report`]: free-form markup and plots, rendered in
/// insertion order.
pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
    n_plots: usize,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            blocks: Vec::new(),
            n_plots: 0,
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let div_id = format!("{}-plot-{}", slug(&self.title), self.n_plots);
        self.n_plots += 1;
        self.blocks.push(html! {
            div class="plot" { (PreEscaped(plot.to_inline_html(Some(div_id.as_str())))) }
        });
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.blocks {
                    (block)
                }
            }
        }
    }
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

/// Self-contained HTML report.
pub struct Report {
    app_name: String,
    version: String,
    title: String,
    generated_at: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(app_name: &str, version: &str, title: &str) -> Self {
        Report {
            app_name: app_name.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; }
                         table { border-collapse: collapse; }
                         td, th { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
                         .meta { color: #666; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    p class="meta" {
                        (self.app_name) " v" (self.version) " | generated " (self.generated_at)
                    }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        fs::write(path, self.render().into_string())
    }
}
