use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use super::{PageKind, RenderContext, Renderer};
use crate::document::NavLink;

/// Writes plain HTML pages under an output folder.
///
/// Bare markup; a template engine plugs in through [`Renderer`] instead.
#[derive(Debug, Clone)]
pub struct FileRenderer {
    output_folder: PathBuf,
}

impl FileRenderer {
    pub fn new<P: AsRef<Path>>(output_folder: P) -> Self {
        Self {
            output_folder: output_folder.as_ref().to_path_buf(),
        }
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    fn page(&self, ctx: &RenderContext<'_>) -> String {
        let mut html = String::new();
        let title = match ctx.kind {
            PageKind::Document => ctx
                .document
                .and_then(|d| d.title.clone())
                .unwrap_or_else(|| ctx.output_uri.clone()),
            PageKind::Index => "Index".to_string(),
            PageKind::Tag => ctx.tag.map(|t| format!("Tag: {}", t.name)).unwrap_or_default(),
        };

        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n",
            escape(&title)
        );

        match ctx.kind {
            PageKind::Document => {
                if let Some(doc) = ctx.document {
                    let _ = write!(
                        html,
                        "<article>\n<h1>{}</h1>\n<time datetime=\"{}\">{}</time>\n{}\n</article>\n",
                        escape(&title),
                        doc.date.to_rfc3339(),
                        doc.date.format("%Y-%m-%d"),
                        doc.body
                    );
                }
                html.push_str("<nav>\n");
                if let Some(prev) = &ctx.neighbors.previous {
                    push_link(&mut html, "previous", prev);
                }
                if let Some(next) = &ctx.neighbors.next {
                    push_link(&mut html, "next", next);
                }
                html.push_str("</nav>\n");
            }
            PageKind::Index => {
                html.push_str("<ul>\n");
                for doc in ctx.listing {
                    html.push_str("<li>");
                    push_link(&mut html, "", &doc.nav_link());
                    html.push_str("</li>\n");
                }
                html.push_str("</ul>\n");
                if let Some(p) = &ctx.pagination {
                    html.push_str("<nav>\n");
                    if let Some(prev) = &p.previous {
                        let _ = writeln!(html, "<a rel=\"prev\" href=\"/{}\">Newer</a>", escape(prev));
                    }
                    let _ = writeln!(html, "<span>Page {} of {}</span>", p.page, p.number_of_pages.max(1));
                    if let Some(next) = &p.next {
                        let _ = writeln!(html, "<a rel=\"next\" href=\"/{}\">Older</a>", escape(next));
                    }
                    html.push_str("</nav>\n");
                }
            }
            PageKind::Tag => {
                if let Some(tag) = ctx.tag {
                    let _ = writeln!(html, "<h1>{}</h1>\n<ul>", escape(&tag.name));
                    for link in &tag.tagged_documents {
                        html.push_str("<li>");
                        push_link(&mut html, "", link);
                        html.push_str("</li>\n");
                    }
                    html.push_str("</ul>\n");
                }
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

impl Renderer for FileRenderer {
    fn render(&self, ctx: &RenderContext<'_>) -> anyhow::Result<()> {
        let relative = Path::new(&ctx.output_uri);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            anyhow::bail!("Output path {} leaves the output folder", ctx.output_uri);
        }
        let target = self.output_folder.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, self.page(ctx))
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(())
    }
}

fn push_link(html: &mut String, rel: &str, link: &NavLink) {
    let text = link.title.as_deref().unwrap_or(&link.output_uri_no_ext);
    if rel.is_empty() {
        let _ = write!(html, "<a href=\"/{}\">{}</a>", escape(&link.output_uri), escape(text));
    } else {
        let _ = writeln!(
            html,
            "<a rel=\"{}\" href=\"/{}\">{}</a>",
            rel,
            escape(&link.output_uri),
            escape(text)
        );
    }
}

fn escape(s: &str) -> String {
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
