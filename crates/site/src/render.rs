use askama::Template;
use reserveit_core::page::{FormPageContext, PageTemplate, RenderError, Renderer};

/// A resource's generated page, front matter included.
#[derive(Template)]
#[template(path = "form_page.md", escape = "html")]
struct FormPageMarkdown<'a> {
    page: &'a FormPageContext,
}

#[derive(Template)]
#[template(path = "form_fragment.md", escape = "html")]
struct FormFragmentMarkdown<'a> {
    page: &'a FormPageContext,
}

/// Renders form pages as markdown documents for the site host.
///
/// The forms are raw HTML blocks, so they carry no blank lines that would
/// end the block early. Values are HTML-escaped as in the live pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(
        &self,
        template: PageTemplate,
        context: &FormPageContext,
    ) -> Result<String, RenderError> {
        let rendered = match template {
            PageTemplate::FormPage => FormPageMarkdown { page: context }.render(),
            PageTemplate::FormFragment => FormFragmentMarkdown { page: context }.render(),
        };
        rendered.map_err(|err| RenderError::Template {
            template,
            message: err.to_string(),
        })
    }
}
