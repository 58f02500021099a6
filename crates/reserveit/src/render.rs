use askama::Template;
use reserveit_core::page::{FormPageContext, PageTemplate, RenderError, Renderer};
use reserveit_site::assets::HTMX_SCRIPT;

/// A resource's full form page.
#[derive(Template)]
#[template(path = "form.html")]
struct FormPageHtml<'a> {
    page: &'a FormPageContext,
    htmx_script: &'a str,
}

/// The forms alone, returned to htmx requests.
#[derive(Template)]
#[template(path = "form_fragment.html")]
struct FormFragmentHtml<'a> {
    page: &'a FormPageContext,
}

/// Renders form pages as HTML for the live app.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(
        &self,
        template: PageTemplate,
        context: &FormPageContext,
    ) -> Result<String, RenderError> {
        let rendered = match template {
            PageTemplate::FormPage => FormPageHtml {
                page: context,
                htmx_script: HTMX_SCRIPT,
            }
            .render(),
            PageTemplate::FormFragment => FormFragmentHtml { page: context }.render(),
        };
        rendered.map_err(|err| RenderError::Template {
            template,
            message: err.to_string(),
        })
    }
}
