use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A page generated for one resource, with no source file on disk.
#[derive(Debug)]
pub struct VirtualDocument {
    path: String,
    resource: String,
    content: OnceLock<String>,
}

impl VirtualDocument {
    /// The document for `file_prefix`, registered at `<file_prefix>.md`.
    pub fn for_resource(file_prefix: &str) -> Self {
        Self {
            path: format!("{file_prefix}.md"),
            resource: file_prefix.to_string(),
            content: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn is_rendered(&self) -> bool {
        self.content.get().is_some()
    }

    /// Returns the cached content, computing it with `render` on first use.
    ///
    /// A failed render leaves the document unrendered so a later call can
    /// try again.
    pub fn content_or_try_render<E>(
        &self,
        render: impl FnOnce(&str) -> Result<String, E>,
    ) -> Result<&str, E> {
        if let Some(content) = self.content.get() {
            return Ok(content);
        }
        let rendered = render(&self.resource)?;
        Ok(self.content.get_or_init(|| rendered))
    }
}

/// Virtual documents keyed by their registered path.
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: BTreeMap<String, VirtualDocument>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `document`, keeping an existing entry for the same path.
    pub fn register(&mut self, document: VirtualDocument) -> &VirtualDocument {
        self.documents
            .entry(document.path.clone())
            .or_insert(document)
    }

    pub fn get(&self, path: &str) -> Option<&VirtualDocument> {
        self.documents.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_path_from_file_prefix() {
        let document = VirtualDocument::for_resource("courts");
        assert_eq!(document.path(), "courts.md");
        assert_eq!(document.resource(), "courts");
        assert!(!document.is_rendered());
    }

    #[test]
    fn test_content_is_computed_once() {
        let document = VirtualDocument::for_resource("courts");
        let calls = Cell::new(0);
        let render = |resource: &str| -> Result<String, ()> {
            calls.set(calls.get() + 1);
            Ok(format!("# {resource}"))
        };

        let first = document.content_or_try_render(render).unwrap().as_ptr();
        let second = document.content_or_try_render(render).unwrap();
        assert_eq!(second, "# courts");
        assert_eq!(first, second.as_ptr());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_render_is_not_cached() {
        let document = VirtualDocument::for_resource("courts");
        assert_eq!(
            document.content_or_try_render(|_| Err("boom")),
            Err("boom")
        );
        assert!(!document.is_rendered());
        assert_eq!(
            document.content_or_try_render(|_| Ok::<_, &str>("ok".to_string())),
            Ok("ok")
        );
    }

    #[test]
    fn test_register_keeps_first_document() {
        let mut cache = DocumentCache::new();
        let first = VirtualDocument::for_resource("courts");
        first
            .content_or_try_render(|_| Ok::<_, ()>("first".to_string()))
            .unwrap();
        cache.register(first);
        cache.register(VirtualDocument::for_resource("courts"));
        cache.register(VirtualDocument::for_resource("rooms"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("courts.md").unwrap().is_rendered());
        assert_eq!(cache.paths().collect::<Vec<_>>(), vec!["courts.md", "rooms.md"]);
        assert!(!cache.contains("index.md"));
    }
}
