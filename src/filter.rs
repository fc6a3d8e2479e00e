//! The path filtering writer decorator.

use tracing::trace;

use crate::error::{Error, Result};
use crate::name::QName;
use crate::path::LocationPath;
use crate::stack::PathStack;
use crate::writer::{NamespaceContext, XmlStreamWriter};

/// Element counts of one filtering session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub elements_seen: usize,
    pub elements_written: usize,
}

impl FilterSummary {
    pub fn elements_dropped(&self) -> usize {
        self.elements_seen - self.elements_written
    }
}

/// Forwards writer calls to `inner` only for elements selected by the
/// registered location paths.
///
/// An element is kept when any path matches the stack of open elements at
/// the moment it is started. Everything inside a dropped element is dropped
/// too: its attributes, namespace declarations, text, comments, processing
/// instructions and child elements never reach `inner`. Document level calls
/// (start and end document, flush, close, prefix lookups) are always
/// forwarded.
///
/// Outside the root element, comments, processing instructions and the DTD
/// are written whether or not any path is registered, before the root as
/// well as after it.
///
/// ```
/// use gml_filter::{DocumentWriter, FilteringWriter, LocationPath, QName, XmlStreamWriter};
///
/// let paths: Vec<LocationPath> = vec!["/a/b".parse().unwrap()];
/// let mut writer = FilteringWriter::new(DocumentWriter::new(Vec::new()), paths);
/// writer.write_start_element(&QName::local("a")).unwrap();
/// writer.write_start_element(&QName::local("c")).unwrap();
/// writer.write_characters("dropped").unwrap();
/// writer.write_end_element().unwrap();
/// writer.write_start_element(&QName::local("b")).unwrap();
/// writer.write_characters("kept").unwrap();
/// writer.write_end_element().unwrap();
/// writer.write_end_element().unwrap();
/// writer.write_end_document().unwrap();
///
/// let xml = writer.into_inner().into_inner();
/// assert_eq!(String::from_utf8(xml).unwrap(), "<a><b>kept</b></a>");
/// ```
pub struct FilteringWriter<W> {
    inner: W,
    stack: PathStack,
    writing: bool,
    // depth of the element that started the current exclusion
    excluded_at: Option<usize>,
    // attributes after a dropped empty element belong to it
    dropped_empty: bool,
    summary: FilterSummary,
}

impl<W: XmlStreamWriter> FilteringWriter<W> {
    pub fn new(inner: W, paths: impl IntoIterator<Item = LocationPath>) -> Self {
        Self::with_stack(inner, PathStack::new(paths))
    }

    pub fn with_stack(inner: W, stack: PathStack) -> Self {
        Self {
            inner,
            stack,
            writing: true,
            excluded_at: None,
            dropped_empty: false,
            summary: FilterSummary::default(),
        }
    }

    /// Whether content written now would reach the inner writer.
    pub fn is_writing(&self) -> bool {
        self.writing
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn summary(&self) -> FilterSummary {
        self.summary
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn forward(&mut self, op: impl FnOnce(&mut W) -> Result<()>) -> Result<()> {
        self.dropped_empty = false;
        if self.writing {
            op(&mut self.inner)
        } else {
            Ok(())
        }
    }

    fn forward_to_tag(&mut self, op: impl FnOnce(&mut W) -> Result<()>) -> Result<()> {
        if self.writing && !self.dropped_empty {
            op(&mut self.inner)
        } else {
            Ok(())
        }
    }

    fn enter(&mut self, name: &QName) -> bool {
        self.dropped_empty = false;
        self.stack.start_element(name.clone());
        self.summary.elements_seen += 1;
        if !self.writing {
            return false;
        }
        let keep = self.stack.should_write();
        if keep {
            self.summary.elements_written += 1;
        } else {
            trace!(element = %name, depth = self.stack.depth(), "dropping element");
        }
        keep
    }
}

impl<W: XmlStreamWriter> XmlStreamWriter for FilteringWriter<W> {
    fn write_start_document(&mut self, version: &str, encoding: Option<&str>) -> Result<()> {
        self.inner.write_start_document(version, encoding)
    }

    fn write_end_document(&mut self) -> Result<()> {
        let depth = self.stack.depth();
        if depth > 0 {
            return Err(Error::UnclosedElements(depth));
        }
        self.dropped_empty = false;
        self.inner.write_end_document()
    }

    fn write_start_element(&mut self, name: &QName) -> Result<()> {
        let was_writing = self.writing;
        let keep = self.enter(name);
        // 除外中の子孫はスタックだけ積む
        if !was_writing {
            return Ok(());
        }
        self.writing = keep;
        if keep {
            self.inner.write_start_element(name)
        } else {
            self.excluded_at = Some(self.stack.depth());
            Ok(())
        }
    }

    fn write_empty_element(&mut self, name: &QName) -> Result<()> {
        let keep = self.enter(name);
        let result = if keep {
            self.inner.write_empty_element(name)
        } else {
            Ok(())
        };
        self.stack.end_element()?;
        self.dropped_empty = !keep;
        result
    }

    fn write_end_element(&mut self) -> Result<()> {
        self.dropped_empty = false;
        self.stack.end_element()?;
        if self.writing {
            self.inner.write_end_element()?;
        }

        // 除外を始めた要素の内側にいる間は再評価しない
        match self.excluded_at {
            Some(depth) if self.stack.depth() >= depth => {}
            _ => {
                self.excluded_at = None;
                // ルート要素の外側はプロローグと同じく常に書き出す
                self.writing = self.stack.depth() == 0 || self.stack.should_write();
            }
        }
        Ok(())
    }

    fn write_attribute(&mut self, name: &QName, value: &str) -> Result<()> {
        self.forward_to_tag(|w| w.write_attribute(name, value))
    }

    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.forward_to_tag(|w| w.write_namespace(prefix, uri))
    }

    fn write_default_namespace(&mut self, uri: &str) -> Result<()> {
        self.forward_to_tag(|w| w.write_default_namespace(uri))
    }

    fn write_characters(&mut self, text: &str) -> Result<()> {
        self.forward(|w| w.write_characters(text))
    }

    fn write_cdata(&mut self, data: &str) -> Result<()> {
        self.forward(|w| w.write_cdata(data))
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.forward(|w| w.write_comment(text))
    }

    fn write_processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        self.forward(|w| w.write_processing_instruction(target, data))
    }

    fn write_dtd(&mut self, dtd: &str) -> Result<()> {
        self.forward(|w| w.write_dtd(dtd))
    }

    fn write_entity_ref(&mut self, name: &str) -> Result<()> {
        self.forward(|w| w.write_entity_ref(name))
    }

    fn set_prefix(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.forward_to_tag(|w| w.set_prefix(prefix, uri))
    }

    fn set_default_namespace(&mut self, uri: &str) -> Result<()> {
        self.forward_to_tag(|w| w.set_default_namespace(uri))
    }

    fn namespace_context(&self) -> &NamespaceContext {
        self.inner.namespace_context()
    }

    fn prefix(&self, uri: &str) -> Option<&str> {
        self.inner.prefix(uri)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
