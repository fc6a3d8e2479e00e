//! The streaming writer contract and its `quick-xml` backed implementation.

mod namespace;

pub use namespace::NamespaceContext;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::error::{Error, Result};
use crate::name::QName;

/// A sequential XML writer.
///
/// Calls follow document order. Attributes and namespace declarations belong
/// to the element opened by the most recent start or empty element call and
/// must come before any other content.
pub trait XmlStreamWriter {
    fn write_start_document(&mut self, version: &str, encoding: Option<&str>) -> Result<()>;

    /// Closes every element still open and flushes.
    fn write_end_document(&mut self) -> Result<()>;

    fn write_start_element(&mut self, name: &QName) -> Result<()>;

    fn write_empty_element(&mut self, name: &QName) -> Result<()>;

    fn write_end_element(&mut self) -> Result<()>;

    fn write_attribute(&mut self, name: &QName, value: &str) -> Result<()>;

    /// Declares `prefix` on the current start tag. An empty prefix declares
    /// the default namespace.
    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()>;

    fn write_default_namespace(&mut self, uri: &str) -> Result<()>;

    fn write_characters(&mut self, text: &str) -> Result<()>;

    fn write_cdata(&mut self, data: &str) -> Result<()>;

    fn write_comment(&mut self, text: &str) -> Result<()>;

    fn write_processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()>;

    /// Writes a complete `<!DOCTYPE ...>` declaration verbatim.
    fn write_dtd(&mut self, dtd: &str) -> Result<()>;

    fn write_entity_ref(&mut self, name: &str) -> Result<()>;

    /// Binds `prefix` in the current scope without writing a declaration.
    fn set_prefix(&mut self, prefix: &str, uri: &str) -> Result<()>;

    fn set_default_namespace(&mut self, uri: &str) -> Result<()>;

    fn namespace_context(&self) -> &NamespaceContext;

    fn prefix(&self, uri: &str) -> Option<&str> {
        self.namespace_context().prefix(uri)
    }

    fn flush(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

struct PendingTag {
    start: BytesStart<'static>,
    empty: bool,
}

/// Serializes writer calls to an [`std::io::Write`] with `quick-xml`.
///
/// Names are written with their prefix hint when they carry one, otherwise
/// with the prefix bound to their namespace, otherwise unprefixed. Namespaces
/// are never declared implicitly.
pub struct DocumentWriter<W: Write> {
    writer: Writer<W>,
    namespaces: NamespaceContext,
    open: Vec<String>,
    pending: Option<PendingTag>,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::from_writer(Writer::new(inner))
    }

    /// Indents nested elements by `indent` spaces per level.
    pub fn with_indent(inner: W, indent: usize) -> Self {
        Self::from_writer(Writer::new_with_indent(inner, b' ', indent))
    }

    fn from_writer(writer: Writer<W>) -> Self {
        Self {
            writer,
            namespaces: NamespaceContext::new(),
            open: Vec::new(),
            pending: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Number of elements opened and not yet closed.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn element_name(&self, name: &QName) -> String {
        let prefix = match name.prefix() {
            Some(prefix) => Some(prefix),
            None => name.namespace().and_then(|ns| self.namespaces.prefix(ns)),
        };
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, name.local_name()),
            _ => name.local_name().to_string(),
        }
    }

    fn open_tag(&mut self, name: &QName, empty: bool) -> Result<()> {
        // 前の開始タグを確定してから新しいスコープを開く
        self.flush_pending()?;
        self.namespaces.push_scope();
        let tag = self.element_name(name);
        if !empty {
            self.open.push(tag.clone());
        }
        self.pending = Some(PendingTag {
            start: BytesStart::new(tag),
            empty,
        });
        Ok(())
    }

    fn pending_tag(&mut self, what: &'static str) -> Result<&mut BytesStart<'static>> {
        self.pending
            .as_mut()
            .map(|tag| &mut tag.start)
            .ok_or(Error::NoOpenStartTag(what))
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(tag) = self.pending.take() {
            // 空要素はここでスコープも閉じる
            if tag.empty {
                self.writer.write_event(Event::Empty(tag.start))?;
                self.namespaces.pop_scope();
            } else {
                self.writer.write_event(Event::Start(tag.start))?;
            }
        }
        Ok(())
    }

    fn close_element(&mut self) -> Result<()> {
        let tag = self.open.pop().ok_or(Error::UnbalancedEndElement)?;
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        self.namespaces.pop_scope();
        Ok(())
    }
}

impl<W: Write> XmlStreamWriter for DocumentWriter<W> {
    fn write_start_document(&mut self, version: &str, encoding: Option<&str>) -> Result<()> {
        self.flush_pending()?;
        self.writer
            .write_event(Event::Decl(BytesDecl::new(version, encoding, None)))?;
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        self.flush_pending()?;
        // 開いたままの要素をすべて閉じる
        while !self.open.is_empty() {
            self.close_element()?;
        }
        self.flush()
    }

    fn write_start_element(&mut self, name: &QName) -> Result<()> {
        self.open_tag(name, false)
    }

    fn write_empty_element(&mut self, name: &QName) -> Result<()> {
        self.open_tag(name, true)
    }

    fn write_end_element(&mut self) -> Result<()> {
        self.flush_pending()?;
        self.close_element()
    }

    fn write_attribute(&mut self, name: &QName, value: &str) -> Result<()> {
        // 属性にはデフォルト名前空間が適用されない
        let key = match name.prefix() {
            Some(_) => self.element_name(name),
            None => match name.namespace().and_then(|ns| self.namespaces.prefix(ns)) {
                Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, name.local_name()),
                _ => name.local_name().to_string(),
            },
        };
        self.pending_tag("attribute")?
            .push_attribute((key.as_str(), value));
        Ok(())
    }

    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if prefix.is_empty() {
            return self.write_default_namespace(uri);
        }
        let key = format!("xmlns:{}", prefix);
        self.pending_tag("namespace declaration")?
            .push_attribute((key.as_str(), uri));
        self.namespaces.bind(prefix, uri);
        Ok(())
    }

    fn write_default_namespace(&mut self, uri: &str) -> Result<()> {
        self.pending_tag("namespace declaration")?
            .push_attribute(("xmlns", uri));
        self.namespaces.bind("", uri);
        Ok(())
    }

    fn write_characters(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn write_cdata(&mut self, data: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer.write_event(Event::CData(BytesCData::new(data)))?;
        Ok(())
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer
            .write_event(Event::Comment(BytesText::from_escaped(text)))?;
        Ok(())
    }

    fn write_processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        self.flush_pending()?;
        let content = match data {
            Some(data) if !data.is_empty() => format!("{} {}", target, data),
            _ => target.to_string(),
        };
        self.writer.write_event(Event::PI(BytesPI::new(content)))?;
        Ok(())
    }

    fn write_dtd(&mut self, dtd: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer.get_mut().write_all(dtd.as_bytes())?;
        Ok(())
    }

    fn write_entity_ref(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        write!(self.writer.get_mut(), "&{};", name)?;
        Ok(())
    }

    fn set_prefix(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.namespaces.bind(prefix, uri);
        Ok(())
    }

    fn set_default_namespace(&mut self, uri: &str) -> Result<()> {
        self.namespaces.bind("", uri);
        Ok(())
    }

    fn namespace_context(&self) -> &NamespaceContext {
        &self.namespaces
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.get_mut().flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}
