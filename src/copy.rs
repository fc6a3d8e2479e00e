//! Replaying parsed documents into an [`XmlStreamWriter`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::from_utf8;
use tracing::{debug, error, info};

use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::filter::{FilterSummary, FilteringWriter};
use crate::name::QName;
use crate::path::LocationPath;
use crate::writer::{DocumentWriter, NamespaceContext, XmlStreamWriter};

/// Reads the whole document from `reader` and writes every event to
/// `writer`, finishing with [`XmlStreamWriter::write_end_document`].
///
/// Element and attribute names are resolved against the namespace
/// declarations of the input and carry their original prefix as hint.
pub fn copy_events<R, W>(reader: &mut Reader<R>, writer: &mut W) -> Result<()>
where
    R: BufRead,
    W: XmlStreamWriter + ?Sized,
{
    let mut namespaces = NamespaceContext::new();
    let mut buf = Vec::new();

    // イベントを順に読み出して書き込み先へ流す
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                error!("XML read error at position {}: {}", reader.buffer_position(), e);
                return Err(e.into());
            }
        };

        match event {
            Event::Decl(decl) => {
                let version = decl.version()?;
                let encoding = decl.encoding().transpose()?;
                let encoding = match &encoding {
                    Some(encoding) => Some(from_utf8(encoding)?),
                    None => None,
                };
                writer.write_start_document(from_utf8(&version)?, encoding)?;
            }
            Event::DocType(doctype) => {
                let declaration = from_utf8(&doctype)?;
                writer.write_dtd(&format!("<!DOCTYPE {}>", declaration.trim()))?;
            }
            Event::Start(start) => open_element(&start, &mut namespaces, writer, false)?,
            Event::Empty(start) => open_element(&start, &mut namespaces, writer, true)?,
            Event::End(_) => {
                // 要素を閉じたら入力側の名前空間スコープも戻す
                writer.write_end_element()?;
                namespaces.pop_scope();
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if !text.is_empty() {
                    writer.write_characters(&text)?;
                }
            }
            Event::CData(data) => writer.write_cdata(from_utf8(&data)?)?,
            Event::Comment(comment) => writer.write_comment(from_utf8(&comment)?)?,
            Event::PI(pi) => {
                let target = from_utf8(pi.target())?;
                let data = from_utf8(pi.content())?.trim();
                writer.write_processing_instruction(target, (!data.is_empty()).then_some(data))?;
            }
            Event::Eof => break,
        }
        buf.clear();
    }

    writer.write_end_document()
}

fn open_element<W>(
    start: &BytesStart<'_>,
    namespaces: &mut NamespaceContext,
    writer: &mut W,
    empty: bool,
) -> Result<()>
where
    W: XmlStreamWriter + ?Sized,
{
    namespaces.push_scope();

    // 名前空間宣言と通常の属性を分ける（宣言は要素名の解決より先に束縛する）
    let mut declarations = Vec::new();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            namespaces.bind("", &value);
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces.bind(prefix, &value);
            declarations.push((prefix.to_string(), value));
        } else {
            attributes.push((key.to_string(), value));
        }
    }

    // 要素、名前空間宣言、属性の順に書き出す
    let qname = start.name();
    let name = resolve(from_utf8(qname.as_ref())?, namespaces, true)?;
    if empty {
        writer.write_empty_element(&name)?;
    } else {
        writer.write_start_element(&name)?;
    }
    for (prefix, uri) in &declarations {
        writer.write_namespace(prefix, uri)?;
    }
    for (key, value) in &attributes {
        writer.write_attribute(&resolve(key, namespaces, false)?, value)?;
    }

    if empty {
        namespaces.pop_scope();
    }
    Ok(())
}

// 接頭辞なしの属性は名前空間なし、接頭辞なしの要素はデフォルト名前空間
fn resolve(raw: &str, namespaces: &NamespaceContext, element: bool) -> Result<QName> {
    match raw.split_once(':') {
        Some((prefix, local)) => {
            let uri = namespaces
                .uri(prefix)
                .ok_or_else(|| Error::UndeclaredPrefix(prefix.to_string()))?;
            Ok(QName::new(uri, local).with_prefix(prefix))
        }
        None if element => Ok(match namespaces.uri("") {
            Some(uri) => QName::new(uri, raw).with_prefix(""),
            None => QName::local(raw),
        }),
        None => Ok(QName::local(raw)),
    }
}

/// Copies `input` to `output`, keeping only the elements selected by `paths`.
pub fn filter_document<R, W>(
    input: R,
    output: W,
    paths: impl IntoIterator<Item = LocationPath>,
    options: &FilterOptions,
) -> Result<FilterSummary>
where
    R: BufRead,
    W: Write,
{
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(options.trim_text);

    let sink = match options.indent {
        Some(indent) => DocumentWriter::with_indent(output, indent),
        None => DocumentWriter::new(output),
    };
    let mut writer = FilteringWriter::new(sink, paths);

    copy_events(&mut reader, &mut writer)?;
    writer.close()?;

    let summary = writer.summary();
    debug!(
        "Filtered document: kept {} of {} elements",
        summary.elements_written, summary.elements_seen
    );
    Ok(summary)
}

/// [`filter_document`] from one file into another.
pub fn filter_file(
    input: &Path,
    output: &Path,
    paths: impl IntoIterator<Item = LocationPath>,
    options: &FilterOptions,
) -> Result<FilterSummary> {
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);

    let summary = filter_document(reader, writer, paths, options)?;
    info!(
        "Written {:?}: kept {} of {} elements",
        output, summary.elements_written, summary.elements_seen
    );
    Ok(summary)
}
