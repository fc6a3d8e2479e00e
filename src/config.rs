/// Output settings for [`crate::filter_document`].
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Indent nested elements by this many spaces. `None` keeps the layout
    /// of the input text nodes.
    pub indent: Option<usize>,
    /// Trim whitespace around text nodes and drop whitespace-only ones.
    pub trim_text: bool,
}
