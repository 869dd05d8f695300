pub mod document;
pub mod run_id;
pub mod types;
pub mod walker;

pub use document::{
    Document, LineRule, LineSpacing, Numbering, Paragraph, ParagraphProps, Run, RunProps, Table,
    TableCell, TableRow,
};
pub use types::FieldSet;
pub use walker::{ParagraphRunContext, ParagraphRunContextMut};
