mod fields;
mod ids;
mod record;
mod record_kind;

pub use fields::{RecordFields, parse_date};
pub use ids::{FolderId, RecordId};
pub use record::{Record, RecordBuilder};
pub use record_kind::{ParseKindError, RecordKind};
