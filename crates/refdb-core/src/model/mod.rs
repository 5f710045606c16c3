//! Registry object model: types, reference slots, and record identities.

pub mod attribute;
pub mod object_type;
pub mod record;

pub use attribute::{AUTH_ATTRIBUTE, Attribute, AttributeType};
pub use object_type::ObjectType;
pub use record::{PrimaryKey, Record, RecordRef, ReferenceEdge, Revision, StoredRecord};
