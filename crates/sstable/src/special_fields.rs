//! Reserved field IDs metadata layers above this crate use to tag rows with
//! sequencing, tombstone, and scoring information without colliding with a
//! table's user-defined columns.

/// Field IDs above this boundary are reserved for internal use.
pub const FIELD_ID_END: i32 = i32::MAX - 10_000;

/// Reserved for the MVCC sequence number assigned to a row.
pub const SEQUENCE_NUMBER: i32 = i32::MAX - 1;

/// Reserved for the row's value kind (insert, update, delete, ...).
pub const VALUE_KIND: i32 = i32::MAX - 2;

/// Reserved for a row's stable identifier across compactions.
pub const ROW_ID: i32 = i32::MAX - 5;

/// Reserved for a relevance or ranking score attached to a row.
pub const INDEX_SCORE: i32 = FIELD_ID_END - 1;
