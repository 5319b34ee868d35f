//! Domain model (ids, metadata, records, uploads, errors).

pub mod errors;
pub mod ids;
pub mod meta;
pub mod records;
pub mod upload;

pub use self::errors::{FieldError, FilesError, ValidationErrors};
pub use self::ids::{FileCollectionId, FileDatabaseId, Id, IdParseError};
pub use self::meta::Meta;
pub use self::records::{
    CollectionSummary, DatabaseSummary, FileCollectionRecord, FileDatabaseRecord,
};
pub use self::upload::UploadedFile;
