mod alias;

pub use alias::{AliasQueryParams, AliasRecord, ClickEvent, ShortenBatchDto, ShortenRequest};
