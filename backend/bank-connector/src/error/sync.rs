use crate::error::bank_api::BankApiError;

use models::ErrorKind;

use common::ErrorLocation;

use std::panic::Location;

use chrono::NaiveDate;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SyncError {
    #[error("Invalid Range Error: {from_date} is after {to_date} {location}")]
    InvalidRange {
        from_date: NaiveDate,
        to_date: NaiveDate,
        location: ErrorLocation,
    },

    #[error("Page Limit Error: '{connection}' still offered pages after {pages} {location}")]
    PageLimit {
        connection: String,
        pages: usize,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Api(#[from] BankApiError),
}

impl SyncError {
    #[track_caller]
    pub fn invalid_range(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        SyncError::InvalidRange {
            from_date,
            to_date,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn page_limit(connection: impl Into<String>, pages: usize) -> Self {
        SyncError::PageLimit {
            connection: connection.into(),
            pages,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::InvalidRange { .. } => ErrorKind::InvalidRange,
            SyncError::PageLimit { .. } => ErrorKind::InvalidResponse,
            SyncError::Api(e) => e.kind(),
        }
    }
}
