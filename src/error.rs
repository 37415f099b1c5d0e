// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

use arrow_schema::ArrowError;
use snafu::{location, Location, Snafu};

/// Errors surfaced by index construction and queries.
///
/// Construction over an empty point set is not an error: both index families
/// represent the empty tree explicitly. Errors are reserved for violated
/// preconditions (inverted query intervals, malformed input batches) and for
/// invariant breaches that indicate a bug.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid user input: {message}, {location}"))]
    InvalidInput { message: String, location: Location },
    #[snafu(display("Arrow error: {source}, {location}"))]
    Arrow {
        source: ArrowError,
        location: Location,
    },
    #[snafu(display(
        "Encountered internal error. Please file a bug report at \
         https://github.com/ortho-index/ortho-index/issues. {message}, {location}"
    ))]
    Internal { message: String, location: Location },
}

impl Error {
    pub fn invalid_input(message: impl Into<String>, location: Location) -> Self {
        Self::InvalidInput {
            message: message.into(),
            location,
        }
    }
}

impl From<ArrowError> for Error {
    #[track_caller]
    fn from(e: ArrowError) -> Self {
        let location = std::panic::Location::caller();
        Self::Arrow {
            source: e,
            location: Location::new(location.file(), location.line(), location.column()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
