// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

// Makes logging a true runtime no-op when the feature is off. As a library
// we cannot rely on the consumer's max-level static shortcut.

#[cfg(feature = "logger")]
pub use log::{debug, error, info, trace, warn};

#[cfg(not(feature = "logger"))]
pub use disabled::{debug, error, info, trace, warn};

#[cfg(not(feature = "logger"))]
mod disabled {
    /// Swallows the arguments of a logging statement when the `logger`
    /// feature is disabled.
    #[macro_export]
    macro_rules! nolog {
        ($($arg:tt)+) => {};
    }

    pub use nolog as debug;
    pub use nolog as error;
    pub use nolog as info;
    pub use nolog as trace;
    pub use nolog as warn;
}
