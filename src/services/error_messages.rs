//! Human readable text for HSM return and reason codes.
//!
//! Best-effort lookup used for diagnostics only. Exact `(rc, rsn)` pairs win,
//! then a return-code-only entry, then a generic fallback.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::constants::{HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND};

/// Matches any reason code.
const ANY_REASON: u32 = u32::MAX;

static MESSAGES: LazyLock<HashMap<(u32, u32), &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (
            (HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND),
            "The requested object was not found on the crypto module",
        ),
        ((0x06, ANY_REASON), "The crypto module could not complete the function"),
        ((0x07, ANY_REASON), "The command arguments were rejected"),
        ((0x20, ANY_REASON), "The command data is invalid"),
        ((0x21, ANY_REASON), "The command data length is out of range"),
        ((0x30, ANY_REASON), "The crypto module reported a device error"),
        ((0x54, ANY_REASON), "The function is not supported by the crypto module"),
        (
            (0xc0, ANY_REASON),
            "A signature on the administrative command is invalid",
        ),
        (
            (0x100, ANY_REASON),
            "The administrator is already installed in the domain",
        ),
        (
            (0x101, ANY_REASON),
            "The signing administrator is not installed in the domain",
        ),
    ])
});

/// Look up the text for an HSM return code / reason code pair.
#[must_use]
pub fn hsm_error_message(rc: u32, rsn: u32) -> String {
    MESSAGES
        .get(&(rc, rsn))
        .or_else(|| MESSAGES.get(&(rc, ANY_REASON)))
        .map_or_else(
            || format!("return code {rc} reason code {rsn}"),
            |text| format!("{text} (return code {rc} reason code {rsn})"),
        )
}
