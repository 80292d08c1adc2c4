//! Human readable descriptions of LDAP result codes.
//!
//! Positive codes are the protocol result codes defined in RFC 4511. Negative codes are the
//! client-side codes reported when no server result is available.

/// The operation completed successfully.
pub const SUCCESS: i32 = 0;
/// The server rejected the supplied credentials.
pub const INVALID_CREDENTIALS: i32 = 49;
/// The client could not contact any server.
pub const SERVER_DOWN: i32 = -1;
/// A client-side timeout elapsed.
pub const TIMEOUT: i32 = -5;
/// The client was asked to perform an operation without a connection.
pub const CONNECT_ERROR: i32 = -11;

/// Returns the message associated with the given result code.
#[must_use]
pub fn describe(code: i32) -> &'static str {
    match code {
        SUCCESS => "Success",
        1 => "Operations error",
        2 => "Protocol error",
        3 => "Time limit exceeded",
        4 => "Size limit exceeded",
        5 => "Compare False",
        6 => "Compare True",
        7 => "Authentication method not supported",
        8 => "Strong(er) authentication required",
        10 => "Referral",
        11 => "Administrative limit exceeded",
        12 => "Critical extension is unavailable",
        13 => "Confidentiality required",
        14 => "SASL bind in progress",
        16 => "No such attribute",
        17 => "Undefined attribute type",
        18 => "Inappropriate matching",
        19 => "Constraint violation",
        20 => "Type or value exists",
        21 => "Invalid syntax",
        32 => "No such object",
        33 => "Alias problem",
        34 => "Invalid DN syntax",
        36 => "Alias dereferencing problem",
        48 => "Inappropriate authentication",
        INVALID_CREDENTIALS => "Invalid credentials",
        50 => "Insufficient access",
        51 => "Server is busy",
        52 => "Server is unavailable",
        53 => "Server is unwilling to perform",
        54 => "Loop detected",
        64 => "Naming violation",
        65 => "Object class violation",
        66 => "Operation not allowed on non-leaf",
        67 => "Operation not allowed on RDN",
        68 => "Already exists",
        69 => "Cannot modify object class",
        71 => "Affects multiple DSAs",
        80 => "Internal (implementation specific) error",
        SERVER_DOWN => "Can't contact LDAP server",
        -2 => "Local error",
        -3 => "Encoding error",
        -4 => "Decoding error",
        TIMEOUT => "Timed out",
        -6 => "Unknown authentication method",
        -7 => "Bad search filter",
        -8 => "User cancelled operation",
        -9 => "Bad parameter to an ldap routine",
        -10 => "Out of memory",
        CONNECT_ERROR => "Connect error",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_known_codes() {
        assert_eq!(describe(SUCCESS), "Success");
        assert_eq!(describe(INVALID_CREDENTIALS), "Invalid credentials");
        assert_eq!(describe(SERVER_DOWN), "Can't contact LDAP server");
        assert_eq!(describe(32), "No such object");
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(describe(4242), "Unknown error");
        assert_eq!(describe(-99), "Unknown error");
    }
}
