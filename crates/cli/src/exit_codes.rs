//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad cell ref) |
//! | 3-9     | book             | Workbook file I/O and parsing            |
//! | 10-19   | config           | Configuration file and missing endpoints |
//! | 20-29   | gateway          | Remote endpoint failures                 |
//! | 30-39   | grid             | Insertion flow and host refusals         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant mapping function below

use gridext_engine::{FlowError, HostError, TemplateError};
use gridext_gateway::GatewayError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable cell reference.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Book (3-9)
// =============================================================================

/// Workbook or template file could not be read or written.
pub const EXIT_BOOK_IO: u8 = 3;

/// Workbook or template file is not valid JSON / not a snapshot.
pub const EXIT_BOOK_PARSE: u8 = 4;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Config file exists but is invalid.
pub const EXIT_CONFIG_INVALID: u8 = 10;

/// Feature needs an endpoint that is not configured.
pub const EXIT_NOT_CONFIGURED: u8 = 11;

// =============================================================================
// Gateway (20-29)
// =============================================================================

/// Connection refused, DNS failure, timeout.
pub const EXIT_GATEWAY_NETWORK: u8 = 20;

/// Server answered with a non-success status.
pub const EXIT_GATEWAY_HTTP: u8 = 21;

/// Template or source does not exist.
pub const EXIT_NOT_FOUND: u8 = 22;

/// Server answered with a body we could not interpret.
pub const EXIT_GATEWAY_RESPONSE: u8 = 23;

// =============================================================================
// Grid (30-39)
// =============================================================================

/// Insertion flow used out of order or with no fields.
pub const EXIT_FLOW: u8 = 30;

/// Host refused a mutation or a document.
pub const EXIT_HOST_REJECTED: u8 = 31;

// =============================================================================
// Error Mapping
// =============================================================================

pub fn gateway_exit_code(err: &GatewayError) -> u8 {
    match err {
        GatewayError::NotConfigured(_) => EXIT_NOT_CONFIGURED,
        GatewayError::UnknownSource(_) => EXIT_NOT_FOUND,
        GatewayError::Network(_) => EXIT_GATEWAY_NETWORK,
        GatewayError::Http(404, _) => EXIT_NOT_FOUND,
        GatewayError::Http(_, _) => EXIT_GATEWAY_HTTP,
        GatewayError::Parse(_) | GatewayError::UnexpectedShape(_) => EXIT_GATEWAY_RESPONSE,
    }
}

pub fn host_exit_code(err: &HostError) -> u8 {
    match err {
        HostError::InvalidSnapshot(_) => EXIT_BOOK_PARSE,
        HostError::NoActiveSheet | HostError::UnknownSheet(_) | HostError::Rejected(_, _) => EXIT_HOST_REJECTED,
    }
}

pub fn template_exit_code(err: &TemplateError) -> u8 {
    match err {
        TemplateError::Gateway(e) => gateway_exit_code(e),
        TemplateError::NotFound(_) => EXIT_NOT_FOUND,
        TemplateError::Malformed(_) => EXIT_BOOK_PARSE,
        TemplateError::Host(e) => host_exit_code(e),
        TemplateError::NoDocument => EXIT_HOST_REJECTED,
    }
}

pub fn flow_exit_code(err: &FlowError) -> u8 {
    match err {
        FlowError::Host(e) => host_exit_code(e),
        FlowError::OutOfOrder { .. } | FlowError::NoFields => EXIT_FLOW,
        FlowError::UnknownField(_) => EXIT_USAGE,
    }
}
