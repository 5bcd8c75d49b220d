// Gateway business error codes

use crate::auth::SUCCESS_STATUS_CODE;

const ERROR_MESSAGES: &[(&str, &str)] = &[
    ("0000", "Success"),
    ("2023", "Insufficient Balance"),
    ("2029", "Duplicate Transaction"),
    ("2071", "Refund after specified days not allowed"),
    ("2072", "Refund amount not valid"),
    ("2073", "Invalid SKU"),
    ("2074", "The transaction cannot be reversed"),
    ("2075", "SKU Character Limit Exceeded"),
    ("2076", "Reason Character Limit Exceeded"),
    ("2077", "Invalid TrxID"),
    ("2078", "Invalid Reason"),
    ("2079", "Invalid app Token"),
    ("2080", "The identity is not permitted to initiate this transaction"),
    (
        "2081",
        "The identity of the debit or credit party is in a state which prohibits the execution of this transaction",
    ),
    ("2082", "The merchant is not permitted to initiate this transaction"),
    ("2127", "Transaction not yet completed"),
];

/// Human-readable description of a gateway error code
pub fn error_message(code: &str) -> &'static str {
    ERROR_MESSAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
        .unwrap_or("Unknown Error")
}

pub fn is_success(code: &str) -> bool {
    code == SUCCESS_STATUS_CODE
}

pub fn is_known_error_code(code: &str) -> bool {
    ERROR_MESSAGES.iter().any(|(known, _)| *known == code)
}
