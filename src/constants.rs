use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_MAX_VERIFY_ATTEMPTS: u32 = 3;
pub const DEFAULT_OTP_VALIDITY_SECONDS: i64 = 300;
pub const DEFAULT_OTP_CODE_LENGTH: usize = 6;
pub const COMMIT_FAILURE_MESSAGE: &str =
    "We could not save your submission. Please request a new OTP and try again.";
pub const INTERRUPTED_REQUEST_MESSAGE: &str = "Something went wrong. Please try again.";

lazy_static! {
    pub static ref PHONE_PATTERN: Regex =
        Regex::new(r"^[0-9]{10}$").expect("Failed to compile phone regex pattern");
}
