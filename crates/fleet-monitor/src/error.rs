/// Returned when a scope name given on the command line or in the environment
/// does not match any known variant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} `{value}` (expected one of: {expected})")]
pub struct ParseScopeError {
    pub what: &'static str,
    pub value: String,
    pub expected: &'static str,
}
