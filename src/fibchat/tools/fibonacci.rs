//! # Fibonacci Tool Set
//!
//! Deterministic Fibonacci helpers plus the [`FibonacciToolProtocol`] that exposes them
//! to agents as callable tools.
//!
//! The sequence starts at `0, 1` and every later element is the sum of the two before it.
//! Values are `i64`; very large counts wrap around instead of panicking.
//!
//! ```rust
//! use fibchat::tools::fibonacci::{generate_sequence, is_fibonacci_number, validate_sequence};
//!
//! let seq = generate_sequence(10);
//! assert_eq!(seq, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
//! assert!(validate_sequence(&seq).valid);
//! assert!(is_fibonacci_number(89));
//! assert!(!is_fibonacci_number(4));
//! ```

use crate::fibchat::tool_protocol::{
    ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolProtocol, ToolResult,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::error::Error;
use std::fmt;

/// Largest count the tool protocol accepts from a model.
pub const MAX_TOOL_COUNT: i64 = 10_000;

pub const GENERATE_TOOL: &str = "GenerateFibonacci";
pub const VALIDATE_TOOL: &str = "ValidateFibonacci";
pub const STRING_TOOL: &str = "GetFibonacciString";
pub const MEMBERSHIP_TOOL: &str = "IsFibonacciNumber";

/// Generate the first `count` Fibonacci numbers. `count <= 0` yields an empty sequence.
pub fn generate_sequence(count: i64) -> Vec<i64> {
    if count <= 0 {
        return Vec::new();
    }

    let count = count as usize;
    let mut sequence = vec![0i64; count];
    if count >= 2 {
        sequence[1] = 1;
    }
    for i in 2..count {
        sequence[i] = sequence[i - 1].wrapping_add(sequence[i - 2]);
    }
    sequence
}

/// Comma-joined rendering of [`generate_sequence`].
pub fn render_sequence(count: i64) -> String {
    join(&generate_sequence(count))
}

/// Whether `n` appears in the Fibonacci sequence. Negative numbers never do.
pub fn is_fibonacci_number(n: i64) -> bool {
    if n < 0 {
        return false;
    }

    let (mut a, mut b) = (0i64, 1i64);
    if n == a || n == b {
        return true;
    }

    while b < n {
        // past F(92) the next term no longer fits, so n cannot be reached
        let next = match a.checked_add(b) {
            Some(next) => next,
            None => return false,
        };
        a = b;
        b = next;
    }

    b == n
}

/// Why a candidate sequence was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFailure {
    EmptySequence,
    Mismatch,
}

/// Outcome of [`validate_sequence`]. An invalid sequence is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub provided: Vec<i64>,
    /// Canonical sequence with the same length as `provided`.
    pub expected: Vec<i64>,
    pub mismatch_positions: Vec<usize>,
    /// Set when the compared sequences differ in length.
    pub length_mismatch: bool,
    pub reason: Option<ValidationFailure>,
}

impl ValidationResult {
    /// Human-readable verdict, in the format the validator agent is told to reproduce.
    pub fn summary(&self) -> String {
        match self.reason {
            None => format!(
                "✅ VALID: The sequence [{}] is a correct Fibonacci sequence.",
                join(&self.provided)
            ),
            Some(ValidationFailure::EmptySequence) => {
                "❌ INVALID: Empty sequence provided.".to_string()
            }
            Some(ValidationFailure::Mismatch) => {
                let mut positions = if self.mismatch_positions.is_empty() {
                    String::from("none")
                } else {
                    self.mismatch_positions
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                if self.length_mismatch {
                    positions.push_str(" (length mismatch)");
                }
                format!(
                    "❌ INVALID: The sequence contains errors.\nExpected: [{}]\nProvided: [{}]\nDifferences found at positions: {}",
                    join(&self.expected),
                    join(&self.provided),
                    positions
                )
            }
        }
    }
}

/// Check `candidate` against the canonical sequence of the same length.
pub fn validate_sequence(candidate: &[i64]) -> ValidationResult {
    if candidate.is_empty() {
        return ValidationResult {
            valid: false,
            provided: Vec::new(),
            expected: Vec::new(),
            mismatch_positions: Vec::new(),
            length_mismatch: false,
            reason: Some(ValidationFailure::EmptySequence),
        };
    }

    let expected = generate_sequence(candidate.len() as i64);
    let (mismatch_positions, length_mismatch) = difference_positions(candidate, &expected);
    let valid = mismatch_positions.is_empty() && !length_mismatch;

    ValidationResult {
        valid,
        provided: candidate.to_vec(),
        expected,
        mismatch_positions,
        length_mismatch,
        reason: if valid {
            None
        } else {
            Some(ValidationFailure::Mismatch)
        },
    }
}

/// Indices where the overlapping prefix differs, plus whether the lengths differ.
pub fn difference_positions(actual: &[i64], expected: &[i64]) -> (Vec<usize>, bool) {
    let positions = actual
        .iter()
        .zip(expected)
        .enumerate()
        .filter(|(_, (a, e))| a != e)
        .map(|(i, _)| i)
        .collect();
    (positions, actual.len() != expected.len())
}

/// A token in a textual sequence that is not an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceParseError {
    pub token: String,
    /// Zero-based index of the offending entry among the non-empty entries.
    pub position: usize,
}

impl fmt::Display for SequenceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid number '{}' at position {}",
            self.token, self.position
        )
    }
}

impl Error for SequenceParseError {}

/// Parse `"0, 1, 1, 2"` (optionally wrapped in brackets) into integers.
///
/// Empty entries are skipped, so `"0,,1,"` parses as `[0, 1]`.
pub fn parse_sequence(text: &str) -> Result<Vec<i64>, SequenceParseError> {
    let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(position, token)| {
            token.parse::<i64>().map_err(|_| SequenceParseError {
                token: token.to_string(),
                position,
            })
        })
        .collect()
}

fn join(sequence: &[i64]) -> String {
    sequence
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Exposes the Fibonacci helpers as agent tools.
///
/// | Tool | Parameters | Output |
/// |------|------------|--------|
/// | `GenerateFibonacci` | `count: integer` | `{"count", "sequence"}` |
/// | `ValidateFibonacci` | `sequence: string` | [`ValidationResult`] fields plus `"summary"` |
/// | `GetFibonacciString` | `count: integer` | `{"count", "text"}` |
/// | `IsFibonacciNumber` | `number: integer` | `{"number", "is_fibonacci"}` |
#[derive(Debug, Default, Clone)]
pub struct FibonacciToolProtocol;

impl FibonacciToolProtocol {
    pub fn new() -> Self {
        Self
    }

    fn metadata() -> Vec<ToolMetadata> {
        vec![
            ToolMetadata::new(
                GENERATE_TOOL,
                "Generates the first N numbers of the Fibonacci sequence",
            )
            .with_parameter(
                ToolParameter::new("count", ToolParameterType::Integer)
                    .with_description("The number of Fibonacci numbers to generate")
                    .required(),
            ),
            ToolMetadata::new(
                VALIDATE_TOOL,
                "Validates if a sequence is a correct Fibonacci sequence",
            )
            .with_parameter(
                ToolParameter::new("sequence", ToolParameterType::String)
                    .with_description("The sequence to validate (comma-separated numbers)")
                    .required(),
            ),
            ToolMetadata::new(
                STRING_TOOL,
                "Gets the first N Fibonacci numbers as a formatted string",
            )
            .with_parameter(
                ToolParameter::new("count", ToolParameterType::Integer)
                    .with_description("The number of Fibonacci numbers to get")
                    .required(),
            ),
            ToolMetadata::new(MEMBERSHIP_TOOL, "Checks if a number is a Fibonacci number")
                .with_parameter(
                    ToolParameter::new("number", ToolParameterType::Integer)
                        .with_description("The number to check")
                        .required(),
                ),
        ]
    }

    fn validate(parameters: &JsonValue) -> Result<ToolResult, ToolError> {
        let parsed = match parameters.get("sequence") {
            Some(JsonValue::String(text)) => parse_sequence(text),
            Some(JsonValue::Array(items)) => {
                // some models send a JSON array despite the string schema
                let text = items
                    .iter()
                    .map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                parse_sequence(&text)
            }
            _ => {
                return Err(ToolError::InvalidParameters(
                    "missing required parameter 'sequence'".to_string(),
                ))
            }
        };

        match parsed {
            Ok(numbers) => {
                let result = validate_sequence(&numbers);
                let mut output = serde_json::to_value(&result)
                    .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
                output["summary"] = JsonValue::String(result.summary());
                Ok(ToolResult::success(output))
            }
            Err(e) => Ok(ToolResult::success(json!({
                "valid": false,
                "reason": "parse_error",
                "error": e.to_string(),
                "summary": format!("❌ ERROR: Failed to validate sequence. {}", e),
            }))),
        }
    }
}

/// Read an integer argument, accepting numeric strings since models often quote numbers.
fn integer_param(parameters: &JsonValue, name: &str) -> Result<i64, ToolError> {
    match parameters.get(name) {
        Some(JsonValue::Number(n)) => n.as_i64().ok_or_else(|| {
            ToolError::InvalidParameters(format!("'{}' must be an integer, got {}", name, n))
        }),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            ToolError::InvalidParameters(format!("'{}' must be an integer, got '{}'", name, s))
        }),
        Some(other) => Err(ToolError::InvalidParameters(format!(
            "'{}' must be an integer, got {}",
            name, other
        ))),
        None => Err(ToolError::InvalidParameters(format!(
            "missing required parameter '{}'",
            name
        ))),
    }
}

fn count_param(parameters: &JsonValue) -> Result<i64, ToolError> {
    let count = integer_param(parameters, "count")?;
    if count > MAX_TOOL_COUNT {
        return Err(ToolError::InvalidParameters(format!(
            "'count' must not exceed {}, got {}",
            MAX_TOOL_COUNT, count
        )));
    }
    Ok(count)
}

#[async_trait]
impl ToolProtocol for FibonacciToolProtocol {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let result = match tool_name {
            GENERATE_TOOL => count_param(&parameters).map(|count| {
                ToolResult::success(json!({
                    "count": count,
                    "sequence": generate_sequence(count),
                }))
            }),
            VALIDATE_TOOL => Self::validate(&parameters),
            STRING_TOOL => count_param(&parameters).map(|count| {
                ToolResult::success(json!({
                    "count": count,
                    "text": render_sequence(count),
                }))
            }),
            MEMBERSHIP_TOOL => integer_param(&parameters, "number").map(|number| {
                ToolResult::success(json!({
                    "number": number,
                    "is_fibonacci": is_fibonacci_number(number),
                }))
            }),
            other => Err(ToolError::NotFound(other.to_string())),
        };

        result.map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(Self::metadata())
    }

    fn protocol_name(&self) -> &str {
        "fibonacci"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_sequences() {
        assert!(generate_sequence(0).is_empty());
        assert!(generate_sequence(-5).is_empty());
        assert_eq!(generate_sequence(1), vec![0]);
        assert_eq!(generate_sequence(2), vec![0, 1]);
    }

    #[test]
    fn test_recurrence_holds() {
        for count in 0..60 {
            let seq = generate_sequence(count);
            assert_eq!(seq.len(), count as usize);
            for i in 2..seq.len() {
                assert_eq!(seq[i], seq[i - 1] + seq[i - 2]);
            }
        }
    }

    #[test]
    fn test_render_sequence() {
        assert_eq!(render_sequence(6), "0, 1, 1, 2, 3, 5");
        assert_eq!(render_sequence(0), "");
    }

    #[test]
    fn test_parse_sequence_variants() {
        assert_eq!(parse_sequence("0, 1, 1, 2").unwrap(), vec![0, 1, 1, 2]);
        assert_eq!(parse_sequence("[0,1,1]").unwrap(), vec![0, 1, 1]);
        assert_eq!(parse_sequence("0,,1,").unwrap(), vec![0, 1]);
        assert!(parse_sequence("").unwrap().is_empty());

        let err = parse_sequence("0, 1, two, 3").unwrap_err();
        assert_eq!(err.token, "two");
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_difference_positions_reports_length_sentinel() {
        let (positions, length_mismatch) = difference_positions(&[0, 1, 2], &[0, 1, 1, 2]);
        assert_eq!(positions, vec![2]);
        assert!(length_mismatch);
    }

    #[test]
    fn test_is_fibonacci_near_i64_limit() {
        // F(92), the largest Fibonacci number that fits in i64
        assert!(is_fibonacci_number(7_540_113_804_746_346_429));
        assert!(!is_fibonacci_number(7_540_113_804_746_346_430));
        assert!(!is_fibonacci_number(i64::MAX));
    }

    #[test]
    fn test_summary_wording() {
        let ok = validate_sequence(&[0, 1, 1, 2]);
        assert_eq!(
            ok.summary(),
            "✅ VALID: The sequence [0, 1, 1, 2] is a correct Fibonacci sequence."
        );

        let empty = validate_sequence(&[]);
        assert_eq!(empty.summary(), "❌ INVALID: Empty sequence provided.");

        let bad = validate_sequence(&[0, 1, 1, 3]);
        let text = bad.summary();
        assert!(text.starts_with("❌ INVALID: The sequence contains errors."));
        assert!(text.contains("Expected: [0, 1, 1, 2]"));
        assert!(text.contains("Provided: [0, 1, 1, 3]"));
        assert!(text.ends_with("Differences found at positions: 3"));
    }

    #[tokio::test]
    async fn test_protocol_rejects_oversized_count() {
        let protocol = FibonacciToolProtocol::new();
        let err = protocol
            .execute(GENERATE_TOOL, json!({"count": MAX_TOOL_COUNT + 1}))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid parameters"));
    }

    #[tokio::test]
    async fn test_protocol_accepts_quoted_integers() {
        let protocol = FibonacciToolProtocol::new();
        let result = protocol
            .execute(MEMBERSHIP_TOOL, json!({"number": "89"}))
            .await
            .unwrap();
        assert_eq!(result.output["is_fibonacci"], true);
    }
}
