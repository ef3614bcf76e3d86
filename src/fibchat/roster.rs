//! The fixed Fibonacci agent roster.
//!
//! | Agent | Tools |
//! |-------|-------|
//! | `FibonacciGenerator` | `GenerateFibonacci`, `GetFibonacciString`, `IsFibonacciNumber` |
//! | `FibonacciValidator` | `ValidateFibonacci`, `IsFibonacciNumber` |
//! | `GeneralAssistant` | all four |
//!
//! Round-robin selection follows this order, so the generator always speaks first.

use crate::fibchat::agent::Agent;
use crate::fibchat::tools::fibonacci::{GENERATE_TOOL, MEMBERSHIP_TOOL, STRING_TOOL, VALIDATE_TOOL};

pub const GENERATOR_NAME: &str = "FibonacciGenerator";
pub const VALIDATOR_NAME: &str = "FibonacciValidator";
pub const ASSISTANT_NAME: &str = "GeneralAssistant";

pub const GENERATOR_INSTRUCTIONS: &str = "\
You are a Fibonacci sequence generator specialist. Your primary task is to generate Fibonacci
numbers using the available tools. When the user does not say how many, generate the first 10.

The Fibonacci sequence starts with 0 and 1, and each subsequent number is the sum of the two
preceding ones: 0, 1, 1, 2, 3, 5, 8, 13, 21, 34, ...

ALWAYS use the GenerateFibonacci function to calculate the sequence.
Present the result in a clear, formatted way.

Example response format:
\"The first 10 Fibonacci numbers are: 0, 1, 1, 2, 3, 5, 8, 13, 21, 34\"";

pub const VALIDATOR_INSTRUCTIONS: &str = "\
You are a Fibonacci sequence validation specialist. Your task is to validate whether a given
sequence of numbers represents a correct Fibonacci sequence.

ALWAYS use the ValidateFibonacci function to perform the validation.

The Fibonacci sequence rules:
1. Starts with 0 and 1
2. Each subsequent number is the sum of the two preceding numbers
3. The sequence is: 0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, ...

Provide a clear validation result explaining:
- Whether the sequence is correct or incorrect
- If incorrect, explain what's wrong
- Show the expected sequence if there are errors

Example response format:
\"✅ VALID: The sequence [0, 1, 1, 2, 3, 5, 8, 13, 21, 34] is a correct Fibonacci sequence.\"
OR
\"❌ INVALID: The sequence contains errors. Expected: [0, 1, 1, 2, 3, 5, 8, 13, 21, 34], but got: [provided sequence]\"";

pub const ASSISTANT_INSTRUCTIONS: &str = "\
You are a helpful general-purpose assistant. Answer questions on any topic using your own
knowledge, clearly and concisely. Questions that have nothing to do with Fibonacci numbers
are yours to answer in full.

When a question does involve Fibonacci numbers, use the tools for any concrete number or
sequence instead of computing by hand, and build on what your teammates have already
generated or validated rather than repeating it.";

pub fn generator() -> Agent {
    Agent::new(GENERATOR_NAME, GENERATOR_INSTRUCTIONS)
        .with_description("Specialist agent for generating Fibonacci sequences")
        .with_tools([GENERATE_TOOL, STRING_TOOL, MEMBERSHIP_TOOL])
}

pub fn validator() -> Agent {
    Agent::new(VALIDATOR_NAME, VALIDATOR_INSTRUCTIONS)
        .with_description("Specialist agent for validating Fibonacci sequences")
        .with_tools([VALIDATE_TOOL, MEMBERSHIP_TOOL])
}

pub fn general_assistant() -> Agent {
    Agent::new(ASSISTANT_NAME, ASSISTANT_INSTRUCTIONS)
        .with_description("Answers general questions on any topic")
        .with_tools([GENERATE_TOOL, VALIDATE_TOOL, STRING_TOOL, MEMBERSHIP_TOOL])
}

/// Generator, validator and general assistant, in speaking order.
pub fn fibonacci_roster() -> Vec<Agent> {
    vec![generator(), validator(), general_assistant()]
}
