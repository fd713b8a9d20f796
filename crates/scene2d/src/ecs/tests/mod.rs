//! Cross-module tests for the component runtime
