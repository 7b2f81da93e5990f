//! Prompt composition
//!
//! An instruction containing [`PATCH_PLACEHOLDER`] is treated as a full
//! template and only has the placeholder filled in. Any other instruction
//! gets a fixed suffix naming the change and carrying the context blob.

use crate::review::request::ChangeInfo;

/// Token replaced by the context blob in template-style instructions
pub const PATCH_PLACEHOLDER: &str = "{{patch}}";

/// Merge the instruction, change metadata and context into the final prompt
pub fn compose(instruction: &str, change: &ChangeInfo, context: &str) -> String {
    if instruction.contains(PATCH_PLACEHOLDER) {
        return instruction.replacen(PATCH_PLACEHOLDER, context, 1);
    }

    format!(
        "{}\n\nContext: This is a code review for change {}.\nCode Content:\n{}",
        instruction, change.number, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = "\n--- File: a.rs ---\nfn a() {}\n";

    #[test]
    fn test_placeholder_is_substituted_in_place() {
        let prompt = compose("Review:\n{{patch}}\nBe brief.", &ChangeInfo::new(12), BLOB);
        assert_eq!(prompt, format!("Review:\n{}\nBe brief.", BLOB));
        assert!(!prompt.contains("Code Content:"));
        assert!(!prompt.contains("change 12"));
    }

    #[test]
    fn test_only_first_placeholder_is_replaced() {
        let prompt = compose("{{patch}} and {{patch}}", &ChangeInfo::new(1), "X");
        assert_eq!(prompt, "X and {{patch}}");
    }

    #[test]
    fn test_plain_instruction_gets_suffix() {
        let prompt = compose("Find bugs", &ChangeInfo::new(4242), BLOB);
        assert_eq!(
            prompt,
            format!(
                "Find bugs\n\nContext: This is a code review for change 4242.\nCode Content:\n{}",
                BLOB
            )
        );
        assert!(prompt.ends_with(&format!("Code Content:\n{}", BLOB)));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let change = ChangeInfo::new(9);
        assert_eq!(compose("Review", &change, BLOB), compose("Review", &change, BLOB));
    }
}
